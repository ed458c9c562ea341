//! URLs des ressources et des vignettes
//!
//! L'hôte est repris tel quel de l'en-tête `Host` de la requête, pour que le
//! client rappelle le serveur par l'adresse qu'il a lui-même utilisée.

use url::form_urlencoded::Serializer;

pub const RES_PATH: &str = "/res";
pub const ICON_PATH: &str = "/icon";

/// Ce que désigne une URL `/res` ou `/icon`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceTarget {
    /// Scène, par identifiant public
    Scene(String),
    /// Fichier de la bibliothèque, par clé primaire
    File(u64),
    /// Fichier d'un dossier local, par chemin virtuel relatif à `/folders`
    Path(String),
}

impl ResourceTarget {
    fn query_key(&self) -> &'static str {
        match self {
            ResourceTarget::Scene(_) => "scene",
            ResourceTarget::File(_) => "file",
            ResourceTarget::Path(_) => "path",
        }
    }

    fn query_value(&self) -> String {
        match self {
            ResourceTarget::Scene(id) => id.clone(),
            ResourceTarget::File(id) => id.to_string(),
            ResourceTarget::Path(p) => p.clone(),
        }
    }

    fn url(&self, host: &str, path: &str, extra: &[(&str, &str)]) -> String {
        let mut query = Serializer::new(String::new());
        query.append_pair(self.query_key(), &self.query_value());
        for (k, v) in extra {
            query.append_pair(k, v);
        }
        format!("http://{}{}?{}", host, path, query.finish())
    }

    /// `http://{host}/res?{cible}`
    pub fn res_url(&self, host: &str) -> String {
        self.url(host, RES_PATH, &[])
    }

    /// `http://{host}/res?{cible}&transcode={profil}`
    pub fn transcode_url(&self, host: &str, profile: &str) -> String {
        self.url(host, RES_PATH, &[("transcode", profile)])
    }

    /// `http://{host}/icon?{cible}&c=jpeg`
    pub fn icon_url(&self, host: &str) -> String {
        self.url(host, ICON_PATH, &[("c", "jpeg")])
    }
}
