//! # xblibrary
//!
//! Bibliothèque de scènes vue par le serveur de médias : lecture seule pour
//! le ContentDirectory, alimentée par import.
//!
//! Deux implémentations du trait [`SceneLibrary`] :
//! - [`MemoryLibrary`] : en mémoire, pour les tests et les petits jeux de données
//! - [`SqliteLibrary`] : fichier SQLite (`rusqlite`), requêtes sur `spawn_blocking`
//!
//! Les deux partagent la sémantique de [`SceneQuery`] : une scène visible dans
//! `all` l'est aussi dans les regroupements par site, tag, acteur ou mois.

mod error;
mod memory;
mod model;
mod query;
mod sqlite;

pub use error::{LibraryError, Result};
pub use memory::MemoryLibrary;
pub use model::{LibraryBundle, Playlist, Scene, VideoFile};
pub use query::SceneQuery;
pub use sqlite::SqliteLibrary;

pub use async_trait::async_trait;

/// Source de données du ContentDirectory
#[async_trait]
pub trait SceneLibrary: Send + Sync {
    /// Scènes correspondant au filtre, dans l'ordre de `query.sort`
    async fn query_scenes(&self, query: &SceneQuery) -> Result<Vec<Scene>>;

    /// Sites des scènes accessibles, triés, sans doublon ni valeur vide.
    /// Il en va de même pour tags, acteurs et mois de sortie.
    async fn distinct_sites(&self) -> Result<Vec<String>>;

    async fn distinct_tags(&self) -> Result<Vec<String>>;

    async fn distinct_actors(&self) -> Result<Vec<String>>;

    /// Mois de sortie `YYYY-MM`
    async fn release_groups(&self) -> Result<Vec<String>>;

    /// Listes enregistrées triées par `ordering` ; `deo_only` ne garde que
    /// celles publiées vers les lecteurs
    async fn playlists(&self, deo_only: bool) -> Result<Vec<Playlist>>;

    async fn playlist(&self, id: u64) -> Result<Option<Playlist>>;

    /// Fichiers sans scène associée
    async fn unmatched_files(&self) -> Result<Vec<VideoFile>>;

    async fn scene_by_scene_id(&self, scene_id: &str) -> Result<Option<Scene>>;

    async fn file_by_id(&self, id: u64) -> Result<Option<VideoFile>>;

    /// Version du contenu, incrémentée à chaque écriture
    async fn content_version(&self) -> Result<u64>;
}

/// Valeurs distinctes, triées, non vides
pub(crate) fn distinct<'a, I>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out: Vec<String> = values
        .into_iter()
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();
    out.sort();
    out.dedup();
    out
}
