//! Enregistrements lus par le serveur de médias

use crate::error::Result;
use crate::query::SceneQuery;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Fichier vidéo d'un volume. `scene_id == 0` : fichier non rattaché à une scène.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoFile {
    pub id: u64,
    pub scene_id: u64,
    /// Répertoire contenant le fichier
    pub path: String,
    pub filename: String,
    pub size: u64,
    pub video_width: u32,
    pub video_height: u32,
    pub video_bitrate: u32,
    /// Durée en secondes
    pub duration: f64,
    #[serde(rename = "type")]
    pub file_type: String,
}

impl VideoFile {
    pub fn full_path(&self) -> PathBuf {
        PathBuf::from(&self.path).join(&self.filename)
    }

    /// `"{largeur}x{hauteur}"`, `None` si inconnue
    pub fn resolution(&self) -> Option<String> {
        if self.video_width > 0 && self.video_height > 0 {
            Some(format!("{}x{}", self.video_width, self.video_height))
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
    /// Clé primaire
    pub id: u64,
    /// Identifiant public, ex: `"vrbangers-1234"`
    pub scene_id: String,
    pub title: String,
    pub site: String,
    pub studio: String,
    pub cast: Vec<String>,
    pub tags: Vec<String>,
    pub files: Vec<VideoFile>,
    pub cover_url: String,
    /// Durée annoncée, en minutes
    pub duration: u32,
    pub release_date: Option<NaiveDate>,
    pub release_date_text: String,
    pub added_date: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub last_opened: Option<DateTime<Utc>>,
    pub star_rating: f64,
    pub total_file_size: u64,
    pub total_watch_time: u64,
    pub favourite: bool,
    pub watchlist: bool,
    pub is_watched: bool,
    pub is_scripted: bool,
    pub is_available: bool,
    pub is_accessible: bool,
    pub is_hidden: bool,
}

impl Scene {
    /// Date de sortie textuelle `YYYY-MM-DD`, recalculée si absente
    pub fn release_text(&self) -> String {
        if !self.release_date_text.is_empty() {
            return self.release_date_text.clone();
        }
        self.release_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    }

    /// Groupe de sortie `YYYY-MM`
    pub fn release_month(&self) -> Option<String> {
        match self.release_date {
            Some(d) => Some(d.format("%Y-%m").to_string()),
            None => self.release_date_text.get(..7).map(str::to_string),
        }
    }

    pub fn first_file(&self) -> Option<&VideoFile> {
        self.files.first()
    }
}

/// Liste enregistrée ; les listes "smart" portent un filtre JSON
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Playlist {
    pub id: u64,
    pub name: String,
    pub ordering: i64,
    pub is_system: bool,
    pub is_deo_enabled: bool,
    pub is_smart: bool,
    pub search_params: String,
}

impl Playlist {
    /// Décode le filtre enregistré. Un filtre vide équivaut au filtre par défaut.
    pub fn query(&self) -> Result<SceneQuery> {
        if self.search_params.trim().is_empty() {
            return Ok(SceneQuery::default());
        }
        Ok(serde_json::from_str(&self.search_params)?)
    }
}

/// Contenu importable en une fois dans une bibliothèque
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryBundle {
    pub scenes: Vec<Scene>,
    /// Fichiers non rattachés
    pub files: Vec<VideoFile>,
    pub playlists: Vec<Playlist>,
}
