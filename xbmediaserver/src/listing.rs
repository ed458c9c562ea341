//! Lecture et tri des dossiers locaux

use std::cmp::Ordering;
use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Entrée d'un dossier, métadonnées suivant les liens symboliques
#[derive(Debug, Clone)]
pub struct FolderEntry {
    pub name: String,
    pub fs_path: PathBuf,
    pub metadata: Metadata,
}

impl FolderEntry {
    pub fn is_dir(&self) -> bool {
        self.metadata.is_dir()
    }
}

/// Vrai si le client attend les dossiers après les fichiers
pub fn is_folders_last_client(user_agent: &str, patterns: &[String]) -> bool {
    patterns
        .iter()
        .any(|p| !p.is_empty() && user_agent.contains(p.as_str()))
}

fn compare(a: &FolderEntry, b: &FolderEntry, folders_last: bool) -> Ordering {
    match (a.is_dir(), b.is_dir()) {
        (true, false) if folders_last => Ordering::Greater,
        (true, false) => Ordering::Less,
        (false, true) if folders_last => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
    }
}

/// Dossiers d'abord (ou en dernier), puis nom sans casse ; tri stable
pub fn sort_entries(entries: &mut [FolderEntry], folders_last: bool) {
    entries.sort_by(|a, b| compare(a, b, folders_last));
}

/// Liste un dossier avec `stat` (et non `lstat`) ; les entrées illisibles
/// sont ignorées
pub async fn read_dir(dir: &Path) -> io::Result<Vec<FolderEntry>> {
    let mut rd = tokio::fs::read_dir(dir).await?;
    let mut entries = Vec::new();
    while let Some(entry) = rd.next_entry().await? {
        let fs_path = entry.path();
        let metadata = match tokio::fs::metadata(&fs_path).await {
            Ok(m) => m,
            Err(e) => {
                debug!(path = %fs_path.display(), error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        entries.push(FolderEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            fs_path,
            metadata,
        });
    }
    Ok(entries)
}
