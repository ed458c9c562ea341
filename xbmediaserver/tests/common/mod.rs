#![allow(dead_code)]

use chrono::NaiveDate;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use xblibrary::{LibraryBundle, MemoryLibrary, Playlist, Scene, VideoFile};

pub const HOST: &str = "192.168.1.20:9999";

pub struct Fixture {
    pub dir: TempDir,
    pub library: Arc<MemoryLibrary>,
}

fn video(id: u64, dir: &Path, name: &str, size: u64) -> VideoFile {
    VideoFile {
        id,
        path: dir.to_string_lossy().into_owned(),
        filename: name.to_string(),
        size,
        video_width: 5760,
        video_height: 2880,
        video_bitrate: 24_000,
        duration: 1830.0,
        file_type: "video".to_string(),
        ..Default::default()
    }
}

fn scene(scene_id: &str, site: &str, cast: &[&str], tags: &[&str], file: VideoFile) -> Scene {
    Scene {
        scene_id: scene_id.to_string(),
        title: format!("Title {}", scene_id),
        site: site.to_string(),
        cast: cast.iter().map(|s| s.to_string()).collect(),
        tags: tags.iter().map(|s| s.to_string()).collect(),
        files: vec![file],
        is_available: true,
        is_accessible: true,
        ..Default::default()
    }
}

/// Quatre scènes taguées `lesbian` : deux visibles sur VRSite, une
/// inaccessible, une masquée. Deux fichiers isolés dont un absent du disque.
pub fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    for name in ["a.mp4", "b.mp4", "c.mp4", "d.mp4", "loose.mp4"] {
        std::fs::write(root.join(name), b"0123456789").unwrap();
    }

    let mut first = scene(
        "vrsite-1",
        "VRSite",
        &["Alice"],
        &["lesbian", "pov"],
        video(1, root, "a.mp4", 10),
    );
    first.release_date = NaiveDate::from_ymd_opt(2021, 3, 9);
    first.cover_url = "https://cdn.example.org/covers/1.jpg".to_string();

    let mut second = scene(
        "vrsite-2",
        "VRSite",
        &["Bea"],
        &["lesbian"],
        video(2, root, "b.mp4", 10),
    );
    second.release_date = NaiveDate::from_ymd_opt(2021, 4, 1);

    let mut offline = scene("other-3", "Other", &["Cleo"], &["lesbian"], video(3, root, "c.mp4", 10));
    offline.is_accessible = false;

    let mut hidden = scene("other-4", "Other", &["Dana"], &["lesbian"], video(4, root, "d.mp4", 10));
    hidden.is_hidden = true;

    let bundle = LibraryBundle {
        scenes: vec![first, second, offline, hidden],
        files: vec![
            video(10, root, "loose.mp4", 10),
            video(11, root, "gone.mp4", 10),
        ],
        playlists: vec![
            Playlist {
                id: 1,
                name: "POV".to_string(),
                ordering: 1,
                is_deo_enabled: true,
                is_smart: true,
                search_params: r#"{"tags":["pov"]}"#.to_string(),
                ..Default::default()
            },
            Playlist {
                id: 2,
                name: "Private".to_string(),
                ordering: 2,
                is_smart: true,
                ..Default::default()
            },
        ],
    };

    Fixture {
        dir,
        library: Arc::new(MemoryLibrary::from_bundle(bundle)),
    }
}

/// Valeur d'un argument de sortie
pub fn arg<'a>(out: &'a [(String, String)], name: &str) -> &'a str {
    out.iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
        .unwrap_or_else(|| panic!("missing output argument {}", name))
}

pub fn soap_envelope(urn: &str, action: &str, args: &[(&str, &str)]) -> String {
    let body: String = args
        .iter()
        .map(|(k, v)| format!("<{k}>{v}</{k}>"))
        .collect();
    format!(
        r#"<?xml version="1.0"?><s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/"><s:Body><u:{action} xmlns:u="{urn}">{body}</u:{action}></s:Body></s:Envelope>"#
    )
}
