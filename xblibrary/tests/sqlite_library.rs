use chrono::NaiveDate;
use tempfile::TempDir;
use xblibrary::{
    LibraryBundle, MemoryLibrary, Playlist, Scene, SceneLibrary, SceneQuery, SqliteLibrary,
    VideoFile,
};

fn scene(scene_id: &str, site: &str, tags: &[&str], cast: &[&str], accessible: bool) -> Scene {
    Scene {
        scene_id: scene_id.to_string(),
        title: format!("Title {}", scene_id),
        site: site.to_string(),
        tags: tags.iter().map(|s| s.to_string()).collect(),
        cast: cast.iter().map(|s| s.to_string()).collect(),
        is_accessible: accessible,
        is_available: true,
        files: vec![VideoFile {
            path: "/vr".to_string(),
            filename: format!("{}.mp4", scene_id),
            size: 1024,
            video_width: 3840,
            video_height: 1920,
            video_bitrate: 20_000_000,
            duration: 1800.0,
            file_type: "video".to_string(),
            ..Default::default()
        }],
        ..Default::default()
    }
}

fn bundle() -> LibraryBundle {
    let mut a = scene("site-1", "VRSite", &["lesbian", "pov"], &["Alice", "Bea"], true);
    a.release_date = NaiveDate::from_ymd_opt(2021, 5, 3);
    let mut b = scene("site-2", "VRSite", &["lesbian"], &["Alice"], true);
    b.release_date = NaiveDate::from_ymd_opt(2022, 1, 20);
    let c = scene("other-3", "Other", &["lesbian"], &["Carla"], false);
    let mut d = scene("other-4", "Other", &["outdoor"], &[], true);
    d.is_hidden = true;

    LibraryBundle {
        scenes: vec![a, b, c, d],
        files: vec![VideoFile {
            path: "/vr/unsorted".to_string(),
            filename: "loose.mp4".to_string(),
            size: 42,
            ..Default::default()
        }],
        playlists: vec![
            Playlist {
                name: "Favourites".to_string(),
                ordering: 2,
                is_deo_enabled: true,
                is_smart: true,
                search_params: r#"{"lists":["favourite"]}"#.to_string(),
                ..Default::default()
            },
            Playlist {
                name: "Private".to_string(),
                ordering: 1,
                ..Default::default()
            },
        ],
    }
}

fn open(dir: &TempDir) -> SqliteLibrary {
    SqliteLibrary::open(&dir.path().join("main.db")).unwrap()
}

#[tokio::test]
async fn test_import_and_query() {
    let dir = TempDir::new().unwrap();
    let lib = open(&dir);
    lib.import(&bundle()).unwrap();

    let all = lib.query_scenes(&SceneQuery::accessible()).await.unwrap();
    let ids: Vec<&str> = all.iter().map(|s| s.scene_id.as_str()).collect();
    // release_desc par défaut
    assert_eq!(ids, vec!["site-2", "site-1"]);

    let first = &all[1];
    assert_eq!(first.tags, vec!["lesbian", "pov"]);
    assert_eq!(first.cast, vec!["Alice", "Bea"]);
    assert_eq!(first.files.len(), 1);
    assert_eq!(first.files[0].scene_id, first.id);
    assert_eq!(first.release_date, NaiveDate::from_ymd_opt(2021, 5, 3));
}

#[tokio::test]
async fn test_tag_listing_excludes_inaccessible() {
    let dir = TempDir::new().unwrap();
    let lib = open(&dir);
    lib.import(&bundle()).unwrap();

    let lesbian = lib
        .query_scenes(&SceneQuery::accessible().with_tag("lesbian"))
        .await
        .unwrap();
    assert_eq!(lesbian.len(), 2);
    assert!(lesbian.iter().all(|s| s.is_accessible));
}

#[tokio::test]
async fn test_distinct_lists_match_memory_backend() {
    let dir = TempDir::new().unwrap();
    let sqlite = open(&dir);
    sqlite.import(&bundle()).unwrap();
    let memory = MemoryLibrary::from_bundle(bundle());

    assert_eq!(
        sqlite.distinct_sites().await.unwrap(),
        memory.distinct_sites().await.unwrap()
    );
    assert_eq!(
        sqlite.distinct_tags().await.unwrap(),
        memory.distinct_tags().await.unwrap()
    );
    assert_eq!(
        sqlite.distinct_actors().await.unwrap(),
        memory.distinct_actors().await.unwrap()
    );
    assert_eq!(
        sqlite.release_groups().await.unwrap(),
        memory.release_groups().await.unwrap()
    );

    assert_eq!(sqlite.distinct_sites().await.unwrap(), vec!["VRSite"]);
    assert_eq!(sqlite.distinct_actors().await.unwrap(), vec!["Alice", "Bea"]);
    assert_eq!(
        sqlite.release_groups().await.unwrap(),
        vec!["2021-05", "2022-01"]
    );
}

#[tokio::test]
async fn test_every_grouped_scene_is_in_all() {
    let dir = TempDir::new().unwrap();
    let lib = open(&dir);
    lib.import(&bundle()).unwrap();

    let all: Vec<String> = lib
        .query_scenes(&SceneQuery::accessible())
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.scene_id)
        .collect();

    for tag in lib.distinct_tags().await.unwrap() {
        let scenes = lib
            .query_scenes(&SceneQuery::accessible().with_tag(tag))
            .await
            .unwrap();
        assert!(!scenes.is_empty());
        assert!(scenes.iter().all(|s| all.contains(&s.scene_id)));
    }
}

#[tokio::test]
async fn test_unmatched_files_and_lookup() {
    let dir = TempDir::new().unwrap();
    let lib = open(&dir);
    lib.import(&bundle()).unwrap();

    let unmatched = lib.unmatched_files().await.unwrap();
    assert_eq!(unmatched.len(), 1);
    assert_eq!(unmatched[0].filename, "loose.mp4");

    let found = lib.file_by_id(unmatched[0].id).await.unwrap();
    assert_eq!(found.as_ref().map(|f| f.size), Some(42));
    assert!(lib.file_by_id(9999).await.unwrap().is_none());

    let scene = lib.scene_by_scene_id("site-1").await.unwrap().unwrap();
    assert_eq!(scene.site, "VRSite");
    assert!(lib.scene_by_scene_id("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_playlists() {
    let dir = TempDir::new().unwrap();
    let lib = open(&dir);
    lib.import(&bundle()).unwrap();

    let deo = lib.playlists(true).await.unwrap();
    assert_eq!(deo.len(), 1);
    assert_eq!(deo[0].name, "Favourites");
    assert_eq!(deo[0].query().unwrap().lists, vec!["favourite"]);

    let all = lib.playlists(false).await.unwrap();
    assert_eq!(all[0].name, "Private");

    let by_id = lib.playlist(deo[0].id).await.unwrap();
    assert_eq!(by_id, Some(deo[0].clone()));
}

#[tokio::test]
async fn test_content_version_tracks_writes() {
    let dir = TempDir::new().unwrap();
    let lib = open(&dir);

    let v0 = lib.content_version().await.unwrap();
    assert_eq!(lib.content_version().await.unwrap(), v0);

    lib.save_scene(&scene("x-1", "X", &[], &[], true)).unwrap();
    let v1 = lib.content_version().await.unwrap();
    assert!(v1 > v0);

    // la version survit à la réouverture
    drop(lib);
    let reopened = open(&dir);
    assert_eq!(reopened.content_version().await.unwrap(), v1);
}

#[tokio::test]
async fn test_save_scene_upserts() {
    let lib = SqliteLibrary::open_in_memory().unwrap();
    let id = lib
        .save_scene(&scene("x-1", "X", &["a"], &[], true))
        .unwrap();
    let again = lib
        .save_scene(&scene("x-1", "Y", &["b"], &[], true))
        .unwrap();
    assert_eq!(id, again);

    let scenes = lib.query_scenes(&SceneQuery::accessible()).await.unwrap();
    assert_eq!(scenes.len(), 1);
    assert_eq!(scenes[0].site, "Y");
    assert_eq!(scenes[0].tags, vec!["b"]);
    assert_eq!(scenes[0].files.len(), 1);
}
