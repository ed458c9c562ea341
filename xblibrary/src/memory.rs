use crate::{
    LibraryBundle, Playlist, Result, Scene, SceneLibrary, SceneQuery, VideoFile, async_trait,
    distinct,
};
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
struct Inner {
    scenes: Vec<Scene>,
    files: Vec<VideoFile>,
    playlists: Vec<Playlist>,
}

/// Bibliothèque en mémoire
#[derive(Debug, Default)]
pub struct MemoryLibrary {
    inner: RwLock<Inner>,
    version: AtomicU64,
}

impl MemoryLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bundle(bundle: LibraryBundle) -> Self {
        let library = Self::new();
        library.import(bundle);
        library
    }

    fn bump(&self) {
        self.version.fetch_add(1, Ordering::SeqCst);
    }

    /// Ajoute ou remplace une scène (clé `scene_id`), renvoie sa clé primaire
    pub fn save_scene(&self, mut scene: Scene) -> u64 {
        let mut inner = self.inner.write().unwrap();
        let next_id = inner.scenes.iter().map(|s| s.id).max().unwrap_or(0) + 1;
        let id = match inner.scenes.iter().position(|s| s.scene_id == scene.scene_id) {
            Some(pos) => {
                scene.id = inner.scenes[pos].id;
                let id = scene.id;
                inner.scenes[pos] = scene;
                id
            }
            None => {
                if scene.id == 0 {
                    scene.id = next_id;
                }
                let id = scene.id;
                inner.scenes.push(scene);
                id
            }
        };
        // les fichiers embarqués pointent sur leur scène
        if let Some(s) = inner.scenes.iter_mut().find(|s| s.id == id) {
            for f in &mut s.files {
                f.scene_id = id;
            }
        }
        drop(inner);
        self.bump();
        id
    }

    /// Ajoute un fichier isolé (non rattaché)
    pub fn save_file(&self, mut file: VideoFile) -> u64 {
        let mut inner = self.inner.write().unwrap();
        if file.id == 0 {
            file.id = inner.files.iter().map(|f| f.id).max().unwrap_or(0) + 1;
        }
        let id = file.id;
        inner.files.retain(|f| f.id != id);
        inner.files.push(file);
        drop(inner);
        self.bump();
        id
    }

    pub fn save_playlist(&self, mut playlist: Playlist) -> u64 {
        let mut inner = self.inner.write().unwrap();
        if playlist.id == 0 {
            playlist.id = inner.playlists.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        }
        let id = playlist.id;
        inner.playlists.retain(|p| p.id != id);
        inner.playlists.push(playlist);
        drop(inner);
        self.bump();
        id
    }

    pub fn import(&self, bundle: LibraryBundle) {
        for scene in bundle.scenes {
            self.save_scene(scene);
        }
        for file in bundle.files {
            self.save_file(file);
        }
        for playlist in bundle.playlists {
            self.save_playlist(playlist);
        }
    }

    fn visible_scenes(&self) -> Vec<Scene> {
        let inner = self.inner.read().unwrap();
        SceneQuery::accessible().apply(inner.scenes.iter())
    }
}

#[async_trait]
impl SceneLibrary for MemoryLibrary {
    async fn query_scenes(&self, query: &SceneQuery) -> Result<Vec<Scene>> {
        let inner = self.inner.read().unwrap();
        Ok(query.apply(inner.scenes.iter()))
    }

    async fn distinct_sites(&self) -> Result<Vec<String>> {
        let scenes = self.visible_scenes();
        Ok(distinct(scenes.iter().map(|s| s.site.as_str())))
    }

    async fn distinct_tags(&self) -> Result<Vec<String>> {
        let scenes = self.visible_scenes();
        Ok(distinct(
            scenes.iter().flat_map(|s| s.tags.iter().map(String::as_str)),
        ))
    }

    async fn distinct_actors(&self) -> Result<Vec<String>> {
        let scenes = self.visible_scenes();
        Ok(distinct(
            scenes.iter().flat_map(|s| s.cast.iter().map(String::as_str)),
        ))
    }

    async fn release_groups(&self) -> Result<Vec<String>> {
        let months: Vec<String> = self
            .visible_scenes()
            .iter()
            .filter_map(Scene::release_month)
            .collect();
        Ok(distinct(months.iter().map(String::as_str)))
    }

    async fn playlists(&self, deo_only: bool) -> Result<Vec<Playlist>> {
        let inner = self.inner.read().unwrap();
        let mut out: Vec<Playlist> = inner
            .playlists
            .iter()
            .filter(|p| !deo_only || p.is_deo_enabled)
            .cloned()
            .collect();
        out.sort_by_key(|p| (p.ordering, p.id));
        Ok(out)
    }

    async fn playlist(&self, id: u64) -> Result<Option<Playlist>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.playlists.iter().find(|p| p.id == id).cloned())
    }

    async fn unmatched_files(&self) -> Result<Vec<VideoFile>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .files
            .iter()
            .filter(|f| f.scene_id == 0)
            .cloned()
            .collect())
    }

    async fn scene_by_scene_id(&self, scene_id: &str) -> Result<Option<Scene>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.scenes.iter().find(|s| s.scene_id == scene_id).cloned())
    }

    async fn file_by_id(&self, id: u64) -> Result<Option<VideoFile>> {
        let inner = self.inner.read().unwrap();
        let loose = inner.files.iter().find(|f| f.id == id);
        let attached = || {
            inner
                .scenes
                .iter()
                .flat_map(|s| s.files.iter())
                .find(|f| f.id == id)
        };
        Ok(loose.or_else(attached).cloned())
    }

    async fn content_version(&self) -> Result<u64> {
        Ok(self.version.load(Ordering::SeqCst))
    }
}
