//! Arborescence virtuelle du ContentDirectory
//!
//! La bibliothèque est plate ; l'arbre est recalculé à chaque requête à
//! partir des catégories fixes de la racine :
//!
//! | Chemin | Enfants |
//! |---|---|
//! | `/all` | scènes accessibles |
//! | `/saved-searches/{id}` | scènes du filtre enregistré, jouables |
//! | `/sites/{nom}`, `/tags/{nom}`, `/actors/{nom}` | scènes accessibles du groupe |
//! | `/released/{YYYY-MM}` | scènes accessibles sorties ce mois-là |
//! | `/not-matched` | fichiers non rattachés présents sur disque |
//! | `/folders/...` | dossiers locaux, si configurés |

use crate::listing::{is_folders_last_client, read_dir, sort_entries};
use crate::mapper::{EntryFilter, MapContext, file_to_item, filesystem_entry_to_object, scene_to_item};
use crate::object::{is_root, join, path_to_id, physical_path, split_category};
use crate::options::MediaServerOptions;
use std::sync::Arc;
use tracing::{debug, warn};
use xbdidl::{Container, DidlObject};
use xblibrary::{Result, SceneLibrary, SceneQuery};

pub const SAVED_SEARCHES: &str = "saved-searches";
pub const ALL: &str = "all";
pub const ACTORS: &str = "actors";
pub const TAGS: &str = "tags";
pub const RELEASED: &str = "released";
pub const SITES: &str = "sites";
pub const NOT_MATCHED: &str = "not-matched";
pub const FOLDERS: &str = "folders";

/// Catégories de la racine, dans l'ordre d'affichage
pub const ROOT_CATEGORIES: [&str; 7] = [
    SAVED_SEARCHES,
    ALL,
    ACTORS,
    TAGS,
    RELEASED,
    SITES,
    NOT_MATCHED,
];

/// Informations de la requête HTTP utiles à la construction de l'arbre
#[derive(Debug, Clone, Default)]
pub struct RequestInfo {
    pub host: String,
    pub user_agent: String,
}

impl RequestInfo {
    pub fn new(host: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            user_agent: user_agent.into(),
        }
    }
}

/// Constructeur de l'arbre virtuel
#[derive(Clone)]
pub struct ContentTree {
    library: Arc<dyn SceneLibrary>,
    options: Arc<MediaServerOptions>,
}

impl ContentTree {
    pub fn new(library: Arc<dyn SceneLibrary>, options: Arc<MediaServerOptions>) -> Self {
        Self { library, options }
    }

    fn ctx<'a>(&'a self, request: &'a RequestInfo) -> MapContext<'a> {
        MapContext {
            host: &request.host,
            planner: self.options.planner.as_ref(),
        }
    }

    fn root_categories(&self) -> Vec<&'static str> {
        let mut out = ROOT_CATEGORIES.to_vec();
        if self.options.folders_root.is_some() {
            out.push(FOLDERS);
        }
        out
    }

    /// Enfants directs de `path`. Un chemin inconnu n'a pas d'enfant.
    pub async fn children(&self, path: &str, request: &RequestInfo) -> Result<Vec<DidlObject>> {
        if is_root(path) {
            return Ok(self.root_children());
        }
        self.category_children(path, request).await
    }

    /// Nombre d'enfants, en reparcourant la liste
    pub async fn child_count(&self, path: &str, request: &RequestInfo) -> Result<usize> {
        Ok(self.children(path, request).await?.len())
    }

    pub async fn has_children(&self, path: &str, request: &RequestInfo) -> Result<bool> {
        Ok(self.child_count(path, request).await? != 0)
    }

    /// Containers fixes de la racine, sans interroger la bibliothèque
    fn root_children(&self) -> Vec<DidlObject> {
        self.root_categories()
            .into_iter()
            .map(|category| {
                let id = path_to_id(&join("/", category));
                DidlObject::from(Container::storage_folder(id, path_to_id("/"), category))
            })
            .collect()
    }

    async fn category_children(&self, path: &str, request: &RequestInfo) -> Result<Vec<DidlObject>> {
        let (category, value) = split_category(path);
        let value = value.filter(|v| !v.is_empty());

        match (category, value) {
            (ALL, None) => self.scenes(path, &SceneQuery::accessible(), request).await,
            (SAVED_SEARCHES, None) => self.saved_searches().await,
            (SAVED_SEARCHES, Some(id)) => self.saved_search(path, id, request).await,
            (SITES, None) => Ok(self.groups(SITES, self.library.distinct_sites().await?)),
            (SITES, Some(site)) => {
                self.scenes(path, &SceneQuery::accessible().with_site(site), request)
                    .await
            }
            (TAGS, None) => Ok(self.groups(TAGS, self.library.distinct_tags().await?)),
            (TAGS, Some(tag)) => {
                self.scenes(path, &SceneQuery::accessible().with_tag(tag), request)
                    .await
            }
            (ACTORS, None) => Ok(self.groups(ACTORS, self.library.distinct_actors().await?)),
            (ACTORS, Some(actor)) => {
                self.scenes(path, &SceneQuery::accessible().with_cast(actor), request)
                    .await
            }
            (RELEASED, None) => Ok(self.groups(RELEASED, self.library.release_groups().await?)),
            (RELEASED, Some(month)) => {
                let query = SceneQuery::accessible().with_release_month(month);
                self.scenes(path, &query, request).await
            }
            (NOT_MATCHED, None) => self.unmatched(path, request).await,
            (FOLDERS, rel) if self.options.folders_root.is_some() => {
                Ok(self.folder(path, rel.unwrap_or(""), request).await)
            }
            _ => {
                debug!(path = %path, "Unknown browse path");
                Ok(Vec::new())
            }
        }
    }

    /// Un container par valeur
    fn groups(&self, category: &str, values: Vec<String>) -> Vec<DidlObject> {
        let parent = join("/", category);
        let parent_id = path_to_id(&parent);
        values
            .into_iter()
            .map(|value| {
                let id = path_to_id(&join(&parent, &value));
                DidlObject::from(Container::storage_folder(id, parent_id.clone(), value))
            })
            .collect()
    }

    async fn scenes(
        &self,
        parent: &str,
        query: &SceneQuery,
        request: &RequestInfo,
    ) -> Result<Vec<DidlObject>> {
        let scenes = self.library.query_scenes(query).await?;
        let ctx = self.ctx(request);
        Ok(scenes
            .iter()
            .filter_map(|scene| {
                let item = scene_to_item(scene, parent, ctx);
                if item.is_none() {
                    debug!(scene_id = %scene.scene_id, "Scene without video file skipped");
                }
                item
            })
            .map(DidlObject::from)
            .collect())
    }

    async fn saved_searches(&self) -> Result<Vec<DidlObject>> {
        let parent = join("/", SAVED_SEARCHES);
        let parent_id = path_to_id(&parent);
        Ok(self
            .library
            .playlists(true)
            .await?
            .into_iter()
            .map(|p| {
                let id = path_to_id(&join(&parent, &p.id.to_string()));
                DidlObject::from(Container::storage_folder(id, parent_id.clone(), p.name))
            })
            .collect())
    }

    async fn saved_search(
        &self,
        path: &str,
        raw_id: &str,
        request: &RequestInfo,
    ) -> Result<Vec<DidlObject>> {
        let Ok(id) = raw_id.parse::<u64>() else {
            return Ok(Vec::new());
        };
        let Some(playlist) = self.library.playlist(id).await? else {
            return Ok(Vec::new());
        };
        let query = match playlist.query() {
            Ok(q) => q.force_playable(),
            Err(e) => {
                warn!(playlist = id, error = %e, "Saved search has an unreadable filter");
                return Ok(Vec::new());
            }
        };
        self.scenes(path, &query, request).await
    }

    async fn unmatched(&self, path: &str, request: &RequestInfo) -> Result<Vec<DidlObject>> {
        let files = self.library.unmatched_files().await?;
        let ctx = self.ctx(request);
        let mut out = Vec::with_capacity(files.len());
        for file in &files {
            if tokio::fs::metadata(file.full_path()).await.is_err() {
                debug!(path = %file.full_path().display(), "Unmatched file missing on disk");
                continue;
            }
            out.push(DidlObject::from(file_to_item(file, path, ctx)));
        }
        Ok(out)
    }

    /// Contenu d'un dossier local ; un dossier illisible est vide
    async fn folder(&self, path: &str, rel: &str, request: &RequestInfo) -> Vec<DidlObject> {
        let Some(root) = self.options.folders_root.as_deref() else {
            return Vec::new();
        };
        let Some(dir) = physical_path(root, rel) else {
            return Vec::new();
        };

        let mut entries = match read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) => {
                debug!(dir = %dir.display(), error = %e, "Cannot list folder");
                return Vec::new();
            }
        };
        let folders_last =
            is_folders_last_client(&request.user_agent, &self.options.folders_last_user_agents);
        sort_entries(&mut entries, folders_last);

        let filter = EntryFilter {
            show_images: self.options.show_images,
            ignore_hidden: self.options.ignore_hidden,
            ignore_unreadable: self.options.ignore_unreadable,
        };
        let rel_base = format!("/{}", rel.trim_matches('/'));
        let ctx = self.ctx(request);

        let mut out = Vec::with_capacity(entries.len());
        for entry in &entries {
            let child_path = join(path, &entry.name);
            let child_rel = join(&rel_base, &entry.name);
            match filesystem_entry_to_object(entry, &child_path, &child_rel, filter, ctx).await {
                Ok(Some(obj)) => out.push(obj),
                Ok(None) => {}
                Err(e) => warn!(path = %entry.fs_path.display(), error = %e, "Skipping entry"),
            }
        }
        out
    }
}
