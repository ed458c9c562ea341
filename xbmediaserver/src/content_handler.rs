//! # ContentDirectory Handler
//!
//! Répartit les actions du service ContentDirectory :
//!
//! - **Browse** : enfants directs d'un objet (`BrowseDirectChildren` uniquement)
//! - **GetSystemUpdateID** : version du contenu de la bibliothèque
//! - **GetSortCapabilities** / **GetSearchCapabilities** : capacités fixes
//!
//! Les arguments de sortie sont renvoyés dans l'ordre déclaré par le SCPD.

use crate::object::id_to_path;
use crate::options::MediaServerOptions;
use crate::tree::{ContentTree, RequestInfo};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error};
use xbdidl::to_didl_lite;
use xblibrary::{LibraryError, SceneLibrary};
use xbupnp::ActionError;

pub const CONTENT_DIRECTORY_URN: &str = "urn:schemas-upnp-org:service:ContentDirectory:1";

/// Arguments de sortie d'une action, dans l'ordre du SCPD
pub type ActionOutput = Vec<(String, String)>;

fn out(pairs: &[(&str, String)]) -> ActionOutput {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn library_failure(e: LibraryError) -> ActionError {
    error!(error = %e, "Library access failed");
    ActionError::ActionFailed(e.to_string())
}

/// Argument numérique ; absent ou vide vaut 0
fn parse_u32(args: &HashMap<String, String>, name: &str) -> Result<u32, ActionError> {
    let raw = args.get(name).map(|s| s.trim()).unwrap_or("");
    if raw.is_empty() {
        return Ok(0);
    }
    raw.parse::<u32>()
        .map_err(|_| ActionError::InvalidArgs(format!("{} must be an unsigned integer", name)))
}

/// Requête Browse décodée
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowseRequest {
    pub object_id: String,
    pub browse_flag: String,
    pub filter: String,
    pub starting_index: u32,
    pub requested_count: u32,
    pub sort_criteria: String,
}

impl BrowseRequest {
    pub fn from_args(args: &HashMap<String, String>) -> Result<Self, ActionError> {
        let text = |name: &str| args.get(name).cloned().unwrap_or_default();
        Ok(Self {
            object_id: text("ObjectID"),
            browse_flag: text("BrowseFlag"),
            filter: text("Filter"),
            starting_index: parse_u32(args, "StartingIndex")?,
            requested_count: parse_u32(args, "RequestedCount")?,
            sort_criteria: text("SortCriteria"),
        })
    }
}

/// Résultat d'un Browse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowseResult {
    pub result: String,
    pub number_returned: u32,
    pub total_matches: u32,
    pub update_id: u64,
}

/// Service ContentDirectory
#[derive(Clone)]
pub struct ContentDirectory {
    tree: ContentTree,
    library: Arc<dyn SceneLibrary>,
    options: Arc<MediaServerOptions>,
}

impl ContentDirectory {
    pub fn new(library: Arc<dyn SceneLibrary>, options: Arc<MediaServerOptions>) -> Self {
        Self {
            tree: ContentTree::new(library.clone(), options.clone()),
            library,
            options,
        }
    }

    pub fn tree(&self) -> &ContentTree {
        &self.tree
    }

    /// Point d'entrée SOAP
    pub async fn handle(
        &self,
        action: &str,
        args: &HashMap<String, String>,
        request: &RequestInfo,
    ) -> Result<ActionOutput, ActionError> {
        debug!(action = %action, host = %request.host, "ContentDirectory action");

        match action {
            "GetSystemUpdateID" => {
                let id = self.system_update_id().await?;
                Ok(out(&[("Id", id.to_string())]))
            }
            "GetSortCapabilities" => Ok(out(&[("SortCaps", "dc:title".to_string())])),
            "GetSearchCapabilities" => Ok(out(&[("SearchCaps", String::new())])),
            "Browse" => {
                let browse = BrowseRequest::from_args(args)?;
                let result = self.browse(&browse, request).await?;
                Ok(out(&[
                    ("Result", result.result),
                    ("NumberReturned", result.number_returned.to_string()),
                    ("TotalMatches", result.total_matches.to_string()),
                    ("UpdateID", result.update_id.to_string()),
                ]))
            }
            _ => Err(ActionError::InvalidAction),
        }
    }

    pub async fn system_update_id(&self) -> Result<u64, ActionError> {
        self.library.content_version().await.map_err(library_failure)
    }

    pub async fn browse(
        &self,
        browse: &BrowseRequest,
        request: &RequestInfo,
    ) -> Result<BrowseResult, ActionError> {
        let path = id_to_path(&browse.object_id)
            .map_err(|e| ActionError::NoSuchObject(e.to_string()))?;

        debug!(
            object_id = %browse.object_id,
            path = %path,
            browse_flag = %browse.browse_flag,
            starting_index = browse.starting_index,
            requested_count = browse.requested_count,
            "ContentDirectory::Browse"
        );

        if browse.browse_flag != "BrowseDirectChildren" {
            return Err(ActionError::ArgumentValueInvalid(format!(
                "unhandled browse flag: {}",
                browse.browse_flag
            )));
        }

        let children = self
            .tree
            .children(&path, request)
            .await
            .map_err(library_failure)?;
        let total = children.len();

        let page = if self.options.paginate {
            let start = (browse.starting_index as usize).min(total);
            let count = match browse.requested_count as usize {
                0 => total - start,
                n => n.min(total - start),
            };
            &children[start..start + count]
        } else {
            &children[..]
        };

        let result = to_didl_lite(page).map_err(|e| {
            error!(error = %e, "DIDL-Lite serialization failed");
            ActionError::ActionFailed(e.to_string())
        })?;
        let update_id = self.system_update_id().await?;

        Ok(BrowseResult {
            result,
            number_returned: page.len() as u32,
            total_matches: total as u32,
            update_id,
        })
    }
}
