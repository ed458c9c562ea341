//! Adressage des objets du ContentDirectory
//!
//! Un objet est désigné par un chemin virtuel absolu (`/`, `/tags`,
//! `/tags/lesbian`, ...). Son ObjectID est ce chemin échappé comme une valeur
//! de requête HTTP, sauf la racine qui vaut `"0"`.

use std::path::{Path, PathBuf};
use url::form_urlencoded;

/// ObjectID de la racine
pub const ROOT_ID: &str = "0";

/// ParentID de la racine
pub const ROOT_PARENT_ID: &str = "-1";

/// Échec du décodage d'un ObjectID
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObjectIdError {
    #[error("empty object id")]
    Empty,

    #[error("invalid escape sequence in object id {0:?}")]
    InvalidEscape(String),

    #[error("object id {0:?} is not valid UTF-8 once decoded")]
    InvalidUtf8(String),
}

/// Chemin virtuel -> ObjectID
///
/// # Panics
///
/// Si le chemin n'est pas absolu.
pub fn path_to_id(path: &str) -> String {
    assert!(path.starts_with('/'), "relative object path: {}", path);
    if is_root(path) {
        return ROOT_ID.to_string();
    }
    form_urlencoded::byte_serialize(path.as_bytes()).collect()
}

/// ObjectID -> chemin virtuel
///
/// Le décodage est strict : une séquence `%` incomplète ou non hexadécimale
/// est refusée. Les identifiants relatifs (`all`, `tags/x`) sont rattachés à
/// la racine. Un identifiant vide ne désigne aucun objet.
pub fn id_to_path(id: &str) -> Result<String, ObjectIdError> {
    if id.is_empty() {
        return Err(ObjectIdError::Empty);
    }
    let path = query_unescape(id)?;
    if path == ROOT_ID {
        return Ok("/".to_string());
    }
    if path.starts_with('/') {
        Ok(path)
    } else {
        Ok(format!("/{}", path))
    }
}

/// ObjectID du parent ; `"-1"` pour la racine
pub fn parent_id(path: &str) -> String {
    if is_root(path) {
        return ROOT_PARENT_ID.to_string();
    }
    path_to_id(&dirname(path))
}

pub fn is_root(path: &str) -> bool {
    path == "/"
}

/// Répertoire parent d'un chemin virtuel absolu
pub fn dirname(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => trimmed[..idx].to_string(),
    }
}

/// Joint un nom à un chemin virtuel
pub fn join(parent: &str, name: &str) -> String {
    if is_root(parent) {
        format!("/{}", name)
    } else {
        format!("{}/{}", parent.trim_end_matches('/'), name)
    }
}

/// Découpe `/categorie/valeur` ; la valeur peut elle-même contenir des `/`
pub fn split_category(path: &str) -> (&str, Option<&str>) {
    let rel = path.trim_start_matches('/');
    match rel.split_once('/') {
        Some((category, value)) => (category, Some(value)),
        None => (rel, None),
    }
}

/// Chemin physique correspondant à un chemin virtuel sous `root`
///
/// Renvoie `None` si le chemin tente de sortir de la racine (`..`).
pub fn physical_path(root: &Path, path: &str) -> Option<PathBuf> {
    let mut out = root.to_path_buf();
    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return None,
            s => out.push(s),
        }
    }
    Some(out)
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

fn query_unescape(s: &str) -> Result<String, ObjectIdError> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' => {
                let hi = bytes.get(i + 1).copied().and_then(hex_value);
                let lo = bytes.get(i + 2).copied().and_then(hex_value);
                match (hi, lo) {
                    (Some(hi), Some(lo)) => out.push(hi << 4 | lo),
                    _ => return Err(ObjectIdError::InvalidEscape(s.to_string())),
                }
                i += 3;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8(out).map_err(|_| ObjectIdError::InvalidUtf8(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_mapping() {
        assert_eq!(path_to_id("/"), "0");
        assert_eq!(id_to_path("0").unwrap(), "/");
        assert_eq!(parent_id("/"), "-1");
    }

    #[test]
    fn test_round_trip() {
        for path in [
            "/all",
            "/tags/lesbian",
            "/actors/Jane Doe",
            "/sites/A&B+C",
            "/released/2021-05",
            "/folders/sub dir/é.mp4",
            "/tags/50%",
        ] {
            let id = path_to_id(path);
            assert_eq!(id_to_path(&id).unwrap(), path, "id {}", id);
        }
    }

    #[test]
    fn test_escaped_form() {
        assert_eq!(path_to_id("/tags/lesbian"), "%2Ftags%2Flesbian");
        assert_eq!(path_to_id("/actors/Jane Doe"), "%2Factors%2FJane+Doe");
    }

    #[test]
    fn test_parent_consistency() {
        assert_eq!(parent_id("/all"), "0");
        assert_eq!(parent_id("/tags/lesbian"), path_to_id("/tags"));
        assert_eq!(parent_id("/folders/a/b"), path_to_id("/folders/a"));
    }

    #[test]
    fn test_relative_ids_are_rooted() {
        assert_eq!(id_to_path("all").unwrap(), "/all");
        assert_eq!(id_to_path("tags%2Fpov").unwrap(), "/tags/pov");
    }

    #[test]
    fn test_invalid_escapes() {
        assert!(matches!(
            id_to_path("%zz"),
            Err(ObjectIdError::InvalidEscape(_))
        ));
        assert!(id_to_path("%2").is_err());
        assert_eq!(id_to_path(""), Err(ObjectIdError::Empty));
        assert!(matches!(
            id_to_path("%ff%fe"),
            Err(ObjectIdError::InvalidUtf8(_))
        ));
    }

    #[test]
    #[should_panic(expected = "relative object path")]
    fn test_relative_path_panics() {
        path_to_id("all");
    }

    #[test]
    fn test_split_category() {
        assert_eq!(split_category("/"), ("", None));
        assert_eq!(split_category("/tags"), ("tags", None));
        assert_eq!(split_category("/tags/a/b"), ("tags", Some("a/b")));
    }

    #[test]
    fn test_physical_path() {
        let root = Path::new("/srv/vr");
        assert_eq!(
            physical_path(root, "/a/b.mp4"),
            Some(PathBuf::from("/srv/vr/a/b.mp4"))
        );
        assert_eq!(physical_path(root, "/"), Some(PathBuf::from("/srv/vr")));
        assert_eq!(physical_path(root, "/a/../../etc"), None);
    }

    #[test]
    fn test_dirname_and_join() {
        assert_eq!(dirname("/a"), "/");
        assert_eq!(dirname("/a/b/"), "/a");
        assert_eq!(join("/", "all"), "/all");
        assert_eq!(join("/tags", "pov"), "/tags/pov");
    }
}
