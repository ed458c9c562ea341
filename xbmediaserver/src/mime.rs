//! Classification MIME des fichiers locaux

use mime_guess::{Mime, MimeGuess, mime};
use std::path::Path;

/// Type MIME deviné d'après l'extension
pub fn mime_type_by_path(path: &Path) -> Option<Mime> {
    MimeGuess::from_path(path).first()
}

pub fn is_video(m: &Mime) -> bool {
    m.type_() == mime::VIDEO
}

pub fn is_image(m: &Mime) -> bool {
    m.type_() == mime::IMAGE
}

/// Classe UPnP `object.item.{type}Item`
pub fn item_class(m: &Mime) -> String {
    format!("object.item.{}Item", m.type_().as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let mp4 = mime_type_by_path(Path::new("/a/b.mp4")).unwrap();
        assert!(is_video(&mp4));
        assert_eq!(mp4.essence_str(), "video/mp4");
        assert_eq!(item_class(&mp4), "object.item.videoItem");

        let jpg = mime_type_by_path(Path::new("c.JPG")).unwrap();
        assert!(is_image(&jpg) && !is_video(&jpg));

        assert!(mime_type_by_path(Path::new("noext")).is_none());
    }
}
