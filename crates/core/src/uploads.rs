//! Upload naming and content-type rules for object storage.

use crate::error::CoreError;

/// Image extensions accepted for carousel, course and post images.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif"];

/// Key prefixes under which uploads are stored.
pub mod prefixes {
    pub const IMAGES: &str = "images";
    pub const CAROUSEL: &str = "carousel";
    pub const FILES: &str = "files";
}

/// Lowercased extension of `file_name`, if any.
pub fn extension(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Reject file names whose extension is not an accepted image type.
pub fn validate_image_name(file_name: &str) -> Result<(), CoreError> {
    match extension(file_name) {
        Some(ext) if IMAGE_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(CoreError::Validation(format!(
            "Unsupported image '{file_name}'. Supported: {}",
            IMAGE_EXTENSIONS.join(", ")
        ))),
    }
}

/// Best-effort content type derived from the extension.
pub fn content_type_for(file_name: &str) -> &'static str {
    match extension(file_name).as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("pdf") => "application/pdf",
        Some("zip") => "application/zip",
        Some("txt") => "text/plain",
        Some("csv") => "text/csv",
        Some("doc") => "application/msword",
        Some("docx") => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        _ => "application/octet-stream",
    }
}

/// Strip path components and anything outside `[A-Za-z0-9._-]`.
pub fn sanitize_file_name(file_name: &str) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Storage key for a new upload: `{prefix}/{uuid}-{sanitized_name}`.
pub fn object_key(prefix: &str, file_name: &str) -> String {
    format!(
        "{prefix}/{}-{}",
        uuid::Uuid::new_v4().simple(),
        sanitize_file_name(file_name)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_parsing() {
        assert_eq!(extension("photo.PNG").as_deref(), Some("png"));
        assert_eq!(extension("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(extension("README"), None);
        assert_eq!(extension(".env"), None);
    }

    #[test]
    fn image_names() {
        assert!(validate_image_name("banner.webp").is_ok());
        assert!(validate_image_name("banner.JPG").is_ok());
        assert!(validate_image_name("script.svg").is_err());
        assert!(validate_image_name("noext").is_err());
    }

    #[test]
    fn content_types() {
        assert_eq!(content_type_for("a.jpeg"), "image/jpeg");
        assert_eq!(content_type_for("notes.pdf"), "application/pdf");
        assert_eq!(content_type_for("blob"), "application/octet-stream");
    }

    #[test]
    fn sanitizing() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\docs\\My CV (final).pdf"), "My_CV__final_.pdf");
        assert_eq!(sanitize_file_name(".hidden"), "hidden");
        assert_eq!(sanitize_file_name("///"), "upload");
    }

    #[test]
    fn keys_are_prefixed_and_unique() {
        let a = object_key(prefixes::FILES, "guide.pdf");
        let b = object_key(prefixes::FILES, "guide.pdf");
        assert!(a.starts_with("files/"));
        assert!(a.ends_with("-guide.pdf"));
        assert_ne!(a, b);
    }
}
