//! Content-addressed image assets
//!
//! Asset file names are derived from the source URL alone, so the same image
//! always lands at the same path. Writes go through a temporary file in the
//! destination directory and are renamed into place; a reader never sees a
//! partially written asset.

use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Extension for a content type with no specific mapping
pub const FALLBACK_EXTENSION: &str = "img";

/// Maps an image content type to a file extension
///
/// Parameters such as `; charset=...` are ignored.
pub fn extension_for_content_type(content_type: &str) -> &'static str {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match mime.as_str() {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        "image/avif" => "avif",
        _ => FALLBACK_EXTENSION,
    }
}

/// Derives the asset file name for an image
///
/// # Returns
///
/// The lowercase hex SHA-256 of `url` followed by the extension for
/// `content_type`, e.g. `3a7bd3...e9.jpg`
pub fn asset_file_name(url: &str, content_type: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    format!(
        "{}.{}",
        hex::encode(digest),
        extension_for_content_type(content_type)
    )
}

/// Writes an asset atomically into `dest_dir`
///
/// An existing file with the same name is replaced. When a concurrent writer
/// wins the rename race on a platform that refuses to overwrite, the file it
/// placed is kept.
pub fn store_asset(dest_dir: &Path, file_name: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
    let final_path = dest_dir.join(file_name);

    let mut temp = tempfile::Builder::new()
        .prefix(".partial-")
        .tempfile_in(dest_dir)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;

    match temp.persist(&final_path) {
        Ok(_) => Ok(final_path),
        Err(e) if final_path.exists() => {
            tracing::debug!(
                "Asset {} already placed by another writer: {}",
                final_path.display(),
                e.error
            );
            Ok(final_path)
        }
        Err(e) => Err(e.error),
    }
}
