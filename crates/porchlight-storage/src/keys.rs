//! Shared key derivation for storage backends.
//!
//! Key format: `{category}/{entity_id}/{filename}`. All backends must use
//! this format for consistency.

/// Build a storage key for the given category, entity and filename.
pub fn storage_key(category: &str, entity_id: &str, filename: &str) -> String {
    format!("{}/{}/{}", category, entity_id, filename)
}

/// Derive the thumbnail variant key by inserting a `thumbs` segment before
/// the filename: `avatars/42/foo.jpg` becomes `avatars/42/thumbs/foo.jpg`.
///
/// Keys with fewer than three segments have no thumbnail location and yield
/// `None`; the caller decides whether that is an error or a skip.
///
/// Not idempotent: deriving from an already-derived key inserts `thumbs`
/// again. Callers must only derive from original keys.
pub fn thumbnail_key(key: &str) -> Option<String> {
    let mut segments: Vec<&str> = key.split('/').collect();
    if segments.len() < 3 {
        return None;
    }
    let filename = segments.pop()?;
    segments.push("thumbs");
    segments.push(filename);
    Some(segments.join("/"))
}
