//! Normalization for stored file references (profile images, sample work).
//! Uploads are handled outside this service; what reaches the API is a path
//! string which must be stored in a platform-independent form.

/// Normalize a file path for consistent storage: backslashes become forward
/// slashes and duplicate slashes collapse.
pub fn normalize_file_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut prev_slash = false;
    for c in path.chars() {
        let c = if c == '\\' { '/' } else { c };
        if c == '/' {
            if prev_slash {
                continue;
            }
            prev_slash = true;
        } else {
            prev_slash = false;
        }
        out.push(c);
    }
    out.trim().to_string()
}

/// Extract the filename component from a stored path.
pub fn filename_from_path(path: &str) -> String {
    let normalized = normalize_file_path(path);
    normalized
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_converts_backslashes() {
        assert_eq!(
            normalize_file_path("uploads\\avatars\\photo.png"),
            "uploads/avatars/photo.png"
        );
    }

    #[test]
    fn test_normalize_collapses_duplicate_slashes() {
        assert_eq!(
            normalize_file_path("uploads//providers///pic.jpg"),
            "uploads/providers/pic.jpg"
        );
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize_file_path(""), "");
    }

    #[test]
    fn test_filename_from_path() {
        assert_eq!(
            filename_from_path("uploads\\avatars\\photo.png"),
            "photo.png"
        );
        assert_eq!(filename_from_path("photo.png"), "photo.png");
        assert_eq!(filename_from_path(""), "");
    }
}
