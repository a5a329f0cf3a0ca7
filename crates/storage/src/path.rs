//! Destination path validation.
//!
//! Generated subfolders and names come from user preferences and camera
//! metadata, so they are checked before anything touches the file system.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Validates a generated subfolder, relative to a download folder.
/// Ensures that it never escapes the download folder (no `..` traversal) and
/// is not absolute.
///
/// > **Note:** This does **not** normalize backslashes, non-UTF8 bytes, or
/// >           platform-specific weirdness. Null bytes are explicitly rejected.
///
/// # Returns
/// Returns the normalized path if valid, or [`InvalidPath`](crate::error::ErrorKind::InvalidPath)
/// if invalid.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use ferry_storage::validate_path;
/// // Valid paths
/// assert!(validate_path("2024/20240309").is_ok());
/// assert!(validate_path("2024/../20240309").is_ok()); // (never leaves the download folder)
/// // Invalid paths
/// assert!(validate_path("../Pictures").is_err());
/// assert!(validate_path("/etc").is_err());
/// assert!(validate_path("a\0b").is_err());
/// // Paths get resolved
/// assert_eq!(validate_path("2024/./03//09/").unwrap(), Path::new("2024/03/09"));
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let invalid = || ErrorKind::InvalidPath(path.as_ref().to_path_buf());
    let mut components = Vec::new();
    for component in path.as_ref().components() {
        match component {
            Component::Normal(s) => {
                // Null bytes pass through Path::components() on Unix but cause
                // truncation in C-based syscalls.
                if s.as_encoded_bytes().contains(&0) {
                    exn::bail!(invalid());
                }
                components.push(s)
            },
            Component::CurDir => {},
            Component::RootDir | Component::Prefix(_) => exn::bail!(invalid()),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(invalid());
                }
            },
        }
    }
    match components.is_empty() {
        true => exn::bail!(invalid()),
        false => Ok(components.into_iter().collect()),
    }
}

/// Validates a generated file name: exactly one normal path component.
pub fn validate_file_name(name: &str) -> Result<&str> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(s)), None) if s == name && !name.contains('\0') => Ok(name),
        _ => exn::bail!(ErrorKind::InvalidPath(PathBuf::from(name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("2024", "2024")]
    #[case("2024/20240309", "2024/20240309")]
    #[case("a//b//c", "a/b/c")]
    #[case("a/./b/./c", "a/b/c")]
    #[case("a/b/..", "a")]
    #[case("2024/", "2024")]
    #[case("./jpg", "jpg")]
    fn test_valid_paths(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(validate(Path::new(path)).unwrap(), Path::new(expected));
    }

    #[rstest]
    #[case("../Pictures")]
    #[case("a/../../b")]
    #[case("..")]
    #[case("/etc/passwd")]
    #[case("a\0b")]
    #[case("")]
    #[case(".")]
    #[case("./.")]
    fn test_invalid_paths(#[case] path: &str) {
        let err = validate(Path::new(path)).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }

    #[cfg(windows)]
    #[test]
    fn test_backslash_normalization() {
        assert_eq!(validate(Path::new("a\\b\\c")).unwrap(), Path::new("a/b/c"));
    }

    #[rstest]
    #[case("IMG_0001.JPG", true)]
    #[case(".hidden", true)]
    #[case("", false)]
    #[case(".", false)]
    #[case("..", false)]
    #[case("a/b.jpg", false)]
    #[case("b.jpg/", false)]
    #[case("/b.jpg", false)]
    #[case("a\0b", false)]
    fn test_validate_file_name(#[case] name: &str, #[case] valid: bool) {
        assert_eq!(validate_file_name(name).is_ok(), valid);
    }
}
