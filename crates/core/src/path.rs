//! Repository-relative path helpers
//!
//! Paths are always forward-slash separated and relative to the repository
//! root, regardless of the host platform.

use crate::error::PatchError;

/// Directory holding a component inside the shared repository:
/// `release/<first letter>/<name>`
pub fn component_path(name: &str) -> Result<String, PatchError> {
    let first = name
        .chars()
        .next()
        .ok_or_else(|| PatchError::Validation("component name is empty".to_string()))?;
    if name.contains('/') {
        return Err(PatchError::Validation(format!(
            "component name '{}' must not contain '/'",
            name
        )));
    }
    Ok(format!("release/{}/{}", first, name))
}

/// Reject empty, absolute, `.` and `..` segments
pub fn validate(path: &str) -> Result<(), PatchError> {
    if path.is_empty() {
        return Err(PatchError::Validation("empty path in change list".to_string()));
    }
    for segment in path.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(PatchError::Validation(format!(
                "path '{}' is not a normalized repository-relative path",
                path
            )));
        }
    }
    Ok(())
}

/// Strip a trailing slash so `release/s/shan/` and `release/s/shan` agree
pub fn normalize_scope(scope: &str) -> &str {
    scope.trim_end_matches('/')
}

/// Whether `path` lies under `scope`.
///
/// `scope` must be a literal prefix of `path` ending at a segment boundary,
/// so `release/s/shannon/x` is not under `release/s/shan`. An empty scope
/// covers the whole repository.
pub fn is_within(path: &str, scope: &str) -> bool {
    let scope = normalize_scope(scope);
    if scope.is_empty() {
        return true;
    }
    match path.strip_prefix(scope) {
        Some(rest) => rest.starts_with('/'),
        None => false,
    }
}

/// Split off the first segment: `a/b/c` -> (`a`, `b/c`), `a` -> (`a`, ``)
pub fn split_first(path: &str) -> (&str, &str) {
    match path.split_once('/') {
        Some((head, rest)) => (head, rest),
        None => (path, ""),
    }
}

/// Join two repository paths, either of which may be empty
pub fn join(base: &str, segment: &str) -> String {
    if base.is_empty() {
        segment.to_string()
    } else {
        format!("{}/{}", base, segment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_path() {
        assert_eq!(component_path("shan").unwrap(), "release/s/shan");
        assert_eq!(component_path("khmer_angkor").unwrap(), "release/k/khmer_angkor");
        assert!(component_path("").is_err());
        assert!(component_path("a/b").is_err());
    }

    #[test]
    fn test_validate() {
        assert!(validate("release/s/shan/README.md").is_ok());
        assert!(validate("").is_err());
        assert!(validate("/etc/passwd").is_err());
        assert!(validate("release//shan").is_err());
        assert!(validate("release/../secret").is_err());
        assert!(validate("./README.md").is_err());
    }

    #[test]
    fn test_is_within() {
        assert!(is_within("release/s/shan/README.md", "release/s/shan"));
        assert!(is_within("release/s/shan/README.md", "release/s/shan/"));
        assert!(is_within("README.md", ""));
        assert!(!is_within("README.md", "release/s/shan"));
        assert!(!is_within("release/s/shannon/README.md", "release/s/shan"));
        assert!(!is_within("release/s/shan", "release/s/shan"));
    }

    #[test]
    fn test_split_first() {
        assert_eq!(split_first("release/s/shan"), ("release", "s/shan"));
        assert_eq!(split_first("shan"), ("shan", ""));
        assert_eq!(split_first(""), ("", ""));
    }
}
