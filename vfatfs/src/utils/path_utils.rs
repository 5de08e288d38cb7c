// SPDX-License-Identifier: MIT

//! Path splitting for resolution from the root directory.
//!
//! Paths are `/`-separated; empty components (leading, trailing or doubled
//! slashes) are ignored.

/// One step of a path walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathComponent<'a> {
    /// `.`
    Current,
    /// `..`
    Parent,
    Name(&'a str),
}

/// Splits and classifies the components of `path`.
pub fn components(path: &str) -> impl Iterator<Item = PathComponent<'_>> {
    path.split('/')
        .filter(|part| !part.is_empty())
        .map(|part| match part {
            "." => PathComponent::Current,
            ".." => PathComponent::Parent,
            name => PathComponent::Name(name),
        })
}

/// True for "" and any run of slashes.
pub fn is_root(path: &str) -> bool {
    path.bytes().all(|b| b == b'/')
}

/// Last component of the path (file or directory name).
///
/// Example: `path/to/file.txt` → `file.txt`.
pub fn extract_name_from_path(path: &str) -> &str {
    path.rsplit('/').find(|part| !part.is_empty()).unwrap_or("")
}

/// Join two path components with `/`, ensuring no duplicate slash.
#[cfg(feature = "std")]
pub fn join_paths(base: &str, part: &str) -> String {
    let mut out = String::with_capacity(base.len() + part.len() + 1);
    out.push_str(base.trim_end_matches('/'));
    out.push('/');
    out.push_str(part.trim_start_matches('/'));
    out
}
