//! URL path handling
//!
//! Percent-decoding with strict escape validation and the mapping from a URL
//! path to a path relative to an asset root.

use std::path::{Component, Path, PathBuf};

/// Percent-decode a URL path component
///
/// Returns `None` when an escape is malformed (`%`, `%4`, `%zz`) or the
/// decoded bytes are not valid UTF-8. Callers treat this as "no match".
pub fn decode_path(raw: &str) -> Option<String> {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while let Some(offset) = bytes[i..].iter().position(|&b| b == b'%') {
        let at = i + offset;
        let escape = bytes.get(at + 1..at + 3)?;
        if !escape.iter().all(u8::is_ascii_hexdigit) {
            return None;
        }
        i = at + 3;
    }
    urlencoding::decode(raw).ok().map(std::borrow::Cow::into_owned)
}

/// Map a decoded URL path to a path relative to an asset root
///
/// Returns `None` for paths that could leave the root (`..` components) or
/// that contain NUL bytes.
pub fn to_relative_path(decoded: &str) -> Option<PathBuf> {
    if decoded.contains('\0') {
        return None;
    }
    let mut relative = PathBuf::new();
    for component in Path::new(decoded.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(relative)
}
