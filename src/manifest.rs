//! Route manifest module
//!
//! The build step writes the manifest once; it is loaded at startup and never
//! mutated afterwards.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

use crate::error::{Error, Result};
use crate::routing::{self, RoutePattern};

/// A server-rendered route as recorded by the build
#[derive(Debug, Clone, Deserialize)]
pub struct RouteDefinition {
    /// Route id in the framework's pattern syntax, e.g. `/blog/[slug]`
    pub id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawManifest {
    #[serde(default = "default_app_path")]
    app_path: String,
    #[serde(default)]
    base_path: String,
    #[serde(default)]
    prerendered: HashSet<String>,
    #[serde(default)]
    routes: Vec<RouteDefinition>,
}

fn default_app_path() -> String {
    "_app".to_string()
}

/// Immutable description of routes and prerendered pages
#[derive(Debug, Clone)]
pub struct RouteManifest {
    app_path: String,
    base_path: String,
    prerendered: HashSet<String>,
    routes: Vec<RoutePattern>,
}

impl RouteManifest {
    /// Load the manifest JSON written by the build
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| Error::Manifest {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_json(&raw).map_err(|e| match e {
            Error::Manifest { reason, .. } => Error::Manifest {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let manifest: RawManifest = serde_json::from_str(raw).map_err(|e| Error::Manifest {
            path: "<inline>".into(),
            reason: e.to_string(),
        })?;
        Ok(Self::new(
            manifest.app_path,
            manifest.base_path,
            manifest.prerendered,
            &manifest.routes,
        ))
    }

    pub fn new(
        app_path: String,
        base_path: String,
        prerendered: HashSet<String>,
        routes: &[RouteDefinition],
    ) -> Self {
        Self {
            app_path: app_path.trim_matches('/').to_string(),
            base_path: normalize_base(&base_path),
            prerendered,
            routes: routes.iter().map(|r| RoutePattern::parse(&r.id)).collect(),
        }
    }

    /// Directory (relative to the client root) holding content-hashed assets
    pub fn app_path(&self) -> &str {
        &self.app_path
    }

    /// URL prefix under which client assets are immutable
    pub fn immutable_prefix(&self) -> String {
        format!("{}/{}/immutable/", self.base_path, self.app_path)
    }

    /// Whether a decoded path is a known prerendered page
    pub fn is_prerendered(&self, path: &str) -> bool {
        self.prerendered.contains(path)
    }

    pub fn prerendered_count(&self) -> usize {
        self.prerendered.len()
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Whether a decoded path may be handed to the renderer
    ///
    /// An empty route table accepts every path; otherwise the path must sit
    /// under the base path and match a route. Client-side data and route
    /// requests are matched against the page they belong to.
    pub fn has_route(&self, path: &str) -> bool {
        if self.routes.is_empty() {
            return true;
        }
        let Some(relative) = strip_base(path, &self.base_path) else {
            return false;
        };
        routing::match_route(page_path(relative), &self.routes).is_some()
    }
}

/// Suffixes the client router appends to a page path
const PAGE_SUFFIXES: [&str; 3] = ["/__data.json", ".html__data.json", "/__route.js"];

/// The page a data or route request belongs to
fn page_path(path: &str) -> &str {
    PAGE_SUFFIXES
        .iter()
        .find_map(|suffix| path.strip_suffix(suffix))
        .map_or(path, |page| if page.is_empty() { "/" } else { page })
}

fn normalize_base(base: &str) -> String {
    let base = base.trim_matches('/');
    if base.is_empty() {
        String::new()
    } else {
        format!("/{base}")
    }
}

fn strip_base<'a>(path: &'a str, base: &str) -> Option<&'a str> {
    if base.is_empty() {
        return Some(path);
    }
    match path.strip_prefix(base)? {
        "" => Some("/"),
        rest if rest.starts_with('/') => Some(rest),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"{
        "appPath": "_app",
        "basePath": "/docs",
        "prerendered": ["/docs", "/docs/about"],
        "routes": [{"id": "/"}, {"id": "/blog/[slug]"}]
    }"#;

    #[test]
    fn test_from_json() {
        let manifest = RouteManifest::from_json(MANIFEST).unwrap();
        assert_eq!(manifest.app_path(), "_app");
        assert_eq!(manifest.immutable_prefix(), "/docs/_app/immutable/");
        assert!(manifest.is_prerendered("/docs/about"));
        assert!(!manifest.is_prerendered("/docs/about/"));
        assert_eq!(manifest.prerendered_count(), 2);
        assert_eq!(manifest.route_count(), 2);
    }

    #[test]
    fn test_defaults() {
        let manifest = RouteManifest::from_json("{}").unwrap();
        assert_eq!(manifest.immutable_prefix(), "/_app/immutable/");
        assert!(manifest.has_route("/anything"));
    }

    #[test]
    fn test_has_route_with_base_path() {
        let manifest = RouteManifest::from_json(MANIFEST).unwrap();
        assert!(manifest.has_route("/docs"));
        assert!(manifest.has_route("/docs/blog/hello"));
        assert!(!manifest.has_route("/blog/hello"));
        assert!(!manifest.has_route("/docsblog/hello"));
        assert!(!manifest.has_route("/docs/missing"));
    }

    #[test]
    fn test_data_requests_follow_their_page() {
        let manifest = RouteManifest::from_json(MANIFEST).unwrap();
        assert!(manifest.has_route("/docs/blog/hello/__data.json"));
        assert!(manifest.has_route("/docs/blog/hello.html__data.json"));
        assert!(manifest.has_route("/docs/blog/hello/__route.js"));
        assert!(manifest.has_route("/docs/__data.json"));
        assert!(!manifest.has_route("/docs/missing/__data.json"));
        assert!(!manifest.has_route("/blog/hello/__data.json"));
    }

    #[test]
    fn test_base_path_is_normalized() {
        let manifest =
            RouteManifest::new("/_app/".into(), "docs/".into(), HashSet::new(), &[]);
        assert_eq!(manifest.immutable_prefix(), "/docs/_app/immutable/");
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            RouteManifest::from_json("{not json"),
            Err(Error::Manifest { .. })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = RouteManifest::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
