// Application state module
// Read-only state shared by every connection

use std::collections::HashMap;
use std::sync::Arc;

use super::types::Config;
use crate::resource::{ServingRoot, StaticData};

/// A serving root attached to a URL prefix
#[derive(Debug, Clone)]
pub struct Mount {
    /// Prefix without trailing slash; empty for `/`
    pub prefix: String,
    pub root: Arc<ServingRoot>,
}

impl Mount {
    pub fn new(prefix: &str, root: Arc<ServingRoot>) -> Self {
        Self {
            prefix: normalize_prefix(prefix),
            root,
        }
    }

    /// Path below this mount, if `path` falls under it
    ///
    /// `Some("")` means the mount's own prefix without a trailing slash.
    pub fn strip<'a>(&self, path: &'a str) -> Option<&'a str> {
        let rest = path.strip_prefix(self.prefix.as_str())?;
        if rest.is_empty() || rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

/// Application state
pub struct AppState {
    pub config: Config,
    /// Longest prefix first
    pub mounts: Vec<Mount>,
    /// Exact request path to fixed response
    pub data: HashMap<String, StaticData>,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let mut mounts: Vec<Mount> = config
            .mounts
            .iter()
            .map(|m| Mount::new(&m.prefix, Arc::new(m.to_serving_root())))
            .collect();
        mounts.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));

        let data = config
            .data
            .iter()
            .map(|d| {
                (
                    d.path.clone(),
                    StaticData::new(d.content_type.clone(), d.body.clone()),
                )
            })
            .collect();

        Self {
            config: config.clone(),
            mounts,
            data,
        }
    }

    /// The mount with the longest prefix covering `path`, and the rest of the path
    pub fn find_mount<'a>(&self, path: &'a str) -> Option<(&Mount, &'a str)> {
        self.mounts
            .iter()
            .find_map(|m| m.strip(path).map(|rest| (m, rest)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        let config = Config::from_toml_str(
            r#"
[[mounts]]
prefix = "/"
root = "/srv/www"

[[mounts]]
prefix = "/static/"
root = "/srv/static"

[[mounts]]
prefix = "/static/img"
root = "/srv/img"
"#,
        )
        .unwrap();
        AppState::new(&config)
    }

    #[test]
    fn test_prefixes_normalized_and_sorted() {
        let state = state();
        let prefixes: Vec<_> = state.mounts.iter().map(|m| m.prefix.as_str()).collect();
        assert_eq!(prefixes, ["/static/img", "/static", ""]);
    }

    #[test]
    fn test_longest_prefix_wins() {
        let state = state();
        let (mount, rest) = state.find_mount("/static/img/a.png").unwrap();
        assert_eq!(mount.prefix, "/static/img");
        assert_eq!(rest, "/a.png");

        let (mount, rest) = state.find_mount("/static/css/site.css").unwrap();
        assert_eq!(mount.prefix, "/static");
        assert_eq!(rest, "/css/site.css");
    }

    #[test]
    fn test_prefix_needs_segment_boundary() {
        let state = state();
        let (mount, rest) = state.find_mount("/staticfile.txt").unwrap();
        assert_eq!(mount.prefix, "");
        assert_eq!(rest, "/staticfile.txt");

        let (mount, rest) = state.find_mount("/static").unwrap();
        assert_eq!(mount.prefix, "/static");
        assert_eq!(rest, "");
    }
}
