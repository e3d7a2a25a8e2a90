//! Asset URL hydration
//!
//! Media records store a path relative to the asset host. Responses carry a
//! `url` built from the configured base, unless the stored path is already a
//! fully-qualified URL.

use mongodb::bson::{Bson, doc};
use url::Url;

/// Scheme followed by a non-empty authority, e.g. `https://cdn.example.com`.
const ABSOLUTE_URL_PATTERN: &str = "^[A-Za-z][A-Za-z0-9+.-]*://[^/?#]+";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetUrl {
    base: String,
}

impl AssetUrl {
    pub fn new(base: impl Into<String>) -> Self {
        let base: String = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// True when `path` parses as a URL with both a scheme and a host
    pub fn is_absolute(path: &str) -> bool {
        Url::parse(path).map(|url| url.has_host()).unwrap_or(false)
    }

    pub fn resolve(&self, path: &str) -> String {
        if Self::is_absolute(path) {
            path.to_string()
        } else {
            format!("{}/{}", self.base, path.trim_start_matches('/'))
        }
    }

    /// Aggregation expression computing the URL for the path at `field`
    pub fn expression(&self, field: &str) -> Bson {
        let path = format!("${}", field);
        Bson::Document(doc! {
            "$cond": [
                { "$regexMatch": { "input": path.as_str(), "regex": ABSOLUTE_URL_PATTERN } },
                path.as_str(),
                { "$concat": [
                    format!("{}/", self.base),
                    { "$ltrim": { "input": path.as_str(), "chars": "/" } },
                ] },
            ]
        })
    }
}
