//! Provider routing table
//!
//! Requests arrive as `/{provider}/{rest...}`. The first segment selects a
//! route; the remainder and the request query string are appended to the
//! route's upstream base URL.

use std::collections::HashMap;
use url::Url;

use crate::config::RouteConfig;
use crate::error::{Result, WardenError};

/// First path segment served by the admin namespace
pub const RESERVED_PREFIX: &str = "admin";

/// A resolved provider route
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRoute {
    pub prefix: String,
    pub upstream: Url,
    pub credential_header: String,
    pub credential_prefix: String,
    pub credential_key: String,
}

impl ProviderRoute {
    /// Value sent under `credential_header` for a given credential
    pub fn credential_value(&self, credential: &str) -> String {
        format!("{}{}", self.credential_prefix, credential)
    }
}

/// Immutable prefix -> route map built once at startup
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<String, ProviderRoute>,
}

/// A request path matched against the table
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTarget<'a> {
    pub route: &'a ProviderRoute,
    /// Path after the provider segment, always starting with `/`
    pub rest: String,
    pub url: Url,
}

impl ResolvedTarget<'_> {
    /// Upstream path as a normalizing server would see it: dot segments
    /// resolved and percent-escapes decoded.
    pub fn normalized_path(&self) -> String {
        let decoded = urlencoding::decode_binary(self.url.path().as_bytes());
        String::from_utf8_lossy(&decoded).into_owned()
    }
}

impl RouteTable {
    pub fn from_config(routes: &[RouteConfig]) -> Result<Self> {
        let mut table = HashMap::new();

        for route in routes {
            let prefix = route.prefix.trim_matches('/').to_string();
            if prefix.is_empty() || prefix.contains('/') {
                return Err(WardenError::Config(format!(
                    "Invalid route prefix '{}': must be a single path segment",
                    route.prefix
                )));
            }
            if prefix == RESERVED_PREFIX {
                return Err(WardenError::Config(format!(
                    "Route prefix '{prefix}' is reserved"
                )));
            }

            let upstream = Url::parse(&route.upstream).map_err(|e| {
                WardenError::Config(format!(
                    "Invalid upstream URL '{}' for route '{prefix}': {e}",
                    route.upstream
                ))
            })?;
            if upstream.scheme() != "http" && upstream.scheme() != "https" {
                return Err(WardenError::Config(format!(
                    "Unsupported scheme '{}' for route '{prefix}': only http and https are allowed",
                    upstream.scheme()
                )));
            }

            let provider_route = ProviderRoute {
                prefix: prefix.clone(),
                upstream,
                credential_header: route.credential_header.to_ascii_lowercase(),
                credential_prefix: route.credential_prefix.clone(),
                credential_key: route.credential_key.clone(),
            };

            if table.insert(prefix.clone(), provider_route).is_some() {
                return Err(WardenError::Config(format!(
                    "Duplicate route prefix '{prefix}'"
                )));
            }
        }

        Ok(Self { routes: table })
    }

    pub fn get(&self, prefix: &str) -> Option<&ProviderRoute> {
        self.routes.get(prefix)
    }

    pub fn routes(&self) -> impl Iterator<Item = &ProviderRoute> {
        self.routes.values()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Resolve `/{provider}/{rest}` to an upstream URL.
    ///
    /// Returns `None` for an unknown provider segment.
    pub fn resolve(&self, path: &str, query: Option<&str>) -> Option<ResolvedTarget<'_>> {
        let trimmed = path.strip_prefix('/').unwrap_or(path);
        let (prefix, rest) = match trimmed.split_once('/') {
            Some((prefix, rest)) => (prefix, format!("/{rest}")),
            None => (trimmed, "/".to_string()),
        };

        let route = self.routes.get(prefix)?;
        let url = join_upstream(&route.upstream, &rest, query);

        Some(ResolvedTarget { route, rest, url })
    }
}

fn join_upstream(base: &Url, rest: &str, query: Option<&str>) -> Url {
    let mut url = base.clone();
    let base_path = base.path().trim_end_matches('/');
    url.set_path(&format!("{base_path}{rest}"));
    url.set_query(query.filter(|q| !q.is_empty()));
    url.set_fragment(None);
    url
}
