//! Route table: upstream path prefixes to downstream services.

use crate::domain::config::RouteConfig;

/// Decides which requests go through the envelope pipeline.
pub trait RouteGuard: Send + Sync {
    fn is_guarded(&self, path: &str) -> bool;
}

/// Guards every path under a fixed prefix.
#[derive(Debug, Clone)]
pub struct PrefixGuard {
    prefix: String,
}

impl PrefixGuard {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl RouteGuard for PrefixGuard {
    fn is_guarded(&self, path: &str) -> bool {
        prefix_matches(&self.prefix, path)
    }
}

/// A configured route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub upstream_path_prefix: String,
    pub downstream_base_url: String,
    pub downstream_path_prefix: String,
    pub service_name: Option<String>,
    guarded: bool,
}

impl Route {
    pub fn is_guarded(&self) -> bool {
        self.guarded
    }
}

/// A request path resolved against a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute<'a> {
    pub route: &'a Route,
    /// Path to request on the downstream service
    pub downstream_path: String,
}

impl ResolvedRoute<'_> {
    /// Full downstream URL, with the original query appended.
    pub fn url(&self, query: Option<&str>) -> String {
        let base = self.route.downstream_base_url.trim_end_matches('/');
        match query {
            Some(query) if !query.is_empty() => {
                format!("{}{}?{}", base, self.downstream_path, query)
            }
            _ => format!("{}{}", base, self.downstream_path),
        }
    }
}

/// Longest-prefix route table.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Build from config. A route is guarded when it names a service and its
    /// downstream path starts with `guarded_path_prefix`.
    pub fn new(routes: &[RouteConfig], guarded_path_prefix: &str) -> Self {
        let mut routes: Vec<Route> = routes
            .iter()
            .map(|config| {
                let upstream = normalize_prefix(&config.upstream_path_prefix);
                let downstream = normalize_prefix(&config.downstream_path_prefix);
                let named = config
                    .service_name
                    .as_deref()
                    .is_some_and(|name| !name.trim().is_empty());
                Route {
                    guarded: named && prefix_matches(guarded_path_prefix, &downstream),
                    upstream_path_prefix: upstream,
                    downstream_base_url: config.downstream_base_url.clone(),
                    downstream_path_prefix: downstream,
                    service_name: config.service_name.clone(),
                }
            })
            .collect();
        // longest prefix first
        routes.sort_by(|a, b| b.upstream_path_prefix.len().cmp(&a.upstream_path_prefix.len()));
        Self { routes }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn resolve(&self, path: &str) -> Option<ResolvedRoute<'_>> {
        let route = self
            .routes
            .iter()
            .find(|route| prefix_matches(&route.upstream_path_prefix, path))?;
        let rest = &path[route.upstream_path_prefix.len()..];
        let mut downstream_path = format!("{}{}", route.downstream_path_prefix, rest);
        if downstream_path.is_empty() {
            downstream_path.push('/');
        }
        Some(ResolvedRoute {
            route,
            downstream_path,
        })
    }
}

impl RouteGuard for RouteTable {
    fn is_guarded(&self, path: &str) -> bool {
        self.resolve(path)
            .is_some_and(|resolved| resolved.route.is_guarded())
    }
}

/// `/a/b` matches `/a/b` and `/a/b/...` but not `/a/bc`. The root prefix
/// (empty after normalization) matches everything.
fn prefix_matches(prefix: &str, path: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

fn normalize_prefix(prefix: &str) -> String {
    prefix.trim_end_matches('/').to_string()
}
