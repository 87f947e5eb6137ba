//! Route lookup.
//!
//! # Responsibilities
//! - Find the route for a request path in the active table
//! - Return the matched route or an explicit no-match
//!
//! # Design Decisions
//! - First prefix match wins, in table order; a later, longer prefix is
//!   never preferred over an earlier, shorter one
//! - Each lookup works on one snapshot, so it sees either the old or the
//!   new table during a reload
//! - O(n) prefix scan (acceptable for typical route counts)

use std::sync::Arc;

use crate::config::RouteConfig;
use crate::routing::table::{RouteStore, RouteTable};

impl RouteTable {
    /// First route whose `urlContext` is a prefix of `path`.
    pub fn resolve(&self, path: &str) -> Option<&Arc<RouteConfig>> {
        self.iter().find(|route| path.starts_with(route.url_context.as_str()))
    }
}

/// Resolves request paths against the active route table.
#[derive(Debug, Clone)]
pub struct RouteResolver {
    store: Arc<RouteStore>,
}

impl RouteResolver {
    pub fn new(store: Arc<RouteStore>) -> Self {
        Self { store }
    }

    pub fn resolve(&self, path: &str) -> Option<Arc<RouteConfig>> {
        self.store.snapshot().resolve(path).cloned()
    }

    pub fn store(&self) -> &Arc<RouteStore> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn resolver(contexts: &[&str]) -> RouteResolver {
        let table = contexts
            .iter()
            .map(|c| RouteConfig::new(*c, format!("{}:80", c.trim_matches('/').replace('/', "-"))))
            .collect();
        RouteResolver::new(Arc::new(RouteStore::new(table)))
    }

    #[test]
    fn test_first_prefix_wins() {
        let resolver = resolver(&["/api", "/api/v2"]);
        let route = resolver.resolve("/api/v2/users").unwrap();
        assert_eq!(route.url_context, "/api");
    }

    #[test]
    fn test_order_decides_not_length() {
        let resolver = resolver(&["/api/v2", "/api"]);
        assert_eq!(resolver.resolve("/api/v2/users").unwrap().url_context, "/api/v2");
        assert_eq!(resolver.resolve("/api/v1/users").unwrap().url_context, "/api");
    }

    #[test]
    fn test_literal_prefix_match() {
        let resolver = resolver(&["/api"]);
        // Plain string prefix, not segment-aware.
        assert!(resolver.resolve("/apix").is_some());
        assert!(resolver.resolve("/ap").is_none());
        assert!(resolver.resolve("/other").is_none());
    }

    #[test]
    fn test_query_string_included() {
        let resolver = resolver(&["/search?q="]);
        assert!(resolver.resolve("/search?q=rust").is_some());
        assert!(resolver.resolve("/search").is_none());
    }

    #[test]
    fn test_reload_never_exposes_empty_table() {
        let resolver = resolver(&["/api", "/web"]);
        let store = resolver.store().clone();
        let stop = Arc::new(AtomicBool::new(false));

        let writer = {
            let stop = stop.clone();
            std::thread::spawn(move || {
                for i in 0..2_000 {
                    let table: RouteTable = vec![
                        RouteConfig::new("/api", format!("api-{i}:80")),
                        RouteConfig::new("/web", "web:80"),
                    ]
                    .into_iter()
                    .collect();
                    store.replace(table);
                }
                stop.store(true, Ordering::SeqCst);
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let resolver = resolver.clone();
                let stop = stop.clone();
                std::thread::spawn(move || {
                    while !stop.load(Ordering::SeqCst) {
                        assert!(resolver.resolve("/api/items").is_some());
                        assert!(resolver.resolve("/web/index.html").is_some());
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(resolver.store().generation(), 2_000);
    }
}
