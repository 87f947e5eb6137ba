//! Route table snapshots and the swappable store that holds the active one.
//!
//! # Responsibilities
//! - Keep routes in insertion order, unique by `urlContext`
//! - Publish a complete new table on every reload
//!
//! # Design Decisions
//! - Tables are immutable once published; reloads build a new one
//! - The active table is an `Arc` behind `ArcSwap`, so a swap is a single
//!   pointer store and readers never see a partially built table
//! - Requests keep the snapshot they resolved against until they finish

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::RouteConfig;

/// An ordered set of routes keyed by `urlContext`.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Arc<RouteConfig>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a route. A route with the same `urlContext` is replaced in
    /// place, keeping its position, and returned.
    pub fn insert(&mut self, route: RouteConfig) -> Option<Arc<RouteConfig>> {
        let route = Arc::new(route);
        match self
            .routes
            .iter_mut()
            .find(|r| r.url_context == route.url_context)
        {
            Some(slot) => Some(std::mem::replace(slot, route)),
            None => {
                self.routes.push(route);
                None
            }
        }
    }

    pub fn get(&self, url_context: &str) -> Option<&Arc<RouteConfig>> {
        self.routes.iter().find(|r| r.url_context == url_context)
    }

    /// Routes in table order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<RouteConfig>> {
        self.routes.iter()
    }

    /// `urlContext` keys in table order.
    pub fn contexts(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(|r| r.url_context.as_str())
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl FromIterator<RouteConfig> for RouteTable {
    fn from_iter<I: IntoIterator<Item = RouteConfig>>(iter: I) -> Self {
        let mut table = RouteTable::new();
        for route in iter {
            table.insert(route);
        }
        table
    }
}

/// Shared handle to the active route table.
#[derive(Debug)]
pub struct RouteStore {
    current: ArcSwap<RouteTable>,
    generation: AtomicU64,
}

impl RouteStore {
    pub fn new(table: RouteTable) -> Self {
        Self {
            current: ArcSwap::from_pointee(table),
            generation: AtomicU64::new(0),
        }
    }

    /// The table active right now.
    pub fn snapshot(&self) -> Arc<RouteTable> {
        self.current.load_full()
    }

    /// Publish `table` as the active table and return the new generation.
    pub fn replace(&self, table: RouteTable) -> u64 {
        self.current.store(Arc::new(table));
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Number of successful replacements since startup.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

impl Default for RouteStore {
    fn default() -> Self {
        Self::new(RouteTable::new())
    }
}
