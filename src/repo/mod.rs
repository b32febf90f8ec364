use anyhow::Result;

pub mod cache;
pub mod github;

/// Keyed store for raw response bodies. Freshness policy belongs to the
/// implementation: `get` must return `None` for anything stale.
pub trait ResponseCache {
    fn get(&self, key: &str) -> Option<String>;
    fn put(&self, key: &str, body: &str) -> Result<()>;
}
