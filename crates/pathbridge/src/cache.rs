//! Bidirectional base-path cache.
//!
//! Entries are scoped per resolver instance and map a base path to its
//! counterpart in the other coordinate system. A successful resolution is
//! recorded in both directions at once, so resolving `C:\` also answers later
//! lookups for `/mnt/c`.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;
use tracing::{debug, warn};

use crate::context::ResolutionContext;
use crate::path::{classify, join_path};

static GLOBAL_CACHE: Lazy<Arc<BasePathCache>> = Lazy::new(|| Arc::new(BasePathCache::new()));

type InstanceEntries = HashMap<String, String>;

#[derive(Debug, Default)]
pub struct BasePathCache {
    entries: RwLock<HashMap<String, InstanceEntries>>,
}

impl BasePathCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache used when options do not supply one.
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL_CACHE)
    }

    pub fn get(&self, instance: &str, base: &str) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(instance)
            .and_then(|entries| entries.get(base))
            .cloned()
    }

    /// Record a single mapping, overriding whatever the resolver would say.
    pub fn insert(&self, instance: &str, base: impl Into<String>, resolved: impl Into<String>) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(instance.to_string())
            .or_default()
            .insert(base.into(), resolved.into());
    }

    /// The full translated path for `ctx`, if its base is known.
    pub fn lookup(&self, ctx: &ResolutionContext<'_>) -> Option<String> {
        let resolved = self.get(ctx.resolver_instance(), ctx.base_path())?;
        Some(join_path(
            &resolved,
            ctx.rest_of_path(),
            ctx.kind().opposite(),
        ))
    }

    /// Record `ctx`'s base and `resolved_base` as counterparts.
    ///
    /// Both directions are written under one lock. A result in the same
    /// coordinate system as the source is not a translation and is discarded;
    /// returns whether anything was written.
    pub fn store(&self, ctx: &ResolutionContext<'_>, resolved_base: &str) -> bool {
        if classify(resolved_base) == ctx.kind() {
            debug!(
                base = ctx.base_path(),
                resolved = resolved_base,
                "not caching same-system resolution"
            );
            return false;
        }
        if resolved_base.is_empty() {
            warn!(base = ctx.base_path(), "refusing to cache empty resolution");
            return false;
        }

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let scoped = entries.entry(ctx.resolver_instance().to_string()).or_default();
        scoped.insert(ctx.base_path().to_string(), resolved_base.to_string());
        scoped.insert(resolved_base.to_string(), ctx.base_path().to_string());
        true
    }

    pub fn reset(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(HashMap::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<I, B, R> FromIterator<(I, B, R)> for BasePathCache
where
    I: AsRef<str>,
    B: Into<String>,
    R: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (I, B, R)>>(iter: T) -> Self {
        let cache = BasePathCache::new();
        for (instance, base, resolved) in iter {
            cache.insert(instance.as_ref(), base, resolved);
        }
        cache
    }
}
