use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use tracing::debug;

use crate::builder::TemplateBuilder;
use crate::template::CompiledTemplate;

/// A template that compiles itself on first access.
///
/// Concurrent first callers serialize on a lock; exactly one of them runs the
/// compiler and every caller observes the same [`CompiledTemplate`]. After
/// that, access is a lock-free read. A failed compilation is not cached, so
/// the error is reported again on the next access.
#[derive(Debug)]
pub struct LazyTemplate {
    builder: Mutex<TemplateBuilder>,
    compiled: OnceLock<Arc<CompiledTemplate>>,
}

impl LazyTemplate {
    /// Wraps `builder` without compiling it.
    pub fn new(builder: TemplateBuilder) -> Self {
        Self {
            builder: Mutex::new(builder),
            compiled: OnceLock::new(),
        }
    }

    /// Returns the compiled template, compiling it if needed.
    ///
    /// # Errors
    ///
    /// Configuration errors from [`TemplateBuilder::compile`].
    pub fn get(&self) -> crate::Result<Arc<CompiledTemplate>> {
        self.get_or_compile_with(|builder| builder.compile())
    }

    /// Whether a successful compilation has been stored.
    pub fn is_compiled(&self) -> bool {
        self.compiled.get().is_some()
    }

    fn get_or_compile_with<F>(&self, compile: F) -> crate::Result<Arc<CompiledTemplate>>
    where
        F: FnOnce(TemplateBuilder) -> crate::Result<CompiledTemplate>,
    {
        if let Some(compiled) = self.compiled.get() {
            return Ok(Arc::clone(compiled));
        }
        let builder = self.builder.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(compiled) = self.compiled.get() {
            return Ok(Arc::clone(compiled));
        }
        let compiled = Arc::new(compile(builder.clone())?);
        Ok(Arc::clone(self.compiled.get_or_init(|| compiled)))
    }
}

/// Memoizes compiled templates for the lifetime of the cache.
///
/// Entries are keyed by the full builder contents (template text, marker,
/// default length and overrides), so each distinct template is compiled
/// exactly once no matter how many threads ask for it.
///
/// ```
/// use sqlx_named_template::{TemplateBuilder, TemplateCache};
///
/// let cache = TemplateCache::new();
/// let a = cache.get_or_compile(TemplateBuilder::new("SELECT * FROM t WHERE id = :id"))?;
/// let b = cache.get_or_compile(TemplateBuilder::new("SELECT * FROM t WHERE id = :id"))?;
/// assert!(std::sync::Arc::ptr_eq(&a, &b));
/// assert_eq!(cache.compilations(), 1);
/// # Ok::<(), sqlx_named_template::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct TemplateCache {
    entries: Mutex<HashMap<TemplateBuilder, Arc<LazyTemplate>>>,
    compilations: AtomicUsize,
}

impl TemplateCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the compiled template for `builder`, compiling it on first use.
    ///
    /// A builder that fails to compile is not kept: its entry is removed and
    /// a later call with the same builder runs the compiler again.
    ///
    /// # Errors
    ///
    /// Configuration errors from [`TemplateBuilder::compile`].
    pub fn get_or_compile(&self, builder: TemplateBuilder) -> crate::Result<Arc<CompiledTemplate>> {
        let key = builder.clone();
        let entry = {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(
                entries
                    .entry(builder)
                    .or_insert_with_key(|key| Arc::new(LazyTemplate::new(key.clone()))),
            )
        };
        let compiled = entry.get_or_compile_with(|builder| {
            self.compilations.fetch_add(1, Ordering::Relaxed);
            debug!(template = builder.template(), "template cache miss");
            builder.compile()
        });
        if compiled.is_err() {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            if entries
                .get(&key)
                .is_some_and(|current| Arc::ptr_eq(current, &entry) && !current.is_compiled())
            {
                entries.remove(&key);
            }
        }
        compiled
    }

    /// Number of times the compiler has run, failed attempts included.
    pub fn compilations(&self) -> usize {
        self.compilations.load(Ordering::Relaxed)
    }

    /// Number of cached templates.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_lazy_compiles_once() {
        let lazy = LazyTemplate::new(TemplateBuilder::new("SELECT * FROM t WHERE id = :id"));
        assert!(!lazy.is_compiled());
        let a = lazy.get().unwrap();
        let b = lazy.get().unwrap();
        assert!(lazy.is_compiled());
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.sql(), "SELECT * FROM t WHERE id = ?");
    }

    #[test]
    fn test_lazy_error_not_cached() {
        let lazy = LazyTemplate::new(TemplateBuilder::new("WHERE id = :id").array_len("id", 2));
        assert!(matches!(lazy.get(), Err(Error::ArrayParameterRequired(_))));
        assert!(matches!(lazy.get(), Err(Error::ArrayParameterRequired(_))));
        assert!(!lazy.is_compiled());
    }

    #[test]
    fn test_cache_drops_failed_entries() {
        let cache = TemplateCache::new();
        let builder = TemplateBuilder::new("WHERE id = :id").array_len("id", 2);
        assert!(matches!(
            cache.get_or_compile(builder.clone()),
            Err(Error::ArrayParameterRequired(_))
        ));
        assert!(cache.is_empty());
        assert!(cache.get_or_compile(builder).is_err());
        assert!(cache.is_empty());
        assert_eq!(cache.compilations(), 2);

        cache
            .get_or_compile(TemplateBuilder::new("WHERE id = :id"))
            .unwrap();
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_distinguishes_settings() {
        let cache = TemplateCache::new();
        let sql = "SELECT * FROM t WHERE id IN :ids";
        let a = cache.get_or_compile(TemplateBuilder::new(sql)).unwrap();
        let b = cache
            .get_or_compile(TemplateBuilder::new(sql).array_len("ids", 2))
            .unwrap();
        assert_eq!(a.array_len("ids").unwrap(), 32);
        assert_eq!(b.sql(), "SELECT * FROM t WHERE id IN (?, ?)");
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.compilations(), 2);
    }
}
