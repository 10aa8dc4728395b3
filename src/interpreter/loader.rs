//! Per-thread context loader
//!
//! Some interpreters install a resource loader on the calling thread while
//! they run (their own search path, plugin set, ...). [`LoaderGuard`]
//! snapshots whatever loader the caller had and puts it back on drop, so a
//! statement cannot leave its loader behind on a pooled thread.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::sync::Arc;

use url::Url;

thread_local! {
    static CURRENT: RefCell<Option<Arc<ContextLoader>>> = const { RefCell::new(None) };
}

/// Named, ordered set of locations resources are resolved from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextLoader {
    name: String,
    urls: Vec<Url>,
}

impl ContextLoader {
    pub fn new(name: impl Into<String>, urls: Vec<Url>) -> Self {
        Self {
            name: name.into(),
            urls,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn urls(&self) -> &[Url] {
        &self.urls
    }
}

/// Loader installed on the current thread, if any
pub fn current() -> Option<Arc<ContextLoader>> {
    CURRENT.with(|cell| cell.borrow().clone())
}

/// Install `loader` on the current thread and return the previous one
pub fn replace(loader: Option<Arc<ContextLoader>>) -> Option<Arc<ContextLoader>> {
    CURRENT.with(|cell| cell.replace(loader))
}

/// Restores the thread's loader to its state at [`LoaderGuard::capture`]
///
/// Not `Send`: it must be dropped on the thread it captured.
#[must_use = "the loader is restored when the guard is dropped"]
pub struct LoaderGuard {
    saved: Option<Arc<ContextLoader>>,
    _thread_bound: PhantomData<*const ()>,
}

impl LoaderGuard {
    pub fn capture() -> Self {
        Self {
            saved: current(),
            _thread_bound: PhantomData,
        }
    }
}

impl Drop for LoaderGuard {
    fn drop(&mut self) {
        replace(self.saved.take());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    fn loader(name: &str) -> Arc<ContextLoader> {
        Arc::new(ContextLoader::new(name, Vec::new()))
    }

    #[test]
    fn test_replace_returns_previous() {
        replace(None);
        assert_eq!(replace(Some(loader("a"))), None);
        assert_eq!(replace(Some(loader("b"))).unwrap().name(), "a");
        assert_eq!(current().unwrap().name(), "b");
        replace(None);
    }

    #[test]
    fn test_guard_restores_on_drop() {
        replace(Some(loader("outer")));
        {
            let _guard = LoaderGuard::capture();
            replace(Some(loader("inner")));
            assert_eq!(current().unwrap().name(), "inner");
        }
        assert_eq!(current().unwrap().name(), "outer");
        replace(None);
    }

    #[test]
    fn test_guard_restores_none() {
        replace(None);
        {
            let _guard = LoaderGuard::capture();
            replace(Some(loader("leak")));
        }
        assert!(current().is_none());
    }

    #[test]
    fn test_guard_restores_on_panic() {
        replace(Some(loader("outer")));
        let result = catch_unwind(AssertUnwindSafe(|| {
            let _guard = LoaderGuard::capture();
            replace(Some(loader("inner")));
            panic!("statement blew up");
        }));
        assert!(result.is_err());
        assert_eq!(current().unwrap().name(), "outer");
        replace(None);
    }

    #[test]
    fn test_loader_is_per_thread() {
        replace(Some(loader("main")));
        std::thread::spawn(|| assert!(current().is_none()))
            .join()
            .unwrap();
        assert_eq!(current().unwrap().name(), "main");
        replace(None);
    }
}
