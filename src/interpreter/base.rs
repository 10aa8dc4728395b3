//! Shared interpreter state
//!
//! Every interpreter embeds an [`InterpreterBase`] and returns it from
//! [`Interpreter::base`](super::Interpreter::base). The trait's default
//! accessors read and write through it.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{ReentrantMutex, RwLock};
use url::Url;

use super::group::InterpreterGroup;
use super::scheduler::{Scheduler, SerialScheduler};

/// Interpreter settings, sorted by key
pub type Properties = BTreeMap<String, String>;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Mutable state common to all interpreters
pub struct InterpreterBase {
    id: u64,
    properties: RwLock<Properties>,
    user_name: RwLock<Option<String>>,
    group: RwLock<Option<Arc<InterpreterGroup>>>,
    classloader_urls: RwLock<Vec<Url>>,
    scheduler: Arc<dyn Scheduler>,
    /// Serializes open/close of this interpreter across every wrapper.
    /// Reentrant so stacked wrappers can each take it on the same thread.
    lifecycle: ReentrantMutex<()>,
}

impl InterpreterBase {
    pub fn new() -> Self {
        Self::with_properties(Properties::new())
    }

    pub fn with_properties(properties: Properties) -> Self {
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        Self {
            id,
            properties: RwLock::new(properties),
            user_name: RwLock::new(None),
            group: RwLock::new(None),
            classloader_urls: RwLock::new(Vec::new()),
            scheduler: Arc::new(SerialScheduler::new(format!("interpreter_{}", id))),
            lifecycle: ReentrantMutex::new(()),
        }
    }

    /// Process-unique id of this interpreter instance
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn lifecycle(&self) -> &ReentrantMutex<()> {
        &self.lifecycle
    }

    pub fn properties(&self) -> Properties {
        self.properties.read().clone()
    }

    pub fn set_properties(&self, properties: Properties) {
        *self.properties.write() = properties;
    }

    pub fn property(&self, key: &str) -> Option<String> {
        self.properties.read().get(key).cloned()
    }

    pub fn user_name(&self) -> Option<String> {
        self.user_name.read().clone()
    }

    pub fn set_user_name(&self, user_name: &str) {
        *self.user_name.write() = Some(user_name.to_string());
    }

    pub fn interpreter_group(&self) -> Option<Arc<InterpreterGroup>> {
        self.group.read().clone()
    }

    pub fn set_interpreter_group(&self, group: Arc<InterpreterGroup>) {
        *self.group.write() = Some(group);
    }

    pub fn classloader_urls(&self) -> Vec<Url> {
        self.classloader_urls.read().clone()
    }

    pub fn set_classloader_urls(&self, urls: Vec<Url>) {
        *self.classloader_urls.write() = urls;
    }

    pub fn scheduler(&self) -> Arc<dyn Scheduler> {
        Arc::clone(&self.scheduler)
    }
}

impl Default for InterpreterBase {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InterpreterBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterpreterBase")
            .field("id", &self.id)
            .field("properties", &*self.properties.read())
            .field("user_name", &*self.user_name.read())
            .field("scheduler", &self.scheduler.name())
            .finish_non_exhaustive()
    }
}
