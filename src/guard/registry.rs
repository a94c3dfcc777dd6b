//! Navigation guard registry
//!
//! Guards are async predicates keyed by id and evaluated in registration
//! order before a view change is committed. One request is evaluated at a
//! time; a second request while one is pending fails with `GuardBusy`.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use indexmap::IndexMap;

use crate::error::{Error, Result};

/// Future returned by a guard predicate
pub type GuardFuture = Pin<Box<dyn Future<Output = Result<bool>> + Send>>;

/// Guard predicate; receives the navigation target
pub type GuardPredicate = Arc<dyn Fn(String) -> GuardFuture + Send + Sync>;

struct GuardEntry {
    serial: u64,
    predicate: GuardPredicate,
}

#[derive(Default)]
struct RegistryInner {
    guards: Mutex<IndexMap<String, GuardEntry>>,
    busy: AtomicBool,
    next_serial: AtomicU64,
}

impl RegistryInner {
    fn guards(&self) -> MutexGuard<'_, IndexMap<String, GuardEntry>> {
        self.guards.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Ordered registry of navigation guards
#[derive(Clone, Default)]
pub struct NavigationGuardRegistry {
    inner: Arc<RegistryInner>,
}

impl NavigationGuardRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `predicate` under `id`
    ///
    /// Registering an id that already exists replaces its predicate and
    /// keeps its position. Dropping the returned handle unregisters.
    pub fn register<F, Fut>(&self, id: impl Into<String>, predicate: F) -> GuardRegistration
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<bool>> + Send + 'static,
    {
        let id = id.into();
        let serial = self.inner.next_serial.fetch_add(1, Ordering::Relaxed);
        let predicate: GuardPredicate =
            Arc::new(move |target: String| -> GuardFuture { Box::pin(predicate(target)) });

        let replaced = self
            .inner
            .guards()
            .insert(id.clone(), GuardEntry { serial, predicate })
            .is_some();

        if replaced {
            tracing::debug!(guard = %id, "Navigation guard replaced");
        } else {
            tracing::debug!(guard = %id, "Navigation guard registered");
        }

        GuardRegistration {
            id,
            serial,
            registry: Arc::downgrade(&self.inner),
            active: AtomicBool::new(true),
        }
    }

    /// Number of registered guards
    pub fn len(&self) -> usize {
        self.inner.guards().len()
    }

    /// Whether no guards are registered
    pub fn is_empty(&self) -> bool {
        self.inner.guards().is_empty()
    }

    /// Whether a guard is registered under `id`
    pub fn contains(&self, id: &str) -> bool {
        self.inner.guards().contains_key(id)
    }

    /// Guard ids in evaluation order
    pub fn ids(&self) -> Vec<String> {
        self.inner.guards().keys().cloned().collect()
    }

    /// Whether a request is being evaluated
    pub fn is_busy(&self) -> bool {
        self.inner.busy.load(Ordering::Acquire)
    }

    /// Begin a navigation request to `target`
    ///
    /// Fails immediately with `GuardBusy` while another request is pending.
    /// The guards are captured now; guards registered afterwards do not take
    /// part in this request.
    pub fn request_navigation(&self, target: impl Into<String>) -> Result<PendingNavigation> {
        if self
            .inner
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Navigation request rejected, another is pending");
            return Err(Error::GuardBusy);
        }

        let guards = self
            .inner
            .guards()
            .iter()
            .map(|(id, entry)| (id.clone(), Arc::clone(&entry.predicate)))
            .collect();

        Ok(PendingNavigation {
            target: target.into(),
            guards,
            _busy: BusyToken {
                registry: Arc::clone(&self.inner),
            },
        })
    }

    /// Request navigation to `target` and evaluate it
    pub async fn navigate(&self, target: impl Into<String>) -> Result<bool> {
        self.request_navigation(target)?.resolve().await
    }
}

struct BusyToken {
    registry: Arc<RegistryInner>,
}

impl Drop for BusyToken {
    fn drop(&mut self) {
        self.registry.busy.store(false, Ordering::Release);
    }
}

/// A navigation request awaiting evaluation
///
/// The registry stays busy until this is resolved or dropped.
#[must_use = "a pending navigation keeps the registry busy until resolved or dropped"]
pub struct PendingNavigation {
    target: String,
    guards: Vec<(String, GuardPredicate)>,
    _busy: BusyToken,
}

impl PendingNavigation {
    /// Navigation target
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Evaluate the guards
    ///
    /// Resolves `false` at the first guard that vetoes; later guards are not
    /// invoked. A guard error blocks navigation and is returned.
    pub async fn resolve(self) -> Result<bool> {
        for (id, predicate) in &self.guards {
            match predicate(self.target.clone()).await {
                Ok(true) => {}
                Ok(false) => {
                    tracing::info!(guard = %id, target = %self.target, "Navigation blocked");
                    return Ok(false);
                }
                Err(e) => {
                    tracing::warn!(guard = %id, target = %self.target, error = %e, "Navigation guard failed");
                    return Err(e);
                }
            }
        }

        tracing::debug!(target = %self.target, guards = self.guards.len(), "Navigation approved");
        Ok(true)
    }
}

/// Handle to a registered guard
///
/// Dropping the handle unregisters. A handle whose id has since been
/// re-registered leaves the newer guard in place.
#[must_use = "dropping a GuardRegistration unregisters the guard immediately"]
pub struct GuardRegistration {
    id: String,
    serial: u64,
    registry: Weak<RegistryInner>,
    active: AtomicBool,
}

impl GuardRegistration {
    /// Guard id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Remove the guard; further calls do nothing
    pub fn unregister(&self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }

        let Some(registry) = self.registry.upgrade() else {
            return;
        };

        let mut guards = registry.guards();
        if guards
            .get(&self.id)
            .is_some_and(|entry| entry.serial == self.serial)
        {
            guards.shift_remove(&self.id);
            tracing::debug!(guard = %self.id, "Navigation guard unregistered");
        }
    }
}

impl Drop for GuardRegistration {
    fn drop(&mut self) {
        self.unregister();
    }
}

impl std::fmt::Debug for GuardRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardRegistration")
            .field("id", &self.id)
            .field("serial", &self.serial)
            .finish()
    }
}
