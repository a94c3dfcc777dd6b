//! Frame navigation controller
//!
//! Owns the frame index cursor of the active take and materializes frames
//! through the blob cache.
//!
//! # Loads
//!
//! ```text
//!   load_frame(i) ──► cache hit? ──yes──► pin as current ──► preload neighbors
//!                        │no
//!                        ▼
//!                 in_flight[key] ──► one fetch per key, shared by all callers
//!                        │
//!                        ▼
//!                 still the latest request? ──no──► Superseded
//!                        │yes
//!                        ▼
//!                 cache.set_current(key) ──► preload neighbors
//! ```
//!
//! Preloads run on a background task in spiral order (+1, -1, +2, -2, ...)
//! and never request more frames than fit in the cache beside the current
//! one. Their failures are logged and dropped.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use tokio::sync::{watch, OnceCell};
use tokio::task::JoinHandle;

use crate::cache::{FrameBlobCache, FrameHandle, FrameKey};
use crate::error::{Error, FetchError, Result};
use crate::remote::FrameSource;
use crate::session::ActivityState;
use crate::stats::CacheStats;

use super::config::NavigationConfig;
use super::cursor::{FrameIndexCursor, NavTarget};
use super::prefs::Preferences;

/// Result of a frame load
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    /// Frame is in the cache and marked current
    Loaded(FrameHandle),
    /// A newer request replaced this one; its result was discarded
    Superseded,
}

impl LoadOutcome {
    /// Handle of a loaded frame
    pub fn handle(&self) -> Option<&FrameHandle> {
        match self {
            LoadOutcome::Loaded(handle) => Some(handle),
            LoadOutcome::Superseded => None,
        }
    }

    /// Whether the load was superseded
    pub fn is_superseded(&self) -> bool {
        matches!(self, LoadOutcome::Superseded)
    }
}

type InFlight = Arc<OnceCell<std::result::Result<Bytes, FetchError>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LoadTicket {
    epoch: u64,
    generation: u64,
}

#[derive(Debug, Default)]
struct NavState {
    take_id: Option<String>,
    cursor: FrameIndexCursor,
    /// Bumped when the take changes
    take_generation: u64,
    /// Bumped when a load targets a different index
    load_epoch: u64,
    load_target: Option<usize>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Neighbors of `center` within `radius`, nearest first, forward before back
fn spiral(center: usize, radius: usize, frame_count: usize) -> Vec<usize> {
    let mut indices = Vec::with_capacity(radius * 2);
    for distance in 1..=radius {
        if let Some(forward) = center.checked_add(distance) {
            if forward < frame_count {
                indices.push(forward);
            }
        }
        if let Some(back) = center.checked_sub(distance) {
            indices.push(back);
        }
    }
    indices
}

/// Removes a finished or abandoned fetch from the in-flight table
struct InFlightEntry<'a> {
    table: &'a Mutex<HashMap<FrameKey, InFlight>>,
    key: &'a FrameKey,
    cell: InFlight,
}

impl Drop for InFlightEntry<'_> {
    fn drop(&mut self) {
        let mut table = lock(self.table);
        let Some(pending) = table.get(self.key) else {
            return;
        };
        if !Arc::ptr_eq(pending, &self.cell) {
            return;
        }

        // Table, this entry and the local handle; anyone else is still waiting
        if self.cell.initialized() || Arc::strong_count(&self.cell) <= 3 {
            table.remove(self.key);
        }
    }
}

struct Inner<S> {
    source: S,
    config: NavigationConfig,
    cache: Mutex<FrameBlobCache>,
    state: Mutex<NavState>,
    in_flight: Mutex<HashMap<FrameKey, InFlight>>,
    activity: watch::Receiver<ActivityState>,
    preload_task: Mutex<Option<JoinHandle<()>>>,
}

impl<S: FrameSource> Inner<S> {
    fn is_current(&self, ticket: LoadTicket) -> bool {
        let state = lock(&self.state);
        state.load_epoch == ticket.epoch && state.take_generation == ticket.generation
    }

    /// Point the cursor at a loaded frame unless the load was superseded
    fn settle_cursor(&self, index: usize, ticket: LoadTicket) {
        let mut state = lock(&self.state);
        if state.load_epoch == ticket.epoch && state.take_generation == ticket.generation {
            state.cursor.set(index);
        }
    }

    fn is_take_current(&self, generation: u64) -> bool {
        lock(&self.state).take_generation == generation
    }

    /// Fetch `key`, joining a fetch already in flight for it
    async fn fetch_shared(
        &self,
        key: &FrameKey,
        force: bool,
    ) -> std::result::Result<Bytes, FetchError> {
        let cell = {
            let mut in_flight = lock(&self.in_flight);
            if force {
                in_flight.remove(key);
            }
            Arc::clone(in_flight.entry(key.clone()).or_default())
        };

        // Clears the table entry even when this future is cancelled
        let _entry = InFlightEntry {
            table: &self.in_flight,
            key,
            cell: Arc::clone(&cell),
        };

        cell.get_or_init(|| self.source.fetch_frame(key))
            .await
            .clone()
    }

    /// Pin a live cached entry as current
    fn show_cached(&self, key: &FrameKey) -> Option<FrameHandle> {
        let mut cache = lock(&self.cache);
        let handle = cache.get(key).filter(|handle| !handle.is_released())?;
        cache.pin_current(Some(key.clone()));
        Some(handle)
    }

    /// Write a primary load through the cache as the current frame
    fn install_current(&self, key: FrameKey, data: Bytes, replace: bool) -> FrameHandle {
        let mut cache = lock(&self.cache);

        if !replace {
            if let Some(handle) = cache.get(&key).filter(|handle| !handle.is_released()) {
                cache.pin_current(Some(key));
                return handle;
            }
        }

        cache.set_current(key, data)
    }

    async fn preload(&self, keys: Vec<FrameKey>, generation: u64) {
        for key in keys {
            if !self.is_take_current(generation) {
                return;
            }
            if lock(&self.cache).contains(&key) {
                continue;
            }

            match self.fetch_shared(&key, false).await {
                Ok(data) => {
                    if !self.is_take_current(generation) {
                        return;
                    }
                    let mut cache = lock(&self.cache);
                    if !cache.contains(&key) {
                        cache.set(key, data);
                    }
                }
                Err(e) => {
                    tracing::debug!(key = %key, error = %e, "Preload failed");
                }
            }
        }
    }
}

/// Navigation controller for the frames of one take at a time
pub struct FrameNavigationController<S: FrameSource> {
    inner: Arc<Inner<S>>,
}

impl<S: FrameSource> FrameNavigationController<S> {
    /// Create a controller with default configuration
    pub fn new(source: S, activity: watch::Receiver<ActivityState>) -> Self {
        Self::with_config(source, activity, NavigationConfig::default())
    }

    /// Create a controller with custom configuration
    pub fn with_config(
        source: S,
        activity: watch::Receiver<ActivityState>,
        config: NavigationConfig,
    ) -> Self {
        let cache = FrameBlobCache::with_max_size(config.cache_size);

        Self {
            inner: Arc::new(Inner {
                source,
                config,
                cache: Mutex::new(cache),
                state: Mutex::new(NavState::default()),
                in_flight: Mutex::new(HashMap::new()),
                activity,
                preload_task: Mutex::new(None),
            }),
        }
    }

    /// Get the controller configuration
    pub fn config(&self) -> &NavigationConfig {
        &self.inner.config
    }

    /// Get the frame source
    pub fn source(&self) -> &S {
        &self.inner.source
    }

    /// Switch to `take_id` with `frame_count` frames
    ///
    /// A new take resets the cursor, supersedes pending loads and releases
    /// the previous take's cached frames. The same take only updates the
    /// frame count.
    pub fn set_take(&self, take_id: &str, frame_count: usize) {
        let previous = {
            let mut state = lock(&self.inner.state);
            if state.take_id.as_deref() == Some(take_id) {
                state.cursor.set_frame_count(frame_count);
                return;
            }

            let previous = state.take_id.replace(take_id.to_string());
            state.cursor.reset(frame_count);
            state.take_generation += 1;
            state.load_epoch += 1;
            state.load_target = None;
            previous
        };

        self.abort_preload();

        if let Some(previous) = previous {
            let released = lock(&self.inner.cache).remove_take(&previous);
            tracing::debug!(take = %previous, released = released, "Released frames of previous take");
        }

        tracing::info!(take = %take_id, frame_count = frame_count, "Active take changed");
    }

    /// Update the number of frames of the active take
    pub fn set_frame_count(&self, frame_count: usize) {
        lock(&self.inner.state).cursor.set_frame_count(frame_count);
    }

    /// Active take
    pub fn take_id(&self) -> Option<String> {
        lock(&self.inner.state).take_id.clone()
    }

    /// Current frame index
    pub fn current_index(&self) -> usize {
        lock(&self.inner.state).cursor.current()
    }

    /// Number of frames in the active take
    pub fn frame_count(&self) -> usize {
        lock(&self.inner.state).cursor.frame_count()
    }

    /// Whether navigation is locked by a running capture
    pub fn is_locked(&self) -> bool {
        self.inner.activity.borrow().is_capturing()
    }

    /// Move the cursor; returns the new index
    ///
    /// Out-of-range requests clamp, and requests at a bound leave the index
    /// unchanged. Rejected with `NavigationLocked` while capturing. The
    /// frame itself is loaded with `load_frame`.
    pub fn navigate(&self, target: NavTarget) -> Result<usize> {
        if self.is_locked() {
            tracing::debug!(target = ?target, "Navigation rejected while capturing");
            return Err(Error::NavigationLocked);
        }

        let mut state = lock(&self.inner.state);
        let current = state.cursor.current();
        let next = state.cursor.resolve(target);
        if next != current {
            state.cursor.set(next);
            tracing::trace!(from = current, to = next, "Navigated");
        }

        Ok(next)
    }

    /// Map a hotkey to navigation
    ///
    /// `None` if the key is unbound or keyboard stepping is disabled.
    pub fn handle_hotkey(&self, prefs: &Preferences, key: &str) -> Option<Result<usize>> {
        prefs.target_for(key).map(|target| self.navigate(target))
    }

    /// Load frame `index` of the active take and make it the current frame
    ///
    /// A successful load also moves the cursor to `index`. Concurrent loads
    /// of the same frame share one fetch. A load for a
    /// different index (or a take change) supersedes pending ones, which
    /// then resolve to `LoadOutcome::Superseded`. On failure the previously
    /// displayed frame stays current.
    pub async fn load_frame(&self, index: usize, force_reload: bool) -> Result<LoadOutcome> {
        let (key, ticket) = {
            let mut state = lock(&self.inner.state);
            let Some(take_id) = state.take_id.clone() else {
                return Err(FetchError::NotFound.into());
            };

            let frame_count = state.cursor.frame_count();
            if index >= frame_count {
                return Err(FetchError::OutOfRange { index, frame_count }.into());
            }

            if state.load_target != Some(index) {
                state.load_epoch += 1;
                state.load_target = Some(index);
            }

            let ticket = LoadTicket {
                epoch: state.load_epoch,
                generation: state.take_generation,
            };
            (FrameKey::new(take_id, index, self.inner.config.variant), ticket)
        };

        if !force_reload {
            if let Some(handle) = self.inner.show_cached(&key) {
                self.inner.settle_cursor(index, ticket);
                self.spawn_preload(&key, ticket);
                return Ok(LoadOutcome::Loaded(handle));
            }
        }

        let timeout = self.inner.config.load_timeout;
        let fetched =
            match tokio::time::timeout(timeout, self.inner.fetch_shared(&key, force_reload)).await
            {
                Ok(result) => result,
                Err(_) => Err(FetchError::Timeout(timeout)),
            };

        if !self.inner.is_current(ticket) {
            tracing::debug!(key = %key, "Frame load superseded");
            return Ok(LoadOutcome::Superseded);
        }

        let data = fetched.map_err(|e| {
            tracing::warn!(key = %key, error = %e, "Frame load failed");
            e
        })?;

        let handle = self.inner.install_current(key.clone(), data, force_reload);
        self.inner.settle_cursor(index, ticket);
        self.spawn_preload(&key, ticket);
        Ok(LoadOutcome::Loaded(handle))
    }

    /// Handle of the displayed frame
    pub fn current_frame(&self) -> Option<FrameHandle> {
        let mut cache = lock(&self.inner.cache);
        let key = cache.current().cloned()?;
        cache.get(&key)
    }

    /// Whether frame `index` of the active take is cached
    pub fn is_cached(&self, index: usize) -> bool {
        let Some(take_id) = self.take_id() else {
            return false;
        };
        let key = FrameKey::new(take_id, index, self.inner.config.variant);
        lock(&self.inner.cache).contains(&key)
    }

    /// Number of cached frames
    pub fn cached_frames(&self) -> usize {
        lock(&self.inner.cache).len()
    }

    /// Get cache statistics
    pub fn cache_stats(&self) -> CacheStats {
        lock(&self.inner.cache).stats().clone()
    }

    /// Fetches currently in flight
    pub fn pending_fetches(&self) -> usize {
        lock(&self.inner.in_flight).len()
    }

    fn spawn_preload(&self, center: &FrameKey, ticket: LoadTicket) {
        let radius = self.inner.config.preload_radius;
        if radius == 0 {
            return;
        }

        let frame_count = lock(&self.inner.state).cursor.frame_count();
        let keys: Vec<FrameKey> = {
            let cache = lock(&self.inner.cache);
            let room = cache.max_size().saturating_sub(1);
            spiral(center.index, radius, frame_count)
                .into_iter()
                .take(room)
                .map(|index| center.with_index(index))
                .filter(|key| !cache.contains(key))
                .collect()
        };

        if keys.is_empty() {
            return;
        }

        tracing::trace!(center = %center, count = keys.len(), "Preloading neighbors");

        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move { inner.preload(keys, ticket.generation).await });
        if let Some(previous) = lock(&self.inner.preload_task).replace(task) {
            previous.abort();
        }
    }

    fn abort_preload(&self) {
        if let Some(task) = lock(&self.inner.preload_task).take() {
            task.abort();
        }
    }
}

impl<S: FrameSource> Drop for FrameNavigationController<S> {
    fn drop(&mut self) {
        self.abort_preload();
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::time::Duration;

    use super::*;
    use crate::session::CapturePhase;

    #[derive(Default)]
    struct MockSource {
        calls: Mutex<Vec<usize>>,
        delay: Duration,
        failing: HashSet<usize>,
    }

    impl MockSource {
        fn delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn failing(mut self, indices: &[usize]) -> Self {
            self.failing.extend(indices.iter().copied());
            self
        }

        fn calls(&self) -> Vec<usize> {
            self.calls.lock().unwrap().clone()
        }

        fn calls_for(&self, index: usize) -> usize {
            self.calls().iter().filter(|&&i| i == index).count()
        }
    }

    impl FrameSource for MockSource {
        async fn fetch_frame(
            &self,
            key: &FrameKey,
        ) -> std::result::Result<Bytes, FetchError> {
            self.calls.lock().unwrap().push(key.index);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.failing.contains(&key.index) {
                return Err(FetchError::Remote(format!("frame {} unavailable", key.index)));
            }
            Ok(Bytes::from(format!("frame-{}", key.index)))
        }
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn controller(
        source: MockSource,
        config: NavigationConfig,
    ) -> (
        FrameNavigationController<MockSource>,
        watch::Sender<ActivityState>,
    ) {
        let (activity_tx, activity_rx) = watch::channel(ActivityState::for_take("t"));
        let nav = FrameNavigationController::with_config(source, activity_rx, config);
        nav.set_take("t", 20);
        (nav, activity_tx)
    }

    #[test]
    fn test_spiral_order() {
        assert_eq!(spiral(5, 2, 20), vec![6, 4, 7, 3]);
        assert_eq!(spiral(0, 2, 20), vec![1, 2]);
        assert_eq!(spiral(19, 2, 20), vec![18, 17]);
        assert!(spiral(0, 3, 1).is_empty());
    }

    #[tokio::test]
    async fn test_bounded_navigation() {
        let (nav, _activity) = controller(MockSource::default(), NavigationConfig::default());

        assert_eq!(nav.navigate(NavTarget::Last).unwrap(), 19);
        assert_eq!(nav.navigate(NavTarget::Next).unwrap(), 19);
        assert_eq!(nav.navigate(NavTarget::Index(500)).unwrap(), 19);
        assert_eq!(nav.navigate(NavTarget::First).unwrap(), 0);
        assert_eq!(nav.navigate(NavTarget::Previous).unwrap(), 0);
        assert_eq!(nav.current_index(), 0);
    }

    #[tokio::test]
    async fn test_navigation_locked_while_capturing() {
        let (nav, activity) = controller(MockSource::default(), NavigationConfig::default());
        nav.navigate(NavTarget::Index(4)).unwrap();

        activity.send_modify(|state| state.capture = CapturePhase::Capturing);

        assert!(matches!(
            nav.navigate(NavTarget::Next),
            Err(Error::NavigationLocked)
        ));
        assert_eq!(nav.current_index(), 4);

        activity.send_modify(|state| state.capture = CapturePhase::Stopped);
        assert_eq!(nav.navigate(NavTarget::Next).unwrap(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_pins_current_and_preloads_in_spiral_order() {
        let config = NavigationConfig::default().preload_radius(2);
        let (nav, _activity) = controller(MockSource::default(), config);

        let outcome = nav.load_frame(5, false).await.unwrap();
        let handle = outcome.handle().unwrap();
        assert_eq!(handle.bytes().unwrap(), Bytes::from("frame-5"));
        assert_eq!(nav.current_index(), 5);

        tokio::time::sleep(ms(10)).await;

        assert_eq!(nav.source().calls(), vec![5, 6, 4, 7, 3]);
        assert_eq!(nav.cached_frames(), 5);
        assert!(nav.current_frame().unwrap().same_handle(handle));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_hit_skips_fetch() {
        let config = NavigationConfig::default().preload_radius(1);
        let (nav, _activity) = controller(MockSource::default(), config);

        nav.load_frame(5, false).await.unwrap();
        tokio::time::sleep(ms(10)).await;

        // Preloaded neighbor
        nav.load_frame(6, false).await.unwrap();
        assert_eq!(nav.source().calls_for(6), 1);
        assert_eq!(nav.current_frame().unwrap().key().index, 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_fetch_suppressed() {
        let config = NavigationConfig::default().preload_radius(0);
        let source = MockSource::default().delay(ms(50));
        let (nav, _activity) = controller(source, config);

        let (a, b) = tokio::join!(nav.load_frame(3, false), nav.load_frame(3, false));

        let a = a.unwrap();
        let b = b.unwrap();
        assert!(a.handle().unwrap().same_handle(b.handle().unwrap()));
        assert_eq!(nav.source().calls_for(3), 1);
        assert_eq!(nav.pending_fetches(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_load_is_discarded() {
        let config = NavigationConfig::default().preload_radius(0);
        let source = MockSource::default().delay(ms(50));
        let (nav, _activity) = controller(source, config);

        let (first, second) = tokio::join!(nav.load_frame(1, false), async {
            tokio::time::sleep(ms(10)).await;
            nav.load_frame(2, false).await
        });

        assert!(first.unwrap().is_superseded());
        assert!(!second.unwrap().is_superseded());
        assert_eq!(nav.current_frame().unwrap().key().index, 2);
        assert_eq!(nav.current_index(), 2);
        assert!(!nav.is_cached(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_primary_load_timeout() {
        let config = NavigationConfig::default()
            .preload_radius(0)
            .load_timeout(ms(100));
        let source = MockSource::default().delay(ms(1000));
        let (nav, _activity) = controller(source, config);

        let result = nav.load_frame(0, false).await;

        assert!(matches!(
            result,
            Err(Error::Fetch(FetchError::Timeout(t))) if t == ms(100)
        ));

        tokio::time::sleep(ms(5000)).await;
        assert_eq!(nav.pending_fetches(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_aborted_preload_leaves_no_pending_fetch() {
        let config = NavigationConfig::default().preload_radius(2);
        let source = MockSource::default().delay(ms(50));
        let (nav, _activity) = controller(source, config);

        nav.load_frame(5, false).await.unwrap();
        tokio::time::sleep(ms(10)).await;
        assert_eq!(nav.pending_fetches(), 1);

        // Replaces the preload while it is fetching frame 4
        nav.load_frame(15, false).await.unwrap();
        tokio::time::sleep(ms(1000)).await;

        assert_eq!(nav.source().calls_for(4), 1);
        assert!(!nav.is_cached(4));
        assert_eq!(nav.pending_fetches(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_load_keeps_displayed_frame() {
        let config = NavigationConfig::default().preload_radius(0);
        let source = MockSource::default().failing(&[3]);
        let (nav, _activity) = controller(source, config);

        nav.load_frame(2, false).await.unwrap();
        let result = nav.load_frame(3, false).await;

        assert!(matches!(result, Err(Error::Fetch(FetchError::Remote(_)))));
        assert_eq!(nav.current_frame().unwrap().key().index, 2);
        assert_eq!(nav.current_index(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_preload_failure_swallowed() {
        let config = NavigationConfig::default().preload_radius(1);
        let source = MockSource::default().failing(&[6]);
        let (nav, _activity) = controller(source, config);

        assert!(nav.load_frame(5, false).await.is_ok());
        tokio::time::sleep(ms(10)).await;

        assert!(nav.is_cached(4));
        assert!(!nav.is_cached(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_self_eviction_under_preload_pressure() {
        let config = NavigationConfig::default().cache_size(3).preload_radius(5);
        let (nav, _activity) = controller(MockSource::default(), config);

        nav.load_frame(10, false).await.unwrap();
        tokio::time::sleep(ms(10)).await;
        assert!(nav.is_cached(10));
        assert_eq!(nav.cached_frames(), 3);

        for index in [11, 12, 13, 12, 11] {
            nav.load_frame(index, false).await.unwrap();
            tokio::time::sleep(ms(10)).await;

            let current = nav.current_frame().unwrap();
            assert_eq!(current.key().index, index);
            assert!(current.bytes().is_some());
            assert!(nav.cached_frames() <= 3);
        }

        assert_eq!(nav.cache_stats().double_releases, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_slot_cache_never_preloads() {
        let config = NavigationConfig::default().cache_size(1).preload_radius(3);
        let (nav, _activity) = controller(MockSource::default(), config);

        nav.load_frame(4, false).await.unwrap();
        tokio::time::sleep(ms(10)).await;

        assert_eq!(nav.source().calls(), vec![4]);
        assert!(nav.current_frame().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_take_change_supersedes_pending_load() {
        let config = NavigationConfig::default().preload_radius(0);
        let source = MockSource::default().delay(ms(50));
        let (nav, _activity) = controller(source, config);
        nav.navigate(NavTarget::Index(3)).unwrap();

        let (outcome, _) = tokio::join!(nav.load_frame(3, false), async {
            tokio::time::sleep(ms(10)).await;
            nav.set_take("other", 5);
        });

        assert!(outcome.unwrap().is_superseded());
        assert_eq!(nav.take_id().as_deref(), Some("other"));
        assert_eq!(nav.current_index(), 0);
        assert_eq!(nav.frame_count(), 5);
        assert_eq!(nav.cached_frames(), 0);
    }

    #[tokio::test]
    async fn test_out_of_range_load() {
        let (nav, _activity) = controller(MockSource::default(), NavigationConfig::default());

        let result = nav.load_frame(25, false).await;

        assert!(matches!(
            result,
            Err(Error::Fetch(FetchError::OutOfRange {
                index: 25,
                frame_count: 20
            }))
        ));
    }

    #[tokio::test]
    async fn test_force_reload_refetches() {
        let config = NavigationConfig::default().preload_radius(0);
        let (nav, _activity) = controller(MockSource::default(), config);

        let first = nav.load_frame(2, false).await.unwrap();
        let second = nav.load_frame(2, true).await.unwrap();

        assert_eq!(nav.source().calls_for(2), 2);
        assert!(first.handle().unwrap().is_released());
        assert!(second.handle().unwrap().bytes().is_some());
    }

    #[tokio::test]
    async fn test_hotkeys() {
        let (nav, _activity) = controller(MockSource::default(), NavigationConfig::default());
        let prefs = Preferences::default();

        assert_eq!(nav.handle_hotkey(&prefs, "ArrowRight").unwrap().unwrap(), 1);
        assert_eq!(nav.handle_hotkey(&prefs, "Shift+ArrowRight").unwrap().unwrap(), 11);
        assert_eq!(nav.handle_hotkey(&prefs, "End").unwrap().unwrap(), 19);
        assert!(nav.handle_hotkey(&prefs, "F13").is_none());

        let disabled = Preferences {
            keyboard_frame_stepping: false,
            ..Preferences::default()
        };
        assert!(nav.handle_hotkey(&disabled, "ArrowLeft").is_none());
    }
}
