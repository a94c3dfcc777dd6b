//! Releasable frame handles
//!
//! A `FrameHandle` is a cheap-to-clone view over frame bytes. Releasing it
//! drops the cache's reference to the bytes for every clone at once, so a
//! handle that outlives its cache entry is detectably dead rather than
//! silently pinning memory.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;

use super::key::FrameKey;

static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug)]
struct BlobInner {
    id: u64,
    key: FrameKey,
    len: usize,
    released: AtomicBool,
    data: Mutex<Option<Bytes>>,
}

/// Handle to frame bytes owned by the cache
#[derive(Debug, Clone)]
pub struct FrameHandle {
    inner: Arc<BlobInner>,
}

impl FrameHandle {
    /// Allocate a new handle over `data`
    pub(crate) fn new(key: FrameKey, data: Bytes) -> Self {
        Self {
            inner: Arc::new(BlobInner {
                id: NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed),
                key,
                len: data.len(),
                released: AtomicBool::new(false),
                data: Mutex::new(Some(data)),
            }),
        }
    }

    /// Process-unique handle id
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Key this handle was created for
    pub fn key(&self) -> &FrameKey {
        &self.inner.key
    }

    /// Size of the frame payload in bytes
    pub fn len(&self) -> usize {
        self.inner.len
    }

    /// Whether the payload is empty
    pub fn is_empty(&self) -> bool {
        self.inner.len == 0
    }

    /// Frame bytes, or `None` once the handle has been released
    pub fn bytes(&self) -> Option<Bytes> {
        match self.inner.data.lock() {
            Ok(data) => data.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Whether the handle has been released
    pub fn is_released(&self) -> bool {
        self.inner.released.load(Ordering::Acquire)
    }

    /// Whether two handles refer to the same allocation
    pub fn same_handle(&self, other: &FrameHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Release the payload
    ///
    /// Returns `false` if the handle was already released.
    pub(crate) fn release(&self) -> bool {
        if self.inner.released.swap(true, Ordering::AcqRel) {
            return false;
        }

        let mut data = match self.inner.data.lock() {
            Ok(data) => data,
            Err(poisoned) => poisoned.into_inner(),
        };
        data.take();
        true
    }
}
