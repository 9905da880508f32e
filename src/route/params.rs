use std::{
    fmt::{self, Debug, Formatter},
    mem,
    ops::{Deref, DerefMut},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use parking_lot::Mutex;

/// The key under which the remainder of the path captured by a trailing `/*`
/// is stored.
pub const WILDCARD_PARAM: &str = "*wildcard";

#[derive(Default)]
struct Param {
    key: String,
    value: String,
}

/// The parameters captured from the path of one request.
///
/// Entries are kept after a [`reset`](PathParams::reset), so a buffer
/// coming back from the pool captures new values into the strings it already
/// owns.
#[derive(Default)]
pub struct PathParams {
    entries: Vec<Param>,
    len: usize,
}

impl PathParams {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            len: 0,
        }
    }

    pub(crate) fn empty() -> &'static PathParams {
        static EMPTY: PathParams = PathParams {
            entries: Vec::new(),
            len: 0,
        };
        &EMPTY
    }

    /// Returns the value of the parameter `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries[..self.len]
            .iter()
            .find(|param| param.key == key)
            .map(|param| param.value.as_str())
    }

    /// Returns the number of captured parameters.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if nothing was captured.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// An iterator over the `(key, value)` pairs in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries[..self.len]
            .iter()
            .map(|param| (param.key.as_str(), param.value.as_str()))
    }

    pub(crate) fn push(&mut self, key: &str, value: &str) {
        if self.len == self.entries.len() {
            self.entries.push(Param::default());
        }
        let param = &mut self.entries[self.len];
        param.key.clear();
        param.key.push_str(key);
        param.value.clear();
        param.value.push_str(value);
        self.len += 1;
    }

    pub(crate) fn reset(&mut self) {
        self.len = 0;
    }
}

impl Debug for PathParams {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// A free list of [`PathParams`] buffers shared by all requests of a mux.
pub(crate) struct ParamPool {
    capacity: AtomicUsize,
    free: Mutex<Vec<PathParams>>,
}

impl ParamPool {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity: AtomicUsize::new(capacity),
            free: Mutex::new(Vec::new()),
        }
    }

    /// Grows the capacity of newly allocated buffers to at least `capacity`.
    pub(crate) fn reserve(&self, capacity: usize) {
        self.capacity.fetch_max(capacity, Ordering::Relaxed);
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity.load(Ordering::Relaxed)
    }

    /// Takes a buffer out of the pool, allocating one if the pool is empty.
    ///
    /// The buffer goes back to the pool when the returned guard is dropped.
    pub(crate) fn acquire(self: &Arc<Self>) -> PooledParams {
        let params = self.free.lock().pop();
        PooledParams {
            params: params.unwrap_or_else(|| PathParams::with_capacity(self.capacity())),
            pool: self.clone(),
        }
    }

    #[cfg(test)]
    pub(crate) fn idle(&self) -> usize {
        self.free.lock().len()
    }
}

/// A [`PathParams`] buffer borrowed from the parameter pool of a mux.
pub struct PooledParams {
    params: PathParams,
    pool: Arc<ParamPool>,
}

impl Deref for PooledParams {
    type Target = PathParams;

    fn deref(&self) -> &Self::Target {
        &self.params
    }
}

impl DerefMut for PooledParams {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.params
    }
}

impl Drop for PooledParams {
    fn drop(&mut self) {
        let mut params = mem::take(&mut self.params);
        params.reset();
        self.pool.free.lock().push(params);
    }
}

impl Debug for PooledParams {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&**self, f)
    }
}
