//! Move-only ownership wrapper for opaque driver resources.

use std::fmt;

/// Exclusive owner of one opaque resource handle.
///
/// Moving a `Handle` transfers ownership; releasing it via [`Handle::take`]
/// is idempotent, so an explicit close followed by drop-time cleanup is
/// safe. A pure ownership primitive: no panics, no errors.
pub struct Handle<T> {
    inner: Option<T>,
}

impl<T> Handle<T> {
    /// Wrap a raw resource handle.
    pub fn new(inner: T) -> Self {
        Self { inner: Some(inner) }
    }

    /// Read access to the handle, or `None` after release.
    pub fn get(&self) -> Option<&T> {
        self.inner.as_ref()
    }

    /// Mutable access to the handle, or `None` after release.
    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.inner.as_mut()
    }

    /// Release the handle. Subsequent calls return `None`.
    pub fn take(&mut self) -> Option<T> {
        self.inner.take()
    }

    /// Whether the handle is still owned.
    pub fn is_open(&self) -> bool {
        self.inner.is_some()
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_open() {
            write!(f, "Handle(open)")
        } else {
            write!(f, "Handle(released)")
        }
    }
}
