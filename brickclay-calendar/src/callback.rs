//! Identity-compared callback handles.
//!
//! ## Usage
//!
//! Hand a [`Callback`] or [`CallbackWith`] to a picker or to the
//! [`CalendarRegistry`](crate::manager::CalendarRegistry). Handles compare by
//! identity, so the registry can skip exactly the callback that asked
//! for its siblings to close.

use std::{fmt, sync::Arc};

/// Notification with no payload: close requests, `opened` and `closed`.
///
/// Two handles are equal only when one was cloned from the other.
#[derive(Clone)]
pub struct Callback(Arc<dyn Fn() + Send + Sync>);

impl Callback {
    /// Wraps a closure.
    pub fn new(handler: impl Fn() + Send + Sync + 'static) -> Self {
        Self(Arc::new(handler))
    }

    /// Runs the closure.
    pub fn call(&self) {
        (self.0)()
    }
}

impl<F: Fn() + Send + Sync + 'static> From<F> for Callback {
    fn from(handler: F) -> Self {
        Self::new(handler)
    }
}

impl Default for Callback {
    fn default() -> Self {
        Self::new(|| {})
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Callback {}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback({:p})", Arc::as_ptr(&self.0).cast::<()>())
    }
}

/// Payload-carrying handle: selections, time-picker value strings.
pub struct CallbackWith<T, R = ()>(Arc<dyn Fn(T) -> R + Send + Sync>);

impl<T, R> CallbackWith<T, R> {
    /// Wraps a closure.
    pub fn new(handler: impl Fn(T) -> R + Send + Sync + 'static) -> Self {
        Self(Arc::new(handler))
    }

    /// Runs the closure with `value`.
    pub fn call(&self, value: T) -> R {
        (self.0)(value)
    }
}

impl<T, R, F: Fn(T) -> R + Send + Sync + 'static> From<F> for CallbackWith<T, R> {
    fn from(handler: F) -> Self {
        Self::new(handler)
    }
}

// Derived `Clone` would demand `T: Clone` and `R: Clone`.
impl<T, R> Clone for CallbackWith<T, R> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T, R> PartialEq for CallbackWith<T, R> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T, R> Eq for CallbackWith<T, R> {}

impl<T, R> fmt::Debug for CallbackWith<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CallbackWith({:p})", Arc::as_ptr(&self.0).cast::<()>())
    }
}
