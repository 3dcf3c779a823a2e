use std::fmt;
use std::sync::Mutex;

use crate::sync::lock;

type Release = Box<dyn FnOnce() + Send>;

/// Handle to a registered listener.
///
/// Dropping the handle unregisters the listener. Use [`Subscription::detach`]
/// to keep the listener for as long as its source lives.
#[must_use = "dropping a `Subscription` unregisters its listener immediately"]
pub struct Subscription {
    release: Mutex<Option<Release>>,
}

impl Subscription {
    pub(crate) fn new<F>(release: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            release: Mutex::new(Some(Box::new(release))),
        }
    }

    /// A subscription that is already inactive.
    pub fn empty() -> Self {
        Self {
            release: Mutex::new(None),
        }
    }

    /// Unregisters the listener. Calling it again is a no-op.
    pub fn unsubscribe(&self) {
        let release = lock(&self.release).take();
        if let Some(release) = release {
            release();
        }
    }

    /// Whether the listener is still registered through this handle.
    pub fn is_active(&self) -> bool {
        lock(&self.release).is_some()
    }

    /// Gives up the handle without unregistering the listener.
    pub fn detach(self) {
        lock(&self.release).take();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
