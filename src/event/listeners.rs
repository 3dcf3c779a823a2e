use std::sync::{Arc, Mutex};

use crate::error::{Result, StoreError};
use crate::event::Subscription;
use crate::sync::lock;

struct Slots<F: ?Sized> {
    next_id: u64,
    entries: Vec<(u64, Arc<F>)>,
}

/// Ordered list of listeners of one kind.
///
/// `F` is the unsized callback type, e.g. `dyn Fn() + Send + Sync`.
pub(crate) struct ListenerList<F: ?Sized> {
    slots: Arc<Mutex<Slots<F>>>,
}

impl<F: ?Sized + Send + Sync + 'static> ListenerList<F> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Arc::new(Mutex::new(Slots {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// Registers a shared listener, rejecting an `Arc` that is already present.
    pub(crate) fn add(&self, listener: Arc<F>) -> Result<Subscription> {
        let mut slots = lock(&self.slots);
        if slots
            .entries
            .iter()
            .any(|(_, existing)| same_listener(existing, &listener))
        {
            return Err(StoreError::DuplicateListener);
        }
        let id = Self::push(&mut slots, listener);
        drop(slots);
        Ok(self.subscription(id))
    }

    /// Registers a listener that was created by the caller just now.
    ///
    /// A freshly allocated `Arc` cannot collide with a registered one.
    pub(crate) fn add_fresh(&self, listener: Arc<F>) -> Subscription {
        let id = Self::push(&mut lock(&self.slots), listener);
        self.subscription(id)
    }

    /// Copies the current listeners so they can be called without holding the lock.
    pub(crate) fn snapshot(&self) -> Vec<Arc<F>> {
        lock(&self.slots)
            .entries
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }

    pub(crate) fn clear(&self) {
        let removed = std::mem::take(&mut lock(&self.slots).entries);
        drop(removed);
    }

    pub(crate) fn len(&self) -> usize {
        lock(&self.slots).entries.len()
    }

    fn push(slots: &mut Slots<F>, listener: Arc<F>) -> u64 {
        let id = slots.next_id;
        slots.next_id += 1;
        slots.entries.push((id, listener));
        id
    }

    fn subscription(&self, id: u64) -> Subscription {
        let slots = Arc::downgrade(&self.slots);
        Subscription::new(move || {
            let Some(slots) = slots.upgrade() else {
                return;
            };
            let removed = {
                let mut slots = lock(&slots);
                let pos = slots.entries.iter().position(|(entry, _)| *entry == id);
                pos.map(|pos| slots.entries.remove(pos))
            };
            // Listener captures may own subscriptions to this same list.
            drop(removed);
        })
    }
}

impl<F: ?Sized + Send + Sync + 'static> Default for ListenerList<F> {
    fn default() -> Self {
        Self::new()
    }
}

fn same_listener<F: ?Sized>(a: &Arc<F>, b: &Arc<F>) -> bool {
    Arc::as_ptr(a).cast::<()>() == Arc::as_ptr(b).cast::<()>()
}
