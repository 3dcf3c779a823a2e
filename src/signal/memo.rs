use std::sync::{Arc, RwLock};

use crate::runtime::ReactiveRuntime;
use crate::sync::{read, write};

/// A memoized computed value that automatically tracks dependencies.
///
/// The computation runs lazily on the first read after one of the values it
/// read has changed.
#[derive(Clone)]
pub struct Memo<T> {
    cached_value: Arc<RwLock<Option<T>>>,
    compute: Arc<dyn Fn() -> T + Send + Sync>,
    runtime: Arc<ReactiveRuntime>,
    id: usize,
}

impl<T: Clone + Send + Sync + 'static> Memo<T> {
    /// Create a new memo with the given computation function.
    pub fn new<F>(compute: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        let runtime = ReactiveRuntime::current();
        let id = runtime.next_id();
        runtime.register_memo(id);

        Self {
            cached_value: Arc::new(RwLock::new(None)),
            compute: Arc::new(compute),
            runtime,
            id,
        }
    }

    /// Get the current value, recomputing if necessary.
    pub fn get(&self) -> T {
        self.runtime.track_read(self.id);

        if !self.runtime.is_memo_dirty(self.id) {
            if let Some(value) = read(&self.cached_value).as_ref() {
                return value.clone();
            }
        }

        let value = self.runtime.with_observer(self.id, || (self.compute)());
        *write(&self.cached_value) = Some(value.clone());
        self.runtime.mark_memo_clean(self.id);
        value
    }

    /// Read the memoized value with a function.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let value = self.get();
        f(&value)
    }
}

impl<T> Drop for Memo<T> {
    fn drop(&mut self) {
        // Clones share the id; only the last handle unregisters it.
        if Arc::strong_count(&self.compute) == 1 {
            self.runtime.remove_observer(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Signal;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn memo_basic() {
        ReactiveRuntime::scope(|| {
            let count = Signal::new(5);
            let doubled = Memo::new({
                let count = count.clone();
                move || count.get() * 2
            });

            assert_eq!(doubled.get(), 10);

            count.set(10);
            assert_eq!(doubled.get(), 20);
        });
    }

    #[test]
    fn memo_caches_until_dirty() {
        ReactiveRuntime::scope(|| {
            let runs = Arc::new(AtomicUsize::new(0));
            let source = Signal::new(1);
            let memo = Memo::new({
                let source = source.clone();
                let runs = runs.clone();
                move || {
                    runs.fetch_add(1, Ordering::SeqCst);
                    source.get() + 1
                }
            });

            assert_eq!(memo.get(), 2);
            assert_eq!(memo.get(), 2);
            assert_eq!(runs.load(Ordering::SeqCst), 1);

            source.set(3);
            assert_eq!(memo.with(|v| *v), 4);
            assert_eq!(runs.load(Ordering::SeqCst), 2);
        });
    }
}
