use std::fmt;

use crate::event::Subscription;
use crate::select::{Source, Subject};
use crate::signal::Signal;
use crate::store::{Store, StoreEvent, StoreState};

/// A signal kept in sync with a projection of a store.
///
/// Dropping it releases the store listener; the signal itself stays readable.
pub struct Selected<T> {
    signal: Signal<T>,
    subscription: Subscription,
}

impl<T: Clone + Send + Sync + 'static> Selected<T> {
    pub fn get(&self) -> T {
        self.signal.get()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.signal.with(f)
    }

    /// The underlying signal, e.g. to read it from an effect or memo.
    pub fn signal(&self) -> Signal<T> {
        self.signal.clone()
    }

    /// Stop following the store.
    pub fn release(&self) {
        self.subscription.unsubscribe();
    }
}

impl<T: fmt::Debug> fmt::Debug for Selected<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selected")
            .field("signal", &self.signal)
            .field("active", &self.subscription.is_active())
            .finish()
    }
}

/// Project a store into a signal.
///
/// The signal starts at `initial_value`; `computation` is not run until the
/// first `update`. After that every `update` recomputes and sets the signal,
/// whether or not the result changed.
///
/// ```
/// use unistate::{select, Registry, Store, StoreOptions};
///
/// let store = Store::with_options(StoreOptions::new(vec![1, 2]).registry(Registry::new()));
/// let len = select(&store, 0, |items: &Vec<i32>| items.len());
/// assert_eq!(len.get(), 0);
///
/// store.update(|mut items| {
///     items.push(3);
///     items
/// });
/// assert_eq!(len.get(), 3);
/// ```
pub fn select<S, T, F>(store: &Store<S>, initial_value: T, computation: F) -> Selected<T>
where
    S: StoreState,
    T: Clone + Send + Sync + 'static,
    F: Fn(&S) -> T + Send + Sync + 'static,
{
    let signal = Signal::new(initial_value);
    let target = signal.clone();
    let source = store.downgrade();

    let subscription = store.on(StoreEvent::Update, move || {
        if let Some(store) = source.upgrade() {
            target.set(computation(&store.state()));
        }
    });

    Selected {
        signal,
        subscription,
    }
}

/// A replaying stream of a store projection.
///
/// Dropping it releases the store listener and completes the stream.
pub struct SelectStream<T: Clone + Send + Sync + 'static> {
    subject: Subject<T>,
    subscription: Subscription,
}

impl<T: Clone + Send + Sync + 'static> SelectStream<T> {
    /// The last computed value, if the store has updated at least once.
    pub fn latest(&self) -> Option<T> {
        self.subject.latest()
    }

    /// Stop following the store and complete the stream.
    pub fn release(&self) {
        self.subscription.unsubscribe();
        self.subject.complete();
    }
}

impl<T: Clone + Send + Sync + 'static> Source<T> for SelectStream<T> {
    fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.subject.subscribe(observer)
    }
}

impl<T: Clone + Send + Sync + 'static> Drop for SelectStream<T> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T: Clone + Send + Sync + 'static> fmt::Debug for SelectStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectStream")
            .field("subject", &self.subject)
            .field("active", &self.subscription.is_active())
            .finish()
    }
}

/// Project a store into a stream that replays its latest value.
///
/// Nothing is emitted until the store's first `update`.
pub fn select_stream<S, T, F>(store: &Store<S>, computation: F) -> SelectStream<T>
where
    S: StoreState,
    T: Clone + Send + Sync + 'static,
    F: Fn(&S) -> T + Send + Sync + 'static,
{
    let subject = Subject::replay(1);
    let target = subject.clone();
    let source = store.downgrade();

    let subscription = store.on(StoreEvent::Update, move || {
        if let Some(store) = source.upgrade() {
            target.next(computation(&store.state()));
        }
    });

    SelectStream {
        subject,
        subscription,
    }
}
