use std::any::Any;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::event::Subscription;
use crate::select::Source;
use crate::signal::{Effect, Memo};
use crate::store::{Store, StoreState};
use crate::sync::lock;

/// Write-back state of a [`Connection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Propagation {
    /// No write-back in progress.
    #[default]
    Idle,
    /// The connection is writing into its store; nested write-backs are ignored.
    Propagating,
}

#[derive(Default)]
struct PropagationGuard {
    state: Mutex<Propagation>,
}

impl PropagationGuard {
    /// Runs `write` unless a write-back is already in progress.
    fn propagate(&self, write: impl FnOnce()) -> bool {
        {
            let mut state = lock(&self.state);
            if *state == Propagation::Propagating {
                return false;
            }
            *state = Propagation::Propagating;
        }

        let _idle = BackToIdle(&self.state);
        write();
        true
    }

    fn state(&self) -> Propagation {
        *lock(&self.state)
    }
}

struct BackToIdle<'a>(&'a Mutex<Propagation>);

impl Drop for BackToIdle<'_> {
    fn drop(&mut self) {
        *lock(self.0) = Propagation::Idle;
    }
}

enum Binding {
    Effect(Effect),
    Stream {
        subscription: Subscription,
        _source: Box<dyn Any + Send + Sync>,
    },
}

/// A live binding that writes into a store.
///
/// Dropping it stops the binding.
pub struct Connection {
    binding: Binding,
    guard: Arc<PropagationGuard>,
}

impl Connection {
    pub fn propagation(&self) -> Propagation {
        self.guard.state()
    }

    /// Stop the binding now.
    pub fn disconnect(self) {
        if let Binding::Stream { subscription, .. } = &self.binding {
            subscription.unsubscribe();
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.binding {
            Binding::Effect(_) => "effect",
            Binding::Stream { .. } => "stream",
        };
        f.debug_struct("Connection")
            .field("kind", &kind)
            .field("propagation", &self.propagation())
            .finish()
    }
}

/// Keep a store in sync with the signals read by `connect_fn`.
///
/// `connect_fn` receives the current state and returns the state to write.
/// It runs once immediately and again whenever a signal or memo it read
/// changes. A write-back that would be triggered by the connection's own write
/// is ignored.
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use unistate::{connect, Registry, Signal, Store, StoreOptions};
///
/// #[derive(Clone, Serialize, Deserialize)]
/// struct Query {
///     term: String,
/// }
///
/// let term = Signal::new(String::from("rust"));
/// let store = Store::with_options(
///     StoreOptions::new(Query { term: String::new() }).registry(Registry::new()),
/// );
///
/// let _connection = connect(&store, {
///     let term = term.clone();
///     move |mut query: Query| {
///         query.term = term.get();
///         query
///     }
/// });
/// assert_eq!(store.state().term, "rust");
///
/// term.set(String::from("serde"));
/// assert_eq!(store.state().term, "serde");
/// ```
pub fn connect<S, F>(store: &Store<S>, connect_fn: F) -> Connection
where
    S: StoreState,
    F: Fn(S) -> S + Send + Sync + 'static,
{
    let target = store.downgrade();
    let guard = Arc::new(PropagationGuard::default());

    let computed = Memo::new({
        let target = target.clone();
        move || target.upgrade().map(|store| connect_fn(store.state()))
    });

    let effect = Effect::new({
        let guard = guard.clone();
        move || {
            // Read before checking the guard so the memo is clean again and
            // keeps reporting changes.
            let Some(next) = computed.get() else {
                return;
            };
            let Some(store) = target.upgrade() else {
                return;
            };
            guard.propagate(|| store.set(next));
        }
    });

    Connection {
        binding: Binding::Effect(effect),
        guard,
    }
}

/// Feed every value of the source built by `connect_fn` into the store.
///
/// `connect_fn` receives the current state once. The connection keeps the
/// source alive; values that arrive while the connection is already writing
/// are ignored.
pub fn connect_stream<S, O, F>(store: &Store<S>, connect_fn: F) -> Connection
where
    S: StoreState,
    O: Source<S> + Send + Sync + 'static,
    F: FnOnce(S) -> O,
{
    let source = connect_fn(store.state());
    let target = store.downgrade();
    let guard = Arc::new(PropagationGuard::default());

    let subscription = source.subscribe({
        let guard = guard.clone();
        move |state: &S| {
            if let Some(store) = target.upgrade() {
                guard.propagate(|| store.set(state.clone()));
            }
        }
    });

    Connection {
        binding: Binding::Stream {
            subscription,
            _source: Box::new(source),
        },
        guard,
    }
}
