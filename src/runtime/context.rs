use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use crate::sync::lock;

type Observer = Arc<dyn Fn() + Send + Sync>;

/// Dependency graph between signals, memos and effects.
#[derive(Default)]
struct ReactiveGraph {
    current_observer: Option<usize>,
    // signal or memo id -> observers that read it
    dependencies: HashMap<usize, HashSet<usize>>,
    // observer id -> signal or memo ids it read
    observer_deps: HashMap<usize, HashSet<usize>>,
    // effect id -> effect body
    observers: HashMap<usize, Observer>,
    // memo id -> dirty flag
    memo_dirty: HashMap<usize, bool>,
}

impl ReactiveGraph {
    fn unlink(&mut self, observer_id: usize) {
        if let Some(old_deps) = self.observer_deps.remove(&observer_id) {
            for source_id in old_deps {
                if let Some(deps) = self.dependencies.get_mut(&source_id) {
                    deps.remove(&observer_id);
                }
            }
        }
    }
}

/// Reactive runtime for signals, memos and effects.
///
/// Supports a global runtime (default) and scoped runtimes for isolation.
/// The graph lock is never held while effect bodies or memo computations run,
/// so they are free to read and write other reactive values.
///
/// # Examples
///
/// Using the default global runtime:
///
/// ```
/// use unistate::Signal;
///
/// let signal = Signal::new(42);
/// assert_eq!(signal.get(), 42);
/// ```
///
/// Using scoped runtimes for isolation:
///
/// ```
/// use unistate::runtime::ReactiveRuntime;
/// use unistate::Signal;
///
/// ReactiveRuntime::scope(|| {
///     let signal = Signal::new(0);
///     assert_eq!(signal.get(), 0);
/// });
/// ```
pub struct ReactiveRuntime {
    next_id: AtomicUsize,
    graph: Mutex<ReactiveGraph>,
}

thread_local! {
    static RUNTIME_STACK: RefCell<Vec<Arc<ReactiveRuntime>>> = const { RefCell::new(Vec::new()) };
}

impl ReactiveRuntime {
    fn new() -> Arc<Self> {
        Arc::new(ReactiveRuntime {
            next_id: AtomicUsize::new(0),
            graph: Mutex::new(ReactiveGraph::default()),
        })
    }

    /// Run a function with a fresh isolated runtime.
    ///
    /// Primitives created inside `f` keep a handle to this runtime, so they
    /// stay reactive among themselves after the scope returns.
    pub fn scope<F, R>(f: F) -> R
    where
        F: FnOnce() -> R,
    {
        Self::with_runtime(Self::new(), f)
    }

    /// Get or create the global runtime.
    pub fn global() -> Arc<Self> {
        static RUNTIME: OnceLock<Arc<ReactiveRuntime>> = OnceLock::new();
        Arc::clone(RUNTIME.get_or_init(Self::new))
    }

    /// The innermost scoped runtime of this thread, or the global one.
    pub fn current() -> Arc<Self> {
        RUNTIME_STACK.with(|stack| stack.borrow().last().cloned().unwrap_or_else(Self::global))
    }

    /// Run a function with a specific runtime as the current context.
    pub fn with_runtime<F, R>(runtime: Arc<Self>, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        RUNTIME_STACK.with(|stack| stack.borrow_mut().push(runtime));

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));

        RUNTIME_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });

        match result {
            Ok(r) => r,
            Err(e) => std::panic::resume_unwind(e),
        }
    }

    /// Number of live effects registered with this runtime.
    pub fn observer_count(&self) -> usize {
        lock(&self.graph).observers.len()
    }

    pub(crate) fn next_id(&self) -> usize {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Record that the current observer read `source_id`.
    pub(crate) fn track_read(&self, source_id: usize) {
        let mut graph = lock(&self.graph);
        if let Some(observer) = graph.current_observer {
            if observer == source_id {
                return;
            }
            graph.dependencies.entry(source_id).or_default().insert(observer);
            graph.observer_deps.entry(observer).or_default().insert(source_id);
        }
    }

    /// Notify every observer of `source_id` that it changed.
    pub(crate) fn notify_observers(&self, source_id: usize) {
        let observers: Vec<usize> = lock(&self.graph)
            .dependencies
            .get(&source_id)
            .map(|obs| obs.iter().copied().collect())
            .unwrap_or_default();

        for observer_id in observers {
            self.mark_observer_dirty(observer_id);
        }
    }

    /// Mark a memo dirty (propagating to its dependents) or run an effect.
    fn mark_observer_dirty(&self, observer_id: usize) {
        let mut graph = lock(&self.graph);

        if let Some(dirty) = graph.memo_dirty.get_mut(&observer_id) {
            if *dirty {
                return;
            }
            *dirty = true;
            let dependents: Vec<usize> = graph
                .dependencies
                .get(&observer_id)
                .map(|deps| deps.iter().copied().collect())
                .unwrap_or_default();
            drop(graph);

            for dependent_id in dependents {
                self.mark_observer_dirty(dependent_id);
            }
            return;
        }

        let effect = graph.observers.get(&observer_id).cloned();
        drop(graph);

        if let Some(effect) = effect {
            self.with_observer(observer_id, || effect());
        }
    }

    /// Register an effect body, dropping whatever it tracked before.
    pub(crate) fn register_observer(&self, observer_id: usize, effect: Observer) {
        let replaced = {
            let mut graph = lock(&self.graph);
            graph.unlink(observer_id);
            graph.observers.insert(observer_id, effect)
        };
        // Effect bodies own memos whose drop re-enters the graph.
        drop(replaced);
    }

    /// Forget an effect or memo and all of its edges.
    pub(crate) fn remove_observer(&self, observer_id: usize) {
        let removed = {
            let mut graph = lock(&self.graph);
            graph.memo_dirty.remove(&observer_id);
            graph.dependencies.remove(&observer_id);
            graph.unlink(observer_id);
            graph.observers.remove(&observer_id)
        };
        drop(removed);
    }

    /// Run `f` with `observer_id` as the observer collecting reads.
    pub(crate) fn with_observer<F, R>(&self, observer_id: usize, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let prev = lock(&self.graph).current_observer.replace(observer_id);
        let result = f();
        lock(&self.graph).current_observer = prev;
        result
    }

    pub(crate) fn register_memo(&self, memo_id: usize) {
        lock(&self.graph).memo_dirty.insert(memo_id, true);
    }

    pub(crate) fn is_memo_dirty(&self, memo_id: usize) -> bool {
        lock(&self.graph).memo_dirty.get(&memo_id).copied().unwrap_or(true)
    }

    pub(crate) fn mark_memo_clean(&self, memo_id: usize) {
        lock(&self.graph).memo_dirty.insert(memo_id, false);
    }
}
