use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::event::{ListenerList, Subscription};
use crate::sync::lock;

/// Something that pushes values to subscribers.
pub trait Source<T> {
    /// Register `observer`; dropping the returned handle stops delivery.
    fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static;
}

struct Buffer<T> {
    values: VecDeque<T>,
    capacity: usize,
    completed: bool,
}

struct SubjectInner<T> {
    buffer: Mutex<Buffer<T>>,
    observers: ListenerList<dyn Fn(&T) + Send + Sync>,
}

/// Synchronous multicast stream.
///
/// A replaying subject keeps the last `depth` values and hands them to every
/// new subscriber before any live value. Values pushed after
/// [`Subject::complete`] are dropped.
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use unistate::{Source, Subject};
///
/// let subject = Subject::replay(1);
/// subject.next(1);
/// subject.next(2);
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = seen.clone();
/// let _sub = subject.subscribe(move |v: &i32| sink.lock().unwrap().push(*v));
/// subject.next(3);
///
/// assert_eq!(*seen.lock().unwrap(), vec![2, 3]);
/// ```
pub struct Subject<T> {
    inner: Arc<SubjectInner<T>>,
}

impl<T: Clone + Send + Sync + 'static> Subject<T> {
    /// A subject without replay.
    pub fn new() -> Self {
        Self::replay(0)
    }

    /// A subject that replays the last `depth` values to late subscribers.
    pub fn replay(depth: usize) -> Self {
        Self {
            inner: Arc::new(SubjectInner {
                buffer: Mutex::new(Buffer {
                    values: VecDeque::with_capacity(depth),
                    capacity: depth,
                    completed: false,
                }),
                observers: ListenerList::new(),
            }),
        }
    }

    /// Push a value to every subscriber.
    pub fn next(&self, value: T) {
        {
            let mut buffer = lock(&self.inner.buffer);
            if buffer.completed {
                return;
            }
            if buffer.capacity > 0 {
                if buffer.values.len() == buffer.capacity {
                    buffer.values.pop_front();
                }
                buffer.values.push_back(value.clone());
            }
        }

        for observer in self.inner.observers.snapshot() {
            observer(&value);
        }
    }

    /// Stop the stream and drop every subscriber.
    pub fn complete(&self) {
        lock(&self.inner.buffer).completed = true;
        self.inner.observers.clear();
    }

    pub fn is_completed(&self) -> bool {
        lock(&self.inner.buffer).completed
    }

    /// The most recent buffered value.
    pub fn latest(&self) -> Option<T> {
        lock(&self.inner.buffer).values.back().cloned()
    }

    pub fn observer_count(&self) -> usize {
        self.inner.observers.len()
    }
}

impl<T: Clone + Send + Sync + 'static> Source<T> for Subject<T> {
    fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let (replayed, completed) = {
            let buffer = lock(&self.inner.buffer);
            (buffer.values.iter().cloned().collect::<Vec<_>>(), buffer.completed)
        };

        for value in &replayed {
            observer(value);
        }
        if completed {
            return Subscription::empty();
        }
        self.inner.observers.add_fresh(Arc::new(observer))
    }
}

impl<T: Clone + Send + Sync + 'static> Default for Subject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Subject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let buffer = lock(&self.inner.buffer);
        f.debug_struct("Subject")
            .field("buffered", &buffer.values.len())
            .field("capacity", &buffer.capacity)
            .field("completed", &buffer.completed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect<T: Clone + Send + Sync + 'static>(subject: &Subject<T>) -> (Subscription, Arc<Mutex<Vec<T>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let sub = subject.subscribe(move |value: &T| lock(&sink).push(value.clone()));
        (sub, seen)
    }

    #[test]
    fn plain_subject_does_not_replay() {
        let subject = Subject::new();
        subject.next(1);
        let (_sub, seen) = collect(&subject);
        subject.next(2);
        assert_eq!(*lock(&seen), vec![2]);
        assert_eq!(subject.latest(), None);
    }

    #[test]
    fn replay_depth_bounds_buffer() {
        let subject = Subject::replay(2);
        for v in 1..=4 {
            subject.next(v);
        }
        let (_sub, seen) = collect(&subject);
        assert_eq!(*lock(&seen), vec![3, 4]);
        assert_eq!(subject.latest(), Some(4));
    }

    #[test]
    fn complete_stops_delivery_but_still_replays() {
        let subject = Subject::replay(1);
        let (_live, live) = collect(&subject);
        subject.next("a");
        subject.complete();
        subject.next("b");

        assert_eq!(*lock(&live), vec!["a"]);
        assert!(subject.is_completed());
        assert_eq!(subject.observer_count(), 0);

        let (late_sub, late) = collect(&subject);
        assert_eq!(*lock(&late), vec!["a"]);
        assert!(!late_sub.is_active());
    }

    #[test]
    fn dropped_subscription_stops_delivery() {
        let subject = Subject::new();
        let (sub, seen) = collect(&subject);
        subject.next(1);
        drop(sub);
        subject.next(2);
        assert_eq!(*lock(&seen), vec![1]);
    }
}
