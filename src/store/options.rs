use crate::registry::Registry;

/// Construction options for a [`Store`](crate::Store).
///
/// # Example
/// ```
/// use unistate::{Registry, Store, StoreOptions};
///
/// let registry = Registry::new();
/// let store = Store::with_options(
///     StoreOptions::new(0_u32).name("Counter").registry(registry.clone()),
/// );
///
/// assert_eq!(store.name(), "Counter");
/// assert!(registry.get(store.uid()).is_some());
/// ```
#[derive(Debug, Clone)]
pub struct StoreOptions<S> {
    pub(crate) initial_state: S,
    pub(crate) name: Option<String>,
    pub(crate) registry: Option<Registry>,
}

impl<S> StoreOptions<S> {
    pub fn new(initial_state: S) -> Self {
        Self {
            initial_state,
            name: None,
            registry: None,
        }
    }

    /// Display name used in snapshots and devtools actions.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Name the store after `T`, typically the wrapper type that owns it.
    pub fn name_from_type<T: ?Sized>(self) -> Self {
        self.name(short_type_name::<T>())
    }

    /// Registry to join instead of [`Registry::global`].
    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = Some(registry);
        self
    }
}

/// `a::b::Store<c::State>` -> `Store`.
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CounterStore;

    #[test]
    fn short_names_strip_path_and_generics() {
        assert_eq!(short_type_name::<CounterStore>(), "CounterStore");
        assert_eq!(short_type_name::<Vec<String>>(), "Vec");
        assert_eq!(short_type_name::<u8>(), "u8");
    }

    #[test]
    fn name_from_type() {
        let options = StoreOptions::new(()).name_from_type::<CounterStore>();
        assert_eq!(options.name.as_deref(), Some("CounterStore"));
    }
}
