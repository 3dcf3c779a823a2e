use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events a store emits to its own listeners.
///
/// Listeners receive no payload; they re-read the store state themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreEvent {
    /// The state was replaced through `update` or `set`.
    Update,
    /// The state was put back to the initial state.
    Reset,
    /// The store is being destroyed.
    Destroy,
}

impl StoreEvent {
    /// Every event kind, in declaration order.
    pub const ALL: [StoreEvent; 3] = [StoreEvent::Update, StoreEvent::Reset, StoreEvent::Destroy];

    pub fn as_str(&self) -> &'static str {
        match self {
            StoreEvent::Update => "update",
            StoreEvent::Reset => "reset",
            StoreEvent::Destroy => "destroy",
        }
    }
}

impl fmt::Display for StoreEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Randomly generated identity of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreId(Uuid);

impl StoreId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_names() {
        let names: Vec<_> = StoreEvent::ALL.iter().map(StoreEvent::to_string).collect();
        assert_eq!(names, ["update", "reset", "destroy"]);
        assert_eq!(serde_json::to_string(&StoreEvent::Reset).unwrap(), "\"reset\"");
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(StoreId::new(), StoreId::new());
    }
}
