use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::event::Subscription;
use crate::registry::{Registry, RegistryAction};
use crate::store::{StoreEvent, StoreId, StoreRef};
use crate::sync::lock;

/// Severity of a logger line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Info,
    Warn,
}

impl LogLevel {
    pub fn log(self, message: &str) {
        match self {
            LogLevel::Info => info!("{message}"),
            LogLevel::Warn => warn!("{message}"),
        }
    }
}

struct Tracked {
    subscriptions: Mutex<HashMap<StoreId, Subscription>>,
}

impl Tracked {
    fn attach(self: &Arc<Self>, store: &StoreRef) {
        LogLevel::Info.log(&format!("[{}] - Added to registry", store.name()));

        let target = Arc::downgrade(store);
        let subscription = store.on(
            StoreEvent::Update,
            Box::new(move || {
                let Some(store) = target.upgrade() else {
                    return;
                };
                match store.state_value() {
                    Ok(state) => info!(state = %state, "[{}] - UPDATE", store.name()),
                    Err(err) => warn!(error = %err, "[{}] - UPDATE", store.name()),
                }
            }),
        );
        let replaced = lock(&self.subscriptions).insert(*store.uid(), subscription);
        drop(replaced);
    }

    fn detach(&self, uid: &StoreId, name: &str) {
        let subscription = lock(&self.subscriptions).remove(uid);
        drop(subscription);
        LogLevel::Info.log(&format!("[{name}] - Removed from registry"));
    }
}

/// Logs registry and store activity through `tracing`.
///
/// Not meant for production: every update serializes the whole state.
pub struct StoreLogger {
    tracked: Arc<Tracked>,
    _registry_subscription: Subscription,
}

impl StoreLogger {
    pub fn new(registry: &Registry) -> Self {
        LogLevel::Warn.log("the store logger has a performance impact and should not be used in production");

        let tracked = Arc::new(Tracked {
            subscriptions: Mutex::new(HashMap::new()),
        });
        for store in registry.stores() {
            tracked.attach(&store);
        }

        let weak = Arc::downgrade(&tracked);
        let registry_subscription = registry.on(move |event| {
            let Some(tracked) = weak.upgrade() else {
                return;
            };
            match (event.action, &event.store) {
                (RegistryAction::Add, Some(store)) => tracked.attach(store),
                (RegistryAction::Add, None) => {}
                (RegistryAction::Remove, _) => tracked.detach(&event.uid, &event.name),
            }
        });

        Self {
            tracked,
            _registry_subscription: registry_subscription,
        }
    }

    /// Number of stores currently logged.
    pub fn tracked_stores(&self) -> usize {
        lock(&self.tracked.subscriptions).len()
    }
}

/// Start logging the global registry.
pub fn run_logger() -> StoreLogger {
    StoreLogger::new(&Registry::global())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Store, StoreOptions};
    use tracing_test::traced_test;

    fn counter(registry: &Registry, name: &str) -> Store<i64> {
        Store::with_options(StoreOptions::new(0).name(name).registry(registry.clone()))
    }

    #[test]
    #[traced_test]
    fn logs_store_lifecycle() {
        let registry = Registry::new();
        let early = counter(&registry, "Early");
        let logger = StoreLogger::new(&registry);

        assert!(logs_contain("performance impact"));
        assert!(logs_contain("[Early] - Added to registry"));

        let late = counter(&registry, "Late");
        late.set(42);
        assert!(logs_contain("[Late] - Added to registry"));
        assert!(logs_contain("[Late] - UPDATE"));
        assert!(logs_contain("state=42"));
        assert_eq!(logger.tracked_stores(), 2);

        early.destroy();
        assert!(logs_contain("[Early] - Removed from registry"));
        assert_eq!(logger.tracked_stores(), 1);
    }

    #[test]
    #[traced_test]
    fn dropped_logger_stops_listening() {
        let registry = Registry::new();
        let store = counter(&registry, "Quiet");
        let logger = StoreLogger::new(&registry);
        assert_eq!(store.listener_count(StoreEvent::Update), 1);

        drop(logger);
        assert_eq!(store.listener_count(StoreEvent::Update), 0);
        store.set(7);
        assert!(!logs_contain("[Quiet] - UPDATE"));
    }

    #[test]
    #[traced_test]
    fn dropped_store_is_logged_as_removed() {
        let registry = Registry::new();
        let logger = StoreLogger::new(&registry);

        for i in 0..5 {
            let _store = counter(&registry, &format!("Temp{i}"));
        }

        assert_eq!(logger.tracked_stores(), 0);
        assert!(logs_contain("[Temp4] - Removed from registry"));
    }

    #[test]
    fn log_level_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&LogLevel::Warn).unwrap(), "\"WARN\"");
    }
}
