use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use tracing::{debug, warn};

use crate::devtools::{
    DevtoolsAction, DevtoolsConfig, DevtoolsConnection, DevtoolsExtension, DevtoolsMessage,
    DispatchKind,
};
use crate::error::Result;
use crate::event::Subscription;
use crate::registry::{Registry, RegistryAction, Snapshot};
use crate::store::{StoreEvent, StoreId, StoreRef};
use crate::sync::lock;

struct Shared {
    registry: Registry,
    connection: Arc<dyn DevtoolsConnection>,
    config: DevtoolsConfig,
    subscriptions: Mutex<HashMap<StoreId, Vec<Subscription>>>,
    // Store being changed by a debugger command; its next report is the echo.
    applying: Mutex<Option<StoreId>>,
}

impl Shared {
    fn snapshot(&self) -> Option<Snapshot> {
        match self.registry.snapshot() {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                warn!(error = %err, label = err.as_label(), "devtools snapshot failed");
                None
            }
        }
    }

    fn send(&self, action: &str) {
        if let Some(snapshot) = self.snapshot() {
            if self.config.log {
                debug!(action, "devtools action sent");
            }
            self.connection.send(action, &snapshot);
        }
    }

    fn init(&self) {
        if let Some(snapshot) = self.snapshot() {
            self.connection.init(&snapshot);
        }
    }

    fn attach(self: &Arc<Self>, store: &StoreRef) {
        let subscriptions = [
            (StoreEvent::Update, DevtoolsAction::Update),
            (StoreEvent::Reset, DevtoolsAction::Reset),
        ]
        .into_iter()
        .map(|(event, action)| {
            let shared = Arc::downgrade(self);
            let uid = *store.uid();
            let label = action.label(store.name());
            store.on(event, Box::new(move || Shared::report(&shared, &uid, &label)))
        })
        .collect();

        let replaced = lock(&self.subscriptions).insert(*store.uid(), subscriptions);
        drop(replaced);
        self.send(&DevtoolsAction::Init.label(store.name()));
    }

    fn detach(&self, uid: &StoreId, name: &str) {
        let subscriptions = lock(&self.subscriptions).remove(uid);
        drop(subscriptions);
        self.send(&DevtoolsAction::Remove.label(name));
    }

    fn report(shared: &Weak<Shared>, uid: &StoreId, label: &str) {
        let Some(shared) = shared.upgrade() else {
            return;
        };
        {
            let mut applying = lock(&shared.applying);
            if applying.as_ref() == Some(uid) {
                *applying = None;
                return;
            }
        }
        shared.send(label);
    }

    /// Apply a debugger-issued change to `store` without reporting it back.
    ///
    /// Only the first report of that very store is swallowed; changes it
    /// cascades into other stores are still sent.
    fn silently<R>(&self, store: &StoreRef, change: impl FnOnce() -> R) -> R {
        *lock(&self.applying) = Some(*store.uid());
        let result = change();
        *lock(&self.applying) = None;
        result
    }

    fn restore(&self, raw: &str) -> Result<()> {
        let snapshot: Snapshot = serde_json::from_str(raw)?;
        for store in self.registry.stores() {
            if let Some(value) = snapshot.get(store.name()) {
                self.silently(&store, || store.restore_value(value.clone()))?;
            }
        }
        Ok(())
    }
}

/// Bridge between a registry and a Redux-DevTools style debugger.
///
/// Every store in the registry is reported as `[<name>] - @Init` when it is
/// attached, `[<name>] - @Update` / `@Reset` on change and `[<name>] - @Remove`
/// when it leaves, each time together with the full registry snapshot.
/// Dropping the bridge detaches it from the registry and every store.
pub struct DevTools {
    shared: Arc<Shared>,
    registry_subscription: Subscription,
}

impl DevTools {
    /// Attach to `registry`, including the stores it already holds.
    pub fn new(connection: Arc<dyn DevtoolsConnection>, config: DevtoolsConfig, registry: Registry) -> Self {
        let shared = Arc::new(Shared {
            registry: registry.clone(),
            connection,
            config,
            subscriptions: Mutex::new(HashMap::new()),
            applying: Mutex::new(None),
        });

        for store in registry.stores() {
            shared.attach(&store);
        }

        let weak = Arc::downgrade(&shared);
        let registry_subscription = registry.on(move |event| {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            match (event.action, &event.store) {
                (RegistryAction::Add, Some(store)) => shared.attach(store),
                (RegistryAction::Add, None) => {}
                (RegistryAction::Remove, _) => shared.detach(&event.uid, &event.name),
            }
        });

        Self {
            shared,
            registry_subscription,
        }
    }

    /// Connect through `extension`, or warn and return `None` when there is none.
    pub fn try_connect(
        extension: Option<&dyn DevtoolsExtension>,
        config: DevtoolsConfig,
        registry: Registry,
    ) -> Option<Self> {
        let Some(extension) = extension else {
            warn!("the redux devtools extension was not detected; is it installed?");
            return None;
        };
        let connection = extension.connect(&config);
        Some(Self::new(connection, config, registry))
    }

    /// Report an arbitrary action with the current snapshot.
    pub fn send(&self, action: &str) {
        self.shared.send(action);
    }

    /// Apply a command coming from the debugger.
    pub fn handle_message(&self, message: DevtoolsMessage) -> Result<()> {
        let shared = &self.shared;
        match message {
            DevtoolsMessage::Start => shared.init(),
            DevtoolsMessage::Dispatch {
                payload: Some(payload),
                state,
            } => match payload.kind {
                DispatchKind::Commit => shared.init(),
                DispatchKind::Reset => {
                    for store in shared.registry.stores() {
                        shared.silently(&store, || store.reset());
                    }
                    shared.init();
                }
                DispatchKind::Rollback => {
                    if let Some(state) = state {
                        shared.restore(&state)?;
                    }
                    shared.init();
                }
                DispatchKind::JumpToState | DispatchKind::JumpToAction => {
                    if let Some(state) = state {
                        shared.restore(&state)?;
                    }
                }
                DispatchKind::Other => debug!(?payload, "ignoring devtools dispatch"),
            },
            DevtoolsMessage::Dispatch { payload: None, .. } | DevtoolsMessage::Other => {
                debug!("ignoring devtools message");
            }
        }
        Ok(())
    }

    /// Parse and apply a raw JSON message.
    pub fn handle_raw(&self, raw: &str) -> Result<()> {
        self.handle_message(DevtoolsMessage::parse(raw)?)
    }

    /// Number of stores currently mirrored.
    pub fn tracked_stores(&self) -> usize {
        lock(&self.shared.subscriptions).len()
    }

    pub fn disconnect(self) {
        self.registry_subscription.unsubscribe();
    }
}

/// Connect the global registry to `extension` with the default config.
pub fn init_devtools(extension: Option<&dyn DevtoolsExtension>) -> Option<DevTools> {
    DevTools::try_connect(extension, DevtoolsConfig::default(), Registry::global())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Store, StoreOptions};
    use serde_json::json;

    #[derive(Default)]
    struct Recorder {
        inits: Mutex<Vec<Snapshot>>,
        actions: Mutex<Vec<(String, Snapshot)>>,
    }

    impl DevtoolsConnection for Recorder {
        fn init(&self, snapshot: &Snapshot) {
            lock(&self.inits).push(snapshot.clone());
        }

        fn send(&self, action: &str, snapshot: &Snapshot) {
            lock(&self.actions).push((action.to_string(), snapshot.clone()));
        }
    }

    impl Recorder {
        fn labels(&self) -> Vec<String> {
            lock(&self.actions).iter().map(|(label, _)| label.clone()).collect()
        }
    }

    struct Extension(Arc<Recorder>);

    impl DevtoolsExtension for Extension {
        fn connect(&self, _config: &DevtoolsConfig) -> Arc<dyn DevtoolsConnection> {
            self.0.clone()
        }
    }

    fn bridge(registry: &Registry) -> (DevTools, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let devtools = DevTools::new(recorder.clone(), DevtoolsConfig::default(), registry.clone());
        (devtools, recorder)
    }

    fn counter(registry: &Registry, name: &str) -> Store<i64> {
        Store::with_options(StoreOptions::new(0).name(name).registry(registry.clone()))
    }

    #[test]
    fn mirrors_store_lifecycle() {
        let registry = Registry::new();
        let (devtools, recorder) = bridge(&registry);

        let store = counter(&registry, "Counter");
        store.set(3);
        store.reset();
        store.destroy();

        assert_eq!(
            recorder.labels(),
            vec![
                "[Counter] - @Init",
                "[Counter] - @Update",
                "[Counter] - @Reset",
                "[Counter] - @Remove",
            ]
        );
        let actions = lock(&recorder.actions);
        assert_eq!(actions[1].1, json!({ "Counter": 3 }).as_object().cloned().unwrap());
        assert!(actions[3].1.is_empty());
        assert_eq!(devtools.tracked_stores(), 0);
    }

    #[test]
    fn attaches_existing_stores() {
        let registry = Registry::new();
        let _store = counter(&registry, "Early");
        let (devtools, recorder) = bridge(&registry);

        assert_eq!(recorder.labels(), vec!["[Early] - @Init"]);
        assert_eq!(devtools.tracked_stores(), 1);
    }

    #[test]
    fn start_and_commit_send_init() {
        let registry = Registry::new();
        let _store = counter(&registry, "Counter");
        let (devtools, recorder) = bridge(&registry);

        devtools.handle_raw(r#"{"type":"START"}"#).unwrap();
        devtools
            .handle_raw(r#"{"type":"DISPATCH","payload":{"type":"COMMIT"}}"#)
            .unwrap();

        assert_eq!(lock(&recorder.inits).len(), 2);
        assert_eq!(lock(&recorder.inits)[0]["Counter"], 0);
    }

    #[test]
    fn time_travel_restores_without_echo() {
        let registry = Registry::new();
        let store = counter(&registry, "Counter");
        let other = counter(&registry, "Other");
        let (devtools, recorder) = bridge(&registry);
        store.set(5);

        devtools
            .handle_raw(r#"{"type":"DISPATCH","payload":{"type":"JUMP_TO_STATE"},"state":"{\"Counter\":2,\"Other\":9}"}"#)
            .unwrap();

        assert_eq!(store.state(), 2);
        assert_eq!(other.state(), 9);
        assert_eq!(
            recorder.labels(),
            vec!["[Counter] - @Init", "[Other] - @Init", "[Counter] - @Update"]
        );

        store.set(6);
        assert_eq!(recorder.labels().last().unwrap(), "[Counter] - @Update");
        assert_eq!(recorder.labels().len(), 4);
    }

    #[test]
    fn rollback_and_reset_reinitialise() {
        let registry = Registry::new();
        let store = counter(&registry, "Counter");
        let (devtools, recorder) = bridge(&registry);

        devtools
            .handle_raw(r#"{"type":"DISPATCH","payload":{"type":"ROLLBACK"},"state":"{\"Counter\":4}"}"#)
            .unwrap();
        assert_eq!(store.state(), 4);

        devtools
            .handle_message(DevtoolsMessage::Dispatch {
                payload: Some(crate::devtools::DispatchPayload {
                    kind: DispatchKind::Reset,
                }),
                state: None,
            })
            .unwrap();
        assert_eq!(store.state(), 0);

        let inits = lock(&recorder.inits);
        assert_eq!(inits.len(), 2);
        assert_eq!(inits[0]["Counter"], 4);
        assert_eq!(inits[1]["Counter"], 0);
        assert_eq!(recorder.labels(), vec!["[Counter] - @Init"]);
    }

    #[test]
    fn bad_state_is_reported() {
        let registry = Registry::new();
        let store = counter(&registry, "Counter");
        let (devtools, recorder) = bridge(&registry);

        let err = devtools
            .handle_raw(r#"{"type":"DISPATCH","payload":{"type":"JUMP_TO_STATE"},"state":"{\"Counter\":\"x\"}"}"#)
            .unwrap_err();
        assert_eq!(err.as_label(), "state_restore");
        assert_eq!(store.state(), 0);

        // The failed restore must not swallow the next real update.
        store.set(1);
        assert_eq!(recorder.labels().last().unwrap(), "[Counter] - @Update");
    }

    #[test]
    fn restore_only_swallows_the_restored_store_echo() {
        let registry = Registry::new();
        let a = counter(&registry, "A");
        let b = counter(&registry, "B");
        let _cascade = a.on(StoreEvent::Update, {
            let b = b.clone();
            move || b.update(|n| n + 100)
        });
        let (devtools, recorder) = bridge(&registry);
        lock(&recorder.actions).clear();

        devtools
            .handle_raw(r#"{"type":"DISPATCH","payload":{"type":"JUMP_TO_STATE"},"state":"{\"A\":7}"}"#)
            .unwrap();

        assert_eq!(a.state(), 7);
        assert_eq!(b.state(), 100);
        assert_eq!(recorder.labels(), vec!["[B] - @Update"]);
        assert_eq!(lock(&recorder.actions)[0].1["B"], 100);

        a.set(8);
        assert_eq!(recorder.labels().last().unwrap(), "[A] - @Update");
    }

    #[test]
    fn dropped_store_is_reported_removed() {
        let registry = Registry::new();
        let (devtools, recorder) = bridge(&registry);

        for i in 0..10 {
            let store = counter(&registry, &format!("Temp{i}"));
            store.set(i);
        }

        assert!(registry.is_empty());
        assert_eq!(devtools.tracked_stores(), 0);
        let removes: Vec<String> = recorder
            .labels()
            .into_iter()
            .filter(|label| label.ends_with("@Remove"))
            .collect();
        assert_eq!(removes.len(), 10);
        assert_eq!(removes[0], "[Temp0] - @Remove");
        assert!(lock(&recorder.actions).last().unwrap().1.is_empty());
    }

    #[test]
    fn try_connect_without_extension() {
        assert!(DevTools::try_connect(None, DevtoolsConfig::default(), Registry::new()).is_none());

        let recorder = Arc::new(Recorder::default());
        let extension = Extension(recorder.clone());
        let registry = Registry::new();
        let devtools = DevTools::try_connect(Some(&extension), DevtoolsConfig::default(), registry.clone());
        assert!(devtools.is_some());

        let _store = counter(&registry, "Late");
        assert_eq!(recorder.labels(), vec!["[Late] - @Init"]);
    }

    #[test]
    fn dropping_bridge_detaches() {
        let registry = Registry::new();
        let store = counter(&registry, "Counter");
        let (devtools, recorder) = bridge(&registry);
        assert_eq!(store.listener_count(StoreEvent::Update), 1);

        drop(devtools);
        assert_eq!(store.listener_count(StoreEvent::Update), 0);
        store.set(1);
        let _later = counter(&registry, "Later");
        assert_eq!(recorder.labels(), vec!["[Counter] - @Init"]);
    }
}
