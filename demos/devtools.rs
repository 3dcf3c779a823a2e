//! Mirrors stores into a debugger that prints to stdout, then time travels.
//!
//! Run with `RUST_LOG=debug` to see the bridge's own logging.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;
use unistate::devtools::{DevtoolsConnection, DevtoolsExtension};
use unistate::{init_devtools, run_logger, Snapshot, Store, StoreOptions};

#[derive(Default)]
struct StdoutConnection {
    history: Mutex<Vec<Snapshot>>,
}

impl DevtoolsConnection for StdoutConnection {
    fn init(&self, snapshot: &Snapshot) {
        println!("INIT     {}", serde_json::Value::Object(snapshot.clone()));
    }

    fn send(&self, action: &str, snapshot: &Snapshot) {
        println!("{action:<24} {}", serde_json::Value::Object(snapshot.clone()));
        if let Ok(mut history) = self.history.lock() {
            history.push(snapshot.clone());
        }
    }
}

struct StdoutExtension(Arc<StdoutConnection>);

impl DevtoolsExtension for StdoutExtension {
    fn connect(&self, _config: &unistate::DevtoolsConfig) -> Arc<dyn DevtoolsConnection> {
        self.0.clone()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Cart {
    items: Vec<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let connection = Arc::new(StdoutConnection::default());
    let extension = StdoutExtension(connection.clone());
    let devtools = init_devtools(Some(&extension)).ok_or("devtools unavailable")?;
    let _logger = run_logger();

    let cart = Store::with_options(StoreOptions::new(Cart { items: vec![] }).name("Cart"));
    for item in ["apple", "pear", "plum"] {
        cart.update(|mut cart| {
            cart.items.push(item.to_string());
            cart
        });
    }

    // Jump back to the state after the first item.
    let target = connection
        .history
        .lock()
        .map_err(|_| "history poisoned")?
        .get(1)
        .cloned()
        .ok_or("no history")?;
    let message = serde_json::json!({
        "type": "DISPATCH",
        "payload": { "type": "JUMP_TO_STATE" },
        "state": serde_json::to_string(&target)?,
    });
    devtools.handle_raw(&message.to_string())?;
    println!("after time travel: {:?}", cart.state().items);

    cart.destroy();
    Ok(())
}
