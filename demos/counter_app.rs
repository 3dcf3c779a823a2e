//! Counter application wiring a store to signals, selectors and a connection

use serde::{Deserialize, Serialize};
use unistate::{connect, select, Effect, Memo, Registry, Signal, Store, StoreEvent, StoreOptions};

#[derive(Clone, Debug, Serialize, Deserialize)]
struct CounterState {
    count: i32,
    step: i32,
    history: Vec<i32>,
}

impl CounterState {
    fn new() -> Self {
        Self {
            count: 0,
            step: 1,
            history: vec![0],
        }
    }

    fn increment(mut self) -> Self {
        self.count += self.step;
        self.history.push(self.count);
        self
    }

    fn decrement(mut self) -> Self {
        self.count -= self.step;
        self.history.push(self.count);
        self
    }
}

fn main() {
    println!("=== Counter Application ===\n");

    println!("1. Initializing counter store");
    let registry = Registry::new();
    let store = Store::with_options(
        StoreOptions::new(CounterState::new())
            .name("Counter")
            .registry(registry.clone()),
    );

    let _log = store.on(StoreEvent::Update, {
        let store = store.downgrade();
        move || {
            if let Some(store) = store.upgrade() {
                store.read(|s| println!("   [State] Count: {}, Step: {}", s.count, s.step));
            }
        }
    });

    println!("\n2. Selecting the count into a signal");
    let count = select(&store, 0, |s: &CounterState| s.count);

    println!("\n3. Setting up memoized computations");
    let display = count.signal();
    let is_positive = Memo::new({
        let display = display.clone();
        move || display.get() > 0
    });
    let is_even = Memo::new({
        let display = display.clone();
        move || display.get() % 2 == 0
    });

    let _printer = Effect::new({
        let display = display.clone();
        move || {
            println!(
                "   Count: {} | Positive: {} | Even: {}",
                display.get(),
                is_positive.get(),
                is_even.get()
            );
        }
    });

    println!("\n4. Incrementing...");
    for _ in 0..3 {
        store.update(CounterState::increment);
    }

    println!("\n5. Driving the step size from a signal");
    let step = Signal::new(1);
    let _step_connection = connect(&store, {
        let step = step.clone();
        move |mut state: CounterState| {
            state.step = step.get();
            state
        }
    });
    step.set(5);
    store.update(CounterState::increment);

    println!("\n6. Decrementing...");
    for _ in 0..3 {
        store.update(CounterState::decrement);
    }

    println!("\n7. History: {:?}", store.read(|s| s.history.clone()));

    println!("\n8. Resetting...");
    store.reset();
    println!("   Reset to {:?}", store.state());

    println!("\n9. Snapshot: {}", serde_json::Value::Object(registry.snapshot().unwrap_or_default()));

    println!("\n✓ Counter application complete!");
}
