//! Store example with complex state and a shared registry

use serde::{Deserialize, Serialize};
use unistate::{select_stream, Registry, Source, Store, StoreEvent, StoreOptions};

#[derive(Clone, Debug, Serialize, Deserialize)]
struct TodoItem {
    id: usize,
    text: String,
    completed: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct AppState {
    todos: Vec<TodoItem>,
    filter: String,
}

struct TodoStore;

fn main() {
    println!("=== Store Example ===\n");

    let registry = Registry::new();
    let _registry_log = registry.on(|event| {
        println!("Registry {:?}: {}", event.action, event.name);
    });

    // Create a store with initial state
    let store = Store::with_options(
        StoreOptions::new(AppState {
            todos: vec![],
            filter: "all".to_string(),
        })
        .name_from_type::<TodoStore>()
        .registry(registry.clone()),
    );

    // Follow the number of active todos
    let active = select_stream(&store, |state: &AppState| {
        state.todos.iter().filter(|t| !t.completed).count()
    });
    let _active_log = active.subscribe(|count: &usize| {
        println!("State updated! Active todos: {count}");
    });

    let _destroy_log = store.on(StoreEvent::Destroy, || println!("Store destroyed"));

    // Add a todo
    println!("Adding todo...");
    store.update(|mut state| {
        state.todos.push(TodoItem {
            id: 1,
            text: "Learn Unistate".to_string(),
            completed: false,
        });
        state
    });

    // Complete the todo
    println!("\nCompleting todo...");
    store.update(|mut state| {
        if let Some(todo) = state.todos.first_mut() {
            todo.completed = true;
        }
        state
    });

    println!("\nFinal state: {:#?}", store.state());
    println!("Previous state: {:#?}", store.prev_state());

    match registry.snapshot() {
        Ok(snapshot) => println!("\nSnapshot: {}", serde_json::Value::Object(snapshot)),
        Err(err) => eprintln!("snapshot failed: {err}"),
    }

    store.destroy();
    println!("Stores left: {}", registry.len());
}
