//! Developer tooling built on top of the registry.
//!
//! Both tools are plain observers: they subscribe to registry lifecycle
//! events and to the `update`/`reset` events of every registered store.
//!
//! - [`DevTools`] mirrors the registry into a Redux-DevTools style debugger
//!   and applies the time-travel commands it sends back.
//! - [`StoreLogger`] writes store activity to `tracing`.

mod bridge;
mod logger;
mod protocol;

pub use bridge::{init_devtools, DevTools};
pub use logger::{run_logger, LogLevel, StoreLogger};
pub use protocol::{
    DevtoolsAction, DevtoolsConfig, DevtoolsConnection, DevtoolsExtension, DevtoolsMessage,
    DispatchKind, DispatchPayload,
};
