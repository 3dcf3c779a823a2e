use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::registry::Snapshot;

/// Options passed to the extension when connecting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DevtoolsConfig {
    /// Instance name shown by the debugger.
    pub name: Option<String>,
    /// Log every action sent to the debugger at debug level.
    pub log: bool,
}

/// An open connection to the debugger.
pub trait DevtoolsConnection: Send + Sync {
    /// Replace the debugger's state without recording an action.
    fn init(&self, snapshot: &Snapshot);

    /// Record `action` together with the resulting state.
    fn send(&self, action: &str, snapshot: &Snapshot);
}

/// Entry point of the debugger, e.g. a browser extension bridge.
pub trait DevtoolsExtension {
    fn connect(&self, config: &DevtoolsConfig) -> Arc<dyn DevtoolsConnection>;
}

/// Actions the bridge reports for a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevtoolsAction {
    Init,
    Update,
    Reset,
    Remove,
}

impl DevtoolsAction {
    /// `[<store>] - @Update` and friends.
    pub fn label(&self, store: &str) -> String {
        let action = match self {
            DevtoolsAction::Init => "@Init",
            DevtoolsAction::Update => "@Update",
            DevtoolsAction::Reset => "@Reset",
            DevtoolsAction::Remove => "@Remove",
        };
        format!("[{store}] - {action}")
    }
}

/// Message received from the debugger.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DevtoolsMessage {
    /// The debugger was opened.
    Start,
    /// A command issued from the debugger UI.
    Dispatch {
        #[serde(default)]
        payload: Option<DispatchPayload>,
        /// JSON encoded snapshot for time-travel commands.
        #[serde(default)]
        state: Option<String>,
    },
    #[serde(other)]
    Other,
}

impl DevtoolsMessage {
    pub fn parse(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DispatchPayload {
    #[serde(rename = "type")]
    pub kind: DispatchKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DispatchKind {
    Reset,
    Commit,
    Rollback,
    JumpToState,
    JumpToAction,
    #[serde(other)]
    Other,
}
