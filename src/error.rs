//! Error types used by stores, the registry and the devtools bridge.
//!
//! Most cleanup paths in this crate are silent no-ops (unknown listener,
//! unknown store id, missing store). [`StoreError`] only covers the few cases
//! that callers must handle.

use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, StoreError>;

/// # Errors produced by unistate.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum StoreError {
    /// A shared listener was registered while the same `Arc` was still registered.
    #[error("the listener has already been registered")]
    DuplicateListener,

    /// The state of a store could not be turned into JSON.
    #[error("failed to serialize state of store `{name}`: {source}")]
    Serialize {
        /// Display name of the store.
        name: String,
        /// The underlying serde error.
        #[source]
        source: serde_json::Error,
    },

    /// A JSON value could not be turned back into the state of a store.
    #[error("failed to restore state of store `{name}`: {source}")]
    Restore {
        /// Display name of the store.
        name: String,
        /// The underlying serde error.
        #[source]
        source: serde_json::Error,
    },

    /// A devtools message could not be parsed.
    #[error("malformed devtools message: {0}")]
    Protocol(#[from] serde_json::Error),
}

impl StoreError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use unistate::StoreError;
    ///
    /// assert_eq!(StoreError::DuplicateListener.as_label(), "duplicate_listener");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            StoreError::DuplicateListener => "duplicate_listener",
            StoreError::Serialize { .. } => "state_serialize",
            StoreError::Restore { .. } => "state_restore",
            StoreError::Protocol(_) => "devtools_protocol",
        }
    }
}
