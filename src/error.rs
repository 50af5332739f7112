//! Error types.
//!
//! Contract violations surface immediately from the call that broke the
//! contract. Host failures surface when the commit queue executes, which is
//! after render has finished.

use thiserror::Error;

use crate::types::{HostKind, ObjectId};

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Runtime errors.
#[derive(Debug, Error)]
pub enum Error {
    /// A hook (or the scene accessor, or effect scheduling) ran outside a component render.
    #[error("{hook} must be called inside a component")]
    NoRenderContext { hook: &'static str },

    /// The hook at `index` is not the same hook as on the previous render.
    #[error("hook #{index} in `{component}` was {found} on an earlier render, now called as {expected}")]
    HookOrderChanged {
        component: &'static str,
        index: usize,
        expected: &'static str,
        found: &'static str,
    },

    /// A state setter fired while a component render function was executing.
    #[error("cannot re-render `{component}` while `{rendering}` is rendering")]
    RenderInProgress {
        component: &'static str,
        rendering: &'static str,
    },

    /// A component was handed props of a type it does not accept.
    #[error("component `{component}` received props of an unexpected type")]
    PropsMismatch { component: &'static str },

    /// The host scene refused an operation.
    #[error(transparent)]
    Scene(#[from] SceneError),

    /// Raised by user code inside a component render function.
    #[error("{0}")]
    Render(String),
}

impl Error {
    /// Build an error from inside a component render function.
    pub fn render(message: impl Into<String>) -> Self {
        Error::Render(message.into())
    }
}

/// Errors reported by a [`Scene`](crate::host::Scene) implementation.
#[derive(Debug, Error)]
pub enum SceneError {
    /// The host cannot create objects of this kind.
    #[error("unknown node type: {0}")]
    UnknownKind(HostKind),

    /// The host no longer knows this object.
    #[error("host object {0} does not exist")]
    MissingObject(ObjectId),

    /// Any other host failure.
    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = Error::NoRenderContext { hook: "use_state" };
        assert_eq!(err.to_string(), "use_state must be called inside a component");

        let err: Error = SceneError::UnknownKind(HostKind::Text).into();
        assert_eq!(err.to_string(), "unknown node type: text");
    }
}
