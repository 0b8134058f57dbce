//! Error types for DOM access and the resize controller.

/// Error raised by a [`crate::dom::Dom`] implementation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomError {
    /// The named node is not attached to the document, so it has no geometry.
    #[error("{0} is not attached to the document")]
    Detached(&'static str),
    /// A browser call threw.
    #[error("DOM call failed: {0}")]
    Js(String),
}

/// Error raised while configuring or running an overlay session.
#[derive(Debug, thiserror::Error)]
pub enum ResizeError {
    /// A module identifier matched neither a caller override nor a built-in.
    #[error("unknown feature module {0:?}: no caller override or built-in module matches")]
    UnknownModule(String),
    /// The caller's options could not be parsed.
    #[error("invalid options: {0}")]
    Options(#[from] serde_json::Error),
    /// A DOM operation failed.
    #[error(transparent)]
    Dom(#[from] DomError),
    /// The host editor rejected a call.
    #[error("editor call failed: {0}")]
    Editor(String),
}
