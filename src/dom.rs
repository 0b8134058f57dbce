//! Host abstraction: the DOM surface and editing engine the controller drives.
//!
//! The controller never touches `web-sys` directly. It issues DOM operations
//! through [`Dom`] and editor operations through [`Editor`], and receives every
//! browser callback as a [`DomEvent`] tagged with the [`ListenerId`] or
//! [`TimerId`] it was registered under. [`crate::web`] implements both traits
//! for the browser; tests use an in-memory fake.

use std::fmt;

use crate::error::{DomError, ResizeError};
use crate::geometry::{BoundingBox, ScrollOffset};

/// Handle for a registered event listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(pub u64);

/// Handle for a scheduled one-shot timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(pub u64);

/// DOM event types the crate listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    Scroll,
    KeyUp,
    Input,
    MouseDown,
    MouseMove,
    MouseUp,
}

impl EventKind {
    /// The DOM event type name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::Scroll => "scroll",
            Self::KeyUp => "keyup",
            Self::Input => "input",
            Self::MouseDown => "mousedown",
            Self::MouseMove => "mousemove",
            Self::MouseUp => "mouseup",
        }
    }
}

/// Propagation phase a listener is registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Capture,
    Bubble,
}

/// Where a listener is attached.
#[derive(Debug, Clone, PartialEq)]
pub enum ListenTarget<N> {
    /// The document itself.
    Document,
    /// A specific element.
    Node(N),
}

/// Payload extracted from a browser event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventData<N> {
    /// Element the event was dispatched to, when it is an element.
    pub target: Option<N>,
    /// Legacy `keyCode` for keyboard events, zero otherwise.
    pub key_code: u32,
    /// Pointer x in viewport coordinates for mouse events.
    pub client_x: f64,
    /// Pointer y in viewport coordinates for mouse events.
    pub client_y: f64,
}

impl<N> Default for EventData<N> {
    fn default() -> Self {
        Self { target: None, key_code: 0, client_x: 0.0, client_y: 0.0 }
    }
}

impl<N> EventData<N> {
    #[must_use]
    pub fn on(target: N) -> Self {
        Self { target: Some(target), ..Self::default() }
    }

    #[must_use]
    pub fn key(key_code: u32) -> Self {
        Self { key_code, ..Self::default() }
    }

    #[must_use]
    pub fn pointer(target: Option<N>, client_x: f64, client_y: f64) -> Self {
        Self { target, key_code: 0, client_x, client_y }
    }
}

/// A browser callback delivered to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum DomEvent<N> {
    /// A registered listener fired.
    Listener { id: ListenerId, data: EventData<N> },
    /// A scheduled timer elapsed.
    Timer(TimerId),
}

/// DOM operations required by the controller and its modules.
pub trait Dom: 'static {
    /// Handle to an element. Equality means "same element".
    type Node: Clone + PartialEq + fmt::Debug + 'static;

    /// Create a detached element.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::Js`] if the browser refuses the tag.
    fn create_element(&mut self, tag: &str) -> Result<Self::Node, DomError>;

    /// Append `child` as the last child of `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::Js`] if the insertion is rejected.
    fn append_child(&mut self, parent: &Self::Node, child: &Self::Node) -> Result<(), DomError>;

    /// Detach `node` from its parent. No-op if it has none.
    fn remove(&mut self, node: &Self::Node);

    /// Set an inline style property. An empty value removes the property.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::Js`] if the style declaration rejects the write.
    fn set_style(&mut self, node: &Self::Node, property: &str, value: &str) -> Result<(), DomError>;

    /// Read an inline style property, `None` when unset.
    fn style(&self, node: &Self::Node, property: &str) -> Option<String>;

    /// Set an inline style property on the document element.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::Js`] if the style declaration rejects the write.
    fn set_document_style(&mut self, property: &str, value: &str) -> Result<(), DomError>;

    /// Read an inline style property of the document element, `None` when unset.
    fn document_style(&self, property: &str) -> Option<String>;

    /// Replace the text content of `node`.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::Js`] on failure.
    fn set_text(&mut self, node: &Self::Node, text: &str) -> Result<(), DomError>;

    /// Set an attribute on `node`.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::Js`] if the attribute name is invalid.
    fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str) -> Result<(), DomError>;

    /// Viewport box of `node`, or `None` if it is not attached to the document.
    fn bounding_rect(&self, node: &Self::Node) -> Option<BoundingBox>;

    /// Current scroll offset of `node`.
    fn scroll_offset(&self, node: &Self::Node) -> ScrollOffset;

    /// Nearest ancestor-or-self of `node` matching `selector`, strictly inside `scope`.
    fn closest(&self, node: &Self::Node, selector: &str, scope: &Self::Node) -> Option<Self::Node>;

    /// Register a listener. Events arrive as [`DomEvent::Listener`] with the returned id.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::Js`] if the registration is rejected.
    fn listen(&mut self, target: ListenTarget<Self::Node>, kind: EventKind, phase: Phase) -> Result<ListenerId, DomError>;

    /// Unregister a listener. Unknown ids are ignored.
    fn unlisten(&mut self, id: ListenerId);

    /// Schedule a one-shot timer. It arrives as [`DomEvent::Timer`].
    fn set_timeout(&mut self, delay_ms: u32) -> TimerId;

    /// Cancel a timer. Unknown or elapsed ids are ignored.
    fn clear_timeout(&mut self, id: TimerId);

    /// Turn off the browser's built-in image resize affordance.
    fn disable_native_resize(&mut self);
}

/// The host document-editing engine.
pub trait Editor<N> {
    /// The editable root element (the editing surface).
    fn root(&self) -> &N;

    /// The root's parent, used as the positioning frame for the overlay.
    fn container(&self) -> &N;

    /// Clear the editor's text selection.
    ///
    /// # Errors
    ///
    /// Returns [`ResizeError::Editor`] if the editor rejects the call.
    fn clear_selection(&mut self) -> Result<(), ResizeError>;

    /// Delete the editor node wrapping `node` from the document.
    ///
    /// # Errors
    ///
    /// Returns [`ResizeError::Editor`] if no editor node wraps `node`.
    fn delete_embed(&mut self, node: &N) -> Result<(), ResizeError>;

    /// Push the current document HTML to the mirrored content sink.
    ///
    /// # Errors
    ///
    /// Returns [`ResizeError::Editor`] if the sink cannot be written.
    fn sync_mirror(&mut self) -> Result<(), ResizeError>;
}
