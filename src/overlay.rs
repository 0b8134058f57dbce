//! The overlay element drawn over the selected image.
//!
//! An [`Overlay`] is a scoped acquisition: [`Overlay::show`] suppresses text
//! selection, registers the document `keyup` and surface `input` listeners that
//! detect image removal, and appends the overlay element to the container.
//! [`Overlay::hide`] consumes it and releases exactly those resources, so an
//! overlay can never be hidden twice. Whatever `user-select` values the page
//! had before are written back on hide.

#[cfg(test)]
#[path = "overlay_test.rs"]
mod overlay_test;

use crate::consts::{OVERLAY_BORDER_INSET_PX, USER_SELECT_PROPERTIES};
use crate::dom::{Dom, Editor, EventKind, ListenTarget, ListenerId, Phase};
use crate::error::{DomError, ResizeError};
use crate::geometry::{BoundingBox, measure, px};
use crate::style::StyleMap;

/// Which removal listener an event arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalSignal {
    KeyUp,
    Input,
}

/// `user-select` values on the surface and the document element before suppression,
/// in [`USER_SELECT_PROPERTIES`] order.
#[derive(Debug)]
struct SavedUserSelect {
    root: Vec<Option<String>>,
    document: Vec<Option<String>>,
}

impl SavedUserSelect {
    fn capture<D: Dom>(dom: &D, root: &D::Node) -> Self {
        Self {
            root: USER_SELECT_PROPERTIES.iter().map(|p| dom.style(root, p)).collect(),
            document: USER_SELECT_PROPERTIES.iter().map(|p| dom.document_style(p)).collect(),
        }
    }

    fn restore<D: Dom>(&self, dom: &mut D, root: &D::Node) -> Result<(), DomError> {
        let saved = USER_SELECT_PROPERTIES.iter().zip(&self.root).zip(&self.document);
        for ((property, on_root), on_document) in saved {
            dom.set_style(root, property, on_root.as_deref().unwrap_or(""))?;
            dom.set_document_style(property, on_document.as_deref().unwrap_or(""))?;
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct Overlay<N> {
    element: N,
    key_listener: Option<ListenerId>,
    input_listener: Option<ListenerId>,
    saved_user_select: Option<SavedUserSelect>,
}

impl<N: Clone + PartialEq> Overlay<N> {
    /// Create the overlay and acquire everything it needs while shown.
    ///
    /// On failure, whatever was acquired is released before returning.
    ///
    /// # Errors
    ///
    /// Propagates DOM and editor failures.
    pub fn show<D, E>(dom: &mut D, editor: &mut E, styles: &StyleMap) -> Result<Self, ResizeError>
    where
        D: Dom<Node = N>,
        E: Editor<N>,
    {
        let element = dom.create_element("div")?;
        styles.apply(dom, &element)?;
        editor.clear_selection()?;

        let mut overlay = Self {
            element,
            key_listener: None,
            input_listener: None,
            saved_user_select: None,
        };
        if let Err(err) = overlay.acquire(dom, editor.root(), editor.container()) {
            overlay.hide(dom, editor.root());
            return Err(err);
        }
        Ok(overlay)
    }

    fn acquire<D: Dom<Node = N>>(&mut self, dom: &mut D, root: &N, container: &N) -> Result<(), ResizeError> {
        self.saved_user_select = Some(SavedUserSelect::capture(dom, root));
        set_user_select(dom, root, "none")?;
        self.key_listener = Some(dom.listen(ListenTarget::Document, EventKind::KeyUp, Phase::Capture)?);
        self.input_listener = Some(dom.listen(ListenTarget::Node(root.clone()), EventKind::Input, Phase::Capture)?);
        dom.append_child(container, &self.element)?;
        Ok(())
    }

    /// Remove the overlay, drop its listeners, and put back the page's text
    /// selection styles.
    pub fn hide<D: Dom<Node = N>>(self, dom: &mut D, root: &N) {
        dom.remove(&self.element);
        for id in [self.key_listener, self.input_listener].into_iter().flatten() {
            dom.unlisten(id);
        }
        if let Some(saved) = &self.saved_user_select {
            if let Err(err) = saved.restore(dom, root) {
                log::warn!("failed to restore user-select: {err}");
            }
        }
    }

    /// Size and place the overlay over `image`.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::Detached`] if the image has left the document.
    pub fn reposition<D: Dom<Node = N>>(&self, dom: &mut D, image: &N, container: &N) -> Result<BoundingBox, DomError> {
        let bounds = measure(dom, image, container)?;
        dom.set_style(&self.element, "left", &px(bounds.left - OVERLAY_BORDER_INSET_PX))?;
        dom.set_style(&self.element, "top", &px(bounds.top))?;
        dom.set_style(&self.element, "width", &px(bounds.width))?;
        dom.set_style(&self.element, "height", &px(bounds.height))?;
        Ok(bounds)
    }

    /// Classify `id` if it is one of this overlay's removal listeners.
    #[must_use]
    pub fn removal_signal(&self, id: ListenerId) -> Option<RemovalSignal> {
        if self.key_listener == Some(id) {
            Some(RemovalSignal::KeyUp)
        } else if self.input_listener == Some(id) {
            Some(RemovalSignal::Input)
        } else {
            None
        }
    }

    #[must_use]
    pub fn element(&self) -> &N {
        &self.element
    }
}

/// Set every `user-select` variant on the surface and the document element.
fn set_user_select<D: Dom>(dom: &mut D, root: &D::Node, value: &str) -> Result<(), DomError> {
    for property in USER_SELECT_PROPERTIES {
        dom.set_style(root, property, value)?;
        dom.set_document_style(property, value)?;
    }
    Ok(())
}
