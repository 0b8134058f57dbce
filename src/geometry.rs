//! Axis-aligned boxes and container-relative measurement.
//!
//! The overlay and every module position themselves against the editing
//! surface's container, so viewport rectangles reported by the browser are
//! translated into the container's frame (including its scroll offset).
//! Boxes are recomputed on every pass and never cached.

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

use crate::dom::Dom;
use crate::error::DomError;

/// An axis-aligned box in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    #[must_use]
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Scroll position of a scrollable element.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollOffset {
    pub left: f64,
    pub top: f64,
}

/// Translate `target`'s viewport box into the frame of `container`.
///
/// `left`/`top` are the difference of the two viewport boxes with the
/// container's scroll offset added back; `width`/`height` are copied from
/// `target`.
#[must_use]
pub fn relative_box(target: BoundingBox, container: BoundingBox, scroll: ScrollOffset) -> BoundingBox {
    BoundingBox {
        left: target.left - container.left + scroll.left,
        top: target.top - container.top + scroll.top,
        width: target.width,
        height: target.height,
    }
}

/// Measure `target` relative to `container` through the DOM.
///
/// # Errors
///
/// Returns [`DomError::Detached`] when either node is no longer in the
/// document instead of producing a zeroed box.
pub fn measure<D: Dom>(dom: &D, target: &D::Node, container: &D::Node) -> Result<BoundingBox, DomError> {
    let target_box = dom.bounding_rect(target).ok_or(DomError::Detached("target"))?;
    let container_box = dom.bounding_rect(container).ok_or(DomError::Detached("container"))?;
    Ok(relative_box(target_box, container_box, dom.scroll_offset(container)))
}

/// Format a length as a CSS pixel value.
#[must_use]
pub fn px(value: f64) -> String {
    format!("{value}px")
}
