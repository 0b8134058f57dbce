//! Shared constants for the image resize crate.

// ── Selection ───────────────────────────────────────────────────

/// Selector identifying resizable images inside the editing surface.
pub const DEFAULT_IMAGE_SELECTOR: &str = "img";

/// `keyCode` of the Delete key.
pub const KEY_CODE_DELETE: u32 = 46;

/// `keyCode` of the Backspace key.
pub const KEY_CODE_BACKSPACE: u32 = 8;

// ── Overlay ─────────────────────────────────────────────────────

/// Left inset applied to the overlay so its border hugs the image edge.
pub const OVERLAY_BORDER_INSET_PX: f64 = 1.0;

/// Vendor variants of `user-select`, set on the surface and the document element.
pub const USER_SELECT_PROPERTIES: [&str; 4] = [
    "user-select",
    "-moz-user-select",
    "-webkit-user-select",
    "-ms-user-select",
];

// ── Timing ──────────────────────────────────────────────────────

/// Quiet period before a burst of scroll events repositions the overlay.
pub const SCROLL_DEBOUNCE_MS: u32 = 50;

// ── Size label ──────────────────────────────────────────────────

/// The label sits inside the image only when the image is wider than this.
pub const SIZE_LABEL_INSIDE_MIN_WIDTH: f64 = 120.0;

/// The label sits inside the image only when the image is taller than this.
pub const SIZE_LABEL_INSIDE_MIN_HEIGHT: f64 = 30.0;

/// Gap between the label and the image edge.
pub const SIZE_LABEL_MARGIN_PX: f64 = 4.0;

// ── Resize handles ──────────────────────────────────────────────

/// Handle edge length used when the handle styles carry no `width`.
pub const DEFAULT_HANDLE_SIZE_PX: f64 = 12.0;

/// Smallest width a drag can shrink an image to.
pub const MIN_IMAGE_WIDTH_PX: f64 = 1.0;

// ── Toolbar ─────────────────────────────────────────────────────

/// Filter marking the button of the alignment currently applied.
pub const TOOLBAR_ACTIVE_FILTER: &str = "invert(20%)";
