#[cfg(test)]
#[path = "resize_test.rs"]
mod resize_test;

use crate::consts::{DEFAULT_HANDLE_SIZE_PX, MIN_IMAGE_WIDTH_PX};
use crate::dom::{Dom, DomEvent, EventKind, ListenTarget, ListenerId, Phase};
use crate::error::{DomError, ResizeError};
use crate::geometry::px;
use crate::module::{FeatureModule, Response, SessionContext};

/// Corner of the overlay a handle sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
}

impl Corner {
    pub const ALL: [Corner; 4] = [Self::TopLeft, Self::TopRight, Self::BottomRight, Self::BottomLeft];

    #[must_use]
    pub fn cursor(self) -> &'static str {
        match self {
            Self::TopLeft | Self::BottomRight => "nwse-resize",
            Self::TopRight | Self::BottomLeft => "nesw-resize",
        }
    }

    /// Handles on the left edge grow the image when dragged leftwards.
    #[must_use]
    pub fn is_left(self) -> bool {
        matches!(self, Self::TopLeft | Self::BottomLeft)
    }

    /// `(horizontal, vertical)` offset properties.
    fn edges(self) -> (&'static str, &'static str) {
        match self {
            Self::TopLeft => ("left", "top"),
            Self::TopRight => ("right", "top"),
            Self::BottomRight => ("right", "bottom"),
            Self::BottomLeft => ("left", "bottom"),
        }
    }
}

/// Image width after dragging a `corner` handle from `start_x` to `client_x`.
#[must_use]
pub fn dragged_width(corner: Corner, start_width: f64, start_x: f64, client_x: f64) -> f64 {
    let delta = client_x - start_x;
    let width = if corner.is_left() { start_width - delta } else { start_width + delta };
    width.round().max(MIN_IMAGE_WIDTH_PX)
}

#[derive(Debug)]
struct Handle<N> {
    corner: Corner,
    element: N,
    listener: Option<ListenerId>,
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    corner: Corner,
    start_x: f64,
    start_width: f64,
    move_listener: ListenerId,
    up_listener: ListenerId,
}

/// Corner drag handles.
#[derive(Debug)]
pub struct Resize<N> {
    handles: Vec<Handle<N>>,
    drag: Option<Drag>,
}

impl<N> Default for Resize<N> {
    fn default() -> Self {
        Self { handles: Vec::new(), drag: None }
    }
}

impl<N> Resize<N> {
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }
}

impl<N: Clone + PartialEq> Resize<N> {
    fn start_drag<D: Dom<Node = N>>(&mut self, ctx: &mut SessionContext<'_, D>, corner: Corner, client_x: f64) -> Result<(), ResizeError> {
        self.end_drag(ctx.dom);
        let start_width = ctx.dom.bounding_rect(ctx.image).ok_or(DomError::Detached("image"))?.width;
        ctx.dom.set_document_style("cursor", corner.cursor())?;
        let move_listener = ctx.dom.listen(ListenTarget::Document, EventKind::MouseMove, Phase::Bubble)?;
        let up_listener = match ctx.dom.listen(ListenTarget::Document, EventKind::MouseUp, Phase::Bubble) {
            Ok(id) => id,
            Err(err) => {
                ctx.dom.unlisten(move_listener);
                return Err(err.into());
            }
        };
        self.drag = Some(Drag { corner, start_x: client_x, start_width, move_listener, up_listener });
        Ok(())
    }

    fn end_drag<D: Dom<Node = N>>(&mut self, dom: &mut D) {
        let Some(drag) = self.drag.take() else {
            return;
        };
        dom.unlisten(drag.move_listener);
        dom.unlisten(drag.up_listener);
        if let Err(err) = dom.set_document_style("cursor", "") {
            log::warn!("resize: failed to reset cursor: {err}");
        }
    }
}

impl<D: Dom> FeatureModule<D> for Resize<D::Node> {
    fn on_create(&mut self, ctx: &mut SessionContext<'_, D>) -> Result<(), ResizeError> {
        let size = ctx.config.handle_styles.px_value("width").unwrap_or(DEFAULT_HANDLE_SIZE_PX);
        let offset = px(-(size / 2.0));
        for corner in Corner::ALL {
            let element = ctx.dom.create_element("div")?;
            self.handles.push(Handle { corner, element: element.clone(), listener: None });

            ctx.config.handle_styles.apply(ctx.dom, &element)?;
            ctx.dom.set_style(&element, "cursor", corner.cursor())?;
            let (horizontal, vertical) = corner.edges();
            ctx.dom.set_style(&element, horizontal, &offset)?;
            ctx.dom.set_style(&element, vertical, &offset)?;

            let listener = ctx.dom.listen(ListenTarget::Node(element.clone()), EventKind::MouseDown, Phase::Bubble)?;
            if let Some(handle) = self.handles.last_mut() {
                handle.listener = Some(listener);
            }
            ctx.dom.append_child(ctx.overlay, &element)?;
        }
        Ok(())
    }

    fn on_update(&mut self, _ctx: &mut SessionContext<'_, D>) -> Result<(), ResizeError> {
        // Handles are positioned against the overlay, which the controller moves.
        Ok(())
    }

    fn on_destroy(&mut self, ctx: &mut SessionContext<'_, D>) {
        self.end_drag(ctx.dom);
        for handle in self.handles.drain(..) {
            if let Some(listener) = handle.listener {
                ctx.dom.unlisten(listener);
            }
            ctx.dom.remove(&handle.element);
        }
    }

    fn on_event(&mut self, ctx: &mut SessionContext<'_, D>, event: &DomEvent<D::Node>) -> Result<Response, ResizeError> {
        let DomEvent::Listener { id, data } = event else {
            return Ok(Response::Ignored);
        };

        if let Some(drag) = self.drag {
            if *id == drag.move_listener {
                let width = dragged_width(drag.corner, drag.start_width, drag.start_x, data.client_x);
                ctx.dom.set_attribute(ctx.image, "width", &width.to_string())?;
                return Ok(Response::UpdateRequested);
            }
            if *id == drag.up_listener {
                self.end_drag(ctx.dom);
                return Ok(Response::Handled);
            }
        }

        let Some(corner) = self.handles.iter().find(|h| h.listener == Some(*id)).map(|h| h.corner) else {
            return Ok(Response::Ignored);
        };
        self.start_drag(ctx, corner, data.client_x)?;
        Ok(Response::Handled)
    }
}
