#[cfg(test)]
#[path = "display_size_test.rs"]
mod display_size_test;

use crate::consts::{SIZE_LABEL_INSIDE_MIN_HEIGHT, SIZE_LABEL_INSIDE_MIN_WIDTH, SIZE_LABEL_MARGIN_PX};
use crate::dom::Dom;
use crate::error::{DomError, ResizeError};
use crate::geometry::{BoundingBox, px};
use crate::module::{FeatureModule, SessionContext};

/// Where the size label sits relative to the overlay, as CSS offsets.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelPlacement {
    pub right: String,
    pub bottom: String,
    pub left: String,
}

/// Place the label inside the bottom-right corner when the image is large
/// enough, otherwise outside it, on the side away from a right float.
#[must_use]
pub fn label_placement(width: f64, height: f64, floats_right: bool, label: BoundingBox) -> LabelPlacement {
    if width > SIZE_LABEL_INSIDE_MIN_WIDTH && height > SIZE_LABEL_INSIDE_MIN_HEIGHT {
        return LabelPlacement {
            right: px(SIZE_LABEL_MARGIN_PX),
            bottom: px(SIZE_LABEL_MARGIN_PX),
            left: "auto".to_owned(),
        };
    }
    let below = px(-(label.height + SIZE_LABEL_MARGIN_PX));
    let beside = px(-(label.width + SIZE_LABEL_MARGIN_PX));
    if floats_right {
        LabelPlacement { right: "auto".to_owned(), bottom: below, left: beside }
    } else {
        LabelPlacement { right: beside, bottom: below, left: "auto".to_owned() }
    }
}

/// Floating `width × height` label.
#[derive(Debug)]
pub struct DisplaySize<N> {
    label: Option<N>,
}

impl<N> Default for DisplaySize<N> {
    fn default() -> Self {
        Self { label: None }
    }
}

impl<D: Dom> FeatureModule<D> for DisplaySize<D::Node> {
    fn on_create(&mut self, ctx: &mut SessionContext<'_, D>) -> Result<(), ResizeError> {
        if !ctx.config.show_size_label {
            return Ok(());
        }
        let label = ctx.dom.create_element("div")?;
        self.label = Some(label.clone());
        ctx.config.size_label_styles.apply(ctx.dom, &label)?;
        ctx.dom.append_child(ctx.overlay, &label)?;
        Ok(())
    }

    fn on_update(&mut self, ctx: &mut SessionContext<'_, D>) -> Result<(), ResizeError> {
        let Some(label) = &self.label else {
            return Ok(());
        };
        let image = ctx.dom.bounding_rect(ctx.image).ok_or(DomError::Detached("image"))?;
        let (width, height) = (image.width.round(), image.height.round());
        ctx.dom.set_text(label, &format!("{width} × {height}"))?;

        let floats_right = ctx.dom.style(ctx.image, "float").as_deref() == Some("right");
        let label_box = ctx.dom.bounding_rect(label).unwrap_or_default();
        let placement = label_placement(width, height, floats_right, label_box);
        ctx.dom.set_style(label, "right", &placement.right)?;
        ctx.dom.set_style(label, "bottom", &placement.bottom)?;
        ctx.dom.set_style(label, "left", &placement.left)?;
        Ok(())
    }

    fn on_destroy(&mut self, ctx: &mut SessionContext<'_, D>) {
        if let Some(label) = self.label.take() {
            ctx.dom.remove(&label);
        }
    }
}
