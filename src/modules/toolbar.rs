#[cfg(test)]
#[path = "toolbar_test.rs"]
mod toolbar_test;

use crate::config::Alignment;
use crate::consts::TOOLBAR_ACTIVE_FILTER;
use crate::dom::{Dom, DomEvent, EventKind, ListenTarget, ListenerId, Phase};
use crate::error::{DomError, ResizeError};
use crate::module::{FeatureModule, Response, SessionContext};
use crate::style::StyleMap;

/// Image style properties an alignment writes.
const ALIGNMENT_PROPERTIES: [&str; 3] = ["display", "float", "margin"];

/// Base look of a toolbar button; per-button styles override it.
fn base_button_styles() -> StyleMap {
    StyleMap::from_pairs(&[
        ("display", "inline-block"),
        ("width", "24px"),
        ("height", "24px"),
        ("background", "white"),
        ("border", "1px solid #999"),
        ("verticalAlign", "middle"),
        ("cursor", "pointer"),
    ])
}

impl Alignment {
    /// `(display, float, margin)` written to the image.
    fn image_styles(self) -> [&'static str; 3] {
        match self {
            Self::AlignLeft => ["inline", "left", "0 1em 1em 0"],
            Self::AlignCenter => ["block", "", "auto"],
            Self::AlignRight => ["inline", "right", "0 0 1em 1em"],
        }
    }

    fn glyph(self) -> &'static str {
        match self {
            Self::AlignLeft => "⇤",
            Self::AlignCenter => "↔",
            Self::AlignRight => "⇥",
        }
    }

    fn title(self) -> &'static str {
        match self {
            Self::AlignLeft => "Align left",
            Self::AlignCenter => "Center",
            Self::AlignRight => "Align right",
        }
    }

    /// Whether `image` currently carries this alignment.
    fn is_applied<D: Dom>(self, dom: &D, image: &D::Node) -> bool {
        match self {
            Self::AlignLeft => dom.style(image, "float").as_deref() == Some("left"),
            Self::AlignCenter => dom.style(image, "margin").as_deref() == Some("auto"),
            Self::AlignRight => dom.style(image, "float").as_deref() == Some("right"),
        }
    }
}

fn clear_alignment<D: Dom>(dom: &mut D, image: &D::Node) -> Result<(), DomError> {
    for property in ALIGNMENT_PROPERTIES {
        dom.set_style(image, property, "")?;
    }
    Ok(())
}

/// Toggle `alignment` on `image`, replacing whatever alignment it had.
fn toggle_alignment<D: Dom>(dom: &mut D, image: &D::Node, alignment: Alignment) -> Result<(), DomError> {
    let was_applied = alignment.is_applied(&*dom, image);
    clear_alignment(dom, image)?;
    if !was_applied {
        for (property, value) in ALIGNMENT_PROPERTIES.into_iter().zip(alignment.image_styles()) {
            dom.set_style(image, property, value)?;
        }
    }
    Ok(())
}

#[derive(Debug)]
struct Button<N> {
    alignment: Alignment,
    element: N,
    listener: Option<ListenerId>,
}

/// Alignment toolbar.
#[derive(Debug)]
pub struct Toolbar<N> {
    toolbar: Option<N>,
    buttons: Vec<Button<N>>,
}

impl<N> Default for Toolbar<N> {
    fn default() -> Self {
        Self { toolbar: None, buttons: Vec::new() }
    }
}

impl<N> Toolbar<N> {
    /// Alignments offered by the live toolbar, in display order.
    #[must_use]
    pub fn alignments(&self) -> Vec<Alignment> {
        self.buttons.iter().map(|b| b.alignment).collect()
    }
}

impl<D: Dom> FeatureModule<D> for Toolbar<D::Node> {
    fn on_create(&mut self, ctx: &mut SessionContext<'_, D>) -> Result<(), ResizeError> {
        let config = ctx.config;
        if !config.show_toolbar {
            return Ok(());
        }
        let toolbar = ctx.dom.create_element("div")?;
        self.toolbar = Some(toolbar.clone());
        config.toolbar_styles.apply(ctx.dom, &toolbar)?;

        let base = base_button_styles();
        for alignment in Alignment::ALL.into_iter().filter(|a| config.button_enabled(*a)) {
            let element = ctx.dom.create_element("span")?;
            self.buttons.push(Button { alignment, element: element.clone(), listener: None });

            let styles = match config.toolbar_button_styles.get(&alignment) {
                Some(overrides) => overrides.with_defaults(&base),
                None => base.clone(),
            };
            styles.apply(ctx.dom, &element)?;
            ctx.dom.set_attribute(&element, "title", alignment.title())?;
            ctx.dom.set_text(&element, alignment.glyph())?;

            let listener = ctx.dom.listen(ListenTarget::Node(element.clone()), EventKind::Click, Phase::Bubble)?;
            if let Some(button) = self.buttons.last_mut() {
                button.listener = Some(listener);
            }
            ctx.dom.append_child(&toolbar, &element)?;
        }
        ctx.dom.append_child(ctx.overlay, &toolbar)?;
        Ok(())
    }

    fn on_update(&mut self, ctx: &mut SessionContext<'_, D>) -> Result<(), ResizeError> {
        for button in &self.buttons {
            let filter = if button.alignment.is_applied(&*ctx.dom, ctx.image) { TOOLBAR_ACTIVE_FILTER } else { "" };
            ctx.dom.set_style(&button.element, "filter", filter)?;
        }
        Ok(())
    }

    fn on_destroy(&mut self, ctx: &mut SessionContext<'_, D>) {
        for button in self.buttons.drain(..) {
            if let Some(listener) = button.listener {
                ctx.dom.unlisten(listener);
            }
        }
        if let Some(toolbar) = self.toolbar.take() {
            ctx.dom.remove(&toolbar);
        }
    }

    fn on_event(&mut self, ctx: &mut SessionContext<'_, D>, event: &DomEvent<D::Node>) -> Result<Response, ResizeError> {
        let DomEvent::Listener { id, .. } = event else {
            return Ok(Response::Ignored);
        };
        let Some(button) = self.buttons.iter().find(|b| b.listener == Some(*id)) else {
            return Ok(Response::Ignored);
        };
        log::debug!("toolbar: toggling {}", button.alignment.name());
        toggle_alignment(ctx.dom, ctx.image, button.alignment)?;
        Ok(Response::UpdateRequested)
    }
}
