//! Selection/event coordinator and module lifecycle orchestrator.
//!
//! [`ImageResize`] is a two-state machine: idle (no session) or active (one
//! [`Session`] holding the tracked image, its overlay, and the live modules).
//! Every browser callback enters through [`ImageResize::dispatch`] and runs to
//! completion before the next one, so a session is never observed half built
//! or half torn down. Any error raised while handling an event tears the
//! session down, which releases every listener, timer, and node it acquired.
//!
//! ```text
//!   click on image ──▶ show ──▶ overlay + modules + update pass
//!   click elsewhere / keyup / input ──▶ hide
//!   scroll ──▶ (debounced) reposition + module updates
//! ```

#[cfg(test)]
#[path = "controller_test.rs"]
mod controller_test;

use std::rc::Rc;

use crate::config::Config;
use crate::consts::{KEY_CODE_BACKSPACE, KEY_CODE_DELETE};
use crate::debounce::Debouncer;
use crate::dom::{Dom, DomEvent, Editor, EventData, EventKind, ListenTarget, ListenerId, Phase};
use crate::error::ResizeError;
use crate::module::{FeatureModule, ModuleRegistry, Response, SessionContext};
use crate::overlay::{Overlay, RemovalSignal};

/// The live state bundle for the selected image.
pub struct Session<D: Dom> {
    image: D::Node,
    overlay: Overlay<D::Node>,
    modules: Vec<Box<dyn FeatureModule<D>>>,
    config: Rc<Config>,
}

impl<D: Dom> Session<D> {
    #[must_use]
    pub fn image(&self) -> &D::Node {
        &self.image
    }

    #[must_use]
    pub fn overlay(&self) -> &D::Node {
        self.overlay.element()
    }

    #[must_use]
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Run `f` over every live module in list order, stopping at the first error.
    fn each_module<F>(&mut self, dom: &mut D, mut f: F) -> Result<(), ResizeError>
    where
        F: FnMut(&mut dyn FeatureModule<D>, &mut SessionContext<'_, D>) -> Result<(), ResizeError>,
    {
        let mut ctx = SessionContext { dom, image: &self.image, overlay: self.overlay.element(), config: &self.config };
        for module in &mut self.modules {
            f(module.as_mut(), &mut ctx)?;
        }
        Ok(())
    }

    /// Instantiate modules in order, calling `on_create` on each as it joins the list.
    fn create_modules(&mut self, dom: &mut D, modules: Vec<Box<dyn FeatureModule<D>>>) -> Result<(), ResizeError> {
        let mut ctx = SessionContext { dom, image: &self.image, overlay: self.overlay.element(), config: &self.config };
        for module in modules {
            self.modules.push(module);
            if let Some(module) = self.modules.last_mut() {
                module.on_create(&mut ctx)?;
            }
        }
        Ok(())
    }

    fn destroy_modules(&mut self, dom: &mut D) {
        let mut ctx = SessionContext { dom, image: &self.image, overlay: self.overlay.element(), config: &self.config };
        for module in &mut self.modules {
            module.on_destroy(&mut ctx);
        }
        self.modules.clear();
    }

    /// Offer an event to every module. Returns true if any asked for an update.
    fn route_event(&mut self, dom: &mut D, event: &DomEvent<D::Node>) -> Result<bool, ResizeError> {
        let mut update = false;
        let mut ctx = SessionContext { dom, image: &self.image, overlay: self.overlay.element(), config: &self.config };
        for module in &mut self.modules {
            match module.on_event(&mut ctx, event)? {
                Response::Ignored => {}
                Response::Handled => return Ok(update),
                Response::UpdateRequested => {
                    update = true;
                    break;
                }
            }
        }
        Ok(update)
    }
}

/// Overlay lifecycle controller for one editing surface.
pub struct ImageResize<D: Dom, E: Editor<D::Node>> {
    dom: D,
    editor: E,
    config: Rc<Config>,
    registry: ModuleRegistry<D>,
    click_listener: Option<ListenerId>,
    scroll_listener: Option<ListenerId>,
    scroll: Debouncer,
    session: Option<Session<D>>,
}

impl<D: Dom, E: Editor<D::Node>> ImageResize<D, E> {
    /// Attach to the editor's surface.
    ///
    /// Disables native image resizing, makes the container a positioning
    /// frame, and starts listening for clicks and scrolls on the surface.
    ///
    /// # Errors
    ///
    /// Returns [`ResizeError::UnknownModule`] if the configured module list
    /// names a module nothing provides, or a DOM error if attaching fails.
    pub fn new(dom: D, editor: E, config: Config, registry: ModuleRegistry<D>) -> Result<Self, ResizeError> {
        registry.validate(&config.modules)?;

        let scroll = Debouncer::new(config.scroll_debounce_ms);
        let mut this = Self {
            dom,
            editor,
            config: Rc::new(config),
            registry,
            click_listener: None,
            scroll_listener: None,
            scroll,
            session: None,
        };
        if let Err(err) = this.attach() {
            this.detach();
            return Err(err);
        }
        Ok(this)
    }

    fn attach(&mut self) -> Result<(), ResizeError> {
        self.dom.disable_native_resize();
        let container = self.editor.container().clone();
        if self.dom.style(&container, "position").is_none() {
            self.dom.set_style(&container, "position", "relative")?;
        }
        let root = self.editor.root().clone();
        self.click_listener = Some(self.dom.listen(ListenTarget::Node(root.clone()), EventKind::Click, Phase::Bubble)?);
        self.scroll_listener = Some(self.dom.listen(ListenTarget::Node(root), EventKind::Scroll, Phase::Bubble)?);
        Ok(())
    }

    /// Tear down any session and stop listening to the surface.
    pub fn detach(&mut self) {
        self.hide();
        for id in [self.click_listener.take(), self.scroll_listener.take()].into_iter().flatten() {
            self.dom.unlisten(id);
        }
    }

    // --- Event entry point ---

    /// Handle one browser callback. Errors are logged and end the session.
    pub fn dispatch(&mut self, event: DomEvent<D::Node>) {
        if let Err(err) = self.handle(event) {
            log::warn!("image resize: {err}; closing session");
            self.hide();
        }
    }

    /// Handle one browser callback, surfacing errors to the caller.
    ///
    /// # Errors
    ///
    /// Propagates DOM, editor, and module failures. The session is left as it
    /// was when the error occurred; [`ImageResize::dispatch`] closes it.
    pub fn handle(&mut self, event: DomEvent<D::Node>) -> Result<(), ResizeError> {
        match event {
            DomEvent::Timer(id) => {
                if self.scroll.fire(id) {
                    self.dom.clear_timeout(id);
                    self.refresh_geometry()?;
                }
                Ok(())
            }
            DomEvent::Listener { id, data } => {
                if Some(id) == self.click_listener {
                    return self.handle_click(data.target);
                }
                if Some(id) == self.scroll_listener {
                    self.handle_scroll();
                    return Ok(());
                }
                match self.session.as_ref().and_then(|s| s.overlay.removal_signal(id)) {
                    Some(RemovalSignal::KeyUp) => {
                        self.handle_key_up(data.key_code);
                        Ok(())
                    }
                    Some(RemovalSignal::Input) => {
                        self.handle_input();
                        Ok(())
                    }
                    None => self.route_to_modules(&DomEvent::Listener { id, data }),
                }
            }
        }
    }

    /// Resolve a surface click to a qualifying image and switch sessions.
    ///
    /// A click on the tracked image is a no-op; a click on a different image
    /// replaces the session; a click on anything else ends it. A target that is
    /// not an element is ignored.
    ///
    /// # Errors
    ///
    /// Propagates failures from opening the new session.
    pub fn handle_click(&mut self, target: Option<D::Node>) -> Result<(), ResizeError> {
        let Some(target) = target else {
            return Ok(());
        };
        let image = self.dom.closest(&target, &self.config.image_selector, self.editor.root());
        let current = self.tracked_image().cloned();
        match (image, current) {
            (Some(image), Some(current)) if image == current => Ok(()),
            (Some(image), _) => self.show(image),
            (None, Some(_)) => {
                self.hide();
                Ok(())
            }
            (None, None) => Ok(()),
        }
    }

    /// Debounce a surface scroll. Ignored while idle.
    pub fn handle_scroll(&mut self) {
        if self.session.is_some() {
            self.scroll.schedule(&mut self.dom);
        }
    }

    /// A key was released while a session is active.
    ///
    /// Delete and Backspace remove the tracked image from the document first.
    /// Any key ends the session; a rejected delete is logged, not retried.
    pub fn handle_key_up(&mut self, key_code: u32) {
        let Some(session) = &self.session else {
            return;
        };
        if key_code == KEY_CODE_DELETE || key_code == KEY_CODE_BACKSPACE {
            let image = session.image.clone();
            if let Err(err) = self.editor.delete_embed(&image) {
                log::warn!("image resize: delete failed: {err}");
            }
        }
        self.hide();
    }

    /// The document changed under an active session; end it.
    pub fn handle_input(&mut self) {
        self.hide();
    }

    // --- Session lifecycle ---

    /// Open a session on `image`, closing any current one first.
    ///
    /// # Errors
    ///
    /// Propagates failures from creating the overlay or the modules. The
    /// partially built session stays in place for the caller to close.
    pub fn show(&mut self, image: D::Node) -> Result<(), ResizeError> {
        self.hide();
        log::debug!("image resize: opening session on {image:?}");
        let overlay = Overlay::show(&mut self.dom, &mut self.editor, &self.config.overlay_styles)?;
        self.session = Some(Session { image, overlay, modules: Vec::new(), config: Rc::clone(&self.config) });
        self.reposition()?;
        self.initialize_modules()
    }

    /// Close the session, if any. Idempotent.
    pub fn hide(&mut self) {
        self.scroll.cancel(&mut self.dom);
        let Some(mut session) = self.session.take() else {
            return;
        };
        log::debug!("image resize: closing session on {:?}", session.image);
        session.destroy_modules(&mut self.dom);
        session.overlay.hide(&mut self.dom, self.editor.root());
    }

    /// Place the overlay over the tracked image. No-op while idle.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::error::DomError::Detached`] error if the image has left the document.
    pub fn reposition(&mut self) -> Result<(), ResizeError> {
        let Some(session) = &self.session else {
            return Ok(());
        };
        session.overlay.reposition(&mut self.dom, &session.image, self.editor.container())?;
        Ok(())
    }

    /// Replace the live modules with fresh instances of the configured list.
    ///
    /// # Errors
    ///
    /// Returns [`ResizeError::UnknownModule`] before creating anything if an
    /// identifier cannot be resolved; otherwise propagates `on_create` failures.
    pub fn initialize_modules(&mut self) -> Result<(), ResizeError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        session.destroy_modules(&mut self.dom);
        let modules = self.registry.instantiate_all(&self.config.modules)?;
        session.create_modules(&mut self.dom, modules)?;
        self.global_update()
    }

    /// Reposition, update every module, then sync the mirrored content.
    ///
    /// # Errors
    ///
    /// Propagates reposition, module, and mirror failures.
    pub fn global_update(&mut self) -> Result<(), ResizeError> {
        if self.session.is_none() {
            return Ok(());
        }
        self.refresh_geometry()?;
        self.editor.sync_mirror()
    }

    /// Run a global update on behalf of a module that changed the image
    /// outside an event the controller routed. Ignored while idle; errors are
    /// logged and end the session.
    pub fn request_update(&mut self) {
        if let Err(err) = self.global_update() {
            log::warn!("image resize: {err}; closing session");
            self.hide();
        }
    }

    /// Destroy every live module in list order. Idempotent.
    pub fn remove_modules(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.destroy_modules(&mut self.dom);
        }
    }

    fn refresh_geometry(&mut self) -> Result<(), ResizeError> {
        self.reposition()?;
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        session.each_module(&mut self.dom, |module, ctx| module.on_update(ctx))
    }

    fn route_to_modules(&mut self, event: &DomEvent<D::Node>) -> Result<(), ResizeError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        if session.route_event(&mut self.dom, event)? {
            self.global_update()?;
        }
        Ok(())
    }

    // --- Queries ---

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    #[must_use]
    pub fn tracked_image(&self) -> Option<&D::Node> {
        self.session.as_ref().map(|s| &s.image)
    }

    #[must_use]
    pub fn session(&self) -> Option<&Session<D>> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn scroll_pending(&self) -> bool {
        self.scroll.is_pending()
    }

    #[must_use]
    pub fn dom(&self) -> &D {
        &self.dom
    }

    pub fn dom_mut(&mut self) -> &mut D {
        &mut self.dom
    }

    #[must_use]
    pub fn editor(&self) -> &E {
        &self.editor
    }

    /// Convenience for hosts that deliver events by listener id.
    pub fn fire(&mut self, id: ListenerId, data: EventData<D::Node>) {
        self.dispatch(DomEvent::Listener { id, data });
    }
}
