//! Browser bindings: `web-sys` implementations of [`Dom`] and [`Editor`], and
//! the `wasm-bindgen` surface a page uses to install the module into Quill.
//!
//! Every browser callback (listener, timer, or a script module asking for an
//! update) is pushed through a [`Hub`], which owns the controller. Callbacks
//! that arrive while the controller is already handling one are queued and
//! drained by the outer call, so handlers never re-enter.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::{Rc, Weak};
use std::sync::Once;

use gloo_timers::callback::Timeout;
use js_sys::{Array, Function, JSON, Object, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    Document, Event, EventTarget, HtmlDocument, HtmlElement, HtmlTextAreaElement, KeyboardEvent, MouseEvent,
};

use crate::config::Config;
use crate::controller::ImageResize;
use crate::dom::{Dom, DomEvent, Editor, EventData, EventKind, ListenTarget, ListenerId, Phase, TimerId};
use crate::error::{DomError, ResizeError};
use crate::geometry::{BoundingBox, ScrollOffset};
use crate::module::{FeatureModule, ModuleEntry, ModuleRegistry, SessionContext, split_module_list};

/// Quill module path suffix used when `register` is called without a name.
const DEFAULT_MODULE_NAME: &str = "imageResize";

type Controller = ImageResize<WebDom, QuillEditor>;

fn js_error(err: JsValue) -> DomError {
    DomError::Js(err.as_string().unwrap_or_else(|| format!("{err:?}")))
}

fn property(target: &JsValue, key: &str) -> Result<JsValue, DomError> {
    Reflect::get(target, &JsValue::from_str(key)).map_err(js_error)
}

// =============================================================================
// Hub
// =============================================================================

/// Something the page asked the controller to handle.
enum Delivery {
    Event(DomEvent<HtmlElement>),
    /// A script module changed the image and wants a global update.
    Update,
}

/// Owner of the controller and queue of undelivered callbacks.
struct Hub {
    controller: RefCell<Option<Controller>>,
    queue: RefCell<VecDeque<Delivery>>,
    /// `requestUpdate` handed to script modules; lives as long as the hub.
    request_update: Closure<dyn FnMut()>,
}

impl Hub {
    fn new() -> Rc<Self> {
        Rc::new_cyclic(|hub: &Weak<Hub>| {
            let hub = Weak::clone(hub);
            Self {
                controller: RefCell::new(None),
                queue: RefCell::new(VecDeque::new()),
                request_update: Closure::<dyn FnMut()>::new(move || {
                    if let Some(hub) = hub.upgrade() {
                        hub.deliver(Delivery::Update);
                    }
                }),
            }
        })
    }

    fn deliver(&self, delivery: Delivery) {
        self.queue.borrow_mut().push_back(delivery);
        let Ok(mut slot) = self.controller.try_borrow_mut() else {
            // The outer delivery drains the queue when it returns.
            return;
        };
        loop {
            let next = self.queue.borrow_mut().pop_front();
            let Some(delivery) = next else {
                break;
            };
            let Some(controller) = slot.as_mut() else {
                continue;
            };
            match delivery {
                Delivery::Event(event) => controller.dispatch(event),
                Delivery::Update => controller.request_update(),
            }
        }
    }

    fn request_update_fn(&self) -> Function {
        self.request_update.as_ref().unchecked_ref::<Function>().clone()
    }

    fn with<R>(&self, f: impl FnOnce(&mut Controller) -> R) -> Option<R> {
        let Ok(mut slot) = self.controller.try_borrow_mut() else {
            log::warn!("image resize: call ignored while an event is being handled");
            return None;
        };
        slot.as_mut().map(f)
    }
}

// =============================================================================
// WebDom
// =============================================================================

struct Registration {
    target: EventTarget,
    kind: EventKind,
    capture: bool,
    callback: Closure<dyn FnMut(Event)>,
}

impl Registration {
    fn detach(&self) {
        if let Err(err) = self.target.remove_event_listener_with_callback_and_bool(
            self.kind.as_str(),
            self.callback.as_ref().unchecked_ref(),
            self.capture,
        ) {
            log::warn!("image resize: removing {} listener failed: {err:?}", self.kind.as_str());
        }
    }
}

/// [`Dom`] over the page's live document.
pub struct WebDom {
    document: Document,
    hub: Weak<Hub>,
    listeners: HashMap<ListenerId, Registration>,
    timers: HashMap<TimerId, Timeout>,
    next_listener: u64,
    next_timer: u64,
}

impl WebDom {
    fn new(document: Document, hub: Weak<Hub>) -> Self {
        Self { document, hub, listeners: HashMap::new(), timers: HashMap::new(), next_listener: 0, next_timer: 0 }
    }

    fn document_element(&self) -> Result<HtmlElement, DomError> {
        self.document
            .document_element()
            .ok_or_else(|| DomError::Js("document has no root element".to_owned()))?
            .dyn_into::<HtmlElement>()
            .map_err(|_| DomError::Js("document root is not an HTML element".to_owned()))
    }
}

impl Drop for WebDom {
    fn drop(&mut self) {
        for (_, registration) in self.listeners.drain() {
            registration.detach();
        }
    }
}

fn event_data(event: &Event) -> EventData<HtmlElement> {
    let mut data = EventData {
        target: event.target().and_then(|t| t.dyn_ref::<HtmlElement>().cloned()),
        ..EventData::default()
    };
    if let Some(key) = event.dyn_ref::<KeyboardEvent>() {
        data.key_code = key.key_code();
    }
    if let Some(mouse) = event.dyn_ref::<MouseEvent>() {
        data.client_x = f64::from(mouse.client_x());
        data.client_y = f64::from(mouse.client_y());
    }
    data
}

impl Dom for WebDom {
    type Node = HtmlElement;

    fn create_element(&mut self, tag: &str) -> Result<HtmlElement, DomError> {
        self.document
            .create_element(tag)
            .map_err(js_error)?
            .dyn_into::<HtmlElement>()
            .map_err(|_| DomError::Js(format!("<{tag}> is not an HTML element")))
    }

    fn append_child(&mut self, parent: &HtmlElement, child: &HtmlElement) -> Result<(), DomError> {
        parent.append_child(child).map(|_| ()).map_err(js_error)
    }

    fn remove(&mut self, node: &HtmlElement) {
        node.remove();
    }

    fn set_style(&mut self, node: &HtmlElement, property: &str, value: &str) -> Result<(), DomError> {
        let style = node.style();
        if value.is_empty() {
            style.remove_property(property).map(|_| ()).map_err(js_error)
        } else {
            style.set_property(property, value).map_err(js_error)
        }
    }

    fn style(&self, node: &HtmlElement, property: &str) -> Option<String> {
        match node.style().get_property_value(property) {
            Ok(value) if !value.is_empty() => Some(value),
            _ => None,
        }
    }

    fn set_document_style(&mut self, property: &str, value: &str) -> Result<(), DomError> {
        let root = self.document_element()?;
        self.set_style(&root, property, value)
    }

    fn document_style(&self, property: &str) -> Option<String> {
        match self.document_element() {
            Ok(root) => self.style(&root, property),
            Err(err) => {
                log::warn!("image resize: reading document {property}: {err}");
                None
            }
        }
    }

    fn set_text(&mut self, node: &HtmlElement, text: &str) -> Result<(), DomError> {
        node.set_text_content(Some(text));
        Ok(())
    }

    fn set_attribute(&mut self, node: &HtmlElement, name: &str, value: &str) -> Result<(), DomError> {
        node.set_attribute(name, value).map_err(js_error)
    }

    fn bounding_rect(&self, node: &HtmlElement) -> Option<BoundingBox> {
        if !node.is_connected() {
            return None;
        }
        let rect = node.get_bounding_client_rect();
        Some(BoundingBox::new(rect.left(), rect.top(), rect.width(), rect.height()))
    }

    fn scroll_offset(&self, node: &HtmlElement) -> ScrollOffset {
        ScrollOffset { left: f64::from(node.scroll_left()), top: f64::from(node.scroll_top()) }
    }

    fn closest(&self, node: &HtmlElement, selector: &str, scope: &HtmlElement) -> Option<HtmlElement> {
        let found = match node.closest(selector) {
            Ok(Some(found)) => found,
            Ok(None) => return None,
            Err(err) => {
                log::warn!("image resize: invalid selector {selector:?}: {err:?}");
                return None;
            }
        };
        let Ok(found) = found.dyn_into::<HtmlElement>() else {
            log::debug!("image resize: {selector:?} matched a non-HTML element");
            return None;
        };
        let inside = {
            let node: &web_sys::Node = &found;
            found != *scope && scope.contains(Some(node))
        };
        inside.then_some(found)
    }

    fn listen(&mut self, target: ListenTarget<HtmlElement>, kind: EventKind, phase: Phase) -> Result<ListenerId, DomError> {
        self.next_listener += 1;
        let id = ListenerId(self.next_listener);
        let target = match target {
            ListenTarget::Document => EventTarget::from(self.document.clone()),
            ListenTarget::Node(node) => EventTarget::from(node),
        };
        let hub = Weak::clone(&self.hub);
        let callback = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            if let Some(hub) = hub.upgrade() {
                hub.deliver(Delivery::Event(DomEvent::Listener { id, data: event_data(&event) }));
            }
        });
        let capture = phase == Phase::Capture;
        target
            .add_event_listener_with_callback_and_bool(kind.as_str(), callback.as_ref().unchecked_ref(), capture)
            .map_err(js_error)?;
        self.listeners.insert(id, Registration { target, kind, capture, callback });
        Ok(id)
    }

    fn unlisten(&mut self, id: ListenerId) {
        if let Some(registration) = self.listeners.remove(&id) {
            registration.detach();
        }
    }

    fn set_timeout(&mut self, delay_ms: u32) -> TimerId {
        self.next_timer += 1;
        let id = TimerId(self.next_timer);
        let hub = Weak::clone(&self.hub);
        let timeout = Timeout::new(delay_ms, move || {
            if let Some(hub) = hub.upgrade() {
                hub.deliver(Delivery::Event(DomEvent::Timer(id)));
            }
        });
        self.timers.insert(id, timeout);
        id
    }

    fn clear_timeout(&mut self, id: TimerId) {
        // Dropping a Timeout cancels it.
        self.timers.remove(&id);
    }

    fn disable_native_resize(&mut self) {
        let Some(document) = self.document.dyn_ref::<HtmlDocument>() else {
            return;
        };
        if let Err(err) = document.exec_command_with_show_ui_and_value("enableObjectResizing", false, "false") {
            log::debug!("image resize: enableObjectResizing unsupported: {err:?}");
        }
    }
}

// =============================================================================
// QuillEditor
// =============================================================================

/// [`Editor`] over a Quill instance, reached by reflection.
pub struct QuillEditor {
    quill: JsValue,
    root: HtmlElement,
    container: HtmlElement,
}

impl QuillEditor {
    fn new(quill: JsValue) -> Result<Self, ResizeError> {
        let root = property(&quill, "root")?
            .dyn_into::<HtmlElement>()
            .map_err(|_| ResizeError::Editor("quill.root is not an element".to_owned()))?;
        let container = root
            .parent_element()
            .ok_or_else(|| ResizeError::Editor("quill.root has no parent element".to_owned()))?
            .dyn_into::<HtmlElement>()
            .map_err(|_| ResizeError::Editor("quill.root's parent is not an HTML element".to_owned()))?;
        Ok(Self { quill, root, container })
    }
}

fn method(target: &JsValue, name: &str) -> Result<Function, ResizeError> {
    property(target, name)?
        .dyn_into::<Function>()
        .map_err(|_| ResizeError::Editor(format!("{name} is not a function")))
}

fn editor_error(err: JsValue) -> ResizeError {
    ResizeError::Editor(err.as_string().unwrap_or_else(|| format!("{err:?}")))
}

impl Editor<HtmlElement> for QuillEditor {
    fn root(&self) -> &HtmlElement {
        &self.root
    }

    fn container(&self) -> &HtmlElement {
        &self.container
    }

    fn clear_selection(&mut self) -> Result<(), ResizeError> {
        let set_selection = method(&self.quill, "setSelection")?;
        set_selection.call1(&self.quill, &JsValue::NULL).map_err(editor_error)?;
        Ok(())
    }

    fn delete_embed(&mut self, node: &HtmlElement) -> Result<(), ResizeError> {
        let class = property(&self.quill, "constructor")?;
        let blot = method(&class, "find")?.call1(&class, node).map_err(editor_error)?;
        if blot.is_null() || blot.is_undefined() {
            return Err(ResizeError::Editor("no blot wraps the image".to_owned()));
        }
        method(&blot, "deleteAt")?
            .call2(&blot, &JsValue::from(0), &JsValue::from(1))
            .map_err(editor_error)?;
        Ok(())
    }

    fn sync_mirror(&mut self) -> Result<(), ResizeError> {
        let container = property(&self.quill, "container")?
            .dyn_into::<HtmlElement>()
            .map_err(|_| ResizeError::Editor("quill.container is not an element".to_owned()))?;
        // No wrapper, no mirror.
        let Some(outer) = container.parent_element() else {
            return Ok(());
        };
        let Some(mirror) = outer.query_selector("textarea").map_err(editor_error)? else {
            return Ok(());
        };
        let textarea = mirror
            .dyn_into::<HtmlTextAreaElement>()
            .map_err(|_| ResizeError::Editor("mirror is not a textarea".to_owned()))?;
        textarea.set_value(&self.root.inner_html());
        Ok(())
    }
}

// =============================================================================
// Script-defined modules
// =============================================================================

/// A caller-supplied JS class driven through the module lifecycle.
///
/// The class is constructed with `{ img, overlay, options, requestUpdate }`,
/// where `options` is the merged configuration and `requestUpdate()` runs a
/// global update. Its `onCreate`, `onUpdate` and `onDestroy` methods are
/// called when present.
struct JsModule {
    class: Function,
    request_update: Function,
    instance: Option<JsValue>,
}

impl JsModule {
    fn call(&self, hook: &str) -> Result<(), DomError> {
        let Some(instance) = &self.instance else {
            return Ok(());
        };
        if let Some(method) = property(instance, hook)?.dyn_ref::<Function>() {
            method.call0(instance).map_err(js_error)?;
        }
        Ok(())
    }
}

impl FeatureModule<WebDom> for JsModule {
    fn on_create(&mut self, ctx: &mut SessionContext<'_, WebDom>) -> Result<(), ResizeError> {
        let options = JSON::parse(&serde_json::to_string(ctx.config)?).map_err(js_error)?;
        let init = Object::new();
        Reflect::set(&init, &JsValue::from_str("img"), ctx.image).map_err(js_error)?;
        Reflect::set(&init, &JsValue::from_str("overlay"), ctx.overlay).map_err(js_error)?;
        Reflect::set(&init, &JsValue::from_str("options"), &options).map_err(js_error)?;
        Reflect::set(&init, &JsValue::from_str("requestUpdate"), &self.request_update).map_err(js_error)?;
        let instance = Reflect::construct(&self.class, &Array::of1(&init)).map_err(js_error)?;
        self.instance = Some(instance);
        Ok(self.call("onCreate")?)
    }

    fn on_update(&mut self, _ctx: &mut SessionContext<'_, WebDom>) -> Result<(), ResizeError> {
        Ok(self.call("onUpdate")?)
    }

    fn on_destroy(&mut self, _ctx: &mut SessionContext<'_, WebDom>) {
        if let Err(err) = self.call("onDestroy") {
            log::warn!("image resize: module onDestroy failed: {err}");
        }
        self.instance = None;
    }
}

fn module_entry(entry: JsValue) -> Result<ModuleEntry<Function>, ResizeError> {
    if let Some(name) = entry.as_string() {
        return Ok(ModuleEntry::Name(name));
    }
    let class = entry
        .dyn_into::<Function>()
        .map_err(|other| ResizeError::UnknownModule(format!("{other:?}")))?;
    let name = property(&class, "name")?.as_string();
    Ok(ModuleEntry::Definition { name, definition: class })
}

/// Options JSON with script classes in `modules` replaced by their names,
/// plus the classes themselves keyed by name.
fn split_options(options: &JsValue) -> Result<(String, Vec<(String, Function)>), ResizeError> {
    let Some(source) = options.dyn_ref::<Object>() else {
        return Ok(("{}".to_owned(), Vec::new()));
    };
    let copy = Object::assign(&Object::new(), source);

    let modules = property(&copy, "modules")?;
    let classes = match modules.dyn_ref::<Array>() {
        Some(list) => {
            let entries = list.iter().map(module_entry).collect::<Result<Vec<_>, _>>()?;
            let split = split_module_list(entries)?;
            let names: Array = split.names.iter().map(|name| JsValue::from_str(name)).collect();
            Reflect::set(&copy, &JsValue::from_str("modules"), &names).map_err(js_error)?;
            split.definitions
        }
        None => Vec::new(),
    };

    let json = JSON::stringify(&copy).map_err(js_error)?;
    Ok((String::from(json), classes))
}

// =============================================================================
// Entry points
// =============================================================================

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        console_error_panic_hook::set_once();
        if let Err(err) = console_log::init_with_level(log::Level::Info) {
            log::debug!("image resize: logger already installed: {err}");
        }
    });
}

fn attach(quill: JsValue, options: &JsValue) -> Result<Rc<Hub>, ResizeError> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| ResizeError::Dom(DomError::Js("no document".to_owned())))?;
    let (json, classes) = split_options(options)?;
    let config = Config::from_json(&json)?;
    let hub = Hub::new();

    let mut registry = ModuleRegistry::new();
    for (name, class) in classes {
        let request_update = hub.request_update_fn();
        registry.register(
            name,
            Box::new(move || {
                Box::new(JsModule { class: class.clone(), request_update: request_update.clone(), instance: None })
                    as Box<dyn FeatureModule<WebDom>>
            }),
        );
    }

    let dom = WebDom::new(document, Rc::downgrade(&hub));
    let controller = ImageResize::new(dom, QuillEditor::new(quill)?, config, registry)?;
    *hub.controller.borrow_mut() = Some(controller);
    Ok(hub)
}

/// The Quill module instance.
#[wasm_bindgen(js_name = ImageResize)]
pub struct ImageResizeModule {
    hub: Rc<Hub>,
}

#[wasm_bindgen(js_class = ImageResize)]
impl ImageResizeModule {
    /// Attach to `quill` with the caller's `options` object.
    ///
    /// # Errors
    ///
    /// Throws if the options are malformed, name an unknown module, or the
    /// editor is not mounted.
    #[wasm_bindgen(constructor)]
    pub fn new(quill: JsValue, options: JsValue) -> Result<ImageResizeModule, JsValue> {
        init_logging();
        attach(quill, &options)
            .map(|hub| Self { hub })
            .map_err(|err| js_sys::Error::new(&err.to_string()).into())
    }

    /// Close the current session, if any.
    pub fn hide(&self) {
        self.hub.with(Controller::hide);
    }

    #[wasm_bindgen(js_name = isActive)]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.hub.with(|c| c.is_active()).unwrap_or(false)
    }

    /// Close any session and stop listening to the editor.
    pub fn destroy(&self) {
        self.hub.with(Controller::detach);
        if let Ok(mut slot) = self.hub.controller.try_borrow_mut() {
            slot.take();
        }
    }
}

/// Install the module into `quill_class` as `modules/<name>`.
///
/// # Errors
///
/// Throws if `quill_class.register` is missing or rejects the module.
#[wasm_bindgen]
pub fn register(quill_class: &JsValue, name: Option<String>) -> Result<(), JsValue> {
    init_logging();
    let path = format!("modules/{}", name.as_deref().unwrap_or(DEFAULT_MODULE_NAME));

    let factory = Closure::<dyn FnMut(JsValue, JsValue) -> JsValue>::new(|quill: JsValue, options: JsValue| {
        match ImageResizeModule::new(quill, options) {
            Ok(module) => JsValue::from(module),
            Err(err) => wasm_bindgen::throw_val(err),
        }
    });
    let wrap = Function::new_with_args(
        "factory",
        "return function ImageResize(quill, options) { return factory(quill, options); };",
    );
    let constructor = wrap.call1(&JsValue::NULL, factory.as_ref())?;
    // Quill keeps the constructor for the lifetime of the page.
    factory.forget();

    let register = property(quill_class, "register")
        .map_err(|err| JsValue::from_str(&err.to_string()))?
        .dyn_into::<Function>()?;
    register.call2(quill_class, &JsValue::from_str(&path), &constructor)?;
    log::info!("image resize: registered as {path}");
    Ok(())
}
