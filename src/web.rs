//! Browser bindings: web-sys adapters and the exported entry points.
//!
//! ```text
//! setInterval ──► IntervalHandle ──► PollLoop::tick ──► DiffToggler::initialize
//! click ──► shared listener Closure ──► DiffToggler::dispatch
//!                                            │
//!                      WebPage (document) ◄──┴──► LocalStorageStore (localStorage)
//! ```
//!
//! Listeners are created once per `ClickAction` and reused, so re-binding a
//! header on a later `initialize()` hits `addEventListener`'s duplicate check
//! instead of stacking handlers.

use crate::config::TogglerConfig;
use crate::error::{Result, TogglerError};
use crate::markers::Markers;
use crate::page::{ClickAction, ClickEvent, PageQuery};
use crate::preference::{GlobalPreference, PreferenceStore};
use crate::scheduler::PollLoop;
use crate::toggler::DiffToggler;
use crate::toolbar::Toolbar;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Event, Storage, Window};

pub type WebToggler = DiffToggler<WebPage, LocalStorageStore>;

type Poll = PollLoop<Box<dyn FnMut() -> bool>>;

// =============================================================================
// PAGE
// =============================================================================

pub struct WebPage {
    document: Document,
    toggler: Weak<WebToggler>,
    listeners: RefCell<Vec<(ClickAction, Closure<dyn FnMut(Event)>)>>,
}

impl WebPage {
    pub fn new(document: Document, toggler: Weak<WebToggler>) -> Self {
        Self {
            document,
            toggler,
            listeners: RefCell::new(Vec::new()),
        }
    }

    fn listener_for(&self, action: ClickAction) -> js_sys::Function {
        let mut listeners = self.listeners.borrow_mut();
        if let Some((_, closure)) = listeners.iter().find(|(a, _)| *a == action) {
            return closure.as_ref().unchecked_ref::<js_sys::Function>().clone();
        }

        let toggler = self.toggler.clone();
        let closure = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            if let Some(toggler) = toggler.upgrade() {
                toggler.dispatch(action, &WebClick(event));
            }
        });
        let function = closure.as_ref().unchecked_ref::<js_sys::Function>().clone();
        listeners.push((action, closure));
        function
    }
}

impl Drop for WebPage {
    fn drop(&mut self) {
        // Headers may outlive us and still call these; leak them so the call
        // lands in a closure whose weak toggler no longer upgrades.
        for (_, closure) in self.listeners.borrow_mut().drain(..) {
            closure.forget();
        }
    }
}

impl PageQuery for WebPage {
    type Node = Element;

    fn by_class(&self, class: &str) -> Vec<Element> {
        // HtmlCollection is live; snapshot it before anything mutates classes.
        let collection = self.document.get_elements_by_class_name(class);
        (0..collection.length())
            .filter_map(|i| collection.item(i))
            .collect()
    }

    fn count_class(&self, class: &str) -> usize {
        self.document.get_elements_by_class_name(class).length() as usize
    }

    fn select_all(&self, selector: &str) -> Vec<Element> {
        match self.document.query_selector_all(selector) {
            Ok(list) => (0..list.length())
                .filter_map(|i| list.get(i))
                .filter_map(|node| node.dyn_into::<Element>().ok())
                .collect(),
            Err(err) => {
                tracing::warn!("WebPage: bad selector {:?}: {:?}", selector, err);
                Vec::new()
            }
        }
    }

    fn select_first(&self, selector: &str) -> Option<Element> {
        self.document.query_selector(selector).ok().flatten()
    }

    fn by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn has_class(&self, node: &Element, class: &str) -> bool {
        node.class_list().contains(class)
    }

    fn parent(&self, node: &Element) -> Option<Element> {
        node.parent_element()
    }

    fn next_sibling(&self, node: &Element) -> Option<Element> {
        node.next_element_sibling()
    }

    fn remove(&self, node: &Element) -> Result<()> {
        node.remove();
        Ok(())
    }

    fn add_class(&self, node: &Element, class: &str) -> Result<()> {
        node.class_list().add_1(class)?;
        Ok(())
    }

    fn remove_class(&self, node: &Element, class: &str) -> Result<()> {
        node.class_list().remove_1(class)?;
        Ok(())
    }

    fn prepend_toolbar(&self, anchor: &Element, toolbar: &Toolbar) -> Result<()> {
        anchor.insert_adjacent_html("afterbegin", &toolbar.to_html())?;
        Ok(())
    }

    fn on_click(&self, node: &Element, action: ClickAction) -> Result<()> {
        let listener = self.listener_for(action);
        node.add_event_listener_with_callback("click", &listener)?;
        Ok(())
    }
}

struct WebClick(Event);

impl ClickEvent<Element> for WebClick {
    fn target(&self) -> Option<Element> {
        self.0.target().and_then(|t| t.dyn_into::<Element>().ok())
    }

    fn prevent_default(&self) {
        self.0.prevent_default();
    }
}

// =============================================================================
// STORAGE
// =============================================================================

/// `window.localStorage`, which may be missing or throw on access.
pub struct LocalStorageStore {
    storage: Option<Storage>,
    markers: Markers,
}

impl LocalStorageStore {
    pub fn new(window: &Window, markers: Markers) -> Self {
        let storage = match window.local_storage() {
            Ok(storage) => storage,
            Err(err) => {
                tracing::warn!("LocalStorageStore: localStorage blocked: {:?}", err);
                None
            }
        };
        Self { storage, markers }
    }

    fn storage(&self) -> Result<&Storage> {
        self.storage.as_ref().ok_or_else(|| {
            TogglerError::StorageUnavailable("window.localStorage is not available".to_string())
        })
    }
}

impl PreferenceStore for LocalStorageStore {
    fn get(&self) -> Result<Option<GlobalPreference>> {
        let value = self
            .storage()?
            .get_item(&self.markers.storage_key)
            .map_err(|e| TogglerError::Storage(format!("{:?}", e)))?;
        Ok(value.and_then(|v| GlobalPreference::from_stored(&v, &self.markers)))
    }

    fn set(&self, preference: GlobalPreference) -> Result<()> {
        self.storage()?
            .set_item(
                &self.markers.storage_key,
                preference.as_stored(&self.markers),
            )
            .map_err(|e| TogglerError::Storage(format!("{:?}", e)))
    }
}

// =============================================================================
// TIMER
// =============================================================================

/// A running `setInterval`; cleared on `cancel()` or drop.
pub struct IntervalHandle {
    window: Window,
    id: Option<i32>,
    poll: Rc<RefCell<Poll>>,
    _callback: Closure<dyn FnMut()>,
}

impl IntervalHandle {
    pub fn start(window: &Window, period_ms: u32, poll: Rc<RefCell<Poll>>) -> Result<Self> {
        let tick_poll = poll.clone();
        let callback = Closure::<dyn FnMut()>::new(move || {
            // A tick never re-enters itself, but don't panic if it somehow does.
            if let Ok(mut poll) = tick_poll.try_borrow_mut() {
                poll.tick();
            }
        });
        let period = i32::try_from(period_ms).unwrap_or(i32::MAX);
        let id = window.set_interval_with_callback_and_timeout_and_arguments_0(
            callback.as_ref().unchecked_ref(),
            period,
        )?;
        Ok(Self {
            window: window.clone(),
            id: Some(id),
            poll,
            _callback: callback,
        })
    }

    pub fn cancel(&mut self) {
        if let Some(id) = self.id.take() {
            self.window.clear_interval_with_handle(id);
            if let Ok(mut poll) = self.poll.try_borrow_mut() {
                poll.cancel();
            }
        }
    }

}

impl Drop for IntervalHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

// =============================================================================
// ENTRY POINTS
// =============================================================================

struct Session {
    toggler: Rc<WebToggler>,
    interval: IntervalHandle,
}

thread_local! {
    static SESSION: RefCell<Option<Session>> = const { RefCell::new(None) };
}

fn launch(config: TogglerConfig) -> Result<()> {
    let running = SESSION.with(|session| session.borrow().is_some());
    if running {
        tracing::info!("diff-toggler: already running");
        return Ok(());
    }

    let window =
        web_sys::window().ok_or_else(|| TogglerError::Dom("no window".to_string()))?;
    let document = window
        .document()
        .ok_or_else(|| TogglerError::Dom("no document".to_string()))?;

    let markers = config.markers.clone();
    let store = LocalStorageStore::new(&window, markers.clone());
    let toggler = Rc::new_cyclic(|weak: &Weak<WebToggler>| {
        DiffToggler::new(WebPage::new(document, weak.clone()), store, markers)
    });

    let tick_toggler = Rc::downgrade(&toggler);
    let task: Box<dyn FnMut() -> bool> = Box::new(move || {
        tick_toggler
            .upgrade()
            .map(|toggler| toggler.initialize())
            .unwrap_or(false)
    });
    let poll = Rc::new(RefCell::new(PollLoop::new(task)));
    let interval = IntervalHandle::start(&window, config.poll_interval_ms, poll)?;

    SESSION.with(|session| {
        *session.borrow_mut() = Some(Session {
            toggler,
            interval,
        });
    });
    tracing::info!(
        "diff-toggler: polling every {}ms",
        config.poll_interval_ms
    );
    Ok(())
}

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default();
}

/// Start with the default markers.
#[wasm_bindgen]
pub fn start() -> std::result::Result<(), JsValue> {
    launch(TogglerConfig::default()).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Start with a partial config object, e.g. `{ pollIntervalMs: 1000 }`.
#[wasm_bindgen(js_name = startWithConfig)]
pub fn start_with_config(config: JsValue) -> std::result::Result<(), JsValue> {
    let config = TogglerConfig::from_js(config).map_err(|e| JsValue::from_str(&e.to_string()))?;
    launch(config).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Cancel the poll loop and remove the toolbar, so a later `start()` can
/// enhance the page again. Header listeners already on the page become
/// no-ops.
#[wasm_bindgen]
pub fn stop() {
    let session = SESSION.with(|session| session.borrow_mut().take());
    if let Some(mut session) = session {
        session.interval.cancel();
        session.toggler.teardown();
        tracing::info!("diff-toggler: stopped");
    }
}
