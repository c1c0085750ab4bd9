//! Page capability: everything the toggler needs from the host DOM.
//!
//! The toggling logic only ever talks to a `PageQuery`, so it runs the same
//! against the real document (`web::WebPage`) and against `MemoryPage`.
//!
//! ```text
//! DiffToggler ──► PageQuery ──┬──► WebPage ──► web_sys::Document
//!                             └──► MemoryPage (tests)
//! ```

pub mod memory;

use crate::error::Result;
use crate::toolbar::Toolbar;
use std::cell::Cell;
use std::rc::Rc;

pub use memory::{DiffFixture, FileFixture, MemoryPage, NodeId};

/// What a bound click does once it reaches the toggler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClickAction {
    /// Flip the body under the clicked file header.
    ToggleFile,
    ShowAll,
    CollapseAll,
}

/// The parts of a DOM click event the toggler looks at.
pub trait ClickEvent<N> {
    /// Element the click originated on (not the element the listener is on).
    fn target(&self) -> Option<N>;
    fn prevent_default(&self);
}

/// DOM access, narrowed to what the toggler uses.
///
/// All methods take `&self`; the document is shared mutable state and the
/// implementations use interior mutability the same way the browser does.
pub trait PageQuery {
    type Node: Clone;

    /// Elements carrying `class`, in document order.
    fn by_class(&self, class: &str) -> Vec<Self::Node>;

    fn count_class(&self, class: &str) -> usize {
        self.by_class(class).len()
    }

    /// Elements matching a CSS selector, in document order.
    fn select_all(&self, selector: &str) -> Vec<Self::Node>;

    fn select_first(&self, selector: &str) -> Option<Self::Node> {
        self.select_all(selector).into_iter().next()
    }

    fn by_id(&self, id: &str) -> Option<Self::Node>;

    fn has_class(&self, node: &Self::Node, class: &str) -> bool;

    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Next element sibling.
    fn next_sibling(&self, node: &Self::Node) -> Option<Self::Node>;

    fn remove(&self, node: &Self::Node) -> Result<()>;

    fn add_class(&self, node: &Self::Node, class: &str) -> Result<()>;

    fn remove_class(&self, node: &Self::Node, class: &str) -> Result<()>;

    /// Insert the toolbar as the first child of `anchor`.
    fn prepend_toolbar(&self, anchor: &Self::Node, toolbar: &Toolbar) -> Result<()>;

    /// Route clicks on `node` to `action`.
    ///
    /// Binding the same action to the same node twice must not make it fire
    /// twice (`addEventListener` semantics with a shared listener).
    fn on_click(&self, node: &Self::Node, action: ClickAction) -> Result<()>;

    /// Replace `from` with `to`, keeping the two classes mutually exclusive.
    fn swap_class(&self, node: &Self::Node, from: &str, to: &str) -> Result<()> {
        self.remove_class(node, from)?;
        self.add_class(node, to)
    }
}

impl<P: PageQuery + ?Sized> PageQuery for Rc<P> {
    type Node = P::Node;

    fn by_class(&self, class: &str) -> Vec<Self::Node> {
        (**self).by_class(class)
    }

    fn count_class(&self, class: &str) -> usize {
        (**self).count_class(class)
    }

    fn select_all(&self, selector: &str) -> Vec<Self::Node> {
        (**self).select_all(selector)
    }

    fn select_first(&self, selector: &str) -> Option<Self::Node> {
        (**self).select_first(selector)
    }

    fn by_id(&self, id: &str) -> Option<Self::Node> {
        (**self).by_id(id)
    }

    fn has_class(&self, node: &Self::Node, class: &str) -> bool {
        (**self).has_class(node, class)
    }

    fn parent(&self, node: &Self::Node) -> Option<Self::Node> {
        (**self).parent(node)
    }

    fn next_sibling(&self, node: &Self::Node) -> Option<Self::Node> {
        (**self).next_sibling(node)
    }

    fn remove(&self, node: &Self::Node) -> Result<()> {
        (**self).remove(node)
    }

    fn add_class(&self, node: &Self::Node, class: &str) -> Result<()> {
        (**self).add_class(node, class)
    }

    fn remove_class(&self, node: &Self::Node, class: &str) -> Result<()> {
        (**self).remove_class(node, class)
    }

    fn prepend_toolbar(&self, anchor: &Self::Node, toolbar: &Toolbar) -> Result<()> {
        (**self).prepend_toolbar(anchor, toolbar)
    }

    fn on_click(&self, node: &Self::Node, action: ClickAction) -> Result<()> {
        (**self).on_click(node, action)
    }
}

/// A click that did not come from a browser, e.g. a test or a replay.
#[derive(Debug)]
pub struct SimulatedClick<N> {
    target: Option<N>,
    default_prevented: Cell<bool>,
}

impl<N: Clone> SimulatedClick<N> {
    pub fn on(target: N) -> Self {
        Self {
            target: Some(target),
            default_prevented: Cell::new(false),
        }
    }

    pub fn without_target() -> Self {
        Self {
            target: None,
            default_prevented: Cell::new(false),
        }
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}

impl<N: Clone> ClickEvent<N> for SimulatedClick<N> {
    fn target(&self) -> Option<N> {
        self.target.clone()
    }

    fn prevent_default(&self) {
        self.default_prevented.set(true);
    }
}
