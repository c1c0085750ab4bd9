//! The single persisted show/hide-all choice.

use crate::error::{Result, TogglerError};
use crate::markers::Markers;
use std::cell::{Cell, RefCell};

/// Last bulk action the user took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlobalPreference {
    Collapsed,
    Expanded,
}

impl GlobalPreference {
    /// Stored literal for this preference.
    pub fn as_stored<'a>(&self, markers: &'a Markers) -> &'a str {
        match self {
            GlobalPreference::Collapsed => &markers.state_collapsed,
            GlobalPreference::Expanded => &markers.state_expanded,
        }
    }

    /// Anything other than the two literals counts as "nothing stored".
    pub fn from_stored(value: &str, markers: &Markers) -> Option<Self> {
        if value == markers.state_collapsed {
            Some(GlobalPreference::Collapsed)
        } else if value == markers.state_expanded {
            Some(GlobalPreference::Expanded)
        } else {
            None
        }
    }
}

/// Durable get/set of one `GlobalPreference`.
///
/// Methods take `&self`: the browser store is a shared handle, and the
/// toggler is only ever reached through shared references from event
/// callbacks.
pub trait PreferenceStore {
    fn get(&self) -> Result<Option<GlobalPreference>>;
    fn set(&self, preference: GlobalPreference) -> Result<()>;
}

/// In-process store for tests and non-browser hosts.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    value: RefCell<Option<GlobalPreference>>,
    unavailable: Cell<bool>,
    writes: Cell<usize>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(preference: GlobalPreference) -> Self {
        let store = Self::default();
        *store.value.borrow_mut() = Some(preference);
        store
    }

    /// Make every subsequent get/set fail, like a blocked `localStorage`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.set(unavailable);
    }

    /// Current value, bypassing the availability switch.
    pub fn peek(&self) -> Option<GlobalPreference> {
        *self.value.borrow()
    }

    /// Number of successful writes.
    pub fn writes(&self) -> usize {
        self.writes.get()
    }

    fn check(&self) -> Result<()> {
        if self.unavailable.get() {
            Err(TogglerError::StorageUnavailable(
                "memory store disabled".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self) -> Result<Option<GlobalPreference>> {
        self.check()?;
        Ok(self.peek())
    }

    fn set(&self, preference: GlobalPreference) -> Result<()> {
        self.check()?;
        *self.value.borrow_mut() = Some(preference);
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

impl<S: PreferenceStore + ?Sized> PreferenceStore for std::rc::Rc<S> {
    fn get(&self) -> Result<Option<GlobalPreference>> {
        (**self).get()
    }

    fn set(&self, preference: GlobalPreference) -> Result<()> {
        (**self).set(preference)
    }
}
