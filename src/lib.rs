//! diff-toggler - show/collapse controls for pull-request diffs
//!
//! Content script (compiled to WASM) that adds "Show All" / "Collapse All"
//! buttons to a pull-request diff view, makes each file header toggle its own
//! diff body, and remembers the last bulk choice in `localStorage`.
//!
//! The host page is a single-page app, so the toggler is re-probed on a timer
//! and re-initializes whenever a diff view shows up without its toolbar.
//!
//! # Architecture
//!
//! ```text
//! web::start ──► IntervalHandle ──► PollLoop ──► DiffToggler
//!                                                  │      │
//!                                          PageQuery    PreferenceStore
//!                                          │      │      │           │
//!                                    WebPage  MemoryPage LocalStorage Memory
//! ```
//!
//! Everything above the adapters is platform-free and tested natively
//! against `MemoryPage` and `MemoryPreferenceStore`.

pub mod config;
pub mod error;
pub mod markers;
pub mod page;
pub mod preference;
pub mod scheduler;
pub mod toggler;
pub mod toolbar;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use config::{TogglerConfig, DEFAULT_POLL_INTERVAL_MS};
pub use error::{Result, TogglerError};
pub use markers::Markers;
pub use page::{ClickAction, ClickEvent, MemoryPage, PageQuery, SimulatedClick};
pub use preference::{GlobalPreference, MemoryPreferenceStore, PreferenceStore};
pub use scheduler::{PollLoop, PollState};
pub use toggler::DiffToggler;
pub use toolbar::{Toolbar, ToolbarButton};
