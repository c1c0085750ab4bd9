//! Show/hide control for the files of a pull-request diff.
//!
//! `DiffToggler` owns no DOM state of its own. Visibility lives in marker
//! classes on each diff body, and "already enhanced" is the presence of the
//! toolbar, so every operation can be re-run against whatever the host page
//! currently renders.
//!
//! Lifecycle per poll tick:
//!
//! ```text
//! tick ──► initialize() ──► can_load_extension()? ──no──► false
//!                                  │ yes
//!                                  ▼
//!           remove native buttons ─► bind headers ─► toolbar ─► apply preference
//! ```

use crate::error::{Result, TogglerError};
use crate::markers::Markers;
use crate::page::{ClickAction, ClickEvent, PageQuery};
use crate::preference::{GlobalPreference, PreferenceStore};
use crate::toolbar::Toolbar;
use std::cell::Cell;

pub struct DiffToggler<P, S> {
    page: P,
    store: S,
    markers: Markers,
    toolbar: Toolbar,
    /// Set after the first missing-anchor warning; cleared once injected.
    anchor_missing: Cell<bool>,
}

impl<P: PageQuery, S: PreferenceStore> DiffToggler<P, S> {
    pub fn new(page: P, store: S, markers: Markers) -> Self {
        let toolbar = Toolbar::from_markers(&markers);
        Self {
            page,
            store,
            markers,
            toolbar,
            anchor_missing: Cell::new(false),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Enhance the page if it is a diff view that has not been enhanced yet.
    ///
    /// Returns false, touching nothing, when the toolbar already exists or
    /// there is no diff on the page. Returns false after binding headers if
    /// the toolbar anchor has not rendered yet; the next call retries.
    pub fn initialize(&self) -> bool {
        if !self.can_load_extension() {
            return false;
        }

        let removed = self.remove_default_collapse_buttons();
        let bound = self.bind_headers();

        if let Err(err) = self.add_toolbar_items() {
            // Pages like commit views have a diff but never render the
            // anchor; only the first miss is worth a warning.
            if self.anchor_missing.replace(true) {
                tracing::debug!("DiffToggler: toolbar not injected: {}", err);
            } else {
                tracing::warn!("DiffToggler: toolbar not injected: {}", err);
            }
            return false;
        }
        self.anchor_missing.set(false);

        self.apply_preferences();

        tracing::info!(
            "DiffToggler: initialized ({} headers bound, {} native buttons removed)",
            bound,
            removed
        );
        true
    }

    /// Remove every injected toolbar so a later toggler can initialize the
    /// page again. Returns how many were removed.
    pub fn teardown(&self) -> usize {
        let toolbars = self.page.by_class(&self.markers.toolbar_class);
        let mut removed = 0;
        for toolbar in &toolbars {
            match self.page.remove(toolbar) {
                Ok(()) => removed += 1,
                Err(err) => tracing::warn!("DiffToggler: could not remove toolbar: {}", err),
            }
        }
        tracing::debug!("DiffToggler: teardown removed {} toolbars", removed);
        removed
    }

    /// True iff the toolbar is absent and the page shows a diff.
    pub fn can_load_extension(&self) -> bool {
        let is_already_loaded = self.page.count_class(&self.markers.toolbar_class) != 0;
        let is_diff_page = self.page.count_class(&self.markers.diff_body_class) != 0;

        !is_already_loaded && is_diff_page
    }

    /// The host's own collapse buttons disagree with our marker classes.
    fn remove_default_collapse_buttons(&self) -> usize {
        let buttons = self.page.select_all(&self.markers.native_collapse_selector);
        let mut removed = 0;
        for button in &buttons {
            match self.page.remove(button) {
                Ok(()) => removed += 1,
                Err(err) => tracing::warn!("DiffToggler: could not remove native button: {}", err),
            }
        }
        removed
    }

    fn bind_headers(&self) -> usize {
        let headers = self.page.by_class(&self.markers.file_header_class);
        let mut bound = 0;
        for header in &headers {
            match self.page.on_click(header, ClickAction::ToggleFile) {
                Ok(()) => bound += 1,
                Err(err) => tracing::warn!("DiffToggler: could not bind header: {}", err),
            }
        }
        bound
    }

    fn add_toolbar_items(&self) -> Result<()> {
        if self.page.count_class(&self.markers.toolbar_class) != 0 {
            return Ok(());
        }

        let anchor = self
            .page
            .select_first(&self.markers.diff_bar_selector)
            .ok_or_else(|| TogglerError::MissingAnchor(self.markers.diff_bar_selector.clone()))?;
        self.page.prepend_toolbar(&anchor, &self.toolbar)?;

        for button in &self.toolbar.buttons {
            match self.page.by_id(&button.id) {
                Some(node) => self.page.on_click(&node, button.action)?,
                None => tracing::warn!("DiffToggler: toolbar button #{} missing", button.id),
            }
        }
        tracing::debug!("DiffToggler: toolbar injected");
        Ok(())
    }

    fn apply_preferences(&self) {
        if self.preference() == Some(GlobalPreference::Collapsed) {
            self.swap_all(
                &self.markers.detail_shown_class,
                &self.markers.detail_hidden_class,
            );
        }
    }

    /// Stored preference; unavailable storage reads as none.
    pub fn preference(&self) -> Option<GlobalPreference> {
        match self.store.get() {
            Ok(preference) => preference,
            Err(err) => {
                tracing::warn!("DiffToggler: reading preference failed: {}", err);
                None
            }
        }
    }

    /// Flip the body belonging to the clicked header.
    pub fn toggle_file_details(&self, event: &dyn ClickEvent<P::Node>) {
        let Some(header) = self.header_element(event) else {
            return;
        };
        let Some(body) = self.page.next_sibling(&header) else {
            return;
        };

        let shown = &self.markers.detail_shown_class;
        let hidden = &self.markers.detail_hidden_class;
        // Unmarked bodies are visible, so they count as shown.
        let result = if self.page.has_class(&body, hidden) {
            self.page.swap_class(&body, hidden, shown)
        } else {
            self.page.swap_class(&body, shown, hidden)
        };
        if let Err(err) = result {
            tracing::warn!("DiffToggler: toggle failed: {}", err);
        }
    }

    /// The clicked element if it is a header, else its parent if that is.
    ///
    /// Only one level is checked, so clicks deeper inside a header are
    /// ignored.
    fn header_element(&self, event: &dyn ClickEvent<P::Node>) -> Option<P::Node> {
        let target = event.target()?;
        let class = &self.markers.file_header_class;

        if self.page.has_class(&target, class) {
            return Some(target);
        }

        self.page
            .parent(&target)
            .filter(|parent| self.page.has_class(parent, class))
    }

    /// Hide every shown body and remember "collapsed".
    pub fn hide_all_bodies(&self, event: Option<&dyn ClickEvent<P::Node>>) {
        if let Some(event) = event {
            event.prevent_default();
        }

        let count = self.swap_all(
            &self.markers.detail_shown_class,
            &self.markers.detail_hidden_class,
        );
        tracing::debug!("DiffToggler: collapsed {} files", count);

        self.persist(GlobalPreference::Collapsed);
    }

    /// Show every hidden body and remember "expanded".
    pub fn show_all_bodies(&self, event: Option<&dyn ClickEvent<P::Node>>) {
        if let Some(event) = event {
            event.prevent_default();
        }

        let count = self.swap_all(
            &self.markers.detail_hidden_class,
            &self.markers.detail_shown_class,
        );
        tracing::debug!("DiffToggler: expanded {} files", count);

        self.persist(GlobalPreference::Expanded);
    }

    /// Entry point for bound click listeners.
    pub fn dispatch(&self, action: ClickAction, event: &dyn ClickEvent<P::Node>) {
        match action {
            ClickAction::ToggleFile => self.toggle_file_details(event),
            ClickAction::ShowAll => self.show_all_bodies(Some(event)),
            ClickAction::CollapseAll => self.hide_all_bodies(Some(event)),
        }
    }

    fn swap_all(&self, from: &str, to: &str) -> usize {
        let bodies = self.page.by_class(from);
        let mut swapped = 0;
        for body in &bodies {
            match self.page.swap_class(body, from, to) {
                Ok(()) => swapped += 1,
                Err(err) => tracing::warn!("DiffToggler: class swap failed: {}", err),
            }
        }
        swapped
    }

    fn persist(&self, preference: GlobalPreference) {
        if let Err(err) = self.store.set(preference) {
            tracing::warn!(
                "DiffToggler: storing {:?} failed: {}",
                preference,
                err
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{DiffFixture, MemoryPage, NodeId, SimulatedClick};
    use crate::preference::MemoryPreferenceStore;
    use std::rc::Rc;

    type TestToggler = DiffToggler<Rc<MemoryPage>, Rc<MemoryPreferenceStore>>;

    fn setup(files: usize) -> (TestToggler, Rc<MemoryPage>, Rc<MemoryPreferenceStore>, DiffFixture) {
        setup_with_store(files, MemoryPreferenceStore::new())
    }

    fn setup_with_store(
        files: usize,
        store: MemoryPreferenceStore,
    ) -> (TestToggler, Rc<MemoryPage>, Rc<MemoryPreferenceStore>, DiffFixture) {
        let (page, fixture) = MemoryPage::diff_view(files);
        let page = Rc::new(page);
        let store = Rc::new(store);
        let toggler = DiffToggler::new(page.clone(), store.clone(), Markers::default());
        (toggler, page, store, fixture)
    }

    fn is_hidden(page: &MemoryPage, body: NodeId) -> bool {
        let hidden = page.has_class(&body, "Details-content--hidden");
        let shown = page.has_class(&body, "Details-content--shown");
        assert!(hidden != shown, "body must carry exactly one state class");
        hidden
    }

    #[test]
    fn can_load_on_fresh_diff_page() {
        let (toggler, _, _, _) = setup(2);
        assert!(toggler.can_load_extension());
    }

    #[test]
    fn cannot_load_without_diff_container() {
        let page = Rc::new(MemoryPage::new());
        page.append(page.root(), "div", &["pr-review-tools"]);
        let toggler = DiffToggler::new(
            page,
            Rc::new(MemoryPreferenceStore::new()),
            Markers::default(),
        );
        assert!(!toggler.can_load_extension());
        assert!(!toggler.initialize());
    }

    #[test]
    fn cannot_load_when_toolbar_present() {
        let (toggler, page, _, _) = setup(1);
        page.append(page.root(), "div", &["rvt-tools"]);
        assert!(!toggler.can_load_extension());
    }

    #[test]
    fn ineligible_initialize_has_no_side_effects() {
        let (toggler, page, _, fixture) = setup(1);
        page.append(page.root(), "div", &["rvt-tools"]);
        assert!(!toggler.initialize());
        assert!(page.is_attached(fixture.files[0].native_button));
        assert!(page.listeners(fixture.files[0].header).is_empty());
    }

    #[test]
    fn initialize_is_idempotent() {
        let (toggler, page, _, fixture) = setup(3);
        assert!(toggler.initialize());
        assert!(!toggler.initialize());
        assert_eq!(page.count_class("rvt-tools"), 1);
        assert_eq!(page.children(fixture.toolbar_anchor).len(), 1);
    }

    #[test]
    fn initialize_removes_native_buttons_and_binds_headers() {
        let (toggler, page, _, fixture) = setup(2);
        assert!(toggler.initialize());
        for file in &fixture.files {
            assert!(!page.is_attached(file.native_button));
            assert_eq!(page.listeners(file.header), vec![ClickAction::ToggleFile]);
        }
        let show = page.by_id("rvt-show-all").unwrap();
        let collapse = page.by_id("rvt-collapse-all").unwrap();
        assert_eq!(page.listeners(show), vec![ClickAction::ShowAll]);
        assert_eq!(page.listeners(collapse), vec![ClickAction::CollapseAll]);
    }

    #[test]
    fn missing_anchor_defers_preference() {
        let (toggler, page, store, fixture) =
            setup_with_store(2, MemoryPreferenceStore::with_value(GlobalPreference::Collapsed));
        page.remove(&fixture.toolbar_anchor).unwrap();

        assert!(!toggler.initialize());
        assert_eq!(page.count_class("rvt-tools"), 0);
        assert!(!is_hidden(&page, fixture.files[0].body));
        assert_eq!(page.listeners(fixture.files[0].header), vec![ClickAction::ToggleFile]);

        // Anchor shows up later: the retry finishes the job without
        // duplicating header listeners.
        let anchor = page.append(page.root(), "div", &["pr-review-tools"]);
        assert!(toggler.initialize());
        assert_eq!(page.children(anchor).len(), 1);
        assert_eq!(page.listeners(fixture.files[0].header), vec![ClickAction::ToggleFile]);
        assert!(is_hidden(&page, fixture.files[0].body));
        assert_eq!(store.writes(), 0);
    }

    #[test]
    fn repeated_anchor_miss_warns_once() {
        let (toggler, page, _, fixture) = setup(1);
        page.remove(&fixture.toolbar_anchor).unwrap();

        assert!(!toggler.initialize());
        assert!(toggler.anchor_missing.get());
        assert!(!toggler.initialize());
        assert!(toggler.anchor_missing.get());

        page.append(page.root(), "div", &["pr-review-tools"]);
        assert!(toggler.initialize());
        assert!(!toggler.anchor_missing.get());
    }

    #[test]
    fn teardown_lets_a_new_toggler_initialize() {
        let (first, page, store, fixture) = setup(2);
        assert!(first.initialize());
        assert_eq!(first.teardown(), 1);
        assert_eq!(page.count_class("rvt-tools"), 0);
        drop(first);

        let second = DiffToggler::new(page.clone(), store, Markers::default());
        assert!(second.initialize());
        assert_eq!(page.count_class("rvt-tools"), 1);
        assert_eq!(page.children(fixture.toolbar_anchor).len(), 1);

        let collapse = page.by_id("rvt-collapse-all").unwrap();
        page.click(collapse, |action, event| second.dispatch(action, event));
        assert!(fixture.files.iter().all(|f| is_hidden(&page, f.body)));
    }

    #[test]
    fn teardown_on_plain_page_is_noop() {
        let (toggler, page, _, _) = setup(1);
        assert_eq!(toggler.teardown(), 0);
        assert!(toggler.can_load_extension());
        assert_eq!(page.count_class("rvt-tools"), 0);
    }

    #[test]
    fn header_click_toggles_only_that_file() {
        let (toggler, page, _, fixture) = setup(3);
        toggler.initialize();

        toggler.toggle_file_details(&SimulatedClick::on(fixture.files[1].header));
        assert!(!is_hidden(&page, fixture.files[0].body));
        assert!(is_hidden(&page, fixture.files[1].body));
        assert!(!is_hidden(&page, fixture.files[2].body));
    }

    #[test]
    fn direct_child_resolves_to_header() {
        let (toggler, page, _, fixture) = setup(1);
        toggler.toggle_file_details(&SimulatedClick::on(fixture.files[0].info));
        assert!(is_hidden(&page, fixture.files[0].body));
    }

    #[test]
    fn deeper_descendant_is_ignored() {
        let (toggler, page, _, fixture) = setup(1);
        toggler.toggle_file_details(&SimulatedClick::on(fixture.files[0].link));
        assert!(!is_hidden(&page, fixture.files[0].body));
    }

    #[test]
    fn unrelated_or_missing_target_is_ignored() {
        let (toggler, page, _, fixture) = setup(1);
        toggler.toggle_file_details(&SimulatedClick::on(fixture.container));
        toggler.toggle_file_details(&SimulatedClick::without_target());
        toggler.toggle_file_details(&SimulatedClick::on(page.root()));
        assert!(!is_hidden(&page, fixture.files[0].body));
    }

    #[test]
    fn unmarked_body_becomes_hidden() {
        let page = Rc::new(MemoryPage::new());
        page.append(page.root(), "div", &["js-diff-progressive-container"]);
        let header = page.append(page.root(), "div", &["file-header"]);
        let body = page.append(page.root(), "div", &[]);
        let toggler = DiffToggler::new(
            page.clone(),
            MemoryPreferenceStore::new(),
            Markers::default(),
        );

        toggler.toggle_file_details(&SimulatedClick::on(header));
        assert!(is_hidden(&page, body));
        toggler.toggle_file_details(&SimulatedClick::on(header));
        assert!(!is_hidden(&page, body));
    }

    #[test]
    fn header_without_body_is_ignored() {
        let page = Rc::new(MemoryPage::new());
        let header = page.append(page.root(), "div", &["file-header"]);
        let toggler = DiffToggler::new(
            page.clone(),
            MemoryPreferenceStore::new(),
            Markers::default(),
        );
        toggler.toggle_file_details(&SimulatedClick::on(header));
        assert_eq!(page.classes(header), vec!["file-header".to_string()]);
    }

    #[test]
    fn bulk_actions_persist_preference() {
        let (toggler, page, store, fixture) = setup(3);

        toggler.hide_all_bodies(None);
        assert!(fixture.files.iter().all(|f| is_hidden(&page, f.body)));
        assert_eq!(store.peek(), Some(GlobalPreference::Collapsed));

        toggler.show_all_bodies(None);
        assert!(fixture.files.iter().all(|f| !is_hidden(&page, f.body)));
        assert_eq!(store.peek(), Some(GlobalPreference::Expanded));
    }

    #[test]
    fn bulk_actions_prevent_link_navigation() {
        let (toggler, _, _, fixture) = setup(1);
        let event = SimulatedClick::on(fixture.toolbar_anchor);
        toggler.hide_all_bodies(Some(&event));
        assert!(event.default_prevented());

        let event = SimulatedClick::on(fixture.toolbar_anchor);
        toggler.show_all_bodies(Some(&event));
        assert!(event.default_prevented());
    }

    #[test]
    fn stored_collapsed_applies_on_initialize() {
        let (toggler, page, _, fixture) =
            setup_with_store(3, MemoryPreferenceStore::with_value(GlobalPreference::Collapsed));
        assert!(toggler.initialize());
        assert!(fixture.files.iter().all(|f| is_hidden(&page, f.body)));
    }

    #[test]
    fn stored_expanded_leaves_page_alone() {
        let (toggler, page, _, fixture) = setup(2);
        page.swap_class(
            &fixture.files[0].body,
            "Details-content--shown",
            "Details-content--hidden",
        )
        .unwrap();
        toggler.store().set(GlobalPreference::Expanded).unwrap();

        assert!(toggler.initialize());
        assert!(is_hidden(&page, fixture.files[0].body));
        assert!(!is_hidden(&page, fixture.files[1].body));
    }

    #[test]
    fn unavailable_storage_is_not_fatal() {
        let (toggler, page, store, fixture) = setup(2);
        store.set_unavailable(true);

        assert!(toggler.initialize());
        assert_eq!(toggler.preference(), None);

        toggler.hide_all_bodies(None);
        assert!(fixture.files.iter().all(|f| is_hidden(&page, f.body)));
        assert_eq!(store.peek(), None);
    }

    #[test]
    fn dispatch_routes_actions() {
        let (toggler, page, store, fixture) = setup(2);
        toggler.initialize();

        let collapse = page.by_id("rvt-collapse-all").unwrap();
        let event = page.click(collapse, |action, event| toggler.dispatch(action, event));
        assert!(event.default_prevented());
        assert!(fixture.files.iter().all(|f| is_hidden(&page, f.body)));
        assert_eq!(store.peek(), Some(GlobalPreference::Collapsed));

        page.click(fixture.files[0].info, |action, event| {
            toggler.dispatch(action, event)
        });
        assert!(!is_hidden(&page, fixture.files[0].body));
        assert!(is_hidden(&page, fixture.files[1].body));
    }
}
