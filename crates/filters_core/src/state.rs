use std::collections::BTreeMap;

use ego_tree::NodeId;
use filters_logging::{filters_debug, filters_info, filters_warn, set_render_generation};

use crate::dom::{ControlKind, Fragment, LiveDocument};
use crate::events::{DocumentId, DomEvent, EventKind, Handler, ListenerRegistry, ListenerTarget};
use crate::history::{target_url, History, HistoryState, PopStateEvent};
use crate::query::{combine_form_params, query_from_href};
use crate::render::{render_element, render_filters};
use crate::selectors::{CompiledSelectors, SELECTORS};
use crate::view_model::PageView;
use crate::{CoreError, Effect, Navigation, UserAction};

pub type RequestId = u64;

/// What to do with a section response that is not the newest one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderOrdering {
    /// Apply every response in arrival order; a slow response can overwrite a newer one.
    #[default]
    Unordered,
    /// Apply only the response of the most recently issued render.
    LatestWins,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageSettings {
    pub ordering: RenderOrdering,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingRender {
    search_params: String,
    trigger: Option<NodeId>,
}

/// Forms captured when the listeners were wired.
#[derive(Debug, Clone, Copy, Default)]
struct WiredForms {
    filters: Option<NodeId>,
    sort: Option<NodeId>,
}

/// The page as the UI thread sees it: document, history and listeners.
#[derive(Debug)]
pub struct PageState {
    settings: PageSettings,
    selectors: CompiledSelectors,
    document: LiveDocument,
    document_id: DocumentId,
    history: History,
    listeners: ListenerRegistry,
    forms: WiredForms,
    pending: BTreeMap<RequestId, PendingRender>,
    last_issued: RequestId,
    renders_applied: u64,
    dirty: bool,
}

impl PageState {
    pub fn new(settings: PageSettings) -> Result<Self, CoreError> {
        Ok(Self {
            settings,
            selectors: CompiledSelectors::compile(&SELECTORS)?,
            document: LiveDocument::empty(),
            document_id: 0,
            history: History::default(),
            listeners: ListenerRegistry::default(),
            forms: WiredForms::default(),
            pending: BTreeMap::new(),
            last_issued: 0,
            renders_applied: 0,
            dirty: false,
        })
    }

    pub fn view(&self) -> PageView {
        PageView {
            location: self.history.location().to_string(),
            section_id: self.section_id(),
            history_len: self.history.len(),
            history_index: self.history.index(),
            in_flight: self.pending.len(),
            last_issued: self.last_issued,
            renders_applied: self.renders_applied,
            dirty: self.dirty,
        }
    }

    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn document(&self) -> &LiveDocument {
        &self.document
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn find_element(&self, dom_id: &str) -> Result<NodeId, CoreError> {
        self.document
            .get_element_by_id(dom_id)
            .ok_or_else(|| CoreError::UnknownElement(dom_id.to_string()))
    }

    /// Inner HTML of the first live element matching `selector`.
    pub fn inner_html(&self, selector: &str) -> Result<Option<String>, CoreError> {
        let selector =
            scraper::Selector::parse(selector).map_err(|err| CoreError::InvalidSelector {
                selector: selector.to_string(),
                message: err.to_string(),
            })?;
        Ok(self
            .document
            .query_selector(&selector)
            .and_then(|node| self.document.inner_html(node)))
    }

    pub(crate) fn load_document(&mut self, location: &str, html: &str, navigation: Navigation) {
        self.document = LiveDocument::parse(html);
        self.document_id += 1;
        self.listeners.clear();
        self.forms = WiredForms::default();
        if !self.pending.is_empty() {
            filters_debug!("dropping {} renders of the previous page", self.pending.len());
            self.pending.clear();
        }
        match navigation {
            _ if self.history.is_empty() => {
                self.history = History::new(location, self.document_id);
            }
            Navigation::Push => self.history.navigate(location, self.document_id),
            Navigation::Traverse => self.history.adopt_document(self.document_id),
        }
        self.dirty = true;
        filters_info!("loaded page {location}");
    }

    pub(crate) fn init_event_listeners(&mut self) {
        let form_filters = self.document.query_selector(&self.selectors.form_filters);
        let form_sort = self.document.query_selector(&self.selectors.form_sort);
        let active_filters = self
            .document
            .query_selector(&self.selectors.active_filters_container);

        if let Some(form) = form_filters {
            self.listeners.add(
                ListenerTarget::Node(form),
                EventKind::Input,
                Handler::DebouncedSubmit,
            );
        }
        if let Some(form) = form_sort {
            self.listeners.add(
                ListenerTarget::Node(form),
                EventKind::Change,
                Handler::DebouncedSubmit,
            );
        }
        if let Some(container) = active_filters {
            self.listeners.add(
                ListenerTarget::Node(container),
                EventKind::Click,
                Handler::ActiveFilterClick,
            );
        }
        self.listeners.add(
            ListenerTarget::Window,
            EventKind::PopState,
            Handler::HistoryChange,
        );
        self.forms = WiredForms {
            filters: form_filters,
            sort: form_sort,
        };
        filters_debug!(
            "wired {} listeners (filters form: {}, sort form: {}, active filters: {})",
            self.listeners.len(),
            form_filters.is_some(),
            form_sort.is_some(),
            active_filters.is_some()
        );
    }

    pub(crate) fn perform(&mut self, action: UserAction) -> Result<Vec<Effect>, CoreError> {
        match action {
            UserAction::SetChecked {
                element_id,
                checked,
            } => {
                let node = self.find_element(&element_id)?;
                if self.document.control_kind(node) == Some(ControlKind::Checkable)
                    && self.document.is_checked(node) == checked
                {
                    return Ok(Vec::new());
                }
                self.document.set_checked(node, checked)?;
                Ok(self.fire_control_events(node, ControlKind::Checkable))
            }
            UserAction::SetValue { element_id, value } => {
                let node = self.find_element(&element_id)?;
                self.document.set_value(node, value)?;
                let kind = self.document.control_kind(node).unwrap_or(ControlKind::Text);
                Ok(self.fire_control_events(node, kind))
            }
            UserAction::Click { element_id } => {
                let node = self.find_element(&element_id)?;
                Ok(self.click(node))
            }
            UserAction::Back => Ok(self
                .history
                .back()
                .map(|event| self.traverse(event))
                .unwrap_or_default()),
            UserAction::Forward => Ok(self
                .history
                .forward()
                .map(|event| self.traverse(event))
                .unwrap_or_default()),
        }
    }

    /// After history moved: popstate within this document, a reload otherwise.
    fn traverse(&mut self, event: PopStateEvent) -> Vec<Effect> {
        if self.history.current_document() != Some(self.document_id) {
            let href = self.history.location().to_string();
            filters_info!("history entry {href} belongs to another page; reloading it");
            return vec![Effect::ReloadEntry { href }];
        }
        self.dispatch_pop_state(event)
    }

    fn click(&mut self, node: NodeId) -> Vec<Effect> {
        let event = DomEvent::new(EventKind::Click, node, self.document_id);
        let (mut effects, prevented) = self.dispatch(event);
        if prevented {
            return effects;
        }
        if self.document.control_kind(node) == Some(ControlKind::Checkable) {
            let was_checked = self.document.is_checked(node);
            let is_radio = self
                .document
                .attr(node, "type")
                .is_some_and(|kind| kind.eq_ignore_ascii_case("radio"));
            if is_radio && was_checked {
                return effects;
            }
            if self.document.set_checked(node, !was_checked).is_ok() {
                effects.extend(self.fire_control_events(node, ControlKind::Checkable));
            }
        } else if let Some(link) = self.document.closest(node, &self.selectors.link) {
            let href = self.document.attr(link, "href").unwrap_or_default();
            effects.push(Effect::FollowLink {
                href: href.to_string(),
            });
        }
        effects
    }

    /// Events a browser fires after the user changed a control.
    fn fire_control_events(&mut self, node: NodeId, kind: ControlKind) -> Vec<Effect> {
        let document = self.document_id;
        let mut effects = self.dispatch(DomEvent::new(EventKind::Input, node, document)).0;
        if matches!(kind, ControlKind::Checkable | ControlKind::Select) {
            effects.extend(self.dispatch(DomEvent::new(EventKind::Change, node, document)).0);
        }
        effects
    }

    /// Bubbles `event` through the live tree. Returns the effects and whether
    /// a listener prevented the default action.
    fn dispatch(&mut self, event: DomEvent) -> (Vec<Effect>, bool) {
        let path = self.document.propagation_path(event.target);
        let mut effects = Vec::new();
        let mut prevented = false;
        for handler in self.listeners.bubbling(&path, event.kind) {
            match handler {
                Handler::DebouncedSubmit => effects.push(Effect::DebounceSubmit { event }),
                Handler::ActiveFilterClick => {
                    let Some(link) = self
                        .document
                        .closest(event.target, &self.selectors.remove_filter_link)
                    else {
                        continue;
                    };
                    prevented = true;
                    let href = self.document.attr(link, "href").unwrap_or_default();
                    let search_params = query_from_href(href).to_string();
                    effects.extend(self.render_page(search_params, None));
                }
                Handler::HistoryChange => {}
            }
        }
        (effects, prevented)
    }

    fn dispatch_pop_state(&mut self, event: PopStateEvent) -> Vec<Effect> {
        let mut effects = Vec::new();
        for handler in self.listeners.on_window(EventKind::PopState) {
            if handler != Handler::HistoryChange {
                continue;
            }
            let search_params = match &event.state {
                Some(state) => state.search_params.clone(),
                None => self.history.search().to_string(),
            };
            effects.extend(self.render_page(search_params, None));
        }
        effects
    }

    /// Combined submission of the sort and filter forms.
    pub(crate) fn submit_forms(&mut self, event: DomEvent) -> Option<Effect> {
        if event.document != self.document_id {
            filters_debug!(
                "submit from document {} dropped, page is now document {}",
                event.document,
                self.document_id
            );
            return None;
        }
        let entries = |form: Option<NodeId>| {
            form.map(|form| self.document.form_entries(form))
                .unwrap_or_default()
        };
        let combined = combine_form_params(entries(self.forms.sort), entries(self.forms.filters));
        self.render_page(combined.to_query_string(), Some(event.target))
    }

    fn section_id(&self) -> Option<String> {
        self.document
            .query_selector(&self.selectors.products_container)
            .and_then(|node| self.document.attr(node, "data-section-id"))
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    }

    /// Starts a render: issues the section fetch and remembers what to apply.
    pub(crate) fn render_page(
        &mut self,
        search_params: String,
        trigger: Option<NodeId>,
    ) -> Option<Effect> {
        let Some(section_id) = self.section_id() else {
            filters_debug!("products container has no section id; render skipped");
            return None;
        };
        self.last_issued += 1;
        let request_id = self.last_issued;
        set_render_generation(request_id);

        let target = section_target(self.history.pathname(), &section_id, &search_params);
        filters_debug!("requesting section {section_id} with {search_params:?}");
        self.pending.insert(
            request_id,
            PendingRender {
                search_params,
                trigger,
            },
        );
        Some(Effect::FetchSection { request_id, target })
    }

    /// Applies a finished fetch: regions, filter items, then history.
    pub(crate) fn apply_section(&mut self, request_id: RequestId, html: Option<String>) {
        let Some(pending) = self.pending.remove(&request_id) else {
            filters_warn!("response for unknown request {request_id} ignored");
            return;
        };
        set_render_generation(request_id);
        if self.settings.ordering == RenderOrdering::LatestWins && request_id != self.last_issued {
            filters_debug!(
                "discarding stale response {request_id}, latest is {}",
                self.last_issued
            );
            return;
        }
        let Some(html) = html else {
            filters_debug!("no fragment produced; page left unchanged");
            return;
        };

        let fragment = Fragment::parse(&html);
        let fragment = Some(&fragment);
        let selectors = &self.selectors;
        let document = &mut self.document;
        let regions = [
            render_element(document, fragment, &selectors.products_container),
            render_element(document, fragment, &selectors.form_sort),
            render_element(document, fragment, &selectors.active_filters_container),
        ];
        let filters = render_filters(document, fragment, &selectors.filter_item, pending.trigger);

        let url = target_url(self.history.pathname(), &pending.search_params);
        self.history.push_state(
            Some(HistoryState {
                search_params: pending.search_params,
            }),
            url,
        );
        self.renders_applied += 1;
        self.dirty = true;
        filters_info!(
            "applied render: {} regions, {} filter items, now at {}",
            regions.iter().filter(|swapped| **swapped).count(),
            filters,
            self.history.location()
        );
    }
}

/// Request target for a section render: `<path>?section_id=<id>&<params>`.
pub fn section_target(path: &str, section_id: &str, search_params: &str) -> String {
    format!("{path}?section_id={section_id}&{search_params}")
}

#[cfg(test)]
mod tests {
    use super::section_target;

    #[test]
    fn section_target_keeps_trailing_separator() {
        assert_eq!(
            section_target("/collections/all", "main", "color=red"),
            "/collections/all?section_id=main&color=red"
        );
        assert_eq!(
            section_target("/collections/all", "main", ""),
            "/collections/all?section_id=main&"
        );
    }
}
