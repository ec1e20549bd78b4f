use serde::{Deserialize, Serialize};

use crate::DocumentId;

/// State attached to every history entry pushed by a render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryState {
    pub search_params: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Path plus optional `?query`, as shown in the address bar.
    pub url: String,
    pub state: Option<HistoryState>,
    /// Document the entry was created in; traversing to another one needs a load.
    pub document: DocumentId,
}

/// Delivered to the window when the user traverses history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopStateEvent {
    pub state: Option<HistoryState>,
}

/// Session history across the documents loaded in one session.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct History {
    entries: Vec<HistoryEntry>,
    index: usize,
}

impl History {
    pub fn new(initial_url: impl Into<String>, document: DocumentId) -> Self {
        Self {
            entries: vec![HistoryEntry {
                url: initial_url.into(),
                state: None,
                document,
            }],
            index: 0,
        }
    }

    /// Adds a same-document entry after the current one, dropping any forward entries.
    pub fn push_state(&mut self, state: Option<HistoryState>, url: impl Into<String>) {
        let document = self.current_document().unwrap_or_default();
        self.push(HistoryEntry {
            url: url.into(),
            state,
            document,
        });
    }

    /// Adds the entry of a newly loaded document, dropping any forward entries.
    pub fn navigate(&mut self, url: impl Into<String>, document: DocumentId) {
        self.push(HistoryEntry {
            url: url.into(),
            state: None,
            document,
        });
    }

    /// Hands every entry of the current entry's document over to `document`,
    /// after that document was loaded again by traversal.
    pub fn adopt_document(&mut self, document: DocumentId) {
        let Some(previous) = self.current_document() else {
            return;
        };
        for entry in &mut self.entries {
            if entry.document == previous {
                entry.document = document;
            }
        }
    }

    fn push(&mut self, entry: HistoryEntry) {
        if !self.entries.is_empty() {
            self.entries.truncate(self.index + 1);
        }
        self.entries.push(entry);
        self.index = self.entries.len() - 1;
    }

    pub fn back(&mut self) -> Option<PopStateEvent> {
        if self.index == 0 || self.entries.is_empty() {
            return None;
        }
        self.index -= 1;
        Some(self.pop_state_event())
    }

    pub fn forward(&mut self) -> Option<PopStateEvent> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        Some(self.pop_state_event())
    }

    fn pop_state_event(&self) -> PopStateEvent {
        PopStateEvent {
            state: self.entries[self.index].state.clone(),
        }
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.entries.get(self.index)
    }

    pub fn current_document(&self) -> Option<DocumentId> {
        self.current().map(|entry| entry.document)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current location, `/` before anything was loaded.
    pub fn location(&self) -> &str {
        self.current().map(|entry| entry.url.as_str()).unwrap_or("/")
    }

    pub fn pathname(&self) -> &str {
        split_location(self.location()).0
    }

    /// Current query string without the leading `?`.
    pub fn search(&self) -> &str {
        split_location(self.location()).1
    }
}

/// URL shown after applying `query` on `path`; no trailing `?` for an empty query.
pub fn target_url(path: &str, query: &str) -> String {
    if query.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{query}")
    }
}

fn split_location(location: &str) -> (&str, &str) {
    let location = location.split('#').next().unwrap_or(location);
    match location.split_once('?') {
        Some((path, query)) => (path, query),
        None => (location, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::{target_url, History, HistoryState};

    fn state(q: &str) -> Option<HistoryState> {
        Some(HistoryState {
            search_params: q.to_string(),
        })
    }

    #[test]
    fn target_url_omits_empty_query() {
        assert_eq!(target_url("/collections/all", "color=red"), "/collections/all?color=red");
        assert_eq!(target_url("/collections/all", ""), "/collections/all");
    }

    #[test]
    fn push_always_adds_an_entry() {
        let mut history = History::new("/collections/all", 1);
        history.push_state(state(""), "/collections/all");
        history.push_state(state(""), "/collections/all");
        assert_eq!(history.len(), 3);
        assert_eq!(history.index(), 2);
    }

    #[test]
    fn back_and_forward_report_entry_state() {
        let mut history = History::new("/c?sort=asc", 1);
        history.push_state(state("color=red"), "/c?color=red");
        history.push_state(state("color=blue"), "/c?color=blue");

        assert_eq!(history.back().unwrap().state, state("color=red"));
        assert_eq!(history.search(), "color=red");
        let initial = history.back().unwrap();
        assert_eq!(initial.state, None);
        assert_eq!(history.search(), "sort=asc");
        assert_eq!(history.pathname(), "/c");
        assert!(history.back().is_none());

        assert_eq!(history.forward().unwrap().state, state("color=red"));
    }

    #[test]
    fn push_after_back_drops_forward_entries() {
        let mut history = History::new("/c", 1);
        history.push_state(state("a=1"), "/c?a=1");
        history.push_state(state("a=2"), "/c?a=2");
        history.back();
        history.push_state(state("a=3"), "/c?a=3");
        assert_eq!(history.len(), 3);
        assert!(history.forward().is_none());
        assert_eq!(history.location(), "/c?a=3");
    }

    #[test]
    fn entries_remember_their_document() {
        let mut history = History::new("/collections/all", 1);
        history.push_state(state("color=red"), "/collections/all?color=red");
        history.navigate("/pages/help", 2);
        assert_eq!(history.current_document(), Some(2));

        history.back();
        assert_eq!(history.current_document(), Some(1));
        history.adopt_document(3);
        history.back();
        assert_eq!(history.current_document(), Some(3));
        history.forward();
        history.forward();
        assert_eq!(history.current_document(), Some(2));
    }
}
