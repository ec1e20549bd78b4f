use crate::{DomEvent, RequestId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// A full page arrived; replaces the document and wires the listeners.
    PageLoaded {
        location: String,
        html: String,
        navigation: Navigation,
    },
    /// Something the user did to the page.
    User(UserAction),
    /// The debounce window after form input elapsed.
    SubmitDebounced(DomEvent),
    /// Section fetch finished; `None` when the fetch failed.
    SectionLoaded {
        request_id: RequestId,
        html: Option<String>,
    },
}

/// User interactions, addressed by DOM id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    SetChecked { element_id: String, checked: bool },
    SetValue { element_id: String, value: String },
    Click { element_id: String },
    Back,
    Forward,
}

/// How a full page load relates to the session history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Navigation {
    /// A new entry for the loaded page, e.g. after following a link.
    #[default]
    Push,
    /// The current entry was reached through back/forward and belongs to
    /// another document; the load replaces that document in place.
    Traverse,
}
