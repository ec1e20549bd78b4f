use crate::{DomEvent, RequestId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// (Re)start the submit debounce timer for this event.
    DebounceSubmit { event: DomEvent },
    /// GET `target` (path and query, relative to the page origin).
    FetchSection { request_id: RequestId, target: String },
    /// An unprevented link click; the host performs a full navigation.
    FollowLink { href: String },
    /// History moved to an entry of another document; the host loads `href`
    /// and reports it with `Navigation::Traverse`.
    ReloadEntry { href: String },
}
