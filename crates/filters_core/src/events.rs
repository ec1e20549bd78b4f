use ego_tree::NodeId;

/// Identifies one loaded document; bumped on every full page load.
pub type DocumentId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Input,
    Change,
    Click,
    PopState,
}

/// An event fired at a node of the live document.
///
/// `target` is only meaningful inside `document`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomEvent {
    pub kind: EventKind,
    pub target: NodeId,
    pub document: DocumentId,
}

impl DomEvent {
    pub fn new(kind: EventKind, target: NodeId, document: DocumentId) -> Self {
        Self {
            kind,
            target,
            document,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerTarget {
    Node(NodeId),
    Window,
}

/// What a registered listener does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    /// Schedules the combined form submission after the quiet period.
    DebouncedSubmit,
    /// Intercepts clicks on remove-filter links.
    ActiveFilterClick,
    /// Re-renders for the history entry the user moved to.
    HistoryChange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Listener {
    target: ListenerTarget,
    kind: EventKind,
    handler: Handler,
}

#[derive(Debug, Clone, Default)]
pub struct ListenerRegistry {
    listeners: Vec<Listener>,
}

impl ListenerRegistry {
    pub fn add(&mut self, target: ListenerTarget, kind: EventKind, handler: Handler) {
        self.listeners.push(Listener {
            target,
            kind,
            handler,
        });
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Handlers reached while bubbling along `path`, in firing order.
    pub fn bubbling(&self, path: &[NodeId], kind: EventKind) -> Vec<Handler> {
        path.iter()
            .flat_map(|node| {
                self.listeners
                    .iter()
                    .filter(move |l| l.kind == kind && l.target == ListenerTarget::Node(*node))
                    .map(|l| l.handler)
            })
            .collect()
    }

    pub fn on_window(&self, kind: EventKind) -> Vec<Handler> {
        self.listeners
            .iter()
            .filter(|l| l.kind == kind && l.target == ListenerTarget::Window)
            .map(|l| l.handler)
            .collect()
    }
}
