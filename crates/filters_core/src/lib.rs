//! Collection filters core: live document, history and the pure render state machine.
mod dom;
mod effect;
mod error;
mod events;
mod history;
mod msg;
mod query;
mod render;
mod selectors;
mod state;
mod update;
mod view_model;

pub use dom::{ControlKind, Fragment, LiveDocument};
pub use effect::Effect;
pub use error::CoreError;
pub use events::{DocumentId, DomEvent, EventKind, Handler, ListenerRegistry, ListenerTarget};
pub use history::{target_url, History, HistoryEntry, HistoryState, PopStateEvent};
pub use msg::{Msg, Navigation, UserAction};
pub use query::{combine_form_params, query_from_href, QueryParams};
pub use render::{render_element, render_filters};
pub use selectors::{CompiledSelectors, Selectors, SELECTORS, SUBMIT_DEBOUNCE};
pub use state::{section_target, PageSettings, PageState, RenderOrdering, RequestId};
pub use update::update;
pub use view_model::PageView;
pub use ego_tree::NodeId;
