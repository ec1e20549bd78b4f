use filters_logging::filters_warn;

use crate::{Effect, Msg, PageState};

/// Applies a message to the page and returns the effects the host must run.
pub fn update(mut state: PageState, msg: Msg) -> (PageState, Vec<Effect>) {
    let effects = match msg {
        Msg::PageLoaded {
            location,
            html,
            navigation,
        } => {
            state.load_document(&location, &html, navigation);
            state.init_event_listeners();
            Vec::new()
        }
        Msg::User(action) => match state.perform(action) {
            Ok(effects) => effects,
            Err(err) => {
                filters_warn!("user action ignored: {err}");
                Vec::new()
            }
        },
        Msg::SubmitDebounced(event) => state.submit_forms(event).into_iter().collect(),
        Msg::SectionLoaded { request_id, html } => {
            state.apply_section(request_id, html);
            Vec::new()
        }
    };

    (state, effects)
}
