//! Collection filters engine: HTTP fetching, body decoding and timers.
mod debounce;
mod decode;
mod engine;
mod fetch;
mod types;

pub use debounce::Debouncer;
pub use decode::{decode_body, DecodedText};
pub use engine::EngineHandle;
pub use fetch::{
    fetch_section, resolve_target, ChannelEventSink, EventSink, FetchSettings, Fetcher,
    ReqwestFetcher,
};
pub use types::{EngineEvent, FailureKind, FetchError, FetchMetadata, FetchedPage, RequestId};
