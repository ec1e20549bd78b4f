use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use filters_core::{DomEvent, Effect, Msg, Navigation};
use filters_engine::{
    resolve_target, Debouncer, EngineEvent, EngineHandle, EventSink, FetchSettings,
};
use filters_logging::{filters_debug, filters_error, filters_info};
use url::Url;

use crate::app::LoopEvent;

/// Forwards engine results into the session loop.
struct LoopSink {
    tx: mpsc::Sender<LoopEvent>,
}

impl EventSink for LoopSink {
    fn emit(&self, event: EngineEvent) {
        let event = match event {
            EngineEvent::SectionFetched { request_id, html } => {
                LoopEvent::Core(Msg::SectionLoaded { request_id, html })
            }
            EngineEvent::PageFetched { url, result } => LoopEvent::PageFetched { url, result },
        };
        let _ = self.tx.send(event);
    }
}

/// Runs the effects the page state asks for.
pub struct EffectRunner {
    engine: EngineHandle,
    debouncer: Debouncer<DomEvent>,
    /// Debounced submits fired but not yet handled by the loop.
    queued_submits: Arc<AtomicUsize>,
}

impl EffectRunner {
    pub fn new(
        settings: FetchSettings,
        debounce: Duration,
        tx: mpsc::Sender<LoopEvent>,
    ) -> std::io::Result<Self> {
        let engine = EngineHandle::new(settings, Arc::new(LoopSink { tx: tx.clone() }))?;
        let queued_submits = Arc::new(AtomicUsize::new(0));
        let queued = Arc::clone(&queued_submits);
        let debouncer = Debouncer::new(engine.runtime(), debounce, move |event: DomEvent| {
            queued.fetch_add(1, Ordering::SeqCst);
            let _ = tx.send(LoopEvent::Core(Msg::SubmitDebounced(event)));
        });
        Ok(Self {
            engine,
            debouncer,
            queued_submits,
        })
    }

    /// Runs `effects`; relative targets resolve against `page_url`.
    /// Returns the kind of page load started, if any.
    pub fn enqueue(&self, page_url: &Url, effects: Vec<Effect>) -> Option<Navigation> {
        let mut navigating = None;
        for effect in effects {
            match effect {
                Effect::DebounceSubmit { event } => self.debouncer.call(event),
                Effect::FetchSection { request_id, target } => {
                    match resolve_target(page_url.as_str(), &target) {
                        Ok(url) => {
                            filters_debug!("FetchSection request_id={request_id} url={url}");
                            self.engine.fetch_section(request_id, url.to_string());
                        }
                        Err(err) => filters_error!("section target {target:?} unusable: {err}"),
                    }
                }
                Effect::FollowLink { href } => {
                    navigating = self.navigate(page_url, &href, Navigation::Push).or(navigating);
                }
                Effect::ReloadEntry { href } => {
                    navigating = self
                        .navigate(page_url, &href, Navigation::Traverse)
                        .or(navigating);
                }
            }
        }
        navigating
    }

    fn navigate(&self, page_url: &Url, href: &str, navigation: Navigation) -> Option<Navigation> {
        match resolve_target(page_url.as_str(), href) {
            Ok(url) => {
                self.load_page(&url);
                Some(navigation)
            }
            Err(err) => {
                filters_error!("navigation target {href:?} unusable: {err}");
                None
            }
        }
    }

    /// Starts a full page load. Timers of the current page are dropped.
    pub fn load_page(&self, url: &Url) {
        filters_info!("navigating to {url}");
        self.debouncer.cancel();
        self.engine.load_page(url.to_string());
    }

    /// Called by the loop once it handled a debounced submit.
    pub fn submit_handled(&self) {
        let _ = self
            .queued_submits
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }

    /// No submit is waiting on the timer or in the loop's queue.
    pub fn submits_settled(&self) -> bool {
        !self.debouncer.is_pending() && self.queued_submits.load(Ordering::SeqCst) == 0
    }
}
