use std::sync::{mpsc, Arc};
use std::thread;

use filters_logging::filters_debug;
use tokio::runtime::{Handle, Runtime};

use crate::fetch::{fetch_section, EventSink, FetchSettings, Fetcher, ReqwestFetcher};
use crate::{EngineEvent, RequestId};

enum EngineCommand {
    FetchSection { request_id: RequestId, url: String },
    LoadPage { url: String },
}

/// Runs fetches on a background tokio runtime and reports through an [`EventSink`].
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    runtime: Handle,
}

impl EngineHandle {
    pub fn new(settings: FetchSettings, sink: Arc<dyn EventSink>) -> std::io::Result<Self> {
        Self::with_fetcher(Arc::new(ReqwestFetcher::new(settings)), sink)
    }

    pub fn with_fetcher(
        fetcher: Arc<dyn Fetcher>,
        sink: Arc<dyn EventSink>,
    ) -> std::io::Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let runtime = Runtime::new()?;
        let handle = runtime.handle().clone();

        thread::spawn(move || {
            while let Ok(command) = cmd_rx.recv() {
                let fetcher = fetcher.clone();
                let sink = sink.clone();
                runtime.spawn(async move {
                    handle_command(fetcher.as_ref(), command, sink.as_ref()).await;
                });
            }
            filters_debug!("engine command channel closed");
        });

        Ok(Self {
            cmd_tx,
            runtime: handle,
        })
    }

    pub fn fetch_section(&self, request_id: RequestId, url: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::FetchSection {
            request_id,
            url: url.into(),
        });
    }

    pub fn load_page(&self, url: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::LoadPage { url: url.into() });
    }

    /// Handle of the engine runtime, for timers that must run beside the fetches.
    pub fn runtime(&self) -> Handle {
        self.runtime.clone()
    }
}

async fn handle_command(fetcher: &dyn Fetcher, command: EngineCommand, sink: &dyn EventSink) {
    match command {
        EngineCommand::FetchSection { request_id, url } => {
            let html = fetch_section(fetcher, &url).await;
            sink.emit(EngineEvent::SectionFetched { request_id, html });
        }
        EngineCommand::LoadPage { url } => {
            let result = fetcher.fetch(&url).await;
            sink.emit(EngineEvent::PageFetched { url, result });
        }
    }
}
