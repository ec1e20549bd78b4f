use std::collections::VecDeque;
use std::sync::mpsc;

use anyhow::{bail, Context};
use filters_core::{update, Msg, Navigation, PageState};
use filters_engine::{FetchError, FetchedPage};
use filters_logging::{filters_info, filters_warn};
use url::Url;

use crate::cli::SessionConfig;
use crate::commands::{self, Command};
use crate::effects::EffectRunner;

/// Everything the session loop reacts to.
#[derive(Debug, PartialEq)]
pub enum LoopEvent {
    Core(Msg),
    PageFetched {
        url: String,
        result: Result<FetchedPage, FetchError>,
    },
    Command(Command),
    InputClosed,
}

pub fn run(config: SessionConfig) -> anyhow::Result<()> {
    let (tx, rx) = mpsc::channel::<LoopEvent>();
    let runner = EffectRunner::new(config.fetch.clone(), config.debounce, tx.clone())
        .context("starting the fetch engine")?;
    let state = PageState::new(config.page.clone()).context("compiling page selectors")?;

    runner.load_page(&config.url);
    commands::spawn_reader(config.script.as_deref(), tx)?;

    let mut session = Session {
        state: Some(state),
        runner,
        origin: config.url,
        loading: Some(Navigation::Push),
        loaded_once: false,
        waiting_commands: VecDeque::new(),
        quitting: false,
    };

    while let Ok(event) = rx.recv() {
        session.handle(event)?;
        if session.finished() {
            break;
        }
    }
    filters_info!("session ended");
    Ok(())
}

struct Session {
    // Only `None` while `update` holds it.
    state: Option<PageState>,
    runner: EffectRunner,
    /// URL of the last loaded page; locations resolve against it.
    origin: Url,
    /// Page load in progress, if any.
    loading: Option<Navigation>,
    loaded_once: bool,
    /// Commands that arrived while a page was loading.
    waiting_commands: VecDeque<Command>,
    quitting: bool,
}

impl Session {
    fn handle(&mut self, event: LoopEvent) -> anyhow::Result<()> {
        match event {
            LoopEvent::Core(msg) => {
                if matches!(msg, Msg::SubmitDebounced(_)) {
                    self.runner.submit_handled();
                }
                self.dispatch(msg);
            }
            LoopEvent::PageFetched { url, result } => self.page_fetched(&url, result)?,
            LoopEvent::Command(command) if self.loading.is_some() => {
                self.waiting_commands.push_back(command)
            }
            LoopEvent::Command(command) => self.run_command(command),
            LoopEvent::InputClosed => self.waiting_commands.push_back(Command::Quit),
        }
        if self.loading.is_none() {
            while let Some(command) = self.waiting_commands.pop_front() {
                self.run_command(command);
                if self.loading.is_some() {
                    break;
                }
            }
        }
        Ok(())
    }

    fn page_fetched(
        &mut self,
        url: &str,
        result: Result<FetchedPage, FetchError>,
    ) -> anyhow::Result<()> {
        let navigation = self.loading.take().unwrap_or_default();
        let page = match result {
            Ok(page) => page,
            Err(err) if !self.loaded_once => bail!("loading {url} failed: {err}"),
            Err(err) => {
                filters_warn!("navigation to {url} failed: {err}");
                return Ok(());
            }
        };
        let final_url = Url::parse(&page.metadata.final_url)
            .with_context(|| format!("page answered from {}", page.metadata.final_url))?;
        let location = match final_url.query() {
            Some(query) => format!("{}?{}", final_url.path(), query),
            None => final_url.path().to_string(),
        };
        self.origin = final_url;
        self.loaded_once = true;
        self.dispatch(Msg::PageLoaded {
            location,
            html: page.html,
            navigation,
        });
        Ok(())
    }

    fn run_command(&mut self, command: Command) {
        let Some(state) = self.state.as_ref() else {
            return;
        };
        match command {
            Command::Action(action) => self.dispatch(Msg::User(action)),
            Command::Show(selector) => match state.inner_html(&selector) {
                Ok(Some(html)) => println!("{}", html.trim()),
                Ok(None) => println!("(no element matches {selector})"),
                Err(err) => eprintln!("{err}"),
            },
            Command::Url => println!("{}", state.history().location()),
            Command::History => match serde_json::to_string_pretty(state.history()) {
                Ok(json) => println!("{json}"),
                Err(err) => eprintln!("history unavailable: {err}"),
            },
            Command::Sleep(_) => {}
            Command::Quit => self.quitting = true,
        }
    }

    fn dispatch(&mut self, msg: Msg) {
        let Some(state) = self.state.take() else {
            return;
        };
        let (mut state, effects) = update(state, msg);
        let page_url = self.page_url(&state);
        if let Some(navigation) = self.runner.enqueue(&page_url, effects) {
            self.loading = Some(navigation);
        }
        if state.consume_dirty() {
            let view = state.view();
            println!(
                "-> {} (renders applied: {}, pending: {})",
                view.location, view.renders_applied, view.in_flight
            );
        }
        self.state = Some(state);
    }

    fn page_url(&self, state: &PageState) -> Url {
        self.origin
            .join(state.history().location())
            .unwrap_or_else(|_| self.origin.clone())
    }

    /// Quit was requested and nothing the user started is still running.
    fn finished(&self) -> bool {
        let in_flight = self.state.as_ref().map_or(0, |state| state.view().in_flight);
        self.quitting && self.loading.is_none() && in_flight == 0 && self.runner.submits_settled()
    }
}
