use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use filters_core::{PageSettings, RenderOrdering, SUBMIT_DEBOUNCE};
use filters_engine::FetchSettings;
use log::LevelFilter;
use url::Url;

use crate::logging::LogDestination;

/// Drives live filtering of a collection page from a command session.
#[derive(Debug, Parser)]
#[command(name = "filters_app", version, about, long_about = None)]
pub struct Args {
    /// Collection page to load.
    #[arg(long, value_name = "URL")]
    pub url: Url,
    /// Read session commands from this file instead of stdin.
    #[arg(long, value_name = "PATH")]
    pub script: Option<PathBuf>,
    /// Quiet period before form input is submitted.
    #[arg(long, value_name = "MS", default_value_t = SUBMIT_DEBOUNCE.as_millis() as u64)]
    pub debounce_ms: u64,
    /// Apply only the response of the newest render.
    #[arg(long)]
    pub latest_wins: bool,
    /// Give up on a request after this many seconds (no limit by default).
    #[arg(long, value_name = "SECONDS")]
    pub request_timeout_secs: Option<u64>,
    /// Where log lines go.
    #[arg(long, value_enum, default_value_t = LogArg::File)]
    pub log: LogArg,
    /// Log at debug level.
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogArg {
    Terminal,
    File,
    Both,
}

/// Everything a session needs, resolved from the command line.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub url: Url,
    pub script: Option<PathBuf>,
    pub debounce: Duration,
    pub page: PageSettings,
    pub fetch: FetchSettings,
    pub log: LogDestination,
    pub verbose: bool,
}

impl SessionConfig {
    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }
}

impl From<Args> for SessionConfig {
    fn from(args: Args) -> Self {
        let ordering = if args.latest_wins {
            RenderOrdering::LatestWins
        } else {
            RenderOrdering::Unordered
        };
        let fetch = FetchSettings {
            request_timeout: args.request_timeout_secs.map(Duration::from_secs),
            ..FetchSettings::default()
        };
        let log = match args.log {
            LogArg::Terminal => LogDestination::Terminal,
            LogArg::File => LogDestination::File,
            LogArg::Both => LogDestination::Both,
        };
        Self {
            url: args.url,
            script: args.script,
            debounce: Duration::from_millis(args.debounce_ms),
            page: PageSettings { ordering },
            fetch,
            log,
            verbose: args.verbose,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use clap::Parser;
    use filters_core::RenderOrdering;

    use super::{Args, SessionConfig};
    use crate::logging::LogDestination;

    #[test]
    fn defaults_match_a_plain_session() {
        let args = Args::try_parse_from(["filters_app", "--url", "https://shop.example/collections/all"])
            .unwrap();
        let config = SessionConfig::from(args);
        assert_eq!(config.debounce, Duration::from_millis(300));
        assert_eq!(config.page.ordering, RenderOrdering::Unordered);
        assert_eq!(config.fetch.request_timeout, None);
        assert_eq!(config.log, LogDestination::File);
        assert!(config.script.is_none());
    }

    #[test]
    fn flags_map_onto_settings() {
        let args = Args::try_parse_from([
            "filters_app",
            "--url",
            "https://shop.example/collections/all",
            "--debounce-ms",
            "50",
            "--latest-wins",
            "--request-timeout-secs",
            "8",
            "--log",
            "both",
            "--verbose",
        ])
        .unwrap();
        let config = SessionConfig::from(args);
        assert_eq!(config.debounce, Duration::from_millis(50));
        assert_eq!(config.page.ordering, RenderOrdering::LatestWins);
        assert_eq!(config.fetch.request_timeout, Some(Duration::from_secs(8)));
        assert_eq!(config.log, LogDestination::Both);
        assert_eq!(config.log_level(), log::LevelFilter::Debug);
    }

    #[test]
    fn url_must_parse() {
        assert!(Args::try_parse_from(["filters_app", "--url", "not a url"]).is_err());
    }
}
