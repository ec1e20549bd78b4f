use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use filters_core::UserAction;
use filters_logging::filters_warn;

use crate::app::LoopEvent;

/// One line of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Action(UserAction),
    /// Print the inner HTML of the first element matching a selector.
    Show(String),
    Url,
    History,
    Sleep(Duration),
    Quit,
}

/// Parses one session line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> anyhow::Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (word, rest) = line
        .split_once(char::is_whitespace)
        .map(|(word, rest)| (word, rest.trim()))
        .unwrap_or((line, ""));

    let command = match word {
        "check" | "uncheck" => Command::Action(UserAction::SetChecked {
            element_id: single_id(word, rest)?,
            checked: word == "check",
        }),
        "set" | "select" => {
            let (id, value) = rest
                .split_once(char::is_whitespace)
                .map(|(id, value)| (id, value.trim()))
                .unwrap_or((rest, ""));
            if id.is_empty() {
                bail!("`{word}` needs an element id");
            }
            if word == "select" && value.is_empty() {
                bail!("`select` needs an option value");
            }
            Command::Action(UserAction::SetValue {
                element_id: id.to_string(),
                value: value.to_string(),
            })
        }
        "click" => Command::Action(UserAction::Click {
            element_id: single_id(word, rest)?,
        }),
        "back" => Command::Action(UserAction::Back),
        "forward" => Command::Action(UserAction::Forward),
        "show" if !rest.is_empty() => Command::Show(rest.to_string()),
        "show" => bail!("`show` needs a selector"),
        "url" => Command::Url,
        "history" => Command::History,
        "sleep" => {
            let ms = rest
                .parse::<u64>()
                .with_context(|| format!("`sleep` needs milliseconds, got {rest:?}"))?;
            Command::Sleep(Duration::from_millis(ms))
        }
        "quit" | "exit" => Command::Quit,
        other => return Err(anyhow!("unknown command `{other}`")),
    };
    Ok(Some(command))
}

fn single_id(word: &str, rest: &str) -> anyhow::Result<String> {
    match rest.split_whitespace().collect::<Vec<_>>().as_slice() {
        [id] => Ok((*id).to_string()),
        _ => bail!("`{word}` needs exactly one element id"),
    }
}

/// Reads commands from `script` (or stdin) on a background thread.
///
/// `sleep` pauses the reader only; the session keeps processing events.
/// End of input is reported as [`LoopEvent::InputClosed`].
pub fn spawn_reader(script: Option<&Path>, tx: mpsc::Sender<LoopEvent>) -> anyhow::Result<()> {
    let input: Box<dyn BufRead + Send> = match script {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("opening script {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };
    thread::spawn(move || read_commands(input, &tx));
    Ok(())
}

fn read_commands(input: impl BufRead, tx: &mpsc::Sender<LoopEvent>) {
    for (index, line) in input.lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                filters_warn!("reading commands stopped: {err}");
                break;
            }
        };
        match parse_line(&line) {
            Ok(Some(Command::Sleep(pause))) => thread::sleep(pause),
            Ok(Some(command)) => {
                let quit = command == Command::Quit;
                if tx.send(LoopEvent::Command(command)).is_err() || quit {
                    return;
                }
            }
            Ok(None) => {}
            Err(err) => eprintln!("line {}: {err:#}", index + 1),
        }
    }
    let _ = tx.send(LoopEvent::InputClosed);
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::mpsc;
    use std::time::Duration;

    use filters_core::UserAction;
    use pretty_assertions::assert_eq;

    use super::{parse_line, spawn_reader, Command};
    use crate::app::LoopEvent;

    #[test]
    fn blank_lines_and_comments_are_skipped() {
        assert_eq!(parse_line("").unwrap(), None);
        assert_eq!(parse_line("   # toggle red next").unwrap(), None);
    }

    #[test]
    fn control_commands_address_elements_by_id() {
        assert_eq!(
            parse_line("check color-red").unwrap(),
            Some(Command::Action(UserAction::SetChecked {
                element_id: "color-red".into(),
                checked: true,
            }))
        );
        assert_eq!(
            parse_line("uncheck  size-m ").unwrap(),
            Some(Command::Action(UserAction::SetChecked {
                element_id: "size-m".into(),
                checked: false,
            }))
        );
        assert_eq!(
            parse_line("select sort price-desc").unwrap(),
            Some(Command::Action(UserAction::SetValue {
                element_id: "sort".into(),
                value: "price-desc".into(),
            }))
        );
        assert_eq!(
            parse_line("set price-min 10 EUR").unwrap(),
            Some(Command::Action(UserAction::SetValue {
                element_id: "price-min".into(),
                value: "10 EUR".into(),
            }))
        );
        assert_eq!(
            parse_line("set price-min").unwrap(),
            Some(Command::Action(UserAction::SetValue {
                element_id: "price-min".into(),
                value: String::new(),
            }))
        );
        assert_eq!(
            parse_line("click remove-red").unwrap(),
            Some(Command::Action(UserAction::Click {
                element_id: "remove-red".into(),
            }))
        );
    }

    #[test]
    fn session_commands_parse() {
        assert_eq!(parse_line("back").unwrap(), Some(Command::Action(UserAction::Back)));
        assert_eq!(
            parse_line("forward").unwrap(),
            Some(Command::Action(UserAction::Forward))
        );
        assert_eq!(
            parse_line("show .js-products-container li").unwrap(),
            Some(Command::Show(".js-products-container li".into()))
        );
        assert_eq!(parse_line("url").unwrap(), Some(Command::Url));
        assert_eq!(parse_line("history").unwrap(), Some(Command::History));
        assert_eq!(
            parse_line("sleep 400").unwrap(),
            Some(Command::Sleep(Duration::from_millis(400)))
        );
        assert_eq!(parse_line("quit").unwrap(), Some(Command::Quit));
    }

    #[test]
    fn malformed_lines_are_rejected() {
        assert!(parse_line("check").is_err());
        assert!(parse_line("check a b").is_err());
        assert!(parse_line("select sort").is_err());
        assert!(parse_line("sleep soon").is_err());
        assert!(parse_line("show").is_err());
        assert!(parse_line("dance").is_err());
    }

    #[test]
    fn script_reader_stops_at_quit() {
        let mut script = tempfile::NamedTempFile::new().unwrap();
        writeln!(script, "# demo\ncheck color-red\nbogus\nsleep 1\nurl\nquit\nback").unwrap();

        let (tx, rx) = mpsc::channel();
        spawn_reader(Some(script.path()), tx).unwrap();
        let events: Vec<LoopEvent> = rx.iter().collect();

        assert_eq!(
            events,
            vec![
                LoopEvent::Command(Command::Action(UserAction::SetChecked {
                    element_id: "color-red".into(),
                    checked: true,
                })),
                LoopEvent::Command(Command::Url),
                LoopEvent::Command(Command::Quit),
            ]
        );
    }

    #[test]
    fn script_reader_reports_end_of_input() {
        let mut script = tempfile::NamedTempFile::new().unwrap();
        writeln!(script, "back").unwrap();

        let (tx, rx) = mpsc::channel();
        spawn_reader(Some(script.path()), tx).unwrap();
        let events: Vec<LoopEvent> = rx.iter().collect();

        assert_eq!(
            events,
            vec![
                LoopEvent::Command(Command::Action(UserAction::Back)),
                LoopEvent::InputClosed,
            ]
        );
    }

    #[test]
    fn missing_script_is_an_error() {
        let (tx, _rx) = mpsc::channel();
        assert!(spawn_reader(Some(std::path::Path::new("/nonexistent/session.txt")), tx).is_err());
    }
}
