//! Line-oriented interactive session.
//!
//! Responses are applied as they arrive, even while the user is typing.

use std::io::Write;
use std::path::PathBuf;

use shared::Event;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

use crate::error::Result;
use crate::render;
use crate::runtime::Runtime;
use crate::transport::Transport;

pub const HELP: &str = "\
Commands:
  message <text>   set the message to check
  email <text>     set the contact email
  phone <text>     set the contact phone
  locate           resolve the visitor location
  check            check the message for spam
  show             print the form and current results
  map [FILE]       print the map as GeoJSON, or write it to FILE
  help             show this help
  quit             leave the session
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Message(String),
    Email(String),
    Phone(String),
    Locate,
    Check,
    Show,
    Map(Option<PathBuf>),
    Help,
    Quit,
    Empty,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown command '{0}', try 'help'")]
    Unknown(String),

    #[error("'{0}' takes no arguments")]
    UnexpectedArgument(&'static str),
}

impl Command {
    /// `message` keeps everything after the first space verbatim; contact
    /// fields are trimmed.
    pub fn parse(line: &str) -> std::result::Result<Self, ParseError> {
        let line = line.trim_end_matches(['\r', '\n']);
        let trimmed = line.trim_start();
        if trimmed.trim().is_empty() {
            return Ok(Self::Empty);
        }

        let (word, rest) = match trimmed.split_once(' ') {
            Some((word, rest)) => (word, rest),
            None => (trimmed, ""),
        };
        let bare = |command: Self, name: &'static str| {
            if rest.trim().is_empty() {
                Ok(command)
            } else {
                Err(ParseError::UnexpectedArgument(name))
            }
        };

        match word.to_ascii_lowercase().as_str() {
            "message" | "msg" => Ok(Self::Message(rest.to_string())),
            "email" => Ok(Self::Email(rest.trim().to_string())),
            "phone" => Ok(Self::Phone(rest.trim().to_string())),
            "locate" => bare(Self::Locate, "locate"),
            "check" => bare(Self::Check, "check"),
            "show" => bare(Self::Show, "show"),
            "help" | "?" => bare(Self::Help, "help"),
            "quit" | "exit" => bare(Self::Quit, "quit"),
            "map" => {
                let path = rest.trim();
                Ok(Self::Map((!path.is_empty()).then(|| PathBuf::from(path))))
            }
            other => Err(ParseError::Unknown(other.to_string())),
        }
    }
}

/// Runs the session until `quit` or end of input, then waits for any
/// requests still in flight so their results are not lost.
pub async fn run<T, R, W>(runtime: &mut Runtime<T>, input: R, out: &mut W) -> Result<()>
where
    T: Transport,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    writeln!(out, "Type 'help' for commands.")?;
    out.flush()?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match Command::parse(&line) {
                    Ok(Command::Quit) => break,
                    Ok(command) => execute(runtime, command, out).await?,
                    Err(e) => writeln!(out, "{e}")?,
                }
            }
            rendered = runtime.next_response() => {
                if rendered {
                    write!(out, "{}", render::summary(&runtime.view()))?;
                }
            }
        }
        out.flush()?;
    }

    if runtime.pending() > 0 {
        debug!(pending = runtime.pending(), "waiting for in-flight requests");
        runtime.settle().await;
        write!(out, "{}", render::summary(&runtime.view()))?;
    }
    out.flush()?;
    Ok(())
}

async fn execute<T: Transport>(
    runtime: &mut Runtime<T>,
    command: Command,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        Command::Message(text) => {
            runtime.dispatch(Event::MessageChanged(text));
        }
        Command::Email(text) => {
            runtime.dispatch(Event::EmailChanged(text));
        }
        Command::Phone(text) => {
            runtime.dispatch(Event::PhoneChanged(text));
        }
        Command::Locate => {
            runtime.dispatch(Event::FetchLocationRequested);
            writeln!(out, "Locating...")?;
        }
        Command::Check => {
            runtime.dispatch(Event::CheckSpamRequested);
            writeln!(out, "Checking message...")?;
        }
        Command::Show => {
            let view = runtime.view();
            write!(out, "{}{}", render::form(&view), render::summary(&view))?;
        }
        Command::Map(None) => {
            writeln!(out, "{}", render::map_geojson(&runtime.view())?)?;
        }
        Command::Map(Some(path)) => {
            render::write_map(&runtime.view(), &path).await?;
            writeln!(out, "Map written to {}", path.display())?;
        }
        Command::Help => write!(out, "{HELP}")?,
        Command::Quit | Command::Empty => {}
    }
    Ok(())
}
