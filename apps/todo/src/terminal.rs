//! Line-oriented terminal front end: prints render commands and turns typed
//! lines into controller input.

use std::{io::Write, str::FromStr, sync::Mutex};

use clap::ValueEnum;
use controller::{events::Input, View};
use serde::Deserialize;
use shared::{domain::TodoId, protocol::RenderCommand, protocol::ViewEvent};
use thiserror::Error;

pub const HELP: &str = "\
commands:
  add <title>          create a todo
  done <id>            mark a todo completed
  undo <id>            mark a todo active
  rm <id>              remove a todo
  edit <id>            start editing a todo
  save <id> [title]    finish editing; an empty title removes the todo
  cancel <id>          abandon an edit
  all on|off           complete or reopen every todo
  clear                remove completed todos
  route <hash>         switch filter: #/, #/active, #/completed
  help                 show this text
  quit                 exit";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown output format '{other}'")),
        }
    }
}

pub struct TerminalView<W: Write + Send> {
    out: Mutex<W>,
    format: OutputFormat,
}

impl<W: Write + Send> TerminalView<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self {
            out: Mutex::new(out),
            format,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W: Write + Send> View for TerminalView<W> {
    fn render(&self, command: RenderCommand) {
        let rendered = match self.format {
            OutputFormat::Text => format_text(&command),
            OutputFormat::Json => match serde_json::to_string(&command) {
                Ok(json) => json,
                Err(err) => {
                    tracing::warn!(command = command.name(), error = %err, "failed to encode render command");
                    return;
                }
            },
        };

        let mut out = self.out.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(err) = writeln!(out, "{rendered}").and_then(|()| out.flush()) {
            tracing::warn!(command = command.name(), error = %err, "failed to write render command");
        }
    }
}

pub fn format_text(command: &RenderCommand) -> String {
    match command {
        RenderCommand::SetFilter(filter) if filter.is_empty() => "filter: all".to_string(),
        RenderCommand::SetFilter(filter) => format!("filter: {filter}"),
        RenderCommand::ShowEntries(todos) if todos.is_empty() => "  (no todos)".to_string(),
        RenderCommand::ShowEntries(todos) => todos
            .iter()
            .map(|todo| {
                let mark = if todo.completed { 'x' } else { ' ' };
                format!("  [{mark}] {:>3}  {}", todo.id.0, todo.title)
            })
            .collect::<Vec<_>>()
            .join("\n"),
        RenderCommand::ContentBlockVisibility { visible } => {
            format!("list: {}", if *visible { "shown" } else { "hidden" })
        }
        RenderCommand::ToggleAll { checked } => {
            format!("toggle all: {}", if *checked { "checked" } else { "unchecked" })
        }
        RenderCommand::ClearCompletedButton { completed, visible } => {
            if *visible {
                format!("clear completed: {completed}")
            } else {
                "clear completed: hidden".to_string()
            }
        }
        RenderCommand::ElementComplete { id, completed } => {
            format!("#{id} {}", if *completed { "completed" } else { "active" })
        }
        RenderCommand::ClearNewTodo => "input cleared".to_string(),
        RenderCommand::RemoveItem(id) => format!("#{id} removed"),
        RenderCommand::UpdateElementCount(1) => "1 item left".to_string(),
        RenderCommand::UpdateElementCount(count) => format!("{count} items left"),
        RenderCommand::EditItem { id, title } => format!("editing #{id}: {title}"),
        RenderCommand::EditItemDone { id, title } => format!("#{id}: {title}"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Input(Input),
    Help,
    Quit,
    Blank,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown command '{0}' (try 'help')")]
    UnknownCommand(String),
    #[error("'{command}' needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },
    #[error("'{0}' is not a todo id")]
    InvalidId(String),
    #[error("expected 'on' or 'off', got '{0}'")]
    InvalidSwitch(String),
}

pub fn parse_line(line: &str) -> Result<Line, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Line::Blank);
    }

    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    let event = match command {
        "help" | "?" => return Ok(Line::Help),
        "quit" | "exit" | "q" => return Ok(Line::Quit),
        "route" | "go" => {
            let route = required(rest, "route", "a route such as #/active")?;
            return Ok(Line::Input(Input::Navigate(route.to_string())));
        }
        "add" | "new" => ViewEvent::NewTodo {
            title: required(rest, "add", "a title")?.to_string(),
        },
        "done" => ViewEvent::ItemToggle {
            id: parse_id(rest, "done")?,
            completed: true,
        },
        "undo" => ViewEvent::ItemToggle {
            id: parse_id(rest, "undo")?,
            completed: false,
        },
        "rm" | "remove" => ViewEvent::ItemRemove {
            id: parse_id(rest, "rm")?,
        },
        "edit" => ViewEvent::ItemEdit {
            id: parse_id(rest, "edit")?,
        },
        "save" => {
            let (id, title) = match rest.split_once(char::is_whitespace) {
                Some((id, title)) => (id, title.trim()),
                None => (rest, ""),
            };
            ViewEvent::ItemEditDone {
                id: parse_id(id, "save")?,
                title: title.to_string(),
            }
        }
        "cancel" => ViewEvent::ItemEditCancel {
            id: parse_id(rest, "cancel")?,
        },
        "all" => {
            let completed = match required(rest, "all", "'on' or 'off'")? {
                "on" => true,
                "off" => false,
                other => return Err(ParseError::InvalidSwitch(other.to_string())),
            };
            ViewEvent::ToggleAll { completed }
        }
        "clear" => ViewEvent::RemoveCompleted,
        other => return Err(ParseError::UnknownCommand(other.to_string())),
    };

    Ok(Line::Input(Input::Event(event)))
}

fn required<'a>(
    rest: &'a str,
    command: &'static str,
    argument: &'static str,
) -> Result<&'a str, ParseError> {
    if rest.is_empty() {
        Err(ParseError::MissingArgument { command, argument })
    } else {
        Ok(rest)
    }
}

fn parse_id(raw: &str, command: &'static str) -> Result<TodoId, ParseError> {
    let raw = required(raw, command, "a todo id")?;
    raw.trim_start_matches('#')
        .parse::<i64>()
        .map(TodoId)
        .map_err(|_| ParseError::InvalidId(raw.to_string()))
}

#[cfg(test)]
#[path = "tests/terminal_tests.rs"]
mod tests;
