//! Child process specification

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::color::ConsoleColor;

/// How to launch one child agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChildSpec {
    /// Unique name (case-insensitive); also the `name:` addressing prefix
    #[serde(alias = "Name")]
    pub name: String,

    /// Executable to run
    #[serde(alias = "Cmd", alias = "command", alias = "Command")]
    pub cmd: String,

    /// Arguments, as a list or a single command-line string
    #[serde(default, alias = "Args")]
    pub args: CommandArgs,

    /// Display color spec (see [`ConsoleColor`])
    #[serde(default, alias = "Color")]
    pub color: Option<String>,

    /// Working directory (defaults to the orchestrator's)
    #[serde(
        default,
        alias = "Cwd",
        alias = "workingDirectory",
        alias = "WorkingDirectory"
    )]
    pub cwd: Option<PathBuf>,

    /// Show the child's console window (Windows only)
    #[serde(default, alias = "ShowWindow", alias = "showWindow")]
    pub show_window: bool,

    /// Extra environment variables
    #[serde(default, alias = "Env")]
    pub env: HashMap<String, String>,
}

impl ChildSpec {
    /// Create a spec with just a name and command
    pub fn new(name: impl Into<String>, cmd: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cmd: cmd.into(),
            args: CommandArgs::default(),
            color: None,
            cwd: None,
            show_window: false,
            env: HashMap::new(),
        }
    }

    /// Builder: set arguments
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = CommandArgs::List(args.into_iter().map(Into::into).collect());
        self
    }

    /// Builder: set color spec
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Resolved display color; `None` keeps the console's current color
    pub fn display_color(&self) -> Option<ConsoleColor> {
        let spec = self.color.as_deref()?;
        let color = ConsoleColor::parse(spec);
        if color.is_none() {
            tracing::warn!(child = %self.name, color = %spec, "Unrecognized color, keeping default");
        }
        color
    }
}

/// Command arguments as written in the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandArgs {
    /// Pre-split argument list
    List(Vec<String>),
    /// A single command-line string
    Line(String),
}

impl Default for CommandArgs {
    fn default() -> Self {
        CommandArgs::List(Vec::new())
    }
}

impl CommandArgs {
    /// Argument vector to pass to the process
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            CommandArgs::List(args) => args.clone(),
            CommandArgs::Line(line) => split_command_line(line),
        }
    }
}

/// Split a command line on whitespace, honoring single and double quotes.
///
/// Inside double quotes `\"` yields a literal quote.
pub fn split_command_line(line: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) if c == q => quote = None,
            Some('"') if c == '\\' && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_token = true;
            }
            None if c.is_whitespace() => {
                if in_token {
                    args.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            None => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if in_token {
        args.push(current);
    }
    args
}
