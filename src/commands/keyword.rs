//! Public channel commands

use super::{Action, CommandError, Handler, Invocation};
use crate::state_machine::{Event, Mode};

pub const POMODORO_USAGE: &str =
    "Usage: pomodoro <mode>, where mode is one of [fast, long, lazy]. Example: .pomodoro fast";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Pomodoro,
    Register,
    Registered,
    Export,
    Help,
}

impl Keyword {
    pub const ALL: [Keyword; 5] = [
        Keyword::Pomodoro,
        Keyword::Register,
        Keyword::Registered,
        Keyword::Export,
        Keyword::Help,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Keyword::Pomodoro => "pomodoro",
            Keyword::Register => "register",
            Keyword::Registered => "registered",
            Keyword::Export => "export",
            Keyword::Help => "help",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(name))
    }

    /// Lines sent for `.help <command>`
    pub fn help(self) -> &'static [&'static str] {
        match self {
            Keyword::Pomodoro => &[
                "Start a pomodoro if one isn't already running, if one is call for a vote to change modes.",
                "Usage: .pomodoro <mode>, where mode is one of [fast, long, lazy].",
                "Example: .pomodoro fast",
            ],
            Keyword::Register => &[
                "Register to work in the next pomodoro session.",
                "Usage: .register <thing you're working on>",
                "Example: .register I'm writing a pomodoro bot.",
            ],
            Keyword::Registered => &[
                "Send a list of registered users and what they're working on to the nick requesting the list.",
                "Usage: .registered",
                "Example: .registered",
            ],
            Keyword::Export => &[
                "Export a log of your work sessions to a JSON format.",
                "Usage: .export",
                "Example: .export",
            ],
            Keyword::Help => &[
                "Send a help message to the user who requested it.",
                "Usage: .help, .help <command>",
                "Example: .help help",
            ],
        }
    }
}

/// Lines sent for a bare `.help` or an unknown topic
pub fn general_help() -> Vec<String> {
    let names: Vec<&str> = Keyword::ALL.iter().map(|k| k.name()).collect();
    vec![
        "The PomodoroBot has the following commands:".to_string(),
        names.join(" "),
        " ".to_string(),
        "To get more information about a command, type:".to_string(),
        " .help <command name>".to_string(),
        "Example:".to_string(),
        " .help help".to_string(),
    ]
}

pub const COMMANDS: &[(Keyword, Handler)] = &[
    (Keyword::Pomodoro, pomodoro as Handler),
    (Keyword::Register, register as Handler),
    (Keyword::Registered, registered as Handler),
    (Keyword::Export, export as Handler),
    (Keyword::Help, help as Handler),
];

pub fn handler(keyword: Keyword) -> Option<Handler> {
    COMMANDS
        .iter()
        .find(|(k, _)| *k == keyword)
        .map(|(_, handler)| *handler)
}

fn pomodoro(invocation: &Invocation) -> Result<Action, CommandError> {
    let Some(mode) = invocation.args.first() else {
        return Err(CommandError::Usage(POMODORO_USAGE.to_string()));
    };
    let mode: Mode = mode.parse()?;
    Ok(Action::StartOrVote(mode))
}

fn register(invocation: &Invocation) -> Result<Action, CommandError> {
    Ok(Action::Session(Event::Register {
        identity: invocation.sender.clone(),
        goal: invocation.args.join(" "),
    }))
}

fn registered(_: &Invocation) -> Result<Action, CommandError> {
    Ok(Action::ListRegistered)
}

fn export(_: &Invocation) -> Result<Action, CommandError> {
    Ok(Action::Export)
}

fn help(invocation: &Invocation) -> Result<Action, CommandError> {
    let lines = match invocation
        .args
        .first()
        .and_then(|topic| Keyword::from_name(topic.trim_start_matches('.')))
    {
        Some(keyword) => keyword.help().iter().map(|s| (*s).to_string()).collect(),
        None => general_help(),
    };
    Ok(Action::Reply(lines))
}
