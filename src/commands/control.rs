//! Controller-only private commands

use super::{Action, CommandError, Handler, Invocation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKeyword {
    Join,
    Part,
}

impl ControlKeyword {
    pub const ALL: [ControlKeyword; 2] = [ControlKeyword::Join, ControlKeyword::Part];

    pub fn name(self) -> &'static str {
        match self {
            ControlKeyword::Join => "join",
            ControlKeyword::Part => "part",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(name))
    }
}

pub const COMMANDS: &[(ControlKeyword, Handler)] = &[
    (ControlKeyword::Join, join as Handler),
    (ControlKeyword::Part, part as Handler),
];

pub fn handler(keyword: ControlKeyword) -> Option<Handler> {
    COMMANDS
        .iter()
        .find(|(k, _)| *k == keyword)
        .map(|(_, handler)| *handler)
}

/// Channel names start with `#` or `&`
pub fn is_channel(name: &str) -> bool {
    name.len() > 1 && name.starts_with(['#', '&'])
}

fn join(invocation: &Invocation) -> Result<Action, CommandError> {
    let Some(channel) = invocation.args.first() else {
        return Err(CommandError::Usage(
            "Usage: join <channel> Example: join #test".to_string(),
        ));
    };
    if !is_channel(channel) {
        return Err(CommandError::NotAChannel(channel.clone()));
    }
    Ok(Action::Join(channel.clone()))
}

fn part(invocation: &Invocation) -> Result<Action, CommandError> {
    let Some(channel) = invocation.args.first() else {
        return Err(CommandError::Usage(
            "Usage: part <channel> Example: part #test".to_string(),
        ));
    };
    Ok(Action::Part(channel.clone()))
}
