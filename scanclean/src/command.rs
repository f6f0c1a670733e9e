//! Command selection

use crate::{ProcessError, ProcessResult};
use std::fmt;
use std::str::FromStr;

/// Operation a host applies to the current page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Deskew,
    Binarize,
    BorderRemove,
    Despeckle,
    PunchHoleRemove,
    SplitPages,
}

impl Command {
    pub const ALL: [Command; 6] = [
        Command::Deskew,
        Command::Binarize,
        Command::BorderRemove,
        Command::Despeckle,
        Command::PunchHoleRemove,
        Command::SplitPages,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Command::Deskew => "Deskew",
            Command::Binarize => "Binarize",
            Command::BorderRemove => "BorderRemove",
            Command::Despeckle => "Despeckle",
            Command::PunchHoleRemove => "PunchHoleRemove",
            Command::SplitPages => "SplitPages",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Command {
    type Err = ProcessError;

    fn from_str(s: &str) -> ProcessResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deskew" => Ok(Command::Deskew),
            "binarize" => Ok(Command::Binarize),
            "borderremove" => Ok(Command::BorderRemove),
            "despeckle" => Ok(Command::Despeckle),
            "punchholeremove" | "punchremove" => Ok(Command::PunchHoleRemove),
            "splitpages" | "split" => Ok(Command::SplitPages),
            _ => Err(ProcessError::UnsupportedConfiguration(format!("command '{s}'"))),
        }
    }
}
