//! Mood labels driving the transform selection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The closed set of moods a recording can be transformed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Calm,
    Energetic,
    Sad,
    Angry,
}

impl Mood {
    pub const ALL: [Mood; 5] = [Mood::Happy, Mood::Calm, Mood::Energetic, Mood::Sad, Mood::Angry];

    /// Lowercase label used in filenames and serialized metadata.
    pub fn label(self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Calm => "calm",
            Mood::Energetic => "energetic",
            Mood::Sad => "sad",
            Mood::Angry => "angry",
        }
    }

    /// Capitalized name for titles.
    pub fn display_name(self) -> &'static str {
        match self {
            Mood::Happy => "Happy",
            Mood::Calm => "Calm",
            Mood::Energetic => "Energetic",
            Mood::Sad => "Sad",
            Mood::Angry => "Angry",
        }
    }

    /// Case-insensitive parse; `None` for anything outside the closed set.
    pub fn parse_lenient(label: &str) -> Option<Mood> {
        label.trim().parse().ok()
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown mood '{0}'")]
pub struct UnknownMood(pub String);

impl FromStr for Mood {
    type Err = UnknownMood;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "happy" => Ok(Mood::Happy),
            "calm" => Ok(Mood::Calm),
            "energetic" => Ok(Mood::Energetic),
            "sad" => Ok(Mood::Sad),
            "angry" => Ok(Mood::Angry),
            _ => Err(UnknownMood(s.to_string())),
        }
    }
}
