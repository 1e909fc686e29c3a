//! Trainer profiles supplied by the identity collaborator

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    Mystic,
    Valor,
    Instinct,
}

impl Team {
    /// Colour name as players refer to teams
    pub fn colour(&self) -> &'static str {
        match self {
            Team::Mystic => "Blue",
            Team::Valor => "Red",
            Team::Instinct => "Yellow",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "blue" | "mystic" => Some(Team::Mystic),
            "red" | "valor" => Some(Team::Valor),
            "yellow" | "instinct" => Some(Team::Instinct),
            _ => None,
        }
    }
}

/// Read-only profile data embedded in summaries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainerProfile {
    pub display_name: String,
    pub trainer_code: Option<String>,
    pub level: Option<u8>,
    pub team: Option<Team>,
}

impl TrainerProfile {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            trainer_code: None,
            level: None,
            team: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.trainer_code = Some(code.into());
        self
    }

    pub fn with_level(mut self, level: u8) -> Self {
        self.level = Some(level);
        self
    }

    pub fn with_team(mut self, team: Team) -> Self {
        self.team = Some(team);
        self
    }

    /// `Lvl 40 Yellow` style tag; empty when nothing is known.
    pub fn gamer_tag(&self) -> String {
        match (self.level, self.team) {
            (Some(level), Some(team)) => format!("Lvl {} {}", level, team.colour()),
            (Some(level), None) => format!("Lvl {}", level),
            (None, Some(team)) => team.colour().to_string(),
            (None, None) => String::new(),
        }
    }
}
