use bevy::math::DVec2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The three cyclic kinds. Each beats the next one in the cycle:
/// Scissors cut Paper, Rock crushes Scissors, Paper wraps Rock.
///
/// Declaration order is the enumeration order used for tie-breaking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Kind {
    Scissors,
    Rock,
    Paper,
}

impl Kind {
    pub const ALL: [Kind; 3] = [Kind::Scissors, Kind::Rock, Kind::Paper];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Kind {
        Self::ALL[index % 3]
    }

    /// The kind this one hunts: `(t + 2) mod 3`.
    pub fn prey(self) -> Kind {
        Kind::from_index(self.index() + 2)
    }

    /// The kind that hunts this one: `(t + 1) mod 3`.
    pub fn predator(self) -> Kind {
        Kind::from_index(self.index() + 1)
    }

    /// True when `self` converts `other` on contact.
    pub fn beats(self, other: Kind) -> bool {
        self.prey() == other
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Scissors => "Scissors",
            Kind::Rock => "Rock",
            Kind::Paper => "Paper",
        };
        write!(f, "{}", name)
    }
}

/// One mobile unit. Ids are dense, assigned at creation and never reused.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Agent {
    pub id: usize,
    pub kind: Kind,
    pub position: DVec2,
    pub velocity: DVec2,
}

impl Agent {
    pub fn new(id: usize, kind: Kind, position: DVec2) -> Self {
        Self {
            id,
            kind,
            position,
            velocity: DVec2::ZERO,
        }
    }
}
