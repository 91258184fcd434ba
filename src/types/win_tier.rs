use serde::{Deserialize, Serialize};
use std::fmt;

/// Size class of a burst shown on a replay, from the replay URL or icon name
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WinTier {
    NoBurst,
    Big,
    Super,
    Mega,
    Ultra,
    Legendary,
}

impl WinTier {
    /// Classify by keyword; larger tiers are checked first
    pub fn classify(url: &str) -> Self {
        let lower = url.to_lowercase();
        if lower.contains("legendary") {
            WinTier::Legendary
        } else if lower.contains("ultra") {
            WinTier::Ultra
        } else if lower.contains("mega") {
            WinTier::Mega
        } else if lower.contains("super") {
            WinTier::Super
        } else if lower.contains("big") {
            WinTier::Big
        } else {
            WinTier::NoBurst
        }
    }

    pub fn level(&self) -> u8 {
        match self {
            WinTier::NoBurst => 0,
            WinTier::Big => 1,
            WinTier::Super => 2,
            WinTier::Mega => 3,
            WinTier::Ultra => 4,
            WinTier::Legendary => 5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WinTier::NoBurst => "No Burst",
            WinTier::Big => "Big Win",
            WinTier::Super => "Super Win",
            WinTier::Mega => "Mega Win",
            WinTier::Ultra => "Ultra Win",
            WinTier::Legendary => "Legendary Win",
        }
    }
}

impl fmt::Display for WinTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
