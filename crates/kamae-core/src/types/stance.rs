use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::KamaeError;

/// Stance toward a target entity.
///
/// Doubles as the label codec: `favor ↔ 0`, `neutral ↔ 1`, `against ↔ 2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stance {
    Favor,
    Neutral,
    Against,
}

impl Stance {
    /// Total number of distinct labels.
    pub const NUM_LABELS: usize = 3;

    /// All stances in label order.
    pub fn all() -> &'static [Stance] {
        &[Stance::Favor, Stance::Neutral, Stance::Against]
    }

    /// Integer label id used by the classifier head.
    pub fn label(self) -> usize {
        match self {
            Stance::Favor => 0,
            Stance::Neutral => 1,
            Stance::Against => 2,
        }
    }

    /// Stance for a label id.
    pub fn from_label(id: usize) -> Option<Self> {
        match id {
            0 => Some(Stance::Favor),
            1 => Some(Stance::Neutral),
            2 => Some(Stance::Against),
            _ => None,
        }
    }

    /// Canonical lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Stance::Favor => "favor",
            Stance::Neutral => "neutral",
            Stance::Against => "against",
        }
    }

    /// Parses an exact stance value; anything else yields `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "favor" => Some(Stance::Favor),
            "neutral" => Some(Stance::Neutral),
            "against" => Some(Stance::Against),
            _ => None,
        }
    }
}

impl FromStr for Stance {
    type Err = KamaeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stance::parse(s).ok_or_else(|| KamaeError::UnknownStance(s.to_string()))
    }
}

impl fmt::Display for Stance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_roundtrip() {
        for stance in Stance::all() {
            assert_eq!(Stance::from_label(stance.label()), Some(*stance));
        }
        assert_eq!(Stance::from_label(3), None);
    }

    #[test]
    fn fixed_codec_values() {
        assert_eq!(Stance::Favor.label(), 0);
        assert_eq!(Stance::Neutral.label(), 1);
        assert_eq!(Stance::Against.label(), 2);
    }

    #[test]
    fn string_roundtrip() {
        for stance in Stance::all() {
            let parsed: Stance = stance.to_string().parse().unwrap();
            assert_eq!(parsed, *stance);
        }
    }

    #[test]
    fn parse_is_exact() {
        assert_eq!(Stance::parse("Favor"), None);
        assert_eq!(Stance::parse("support"), None);
        assert_eq!(Stance::parse(""), None);
        assert!("pro".parse::<Stance>().is_err());
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&Stance::Against).unwrap();
        assert_eq!(json, "\"against\"");
        let back: Stance = serde_json::from_str("\"neutral\"").unwrap();
        assert_eq!(back, Stance::Neutral);
    }
}
