use serde::Serialize;

use crate::types::Stance;

/// Candidate hypotheses for one entity, one per stance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hypotheses {
    pub favor: String,
    pub against: String,
    pub neutral: String,
}

impl Hypotheses {
    /// Builds the three statements for `entity`.
    ///
    /// # Examples
    /// ```
    /// use kamae_core::zero_shot::Hypotheses;
    ///
    /// let h = Hypotheses::for_entity("Brian Thompson");
    /// assert_eq!(h.favor, "Brian Thompson is good.");
    /// assert_eq!(h.against, "Brian Thompson is bad.");
    /// assert_eq!(h.neutral, "Brian Thompson exists.");
    /// ```
    pub fn for_entity(entity: &str) -> Self {
        Self {
            favor: format!("{entity} is good."),
            against: format!("{entity} is bad."),
            neutral: format!("{entity} exists."),
        }
    }

    /// Candidates in scoring order: favor, against, neutral.
    pub fn candidates(&self) -> [(Stance, &str); 3] {
        [
            (Stance::Favor, self.favor.as_str()),
            (Stance::Against, self.against.as_str()),
            (Stance::Neutral, self.neutral.as_str()),
        ]
    }
}
