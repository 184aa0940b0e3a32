use serde::{Deserialize, Serialize};

use super::stance::Stance;

/// Entity recorded for texts that mention none of the catalog entities.
pub const NO_ENTITY: &str = "None";

/// One labeled (text, entity) training example.
///
/// Produced by the dataset reshaper from one wide row and one entity column.
/// `label` is always `stance.label()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedRecord {
    /// Original text.
    pub text: String,

    /// Canonical entity the stance refers to.
    pub entity: String,

    /// Text with the entity mention wrapped in markers.
    pub text_with_entity: String,

    /// Annotated stance.
    pub stance: Stance,

    /// Integer label id of `stance`.
    pub label: usize,
}

impl AnnotatedRecord {
    /// Creates a record, deriving `label` from `stance`.
    #[must_use]
    pub fn new(
        text: impl Into<String>,
        entity: impl Into<String>,
        text_with_entity: impl Into<String>,
        stance: Stance,
    ) -> Self {
        Self {
            text: text.into(),
            entity: entity.into(),
            text_with_entity: text_with_entity.into(),
            stance,
            label: stance.label(),
        }
    }
}

/// One (text, detected entity) row of the zero-shot output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpandedRow {
    /// Input text, unmodified.
    pub original_text: String,

    /// Detected canonical entity, or [`NO_ENTITY`].
    pub entity: String,

    /// Marked text fed to the predictor.
    pub text_with_entity: String,

    /// Top-ranked stance once scored.
    pub predicted_stance: Option<Stance>,
}

impl ExpandedRow {
    /// Row for a detected entity.
    #[must_use]
    pub fn new(
        original_text: impl Into<String>,
        entity: impl Into<String>,
        text_with_entity: impl Into<String>,
    ) -> Self {
        Self {
            original_text: original_text.into(),
            entity: entity.into(),
            text_with_entity: text_with_entity.into(),
            predicted_stance: None,
        }
    }

    /// Passthrough row for a text without any detected entity.
    #[must_use]
    pub fn passthrough(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            text_with_entity: text.clone(),
            original_text: text,
            entity: NO_ENTITY.to_string(),
            predicted_stance: None,
        }
    }

    /// Returns `true` for the "None" passthrough row.
    #[must_use]
    pub fn is_passthrough(&self) -> bool {
        self.entity == NO_ENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_label_follows_stance() {
        let record = AnnotatedRecord::new("t", "Brian Thompson", "<entity>Brian Thompson</entity> t", Stance::Against);
        assert_eq!(record.label, 2);
    }

    #[test]
    fn passthrough_keeps_text() {
        let row = ExpandedRow::passthrough("nothing to see");
        assert!(row.is_passthrough());
        assert_eq!(row.entity, "None");
        assert_eq!(row.text_with_entity, row.original_text);
        assert!(row.predicted_stance.is_none());
    }

    #[test]
    fn detected_row_is_not_passthrough() {
        let row = ExpandedRow::new("a", "Luigi Mangione", "b");
        assert!(!row.is_passthrough());
    }
}
