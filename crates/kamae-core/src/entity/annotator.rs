//! # Text Annotator
//!
//! Wraps the first mention of an entity in boundary markers so the stance
//! model knows which target a label refers to.

use regex::RegexBuilder;
use serde::{Deserialize, Serialize};

use crate::error::{KamaeError, Result};

/// Opening and closing boundary markers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Markers {
    pub open: String,
    pub close: String,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            open: "<entity>".to_string(),
            close: "</entity>".to_string(),
        }
    }
}

impl Markers {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }

    /// `open + entity + close`.
    pub fn wrap(&self, entity: &str) -> String {
        format!("{}{}{}", self.open, entity, self.close)
    }

    /// Bytes added by one marker pair.
    pub fn overhead(&self) -> usize {
        self.open.len() + self.close.len()
    }
}

/// Inserts exactly one marker pair per `(text, entity)`.
#[derive(Debug, Clone, Default)]
pub struct TextAnnotator {
    markers: Markers,
}

impl TextAnnotator {
    pub fn new(markers: Markers) -> Self {
        Self { markers }
    }

    pub fn markers(&self) -> &Markers {
        &self.markers
    }

    /// Marks the first case-insensitive occurrence of `entity` in `text`.
    ///
    /// The matched span is replaced by the entity as supplied, so casing in the
    /// output follows `entity`. Later occurrences stay unmarked. When `entity`
    /// does not occur, the marked entity is prepended followed by a space.
    ///
    /// # Errors
    ///
    /// Returns `KamaeError::EmptyEntity` for an empty entity name.
    ///
    /// # Examples
    /// ```
    /// use kamae_core::entity::TextAnnotator;
    ///
    /// let annotator = TextAnnotator::default();
    /// assert_eq!(
    ///     annotator.annotate("free luigi mangione", "Luigi Mangione").unwrap(),
    ///     "free <entity>Luigi Mangione</entity>"
    /// );
    /// assert_eq!(
    ///     annotator.annotate("CEO was shot", "Brian Thompson").unwrap(),
    ///     "<entity>Brian Thompson</entity> CEO was shot"
    /// );
    /// ```
    pub fn annotate(&self, text: &str, entity: &str) -> Result<String> {
        if entity.trim().is_empty() {
            return Err(KamaeError::EmptyEntity);
        }

        let pattern = RegexBuilder::new(&regex::escape(entity))
            .case_insensitive(true)
            .build()?;
        let marked = self.markers.wrap(entity);

        // Spliced by hand so `$` in entity names is never expanded.
        Ok(match pattern.find(text) {
            Some(m) => {
                let mut out = String::with_capacity(text.len() + self.markers.overhead());
                out.push_str(&text[..m.start()]);
                out.push_str(&marked);
                out.push_str(&text[m.end()..]);
                out
            }
            None => format!("{marked} {text}"),
        })
    }
}
