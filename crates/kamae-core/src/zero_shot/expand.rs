//! Text × detected-entity expansion for the zero-shot path.

use crate::entity::{EntityResolver, TextAnnotator};
use crate::error::Result;
use crate::types::ExpandedRow;

/// Expands one text into one row per detected entity.
///
/// Each row is marked independently for its own entity. A text without any
/// detected entity yields a single passthrough row.
pub fn expand_text(
    text: &str,
    resolver: &EntityResolver,
    annotator: &TextAnnotator,
) -> Result<Vec<ExpandedRow>> {
    let entities = resolver.resolve(text);
    if entities.is_empty() {
        return Ok(vec![ExpandedRow::passthrough(text)]);
    }

    entities
        .into_iter()
        .map(|entity| {
            let marked = annotator.annotate(text, &entity)?;
            Ok(ExpandedRow::new(text, entity, marked))
        })
        .collect()
}

/// Expands every text; no input text is ever dropped.
pub fn expand_texts<S: AsRef<str>>(
    texts: &[S],
    resolver: &EntityResolver,
    annotator: &TextAnnotator,
) -> Result<Vec<ExpandedRow>> {
    let mut rows = Vec::with_capacity(texts.len());
    for text in texts {
        rows.extend(expand_text(text.as_ref(), resolver, annotator)?);
    }

    let passthrough = rows.iter().filter(|r| r.is_passthrough()).count();
    tracing::info!(
        texts = texts.len(),
        rows = rows.len(),
        passthrough,
        "expanded texts by detected entity"
    );

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityCatalog;

    fn resolver() -> EntityResolver {
        EntityResolver::from_catalog(&EntityCatalog::default()).unwrap()
    }

    #[test]
    fn multi_entity_text_gets_one_row_per_entity() {
        let annotator = TextAnnotator::default();
        let rows = expand_text("The insurance CEO is awful", &resolver(), &annotator).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].entity, "Brian Thompson");
        assert_eq!(
            rows[0].text_with_entity,
            "<entity>Brian Thompson</entity> The insurance CEO is awful"
        );
        assert_eq!(rows[1].entity, "United Healthcare");
        assert_eq!(
            rows[1].text_with_entity,
            "<entity>United Healthcare</entity> The insurance CEO is awful"
        );
        assert!(rows.iter().all(|r| r.original_text == "The insurance CEO is awful"));
    }

    #[test]
    fn literal_mention_is_marked_in_place() {
        let annotator = TextAnnotator::default();
        let rows = expand_text("luigi mangione is a hero", &resolver(), &annotator).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].text_with_entity,
            "<entity>Luigi Mangione</entity> is a hero"
        );
    }

    #[test]
    fn unmatched_text_passes_through() {
        let annotator = TextAnnotator::default();
        let rows = expand_text("nice weather today", &resolver(), &annotator).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].entity, "None");
        assert_eq!(rows[0].text_with_entity, rows[0].original_text);
    }

    #[test]
    fn expand_texts_keeps_every_input() {
        let annotator = TextAnnotator::default();
        let texts = ["nothing here", "uhc again", "mangione and thompson"];
        let rows = expand_texts(&texts, &resolver(), &annotator).unwrap();

        assert_eq!(rows.len(), 4);
        for text in texts {
            assert!(rows.iter().any(|r| r.original_text == text));
        }
    }
}
