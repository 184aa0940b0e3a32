//! # Dataset Reshaper
//!
//! Unpivots the wide annotation table into one labeled record per
//! (text, entity) cell, marking the entity in each text.

use crate::dataset::filter::{DropStats, Verdict, check_stance};
use crate::dataset::wide::WideTable;
use crate::entity::{EntityCatalog, TextAnnotator};
use crate::error::{KamaeError, Result};
use crate::types::AnnotatedRecord;

/// Long-format records plus what was dropped on the way.
#[derive(Debug, Clone, Default)]
pub struct Reshaped {
    pub records: Vec<AnnotatedRecord>,
    pub drops: DropStats,
}

/// Converts a wide table into long-format [`AnnotatedRecord`]s.
///
/// Columns are unpivoted in catalog order, rows in table order within each
/// column. Missing and unrecognized stance cells are dropped and counted.
///
/// # Errors
///
/// Returns `KamaeError::MissingColumn` if the table lacks a catalog column.
pub fn reshape(
    table: &WideTable,
    catalog: &EntityCatalog,
    annotator: &TextAnnotator,
) -> Result<Reshaped> {
    let mapping = catalog.column_mapping();
    if let Some((column, _)) = mapping.iter().find(|(c, _)| !table.has_column(c)) {
        return Err(KamaeError::MissingColumn(column.to_string()));
    }

    let mut out = Reshaped::default();
    for (column, entity) in mapping {
        for row in table.rows() {
            let stance = match check_stance(row.cell(column)) {
                Verdict::Keep(stance) => stance,
                Verdict::Drop(reason) => {
                    out.drops.record(&reason);
                    continue;
                }
            };
            let marked = annotator.annotate(&row.text, entity)?;
            out.records
                .push(AnnotatedRecord::new(row.text.clone(), entity, marked, stance));
        }
    }

    if out.drops.unrecognized_stance > 0 {
        tracing::warn!(
            count = out.drops.unrecognized_stance,
            "dropped cells with unrecognized stance values"
        );
    }
    tracing::info!(
        rows = table.len(),
        records = out.records.len(),
        missing = out.drops.missing_stance,
        "reshaped wide table"
    );

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::wide::WideRow;
    use crate::entity::EntitySpec;
    use crate::types::Stance;

    fn two_entity_catalog() -> EntityCatalog {
        EntityCatalog::new(vec![
            EntitySpec::new("Brian Thompson", "stance_toward_brian", &["ceo"]),
            EntitySpec::new("United Healthcare", "stance_toward_united", &["uhc"]),
        ])
        .unwrap()
    }

    #[test]
    fn ceo_row_becomes_two_records() {
        let table = WideTable::from_rows(vec![
            WideRow::new("CEO was shot")
                .with_cell("stance_toward_brian", "against")
                .with_cell("stance_toward_united", "neutral"),
        ]);
        let out = reshape(&table, &two_entity_catalog(), &TextAnnotator::default()).unwrap();

        assert_eq!(out.records.len(), 2);
        let brian = &out.records[0];
        assert_eq!(brian.entity, "Brian Thompson");
        assert_eq!(brian.stance, Stance::Against);
        assert_eq!(brian.label, 2);
        assert_eq!(
            brian.text_with_entity,
            "<entity>Brian Thompson</entity> CEO was shot"
        );

        let united = &out.records[1];
        assert_eq!(united.entity, "United Healthcare");
        assert_eq!(united.stance, Stance::Neutral);
        assert_eq!(united.label, 1);
    }

    #[test]
    fn count_matches_valid_cells() {
        let table = WideTable::new(
            vec!["stance_toward_brian".into(), "stance_toward_united".into()],
            vec![
                WideRow::new("a")
                    .with_cell("stance_toward_brian", "favor")
                    .with_cell("stance_toward_united", "against"),
                WideRow::new("b").with_cell("stance_toward_brian", "maybe"),
                WideRow::new("c").with_cell("stance_toward_united", "neutral"),
                WideRow::new("d"),
            ],
        );
        let out = reshape(&table, &two_entity_catalog(), &TextAnnotator::default()).unwrap();

        assert_eq!(out.records.len(), 3);
        assert!(out.records.len() <= table.len() * 2);
        assert_eq!(out.drops.unrecognized_stance, 1);
        assert_eq!(out.drops.missing_stance, 4);
        assert!(out.records.iter().all(|r| r.label == r.stance.label()));
    }

    #[test]
    fn unpivot_is_column_major() {
        let table = WideTable::from_rows(vec![
            WideRow::new("first")
                .with_cell("stance_toward_brian", "favor")
                .with_cell("stance_toward_united", "favor"),
            WideRow::new("second")
                .with_cell("stance_toward_brian", "against")
                .with_cell("stance_toward_united", "against"),
        ]);
        let out = reshape(&table, &two_entity_catalog(), &TextAnnotator::default()).unwrap();

        let order: Vec<(&str, &str)> = out
            .records
            .iter()
            .map(|r| (r.text.as_str(), r.entity.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("first", "Brian Thompson"),
                ("second", "Brian Thompson"),
                ("first", "United Healthcare"),
                ("second", "United Healthcare"),
            ]
        );
    }

    #[test]
    fn missing_catalog_column_is_an_error() {
        let table = WideTable::from_rows(vec![
            WideRow::new("x").with_cell("stance_toward_brian", "favor"),
        ]);
        let result = reshape(&table, &two_entity_catalog(), &TextAnnotator::default());
        assert!(matches!(
            result,
            Err(KamaeError::MissingColumn(c)) if c == "stance_toward_united"
        ));
    }

    #[test]
    fn csv_text_is_kept_verbatim() {
        let csv = "text,stance_toward_brian,stance_toward_united\n\
                   \"  CEO was shot  \", against ,\n";
        let table = WideTable::from_csv_reader(csv.as_bytes()).unwrap();
        let out = reshape(&table, &two_entity_catalog(), &TextAnnotator::default()).unwrap();

        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].text, "  CEO was shot  ");
        assert_eq!(out.records[0].stance, Stance::Against);
        assert_eq!(out.drops.missing_stance, 1);
    }

    #[test]
    fn empty_table_yields_no_records() {
        let table = WideTable::new(
            vec!["stance_toward_brian".into(), "stance_toward_united".into()],
            vec![],
        );
        let out = reshape(&table, &two_entity_catalog(), &TextAnnotator::default()).unwrap();
        assert!(out.records.is_empty());
        assert_eq!(out.drops.total(), 0);
    }
}
