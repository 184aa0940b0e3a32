//! Training data preparation: reshape, length filter, stratified split.

use kamae_core::dataset::{
    DropStats, LengthFilter, TokenCounter, WideTable, label_counts, reshape, stratified_split,
};
use kamae_core::{AnnotatedRecord, EntityCatalog, Stance, TextAnnotator};
use serde::Serialize;

use crate::config::TrainingConfig;

/// Train/validation records ready for fine-tuning.
#[derive(Debug, Clone, Default)]
pub struct PreparedDataset {
    pub train: Vec<AnnotatedRecord>,
    pub validation: Vec<AnnotatedRecord>,
    pub drops: DropStats,
}

/// Per-stance record counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LabelDistribution {
    pub favor: usize,
    pub neutral: usize,
    pub against: usize,
}

impl LabelDistribution {
    pub fn of(records: &[AnnotatedRecord]) -> Self {
        let [favor, neutral, against] = label_counts(records, |r| r.stance);
        Self {
            favor,
            neutral,
            against,
        }
    }

    pub fn get(&self, stance: Stance) -> usize {
        match stance {
            Stance::Favor => self.favor,
            Stance::Neutral => self.neutral,
            Stance::Against => self.against,
        }
    }
}

impl PreparedDataset {
    pub fn train_distribution(&self) -> LabelDistribution {
        LabelDistribution::of(&self.train)
    }

    pub fn validation_distribution(&self) -> LabelDistribution {
        LabelDistribution::of(&self.validation)
    }
}

/// Reshapes the wide table, drops over-long examples and splits the rest.
pub fn prepare_dataset<C: TokenCounter + ?Sized>(
    table: &WideTable,
    catalog: &EntityCatalog,
    annotator: &TextAnnotator,
    counter: &C,
    config: &TrainingConfig,
) -> anyhow::Result<PreparedDataset> {
    let reshaped = reshape(table, catalog, annotator)?;

    let filter = LengthFilter::new(counter, config.max_length);
    let mut length_drops = DropStats::default();
    let records = filter.apply(reshaped.records, &mut length_drops)?;
    if length_drops.too_many_tokens > 0 {
        tracing::warn!(
            count = length_drops.too_many_tokens,
            max_length = config.max_length,
            "dropped examples over the token budget"
        );
    }
    let mut drops = reshaped.drops;
    drops.merge(&length_drops);

    let split = stratified_split(records, config.test_size, config.seed, |r| r.stance)?;
    let prepared = PreparedDataset {
        train: split.train,
        validation: split.validation,
        drops,
    };

    for (name, dist) in [
        ("train", prepared.train_distribution()),
        ("validation", prepared.validation_distribution()),
    ] {
        tracing::info!(
            split = name,
            favor = dist.favor,
            neutral = dist.neutral,
            against = dist.against,
            "label distribution"
        );
    }

    Ok(prepared)
}

#[cfg(test)]
mod tests {
    use kamae_core::KamaeError;
    use kamae_core::dataset::WideRow;

    use super::*;

    struct WordCounter;

    impl TokenCounter for WordCounter {
        fn count_tokens(&self, text: &str) -> kamae_core::Result<usize> {
            Ok(text.split_whitespace().count() + 2)
        }
    }

    fn table(rows: usize) -> WideTable {
        let stances = ["favor", "neutral", "against"];
        WideTable::from_rows(
            (0..rows)
                .map(|i| {
                    WideRow::new(format!("thoughts on the ceo {i}"))
                        .with_cell("stance_toward_luigi", stances[i % 3])
                        .with_cell("stance_toward_brian", stances[(i + 1) % 3])
                        .with_cell("stance_toward_united", "")
                })
                .collect(),
        )
    }

    #[test]
    fn prepares_both_splits() {
        let prepared = prepare_dataset(
            &table(30),
            &EntityCatalog::default(),
            &TextAnnotator::default(),
            &WordCounter,
            &TrainingConfig::default(),
        )
        .unwrap();

        assert_eq!(prepared.train.len() + prepared.validation.len(), 60);
        assert_eq!(prepared.drops.missing_stance, 30);

        let validation = prepared.validation_distribution();
        for stance in Stance::all() {
            assert!(validation.get(*stance) >= 1);
        }
    }

    #[test]
    fn drop_counts_cover_reshape_and_length() {
        let stances = ["favor", "neutral", "against"];
        let long = "word ".repeat(20);
        let rows = (0..33)
            .map(|i| {
                let text = if i < 30 { format!("short post {i}") } else { long.clone() };
                WideRow::new(text)
                    .with_cell("stance_toward_luigi", stances[i % 3])
                    .with_cell("stance_toward_brian", "")
                    .with_cell("stance_toward_united", "")
            })
            .collect();
        let config = TrainingConfig::default().with_max_length(12);
        let prepared = prepare_dataset(
            &WideTable::from_rows(rows),
            &EntityCatalog::default(),
            &TextAnnotator::default(),
            &WordCounter,
            &config,
        )
        .unwrap();

        assert_eq!(prepared.train.len() + prepared.validation.len(), 30);
        assert_eq!(prepared.drops.missing_stance, 66);
        assert_eq!(prepared.drops.too_many_tokens, 3);
        assert_eq!(prepared.drops.total(), 69);
    }

    #[test]
    fn token_budget_is_applied() {
        let config = TrainingConfig::default().with_max_length(4);
        let err = prepare_dataset(
            &table(9),
            &EntityCatalog::default(),
            &TextAnnotator::default(),
            &WordCounter,
            &config,
        )
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<KamaeError>(),
            Some(KamaeError::EmptyDataset)
        ));
    }
}
