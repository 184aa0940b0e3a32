//! End-to-end runs of both stance paths with stand-in models.

use kamae_core::dataset::{DEFAULT_SEED, WideRow, label_counts};
use kamae_core::zero_shot::{EntailmentScorer, HypothesisGroup, expand_texts};
use kamae_core::{
    EntityCatalog, EntityResolver, KamaeError, LengthFilter, Stance, TextAnnotator,
    TokenCounter, WideTable, ZeroShotRunner, reshape, stratified_split,
};

struct WordCounter;

impl TokenCounter for WordCounter {
    fn count_tokens(&self, text: &str) -> kamae_core::Result<usize> {
        Ok(text.split_whitespace().count() + 2)
    }
}

/// Prefers the hypothesis whose polarity word appears in the premise.
struct CueScorer;

impl EntailmentScorer for CueScorer {
    fn score_batch(&self, groups: &[HypothesisGroup<'_>]) -> kamae_core::Result<Vec<Vec<f32>>> {
        Ok(groups
            .iter()
            .map(|g| {
                let premise = g.premise.to_lowercase();
                g.hypotheses
                    .iter()
                    .map(|h| match () {
                        _ if h.ends_with("is good.") && premise.contains("hero") => 0.8,
                        _ if h.ends_with("is bad.") && premise.contains("awful") => 0.8,
                        _ if h.ends_with("exists.") => 0.3,
                        _ => 0.1,
                    })
                    .collect()
            })
            .collect())
    }
}

#[test]
fn wide_row_becomes_one_record_per_labelled_entity() {
    let table = WideTable::from_rows(vec![
        WideRow::new("CEO was shot")
            .with_cell("stance_toward_brian", "against")
            .with_cell("stance_toward_united", "neutral")
            .with_cell("stance_toward_luigi", ""),
    ]);
    let catalog = EntityCatalog::default();

    let reshaped = reshape(&table, &catalog, &TextAnnotator::default()).unwrap();

    let pairs: Vec<(&str, Stance, usize)> = reshaped
        .records
        .iter()
        .map(|r| (r.entity.as_str(), r.stance, r.label))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("Brian Thompson", Stance::Against, 2),
            ("United Healthcare", Stance::Neutral, 1),
        ]
    );
    assert_eq!(reshaped.drops.missing_stance, 1);
}

#[test]
fn fine_tune_preparation_filters_and_splits() {
    let mut rows = Vec::new();
    for i in 0..20 {
        let stance = ["favor", "neutral", "against"][i % 3];
        rows.push(
            WideRow::new(format!("post number {i} about the ceo"))
                .with_cell("stance_toward_luigi", stance)
                .with_cell("stance_toward_brian", "maybe")
                .with_cell("stance_toward_united", ""),
        );
    }
    rows.push(
        WideRow::new("far too many words in this one to fit the tiny budget at all")
            .with_cell("stance_toward_luigi", "favor")
            .with_cell("stance_toward_brian", "")
            .with_cell("stance_toward_united", ""),
    );
    let table = WideTable::from_rows(rows);

    let mut reshaped =
        reshape(&table, &EntityCatalog::default(), &TextAnnotator::default()).unwrap();
    assert_eq!(reshaped.records.len(), 21);
    assert_eq!(reshaped.drops.unrecognized_stance, 20);

    let filter = LengthFilter::new(&WordCounter, 12);
    let kept = filter.apply(reshaped.records, &mut reshaped.drops).unwrap();
    assert_eq!(kept.len(), 20);
    assert_eq!(reshaped.drops.too_many_tokens, 1);

    let split = stratified_split(kept, 0.15, DEFAULT_SEED, |r| r.stance).unwrap();
    assert_eq!(split.train.len() + split.validation.len(), 20);
    for count in label_counts(&split.validation, |r| r.stance) {
        assert!(count >= 1);
    }
}

#[test]
fn zero_shot_scores_every_detected_entity() {
    let resolver = EntityResolver::from_catalog(&EntityCatalog::default()).unwrap();
    let annotator = TextAnnotator::default();
    let texts = [
        "The insurance CEO is awful",
        "Mangione is a hero to some",
        "Lovely weather",
    ];

    let rows = expand_texts(&texts, &resolver, &annotator).unwrap();
    let rows = ZeroShotRunner::new(CueScorer)
        .with_batch_size(2)
        .predict(rows)
        .unwrap();

    let summary: Vec<(&str, Option<Stance>)> = rows
        .iter()
        .map(|r| (r.entity.as_str(), r.predicted_stance))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("Brian Thompson", Some(Stance::Against)),
            ("United Healthcare", Some(Stance::Against)),
            ("Luigi Mangione", Some(Stance::Favor)),
            ("None", None),
        ]
    );
    assert_eq!(
        rows[2].text_with_entity,
        "<entity>Luigi Mangione</entity> Mangione is a hero to some"
    );
}

#[test]
fn scorer_errors_surface_to_the_caller() {
    struct Broken;
    impl EntailmentScorer for Broken {
        fn score_batch(&self, groups: &[HypothesisGroup<'_>]) -> kamae_core::Result<Vec<Vec<f32>>> {
            Ok(vec![vec![0.5; 3]; groups.len().saturating_sub(1)])
        }
    }

    let resolver = EntityResolver::from_catalog(&EntityCatalog::default()).unwrap();
    let rows = expand_texts(&["uhc"], &resolver, &TextAnnotator::default()).unwrap();
    assert!(matches!(
        ZeroShotRunner::new(Broken).predict(rows),
        Err(KamaeError::InferenceError(_))
    ));
}
