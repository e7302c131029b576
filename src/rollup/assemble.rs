//! Flattening per-animal output into the published document.

use crate::config::PipelineConfig;
use crate::rollup::types::{AggregationResult, AveragedFix, Metadata};
use crate::rollup::utility::round_to;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::info;

/// Merges per-animal results into one chronologically ordered feed,
/// stamped with the current time.
pub fn assemble(per_entity: Vec<Vec<AveragedFix>>, config: &PipelineConfig) -> AggregationResult {
    assemble_at(per_entity, config, Utc::now())
}

/// Same as [`assemble`] with an explicit generation time.
///
/// The sort is stable, so points sharing a timestamp keep the order in which
/// their animals were supplied. `total_animals` counts animals present in the
/// output, not in the input.
pub fn assemble_at(
    per_entity: Vec<Vec<AveragedFix>>,
    config: &PipelineConfig,
    generated_at: DateTime<Utc>,
) -> AggregationResult {
    let mut data: Vec<AveragedFix> = per_entity.into_iter().flatten().collect();
    data.sort_by_key(|fix| fix.timestamp);

    let total_animals = data
        .iter()
        .map(|fix| &fix.entity_id)
        .collect::<HashSet<_>>()
        .len();

    info!(total_animals, total_points = data.len(), "Assembled rolling averages");

    AggregationResult {
        metadata: Metadata {
            generated_at,
            rolling_window_days: config.window_size(),
            total_animals,
            total_points: data.len(),
            privacy_note: config.privacy_note().to_string(),
        },
        data,
    }
}

/// Percentage of raw points removed by averaging, one decimal place.
pub fn reduction_percent(original: usize, averaged: usize) -> f64 {
    if original == 0 {
        return 0.0;
    }
    round_to((1.0 - averaged as f64 / original as f64) * 100.0, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rollup::types::{DateRange, EntityId};
    use chrono::{NaiveDate, TimeZone};

    fn point(id: i64, ts: i64) -> AveragedFix {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        AveragedFix {
            entity_id: EntityId::Int(id),
            timestamp: Utc.timestamp_opt(ts, 0).unwrap(),
            latitude: -1.0,
            longitude: 1.0,
            days_used: 7,
            original_points: 7,
            date_range: DateRange {
                start: date,
                end: date,
            },
        }
    }

    #[test]
    fn test_empty_result_is_well_formed() {
        let result = assemble(Vec::new(), &PipelineConfig::default());

        assert!(result.data.is_empty());
        assert_eq!(result.metadata.total_points, 0);
        assert_eq!(result.metadata.total_animals, 0);
        assert_eq!(result.metadata.rolling_window_days, 7);
    }

    #[test]
    fn test_interleaves_animals_chronologically() {
        let per_entity = vec![
            vec![point(1, 100), point(1, 300)],
            vec![point(2, 200), point(2, 400)],
            vec![],
        ];
        let result = assemble(per_entity, &PipelineConfig::default());

        let order: Vec<(i64, i64)> = result
            .data
            .iter()
            .map(|p| match p.entity_id {
                EntityId::Int(id) => (id, p.timestamp.timestamp()),
                EntityId::Text(_) => unreachable!(),
            })
            .collect();
        assert_eq!(order, vec![(1, 100), (2, 200), (1, 300), (2, 400)]);
        assert_eq!(result.metadata.total_animals, 2);
        assert_eq!(result.metadata.total_points, 4);
    }

    #[test]
    fn test_ties_keep_supply_order_and_resort_is_noop() {
        let per_entity = vec![vec![point(5, 100)], vec![point(3, 100)]];
        let result = assemble(per_entity, &PipelineConfig::default());

        assert_eq!(result.data[0].entity_id, EntityId::Int(5));
        assert_eq!(result.data[1].entity_id, EntityId::Int(3));

        let mut resorted = result.data.clone();
        resorted.sort_by_key(|p| p.timestamp);
        assert_eq!(resorted, result.data);
    }

    #[test]
    fn test_metadata_uses_config() {
        let config = PipelineConfig::new(3, "coarse".to_string()).unwrap();
        let at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let result = assemble_at(vec![vec![point(1, 1)]], &config, at);

        assert_eq!(result.metadata.generated_at, at);
        assert_eq!(result.metadata.rolling_window_days, 3);
        assert_eq!(result.metadata.privacy_note, "coarse");
    }

    #[test]
    fn test_document_shape() {
        let at = Utc.timestamp_opt(0, 0).unwrap();
        let result = assemble_at(vec![vec![point(1, 1)]], &PipelineConfig::default(), at);
        let value = serde_json::to_value(&result).unwrap();

        assert_eq!(value["metadata"]["total_points"], 1);
        assert_eq!(value["metadata"]["total_animals"], 1);
        assert_eq!(value["metadata"]["rolling_window_days"], 7);
        assert!(value["metadata"]["privacy_note"].is_string());
        assert_eq!(value["metadata"]["generated_at"], "1970-01-01T00:00:00Z");
        assert_eq!(value["data"][0]["entityId"], 1);
    }

    #[test]
    fn test_reduction_percent() {
        assert_eq!(reduction_percent(100, 40), 60.0);
        assert_eq!(reduction_percent(100, 100), 0.0);
        assert_eq!(reduction_percent(3, 1), 66.7);
        assert_eq!(reduction_percent(0, 0), 0.0);
    }
}
