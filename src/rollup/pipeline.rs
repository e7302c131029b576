use crate::config::PipelineConfig;
use crate::rollup::assemble::{assemble, reduction_percent};
use crate::rollup::group::group;
use crate::rollup::types::{AggregationResult, AveragedFix, RawFix, RunSummary};
use crate::rollup::window::aggregate;
use tracing::info;

/// Published document plus the counts that describe how it was derived.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub result: AggregationResult,
    pub summary: RunSummary,
}

/// Runs filter, per-animal rolling average and assembly over a full dataset.
///
/// Animals are independent, so each timeline is reduced on its own and the
/// final ordering comes only from the sort in assembly.
pub fn run(fixes: Vec<RawFix>, config: &PipelineConfig) -> PipelineOutput {
    let grouped = group(fixes);
    let report = grouped.report;

    let per_entity: Vec<Vec<AveragedFix>> = grouped
        .timelines
        .into_values()
        .map(|timeline| aggregate(timeline, config.window_size()))
        .collect();

    let result = assemble(per_entity, config);

    let summary = RunSummary {
        generated_at: result.metadata.generated_at,
        total_original_points: report.total,
        valid_points: report.valid(),
        discarded_points: report.discarded,
        total_averaged_points: result.metadata.total_points,
        total_animals: result.metadata.total_animals,
        reduction_percent: reduction_percent(report.total, result.metadata.total_points),
    };

    info!(
        original = summary.total_original_points,
        averaged = summary.total_averaged_points,
        reduction_percent = summary.reduction_percent,
        "Rolling average run complete"
    );

    PipelineOutput { result, summary }
}
