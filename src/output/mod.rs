use crate::dosing::{BreakdownEntry, TierSummary, ValidationReport};
use crate::error::DoseResult;
use crate::models::{EstradiolDosageResult, TestosteroneDosageResult};
use log::info;
use serde::Serialize;
use std::fs::File;
use std::path::Path;

pub fn save_testosterone_result<P: AsRef<Path>>(
    result: &TestosteroneDosageResult,
    validation: Option<&ValidationReport>,
    output_dir: P,
) -> DoseResult<()> {
    let output_path = output_dir.as_ref();

    save_json(result, output_path.join("dosage_result.json"))?;
    save_breakdown(&result.dosing_calculation.calculation_breakdown, output_path.join("breakdown.csv"))?;

    if let Some(report) = validation {
        save_json(report, output_path.join("validation.json"))?;
    }

    info!("Testosterone results saved to {:?}", output_path);
    Ok(())
}

pub fn save_estradiol_result<P: AsRef<Path>>(result: &EstradiolDosageResult, output_dir: P) -> DoseResult<()> {
    let output_path = output_dir.as_ref();

    save_json(result, output_path.join("dosage_result.json"))?;
    save_breakdown(&result.dosing_calculation.calculation_breakdown, output_path.join("breakdown.csv"))?;

    info!("Estradiol results saved to {:?}", output_path);
    Ok(())
}

/// Per-tier comparison, one JSON array ordered by tier.
pub fn save_tier_summary<P: AsRef<Path>>(summary: &[TierSummary], output_dir: P) -> DoseResult<()> {
    let path = output_dir.as_ref().join("tier_summary.json");
    save_json(&summary, &path)?;
    info!("Tier summary saved to {:?}", path);
    Ok(())
}

fn save_json<T: Serialize + ?Sized, P: AsRef<Path>>(value: &T, path: P) -> DoseResult<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, value)?;
    Ok(())
}

/// One row per breakdown entry; advisories are flattened to a count so the
/// sheet stays rectangular.
fn save_breakdown<P: AsRef<Path>>(entries: &[BreakdownEntry], path: P) -> DoseResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    write_breakdown(&mut writer, entries)?;
    Ok(())
}

fn write_breakdown<W: std::io::Write>(writer: &mut csv::Writer<W>, entries: &[BreakdownEntry]) -> DoseResult<()> {
    writer.write_record([
        "STEP",
        "CONDITION",
        "PREVIOUS_MG",
        "MULTIPLIER",
        "ADJUSTED_MG",
        "PREVIOUS_DAYS",
        "ADJUSTED_DAYS",
        "ADDITIONAL_DAYS",
        "ALERTS",
        "CRITICAL_ALERTS",
        "WARNINGS",
    ])?;

    for entry in entries {
        let step = serde_json::to_value(entry.step)?;
        writer.write_record(&[
            step.as_str().unwrap_or_default().to_string(),
            entry.condition.clone(),
            format!("{:.3}", entry.previous_value),
            format!("{:.4}", entry.multiplier),
            format!("{:.3}", entry.adjusted_value),
            entry.previous_duration_days.to_string(),
            entry.adjusted_duration_days.to_string(),
            entry.additional_duration_days.to_string(),
            entry.advisories.alerts.len().to_string(),
            entry.advisories.critical_alerts.len().to_string(),
            entry.advisories.warnings.len().to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
