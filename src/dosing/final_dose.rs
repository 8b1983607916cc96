use super::breakdown::{Advice, Advisories, BreakdownEntry, BreakdownStep, RunningDose};
use crate::config::ProtocolConfig;
use crate::models::BiologicalSex;

/// Tolerance for float noise when a dose already sits on a grid line.
const GRID_TOLERANCE: f64 = 1e-9;

/// Snap onto a pellet grid: remainders below half a unit round down, the
/// rest round up.
pub fn snap_to_grid(dose_mg: f64, unit_mg: f64) -> f64 {
    let remainder = dose_mg % unit_mg;
    if remainder < unit_mg / 2.0 {
        (dose_mg / unit_mg).floor() * unit_mg
    } else {
        (dose_mg / unit_mg).ceil() * unit_mg
    }
}

pub fn round_to_increment(dose_mg: f64, increment_mg: f64) -> f64 {
    (dose_mg / increment_mg).round() * increment_mg
}

pub fn ceil_to_increment(dose_mg: f64, increment_mg: f64) -> f64 {
    (dose_mg / increment_mg - GRID_TOLERANCE).ceil() * increment_mg
}

#[derive(Debug, Clone)]
pub struct FinalDose {
    pub preliminary_dose_mg: f64,
    pub final_dose_mg: f64,
    pub pellet_count: f64,
    pub duration_days: i32,
    pub entry: BreakdownEntry,
}

pub fn calculate_final_dose(protocol: &ProtocolConfig, running: RunningDose, sex: BiologicalSex) -> FinalDose {
    let unit = protocol.pellet_unit_mg;
    let mut advisories = Advisories::default();

    let (preliminary_dose_mg, duration_days, condition) = if protocol.is_t100() {
        let duration_days = running.duration_days.max(protocol.duration_floor_days);
        if duration_days < protocol.short_duration_threshold_days {
            advisories.push(Advice::CriticalAlert, "Expected duration is VERY short (<2.5 months)");
            advisories.push(Advice::StrongRecommendation, "Consider T200 protocol instead");
        }

        match sex {
            BiologicalSex::Female => (
                round_to_increment(running.dose_mg, protocol.female_rounding_mg),
                duration_days,
                format!("Final dose rounded to nearest {} mg", protocol.female_rounding_mg),
            ),
            BiologicalSex::Male => (
                snap_to_grid(running.dose_mg, unit),
                duration_days,
                format!("Final dose snapped to {} mg pellet grid", unit),
            ),
        }
    } else {
        (
            snap_to_grid(running.dose_mg, unit),
            running.duration_days,
            format!("Final dose snapped to {} mg pellet grid", unit),
        )
    };

    let final_dose_mg = preliminary_dose_mg.min(protocol.max_dose_mg);
    if final_dose_mg < preliminary_dose_mg {
        advisories.push(
            Advice::Warning,
            format!("Dose capped at protocol maximum of {} mg", protocol.max_dose_mg),
        );
    }

    let after = RunningDose::new(final_dose_mg, duration_days);
    let entry = BreakdownEntry::transition(BreakdownStep::FinalDose, condition, running, 1.0, after, advisories);

    FinalDose {
        preliminary_dose_mg,
        final_dose_mg,
        pellet_count: final_dose_mg / unit,
        duration_days,
        entry,
    }
}
