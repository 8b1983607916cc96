//! Estradiol pellet engine: a single multiplicative pass with no duration
//! effects, rounded up onto the 6.25 mg pellet grid.

use chrono::{Duration, NaiveDate};
use log::{debug, info};

use super::breakdown::{Advice, Advisories, Breakdown, BreakdownEntry, BreakdownStep, RunningDose, StageOutcome};
use super::final_dose::ceil_to_increment;
use crate::bmi::calculate_bmi;
use crate::config::{EngineConfig, EstradiolConfig};
use crate::error::DoseResult;
use crate::models::{
    AlternativeDose, ClinicalRecommendations, Cyp19a1Status, EstradiolDosageCalculation, EstradiolDosageParams,
    EstradiolDosageResult, MonitoringScheduleEntry,
};

const SHBG_LOW: f64 = 20.0;
const SHBG_HIGH: f64 = 80.0;
const BMI_OVERWEIGHT: f64 = 25.0;
const BMI_OBESE: f64 = 30.0;
const BMI_SEVERELY_OBESE: f64 = 35.0;
const AGE_LATE_MENOPAUSE: u32 = 56;
const AGE_ELDERLY: u32 = 66;

const PEAK_LABS_DAYS: i64 = 42;
const TROUGH_LABS_DAYS: i64 = 84;

fn apply_shbg(running: RunningDose, shbg_level: Option<f64>) -> StageOutcome {
    let step = BreakdownStep::ShbgModifier;
    let mut outcome = StageOutcome::new(running);

    match shbg_level {
        Some(level) if level < SHBG_LOW => outcome.adjust(
            step,
            "SHBG is less than 20",
            0.9,
            0,
            Advisories::default().with(Advice::Note, "Low SHBG - more free estradiol per mg delivered."),
        ),
        Some(level) if level >= SHBG_HIGH => outcome.adjust(
            step,
            "SHBG is 80 or greater",
            1.1,
            0,
            Advisories::default().with(Advice::Note, "High SHBG - more estradiol bound, less available."),
        ),
        _ => {}
    }

    outcome.or_unchanged(step, "SHBG within range or not provided")
}

fn apply_bmi(running: RunningDose, bmi: f64) -> StageOutcome {
    let step = BreakdownStep::BmiAromatizationModifier;
    let mut outcome = StageOutcome::new(running);

    let band = if bmi >= BMI_SEVERELY_OBESE {
        Some(("BMI is 35 or greater", 1.2))
    } else if bmi >= BMI_OBESE {
        Some(("BMI is between 30 and 34.9", 1.15))
    } else if bmi >= BMI_OVERWEIGHT {
        Some(("BMI is between 25 and 29.9", 1.1))
    } else {
        None
    };

    if let Some((condition, multiplier)) = band {
        outcome.adjust(step, condition, multiplier, 0, Advisories::default());
    }

    outcome.or_unchanged(step, "BMI is below 25")
}

fn apply_genetics(running: RunningDose, cyp19a1: Option<Cyp19a1Status>) -> StageOutcome {
    let step = BreakdownStep::GeneticModifier;
    let mut outcome = StageOutcome::new(running);

    match cyp19a1 {
        Some(Cyp19a1Status::HighExpression) => outcome.adjust(
            step,
            "CYP19A1 high expression",
            0.9,
            0,
            Advisories::default().with(Advice::Alert, "High aromatase expression - endogenous estradiol is higher."),
        ),
        Some(Cyp19a1Status::LowExpression) => outcome.adjust(
            step,
            "CYP19A1 low expression",
            1.1,
            0,
            Advisories::default().with(Advice::Alert, "Low aromatase expression - endogenous estradiol is lower."),
        ),
        _ => {}
    }

    outcome.or_unchanged(step, "No dose-relevant genetic findings")
}

fn apply_age(running: RunningDose, age: u32) -> StageOutcome {
    let step = BreakdownStep::AgeModifier;
    let mut outcome = StageOutcome::new(running);

    if age >= AGE_ELDERLY {
        outcome.adjust(step, "Age is 66 or greater", 1.1, 0, Advisories::default());
    } else if age >= AGE_LATE_MENOPAUSE {
        outcome.adjust(step, "Age is between 56 and 65", 1.05, 0, Advisories::default());
    }

    outcome.or_unchanged(step, "Age below 56")
}

fn pellet_configuration(pellet_count: u32, increment_mg: f64) -> String {
    format!("{} x {}mg", pellet_count, increment_mg)
}

fn alternative_doses(final_dose_mg: f64, increment_mg: f64) -> Vec<AlternativeDose> {
    let mut alternatives = Vec::new();
    let lower = final_dose_mg - increment_mg;
    if lower > 0.0 {
        alternatives.push(AlternativeDose {
            dose_mg: lower,
            pellet_count: (lower / increment_mg).round() as u32,
            rationale: "One pellet lower for patients sensitive to estradiol".to_string(),
        });
    }
    let higher = final_dose_mg + increment_mg;
    alternatives.push(AlternativeDose {
        dose_mg: higher,
        pellet_count: (higher / increment_mg).round() as u32,
        rationale: "One pellet higher if symptoms persist at trough".to_string(),
    });
    alternatives
}

fn monitoring_schedule(insertion_date: Option<NaiveDate>) -> Vec<MonitoringScheduleEntry> {
    let entry = |timepoint: &str, days: i64, tests: &str, purpose: &str| MonitoringScheduleEntry {
        timepoint: timepoint.to_string(),
        ideal_date: insertion_date.map(|date| date + Duration::days(days)),
        tests_required: tests.to_string(),
        purpose: purpose.to_string(),
        notes: None,
    };

    vec![
        entry("Baseline", 0, "Estradiol, FSH, lipid panel", "Establish pre-insertion reference values"),
        entry("Peak (6 weeks)", PEAK_LABS_DAYS, "Estradiol", "Confirm peak levels"),
        entry("Trough (12 weeks)", TROUGH_LABS_DAYS, "Estradiol, symptom review", "Assess duration and plan next insertion"),
    ]
}

pub struct EstradiolEngine {
    config: EstradiolConfig,
}

impl EstradiolEngine {
    pub fn new(config: &EngineConfig) -> DoseResult<Self> {
        config.validate()?;
        Ok(Self { config: config.estradiol.clone() })
    }

    pub fn calculate_dosage(&self, params: &EstradiolDosageParams) -> DoseResult<EstradiolDosageResult> {
        params.validate()?;

        let demographics = &params.patient_demographics;
        let increment = self.config.increment_mg;
        let bmi = calculate_bmi(demographics.weight_kg, demographics.height_cm);
        let coefficient = self.config.tier_coefficients.get(params.tier);

        info!(
            "Calculating estradiol dosage: {} kg, BMI {:.2}, age {}, {:?} tier",
            demographics.weight_kg, bmi, demographics.age, params.tier
        );

        let base_dose_mg = demographics.weight_kg * coefficient;
        let base = RunningDose::new(base_dose_mg, self.config.expected_duration_days);

        let mut breakdown = Breakdown::new();
        breakdown.record(BreakdownEntry::transition(
            BreakdownStep::BaseDose,
            format!("{} kg x {} mg/kg ({:?} tier)", demographics.weight_kg, coefficient, params.tier),
            RunningDose::new(0.0, self.config.expected_duration_days),
            1.0,
            base,
            Advisories::default(),
        ));

        let shbg = apply_shbg(base, params.clinical.shbg_level);
        let bmi_stage = apply_bmi(shbg.running, bmi);
        let genetic = apply_genetics(bmi_stage.running, params.genetic_data.cyp19a1);
        let age = apply_age(genetic.running, demographics.age);

        let (shbg_multiplier, bmi_multiplier, genetic_multiplier, age_multiplier) =
            (shbg.multiplier, bmi_stage.multiplier, genetic.multiplier, age.multiplier);
        let adjusted = age.running;
        for stage in [shbg, bmi_stage, genetic, age] {
            breakdown.extend(stage.entries);
        }

        let final_dose_mg = ceil_to_increment(adjusted.dose_mg, increment);
        let pellet_count = (final_dose_mg / increment).round() as u32;
        breakdown.record(BreakdownEntry::transition(
            BreakdownStep::FinalDose,
            format!("Final dose rounded up to {} mg pellet increment", increment),
            adjusted,
            1.0,
            RunningDose::new(final_dose_mg, adjusted.duration_days),
            Advisories::default(),
        ));

        debug!(
            "Estradiol adjusted dose {:.3} mg; final {} mg ({} pellets)",
            adjusted.dose_mg, final_dose_mg, pellet_count
        );

        let clinical_recommendations = ClinicalRecommendations {
            supplements: self.config.core_supplements.clone(),
            monitoring_schedules: monitoring_schedule(params.clinical.insertion_date),
            expected_duration_days: self.config.expected_duration_days,
            alerts: breakdown.collect(&[Advice::Alert]),
            warnings: breakdown.collect(&[Advice::Warning, Advice::Caution]),
            critical_alerts: breakdown.collect(&[Advice::CriticalAlert]),
            suggestions: breakdown.collect(&[Advice::Suggestion, Advice::Consideration]),
            recommendations: breakdown.collect(&[Advice::Recommendation]),
            contraindications: Vec::new(),
            holds: Vec::new(),
        };

        Ok(EstradiolDosageResult {
            tier: params.tier,
            dosing_calculation: EstradiolDosageCalculation {
                base_dose_mg,
                shbg_multiplier,
                bmi_multiplier,
                genetic_multiplier,
                age_multiplier,
                adjusted_dose_mg: adjusted.dose_mg,
                final_dose_mg,
                pellet_count,
                pellet_configuration: pellet_configuration(pellet_count, increment),
                alternative_doses: alternative_doses(final_dose_mg, increment),
                calculation_breakdown: breakdown.into_entries(),
            },
            clinical_recommendations,
        })
    }
}
