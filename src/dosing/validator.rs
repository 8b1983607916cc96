//! Post-hoc audit of a T100 male result.
//!
//! Every check re-derives its expectation from the result's headline numbers
//! and the caller's params, never from the breakdown, and uses its own
//! constants rather than the engine configuration.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::models::{
    Cyp3a4Status, SmokingStatus, TestosteroneDosageParams, TestosteroneDosageResult, Ugt2b17Status,
};

const T100_MULTIPLIER: f64 = 0.6;
const T100_MAX_DOSE_MG: f64 = 1700.0;
const T100_PELLET_MG: f64 = 100.0;
const PSA_REQUIRED_OVER_AGE: u32 = 40;
const PSA_CONTRAINDICATION: f64 = 4.0;
const HEMATOCRIT_CONTRAINDICATION: f64 = 52.0;
const VERY_SHORT_DURATION_DAYS: i32 = 60;
const SHORT_DURATION_DAYS: i32 = 75;
const MAX_COMBINED_MULTIPLIER: f64 = 1.5;
const TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    fn new(errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self { valid: errors.is_empty(), errors, warnings }
    }
}

/// UGT2B17 deletion counts here, unlike in the protocol recommendation.
fn fast_clearance_count(params: &TestosteroneDosageParams) -> usize {
    let genetics = &params.genetic_data;
    [
        genetics.cyp3a4 == Some(Cyp3a4Status::Fast),
        matches!(genetics.ugt2b17, Some(Ugt2b17Status::Fast | Ugt2b17Status::Deletion)),
        params.medications.adhd_stimulants,
        params.lifestyle_factors.smoking_status == SmokingStatus::Current,
    ]
    .into_iter()
    .filter(|present| *present)
    .count()
}

pub fn validate_t100_male_calculation(
    result: &TestosteroneDosageResult,
    params: &TestosteroneDosageParams,
) -> ValidationReport {
    let calc = &result.dosing_calculation;
    let clinical = &params.clinical;
    let demographics = &params.patient_demographics;
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if !demographics.is_male() {
        errors.push("T100 Male protocol used for non-male patient.".to_string());
    }

    if calc.t100_multiplier.is_some_and(|m| (m - T100_MULTIPLIER).abs() > TOLERANCE) {
        errors.push("T100 multiplier of 0.6 not applied to base dose.".to_string());
    }

    if calc.final_dose_mg > T100_MAX_DOSE_MG {
        errors.push(format!(
            "Dose {}mg exceeds T100 maximum of {}mg.",
            calc.final_dose_mg, T100_MAX_DOSE_MG
        ));
    }

    let remainder = calc.final_dose_mg % T100_PELLET_MG;
    if remainder > TOLERANCE && T100_PELLET_MG - remainder > TOLERANCE {
        errors.push(format!("Final dose {}mg not rounded to nearest 100mg.", calc.final_dose_mg));
    }

    if demographics.age > PSA_REQUIRED_OVER_AGE && clinical.current_psa.is_none() {
        errors.push("PSA level not provided for patient over 40 years of age.".to_string());
    }

    if clinical.current_psa.is_some_and(|psa| psa > PSA_CONTRAINDICATION) {
        errors.push("PSA >4.0 is contraindication - urological clearance required".to_string());
    }

    if clinical.hematocrit.is_some_and(|hct| hct > HEMATOCRIT_CONTRAINDICATION) {
        errors.push("Hematocrit >52% is contraindication to testosterone replacement therapy.".to_string());
    }

    let expected_duration = result
        .duration_prediction
        .as_ref()
        .map(|prediction| prediction.final_expected_duration_days)
        .unwrap_or(result.clinical_recommendations.expected_duration_days);

    if expected_duration < VERY_SHORT_DURATION_DAYS {
        warnings.push("Final expected duration <2 months - T200 protocol strongly recommended.".to_string());
    }
    if expected_duration < SHORT_DURATION_DAYS {
        warnings.push("Final expected duration <2.5 months - consider T200 protocol.".to_string());
    }

    let expected_pellets = calc.final_dose_mg / T100_PELLET_MG;
    if (expected_pellets - calc.pellet_count).abs() > TOLERANCE {
        errors.push(format!(
            "Pellet count mismatch: {} vs expected {}.",
            calc.pellet_count, expected_pellets
        ));
    }

    if fast_clearance_count(params) >= 2 {
        warnings.push("Multiple fast-clearance factors present - T200 protocol recommended.".to_string());
    }

    let combined = calc.combined_multiplier();
    if combined > MAX_COMBINED_MULTIPLIER {
        warnings.push(format!("Very high total multiplier ({:.2}) - verify calculations.", combined));
    }

    if params.protocol_selection.t100_indication.as_deref().map_or(true, str::is_empty) {
        warnings.push("T100 selected without documented clinical indication. T200 is standard for males.".to_string());
    }

    debug!("Validation: {} errors, {} warnings", errors.len(), warnings.len());
    ValidationReport::new(errors, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::dosing::protocol::{recommend_pellet_protocol_for_male, RecommendationStrength};
    use crate::dosing::testosterone::TestosteroneEngine;
    use crate::models::{
        BiologicalSex, ClinicalParams, DosageTier, GeneticData, LifestyleFactors, Medications, PatientDemographics,
        PelletType, ProtocolSelection,
    };
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rand_distr::{Distribution, Normal};

    fn params() -> TestosteroneDosageParams {
        TestosteroneDosageParams {
            patient_demographics: PatientDemographics {
                weight_kg: 80.0,
                height_cm: 175.0,
                age: 35,
                biological_sex: BiologicalSex::Male,
            },
            clinical: ClinicalParams::default(),
            lifestyle_factors: LifestyleFactors::default(),
            medications: Medications::default(),
            genetic_data: GeneticData::default(),
            tier: DosageTier::Standard,
            protocol_selection: ProtocolSelection {
                pellet_type: PelletType::T100,
                t100_indication: Some("first_time_pellet_trial".to_string()),
            },
        }
    }

    fn run(params: &TestosteroneDosageParams) -> ValidationReport {
        let engine = TestosteroneEngine::new(EngineConfig::default()).unwrap();
        let result = engine.calculate_t100_dosage(params).unwrap();
        validate_t100_male_calculation(&result, params)
    }

    #[test]
    fn test_standard_male_validates_cleanly() {
        let p = params();
        let engine = TestosteroneEngine::new(EngineConfig::default()).unwrap();
        let result = engine.calculate_t100_dosage(&p).unwrap();
        let calc = &result.dosing_calculation;
        assert!(calc.final_dose_mg > 0.0 && calc.final_dose_mg <= 1700.0);
        assert_eq!(calc.final_dose_mg % 100.0, 0.0);
        assert_eq!(calc.pellet_count, calc.final_dose_mg / 100.0);

        let report = validate_t100_male_calculation(&result, &p);
        assert!(report.valid, "{:?}", report.errors);
        assert!(!report
            .warnings
            .iter()
            .any(|w| w.contains("without documented clinical indication")));
    }

    #[test]
    fn test_female_patient_is_an_error() {
        let mut p = params();
        p.patient_demographics.biological_sex = BiologicalSex::Female;
        let report = run(&p);
        assert!(!report.valid);
        assert!(report.errors.contains(&"T100 Male protocol used for non-male patient.".to_string()));
    }

    #[test]
    fn test_psa_contraindication_is_an_error() {
        let mut p = params();
        p.clinical.current_psa = Some(4.5);
        let report = run(&p);
        assert!(!report.valid);
        assert!(report
            .errors
            .contains(&"PSA >4.0 is contraindication - urological clearance required".to_string()));
    }

    #[test]
    fn test_missing_psa_over_forty() {
        let mut p = params();
        p.patient_demographics.age = 41;
        assert!(run(&p)
            .errors
            .contains(&"PSA level not provided for patient over 40 years of age.".to_string()));

        p.patient_demographics.age = 40;
        assert!(run(&p).valid);
    }

    #[test]
    fn test_hematocrit_over_limit() {
        let mut p = params();
        p.clinical.hematocrit = Some(53.0);
        let report = run(&p);
        assert_eq!(
            report.errors,
            vec!["Hematocrit >52% is contraindication to testosterone replacement therapy.".to_string()]
        );
    }

    #[test]
    fn test_four_fast_clearance_factors() {
        let mut p = params();
        p.genetic_data.cyp3a4 = Some(Cyp3a4Status::Fast);
        p.genetic_data.ugt2b17 = Some(Ugt2b17Status::Fast);
        p.medications.adhd_stimulants = true;
        p.lifestyle_factors.smoking_status = SmokingStatus::Current;

        let report = run(&p);
        assert!(report
            .warnings
            .contains(&"Multiple fast-clearance factors present - T200 protocol recommended.".to_string()));
        // Dual fast pins the duration at 70 days.
        assert!(report.warnings.iter().any(|w| w.starts_with("Final expected duration <2.5 months")));
        assert!(!report.warnings.iter().any(|w| w.starts_with("Final expected duration <2 months")));

        let recommendation = recommend_pellet_protocol_for_male(
            &p.lifestyle_factors,
            &p.medications,
            &p.genetic_data,
            &p.protocol_selection,
        );
        assert_eq!(recommendation.protocol, PelletType::T200);
        assert_eq!(recommendation.strength.label(), "strongly recommended");
        assert_eq!(recommendation.strength, RecommendationStrength::StronglyRecommended);
    }

    #[test]
    fn test_missing_indication_warns() {
        let mut p = params();
        p.protocol_selection.t100_indication = None;
        let report = run(&p);
        assert!(report.valid);
        assert_eq!(
            report.warnings,
            vec!["T100 selected without documented clinical indication. T200 is standard for males.".to_string()]
        );
    }

    #[test]
    fn test_tampered_result_is_caught() {
        let p = params();
        let engine = TestosteroneEngine::new(EngineConfig::default()).unwrap();
        let mut result = engine.calculate_t100_dosage(&p).unwrap();
        result.dosing_calculation.calculation_breakdown.clear();
        result.dosing_calculation.final_dose_mg = 1850.0;
        result.dosing_calculation.t100_multiplier = Some(1.0);

        let report = validate_t100_male_calculation(&result, &p);
        assert_eq!(report.errors.len(), 4);
        assert!(report.errors[0].starts_with("T100 multiplier"));
        assert!(report.errors[1].contains("exceeds T100 maximum"));
        assert!(report.errors[2].contains("not rounded to nearest 100mg"));
        assert!(report.errors[3].starts_with("Pellet count mismatch"));
    }

    #[test]
    fn test_random_eligible_males_validate_without_errors() {
        let engine = TestosteroneEngine::new(EngineConfig::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(2024);
        let weight = Normal::<f64>::new(90.0, 25.0).unwrap();

        for _ in 0..300 {
            let mut p = params();
            p.patient_demographics.weight_kg = weight.sample(&mut rng).clamp(45.0, 220.0);
            p.patient_demographics.height_cm = rng.gen_range(155.0..205.0);
            p.patient_demographics.age = rng.gen_range(18..80);
            p.tier = DosageTier::ALL[rng.gen_range(0..4)];
            p.clinical.shbg_level = Some(rng.gen_range(10.0..90.0));
            p.clinical.hematocrit = Some(rng.gen_range(38.0..52.0));
            if p.patient_demographics.age > 40 || rng.gen_bool(0.5) {
                p.clinical.current_psa = Some(rng.gen_range(0.2..4.0));
            }
            p.medications.opioids = rng.gen_bool(0.3);
            p.medications.adhd_stimulants = rng.gen_bool(0.3);
            if rng.gen_bool(0.3) {
                p.genetic_data.cyp3a4 = Some(Cyp3a4Status::Fast);
            }
            if rng.gen_bool(0.3) {
                p.genetic_data.ugt2b17 = Some(Ugt2b17Status::Fast);
            }

            let result = engine.calculate_t100_dosage(&p).unwrap();
            let report = validate_t100_male_calculation(&result, &p);
            assert!(report.valid, "{:?} for {:?}", report.errors, p.patient_demographics);
        }
    }
}
