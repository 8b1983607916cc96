//! Testosterone pellet engine for the T100 and T200 protocols.
//!
//! Both protocols share every modifier stage; they differ only in the
//! [`ProtocolConfig`] handed to each stage.

use chrono::{Duration, NaiveDate};
use log::{debug, info};

use super::breakdown::{Advice, Advisories, Breakdown, BreakdownEntry, BreakdownStep, RunningDose};
use super::final_dose::{calculate_final_dose, ceil_to_increment, snap_to_grid};
use super::modifiers;
use super::protocol::recommend_pellet_protocol_for_male;
use super::regimen::{build_monitoring_schedule, build_supplements};
use crate::bmi::calculate_bmi;
use crate::config::{EngineConfig, ProtocolConfig};
use crate::error::DoseResult;
use crate::models::{
    ClinicalRecommendations, DosageCalculation, DurationPrediction, FollowUpSchedule, PelletType,
    ProstateMonitoring, ProtocolComparison, TestosteroneDosageParams, TestosteroneDosageResult,
};

const PSA_VELOCITY_REFERRAL: f64 = 0.75;

/// The four named multipliers reported on a result.
#[derive(Debug, Clone, Copy)]
struct NamedMultipliers {
    shbg: f64,
    bmi: f64,
    medication: f64,
    genetic: f64,
}

impl NamedMultipliers {
    fn product(&self) -> f64 {
        self.shbg * self.bmi * self.medication * self.genetic
    }
}

pub struct TestosteroneEngine {
    config: EngineConfig,
}

impl TestosteroneEngine {
    pub fn new(config: EngineConfig) -> DoseResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn calculate_t100_dosage(&self, params: &TestosteroneDosageParams) -> DoseResult<TestosteroneDosageResult> {
        self.calculate(&self.config.t100, params)
    }

    pub fn calculate_t200_dosage(&self, params: &TestosteroneDosageParams) -> DoseResult<TestosteroneDosageResult> {
        self.calculate(&self.config.t200, params)
    }

    /// Runs whichever protocol the params select.
    pub fn calculate_dosage(&self, params: &TestosteroneDosageParams) -> DoseResult<TestosteroneDosageResult> {
        match params.protocol_selection.pellet_type {
            PelletType::T100 => self.calculate_t100_dosage(params),
            PelletType::T200 => self.calculate_t200_dosage(params),
        }
    }

    fn calculate(
        &self,
        protocol: &ProtocolConfig,
        params: &TestosteroneDosageParams,
    ) -> DoseResult<TestosteroneDosageResult> {
        params.validate()?;

        let demographics = &params.patient_demographics;
        let clinical = &params.clinical;
        let bmi = calculate_bmi(demographics.weight_kg, demographics.height_cm);
        let coefficient = protocol.tier_coefficients.get(params.tier);

        info!(
            "Calculating {:?} dosage: {} kg, BMI {:.2}, {:?} tier",
            protocol.pellet_type, demographics.weight_kg, bmi, params.tier
        );

        let base_dose_mg = demographics.weight_kg * coefficient * protocol.t100_multiplier;
        let base = RunningDose::new(base_dose_mg, protocol.expected_duration_days);

        let mut breakdown = Breakdown::new();
        let base_condition = if protocol.is_t100() {
            format!(
                "{} kg x {} mg/kg ({:?} tier) x {} T100 factor",
                demographics.weight_kg, coefficient, params.tier, protocol.t100_multiplier
            )
        } else {
            format!("{} kg x {} mg/kg ({:?} tier)", demographics.weight_kg, coefficient, params.tier)
        };
        breakdown.record(BreakdownEntry::transition(
            BreakdownStep::BaseDose,
            base_condition,
            RunningDose::new(0.0, protocol.expected_duration_days),
            1.0,
            base,
            Advisories::default(),
        ));

        let shbg = modifiers::apply_shbg(protocol, base, clinical.shbg_level);
        let bmi_stage = modifiers::apply_bmi(protocol, shbg.running, bmi);
        let medication = modifiers::apply_medications(
            protocol,
            bmi_stage.running,
            &params.medications,
            &params.lifestyle_factors,
        );
        let genetic = modifiers::apply_genetics(protocol, medication.running, &params.genetic_data);
        let vitamin_d = modifiers::apply_vitamin_d(protocol, genetic.running, clinical, &params.genetic_data);
        let estradiol = modifiers::apply_estradiol_feedback(protocol, vitamin_d.running, clinical, bmi);
        let (psa, psa_velocity) = modifiers::apply_psa(estradiol.running, demographics, clinical);

        let multipliers = NamedMultipliers {
            shbg: shbg.multiplier,
            bmi: bmi_stage.multiplier,
            medication: medication.multiplier,
            genetic: genetic.multiplier,
        };
        let duration_warning = medication.duration_warning || genetic.duration_warning;
        let t200_triggered = medication.t200_triggered || genetic.t200_triggered;
        let mut duration_alerts = medication.duration_alerts.clone();
        duration_alerts.extend(genetic.duration_alerts.iter().cloned());

        let adjusted = psa.running;
        for stage in [shbg, bmi_stage, medication, genetic, vitamin_d, estradiol, psa] {
            breakdown.extend(stage.entries);
        }

        let final_dose = calculate_final_dose(protocol, adjusted, demographics.biological_sex);
        breakdown.record(final_dose.entry.clone());

        debug!(
            "Adjusted dose {:.2} mg over {} days; final {} mg ({} pellets)",
            adjusted.dose_mg, adjusted.duration_days, final_dose.final_dose_mg, final_dose.pellet_count
        );

        let rounded_base_dose_mg = snap_to_grid(base_dose_mg, protocol.pellet_unit_mg);
        let t100 = protocol.is_t100();

        let clinical_recommendations = ClinicalRecommendations {
            supplements: build_supplements(protocol, bmi, &params.genetic_data, clinical),
            monitoring_schedules: build_monitoring_schedule(
                protocol,
                &params.genetic_data,
                clinical,
                adjusted.duration_days,
            ),
            expected_duration_days: final_dose.duration_days,
            alerts: breakdown.collect(&[Advice::Alert]),
            warnings: breakdown.collect(&[Advice::Warning, Advice::Caution]),
            critical_alerts: breakdown.collect(&[Advice::CriticalAlert]),
            suggestions: breakdown.collect(&[
                Advice::Suggestion,
                Advice::Consideration,
                Advice::StrongRecommendation,
            ]),
            recommendations: breakdown.collect(&[Advice::Recommendation]),
            contraindications: breakdown.collect(&[Advice::Contraindication]),
            holds: breakdown.collect(&[Advice::Hold]),
        };

        let follow_up_schedule = follow_up_schedule(
            protocol,
            clinical.insertion_date,
            final_dose.duration_days,
            adjusted.duration_days,
        );

        let prostate_monitoring = ProstateMonitoring {
            baseline_psa: clinical.current_psa,
            psa_threshold_alert: psa_velocity.is_some_and(|v| v > PSA_VELOCITY_REFERRAL),
            psa_velocity: psa_velocity.map(|v| (v * 100.0).round() / 100.0),
            psa_monitoring_frequency: "Monthly".to_string(),
            urological_referral_needed: psa_velocity.is_some_and(|v| v > PSA_VELOCITY_REFERRAL),
        };

        let (protocol_comparison, duration_prediction) = if t100 {
            let recommendation = recommend_pellet_protocol_for_male(
                &params.lifestyle_factors,
                &params.medications,
                &params.genetic_data,
                &params.protocol_selection,
            );
            let comparison = ProtocolComparison {
                t100_duration_estimated_days: recommendation.estimated_t100_duration,
                t200_duration_estimated_days: recommendation.estimated_t200_duration,
                t100_pellet_count: final_dose.pellet_count,
                t200_pellet_count: self.estimate_t200_pellet_count(params, multipliers),
                recommend_switch_to_t200: recommendation.protocol == PelletType::T200,
                switch_rationale: recommendation.rationale,
            };
            let prediction = DurationPrediction {
                base_duration_days: protocol.expected_duration_days,
                medication_adjustment_days: breakdown.additional_days(BreakdownStep::MedicationModifier),
                genetic_adjustment_days: breakdown.additional_days(BreakdownStep::GeneticModifier),
                final_expected_duration_days: adjusted.duration_days,
                duration_warning,
                duration_alert: duration_alerts.join(", "),
                t200_recommendation_triggered: t200_triggered,
            };
            (Some(comparison), Some(prediction))
        } else {
            (None, None)
        };

        let dosing_calculation = DosageCalculation {
            base_dose_mg,
            rounded_base_dose_mg,
            base_pellet_count: rounded_base_dose_mg / protocol.pellet_unit_mg,
            shbg_multiplier: multipliers.shbg,
            bmi_multiplier: multipliers.bmi,
            medication_multiplier: multipliers.medication,
            genetic_multiplier: multipliers.genetic,
            adjusted_dose_mg: adjusted.dose_mg,
            preliminary_dose_mg: final_dose.preliminary_dose_mg,
            final_dose_mg: final_dose.final_dose_mg,
            pellet_count: final_dose.pellet_count,
            calculation_breakdown: breakdown.into_entries(),
            t100_multiplier: t100.then_some(protocol.t100_multiplier),
            dose_after_t100_factor: t100.then_some(base_dose_mg),
        };

        Ok(TestosteroneDosageResult {
            pellet_type: protocol.pellet_type,
            tier: params.tier,
            dosing_calculation,
            clinical_recommendations,
            follow_up_schedule,
            prostate_monitoring,
            protocol_comparison,
            duration_prediction,
        })
    }

    /// What the same patient would need on T200, reusing the T100 run's
    /// named multipliers.
    fn estimate_t200_pellet_count(&self, params: &TestosteroneDosageParams, multipliers: NamedMultipliers) -> f64 {
        let t200 = &self.config.t200;
        let unit = t200.pellet_unit_mg;
        let base = snap_to_grid(
            params.patient_demographics.weight_kg * t200.tier_coefficients.get(params.tier),
            unit,
        );
        let dose = ceil_to_increment(base * multipliers.product(), unit).min(t200.max_dose_mg);
        snap_to_grid(dose, unit) / unit
    }
}

fn follow_up_schedule(
    protocol: &ProtocolConfig,
    insertion_date: Option<NaiveDate>,
    expected_duration_days: i32,
    unfloored_duration_days: i32,
) -> FollowUpSchedule {
    let Some(date) = insertion_date else {
        return FollowUpSchedule::default();
    };
    let offset = |days: i64| Some(date + Duration::days(days));

    FollowUpSchedule {
        peak_labs_date: offset(protocol.peak_labs_days),
        midpoint_labs_date: offset(i64::from(expected_duration_days / 2)),
        trough_labs_date: offset(protocol.trough_assessment_days),
        symptom_check_date: offset(protocol.symptom_check_days),
        psa_check_date: offset(protocol.psa_check_days),
        next_insertion_estimated_date: offset(i64::from(unfloored_duration_days)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        BiologicalSex, ClinicalParams, Cyp3a4Status, DosageTier, GeneticData, LifestyleFactors, Medications,
        PatientDemographics, ProtocolSelection, SmokingStatus, Ugt2b17Status,
    };
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};
    use rand_distr::{Distribution, Normal};

    fn engine() -> TestosteroneEngine {
        TestosteroneEngine::new(EngineConfig::default()).unwrap()
    }

    fn params(pellet_type: PelletType) -> TestosteroneDosageParams {
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
                pellet_type,
                t100_indication: Some("first_time_pellet_trial".to_string()),
            },
        }
    }

    #[test]
    fn test_t100_standard_male() {
        let result = engine().calculate_t100_dosage(&params(PelletType::T100)).unwrap();
        let calc = &result.dosing_calculation;

        assert_relative_eq!(calc.base_dose_mg, 432.0);
        assert_eq!(calc.final_dose_mg, 400.0);
        assert_eq!(calc.pellet_count, 4.0);
        assert_eq!(calc.t100_multiplier, Some(0.6));
        assert_eq!(result.clinical_recommendations.expected_duration_days, 105);

        // Base entry, one per modifier stage, final dose.
        assert_eq!(calc.calculation_breakdown.len(), 9);
        assert_eq!(calc.calculation_breakdown[0].step, BreakdownStep::BaseDose);
        assert_eq!(calc.calculation_breakdown[8].step, BreakdownStep::FinalDose);
        assert!(result.protocol_comparison.is_some());
        assert!(result.duration_prediction.is_some());
    }

    #[test]
    fn test_breakdown_chain_is_contiguous() {
        let mut p = params(PelletType::T100);
        p.clinical.shbg_level = Some(60.0);
        p.medications.adhd_stimulants = true;
        p.genetic_data.cyp3a4 = Some(Cyp3a4Status::Fast);

        let result = engine().calculate_t100_dosage(&p).unwrap();
        let entries = &result.dosing_calculation.calculation_breakdown;
        for pair in entries.windows(2) {
            assert_relative_eq!(pair[1].previous_value, pair[0].adjusted_value, epsilon = 1e-9);
            assert_eq!(pair[1].previous_duration_days, pair[0].adjusted_duration_days);
        }
    }

    #[test]
    fn test_t200_standard_male() {
        let result = engine().calculate_t200_dosage(&params(PelletType::T200)).unwrap();
        let calc = &result.dosing_calculation;

        assert_relative_eq!(calc.base_dose_mg, 1200.0);
        assert_eq!(calc.final_dose_mg, 1200.0);
        assert_eq!(calc.pellet_count, 6.0);
        assert_eq!(calc.t100_multiplier, None);
        assert_eq!(result.clinical_recommendations.expected_duration_days, 150);
        assert!(result.protocol_comparison.is_none());
        assert!(result.duration_prediction.is_none());
    }

    #[test]
    fn test_calculate_dosage_dispatches_on_pellet_type() {
        let result = engine().calculate_dosage(&params(PelletType::T200)).unwrap();
        assert_eq!(result.pellet_type, PelletType::T200);
    }

    #[test]
    fn test_stimulants_and_smoking_shorten_duration() {
        let mut p = params(PelletType::T100);
        p.medications.adhd_stimulants = true;
        p.lifestyle_factors.smoking_status = SmokingStatus::Current;

        let result = engine().calculate_t100_dosage(&p).unwrap();
        let prediction = result.duration_prediction.unwrap();
        assert_eq!(prediction.medication_adjustment_days, -60);
        assert_eq!(prediction.final_expected_duration_days, 45);
        assert!(prediction.duration_warning);
        assert!(prediction.t200_recommendation_triggered);
        // Floored by the final-dose stage.
        assert_eq!(result.clinical_recommendations.expected_duration_days, 60);
        assert_relative_eq!(result.dosing_calculation.medication_multiplier, 1.21, epsilon = 1e-9);
        assert!(!result.clinical_recommendations.critical_alerts.is_empty());
    }

    #[test]
    fn test_dual_fast_sets_duration_and_resets_genetic_multiplier() {
        let mut p = params(PelletType::T100);
        p.genetic_data.cyp3a4 = Some(Cyp3a4Status::Fast);
        p.genetic_data.ugt2b17 = Some(Ugt2b17Status::Fast);

        let result = engine().calculate_t100_dosage(&p).unwrap();
        let calc = &result.dosing_calculation;
        assert_eq!(calc.genetic_multiplier, 1.0);
        // The dose still carries both 1.125 factors.
        assert_relative_eq!(calc.adjusted_dose_mg, 432.0 * 1.125 * 1.125, epsilon = 1e-9);
        assert_eq!(result.duration_prediction.unwrap().final_expected_duration_days, 70);
    }

    #[test]
    fn test_protocol_comparison_estimates_t200() {
        let result = engine().calculate_t100_dosage(&params(PelletType::T100)).unwrap();
        let comparison = result.protocol_comparison.unwrap();
        assert_eq!(comparison.t100_pellet_count, 4.0);
        assert_eq!(comparison.t200_pellet_count, 6.0);
        assert!(!comparison.recommend_switch_to_t200);
        assert_eq!((comparison.t100_duration_estimated_days, comparison.t200_duration_estimated_days), (105, 150));
    }

    #[test]
    fn test_follow_up_schedule_from_insertion_date() {
        let mut p = params(PelletType::T100);
        p.clinical.insertion_date = NaiveDate::from_ymd_opt(2024, 3, 1);

        let schedule = engine().calculate_t100_dosage(&p).unwrap().follow_up_schedule;
        assert_eq!(schedule.peak_labs_date, NaiveDate::from_ymd_opt(2024, 4, 12));
        assert_eq!(schedule.midpoint_labs_date, NaiveDate::from_ymd_opt(2024, 4, 22));
        assert_eq!(schedule.trough_labs_date, NaiveDate::from_ymd_opt(2024, 5, 10));
        assert_eq!(schedule.next_insertion_estimated_date, NaiveDate::from_ymd_opt(2024, 6, 14));

        let empty = engine().calculate_t100_dosage(&params(PelletType::T100)).unwrap().follow_up_schedule;
        assert_eq!(empty, FollowUpSchedule::default());
    }

    #[test]
    fn test_psa_velocity_feeds_prostate_monitoring() {
        let mut p = params(PelletType::T100);
        p.clinical.current_psa = Some(2.0);
        p.clinical.previous_psa = Some(1.5);
        p.clinical.months_between_psa = Some(6.0);

        let monitoring = engine().calculate_t100_dosage(&p).unwrap().prostate_monitoring;
        assert_eq!(monitoring.psa_velocity, Some(1.0));
        assert!(monitoring.urological_referral_needed);
        assert!(monitoring.psa_threshold_alert);
        assert_eq!(monitoring.baseline_psa, Some(2.0));
    }

    #[test]
    fn test_psa_contraindication_still_returns_result() {
        let mut p = params(PelletType::T100);
        p.clinical.current_psa = Some(4.5);

        let result = engine().calculate_t100_dosage(&p).unwrap();
        assert_eq!(result.clinical_recommendations.holds.len(), 1);
        assert_eq!(result.clinical_recommendations.contraindications.len(), 1);
        assert_eq!(result.dosing_calculation.final_dose_mg, 400.0);
    }

    #[test]
    fn test_zero_months_between_psa_skips_velocity() {
        let mut p = params(PelletType::T100);
        p.clinical.current_psa = Some(1.0);
        p.clinical.previous_psa = Some(0.8);
        p.clinical.months_between_psa = Some(0.0);

        let result = engine().calculate_t100_dosage(&p).unwrap();
        assert_eq!(result.prostate_monitoring.psa_velocity, None);
        assert!(!result.prostate_monitoring.urological_referral_needed);
        assert_eq!(result.dosing_calculation.final_dose_mg, 400.0);
    }

    #[test]
    fn test_reinsertion_dates_agree() {
        let mut p = params(PelletType::T100);
        p.medications.adhd_stimulants = true;
        p.lifestyle_factors.smoking_status = SmokingStatus::Current;
        p.clinical.insertion_date = NaiveDate::from_ymd_opt(2024, 1, 1);

        let result = engine().calculate_t100_dosage(&p).unwrap();
        let reinsertion = result
            .clinical_recommendations
            .monitoring_schedules
            .iter()
            .find(|entry| entry.timepoint == "Re-insertion")
            .unwrap();
        assert_eq!(reinsertion.ideal_date, NaiveDate::from_ymd_opt(2024, 2, 15));
        assert_eq!(reinsertion.ideal_date, result.follow_up_schedule.next_insertion_estimated_date);
    }

    #[test]
    fn test_invalid_params_are_rejected() {
        let mut p = params(PelletType::T100);
        p.patient_demographics.weight_kg = 0.0;
        assert!(engine().calculate_t100_dosage(&p).is_err());
    }

    fn random_params(rng: &mut StdRng, pellet_type: PelletType) -> TestosteroneDosageParams {
        let weight = Normal::<f64>::new(85.0, 20.0).unwrap();
        let mut p = params(pellet_type);
        p.patient_demographics.weight_kg = weight.sample(rng).clamp(40.0, 200.0);
        p.patient_demographics.height_cm = rng.gen_range(150.0..200.0);
        p.patient_demographics.biological_sex =
            if rng.gen_bool(0.8) { BiologicalSex::Male } else { BiologicalSex::Female };
        p.tier = DosageTier::ALL[rng.gen_range(0..4)];
        p.clinical.shbg_level = rng.gen_bool(0.5).then(|| rng.gen_range(10.0..80.0));
        p.medications.opioids = rng.gen_bool(0.2);
        p.medications.adhd_stimulants = rng.gen_bool(0.2);
        if rng.gen_bool(0.2) {
            p.lifestyle_factors.smoking_status = SmokingStatus::Current;
        }
        if rng.gen_bool(0.2) {
            p.medications.other_medications.push("lisinopril".to_string());
        }
        p.genetic_data.cyp3a4 = rng.gen_bool(0.3).then_some(Cyp3a4Status::Fast);
        p.genetic_data.ugt2b17 = rng.gen_bool(0.3).then_some(Ugt2b17Status::Deletion);
        p
    }

    #[test]
    fn test_random_cohort_respects_grid_and_cap() {
        let engine = engine();
        let mut rng = StdRng::seed_from_u64(42);

        for pellet_type in [PelletType::T100, PelletType::T200] {
            let protocol = engine.config().protocol(pellet_type).clone();
            for _ in 0..200 {
                let p = random_params(&mut rng, pellet_type);
                let calc = engine.calculate_dosage(&p).unwrap().dosing_calculation;

                assert!(calc.final_dose_mg <= protocol.max_dose_mg);
                assert!(calc.pellet_count <= f64::from(protocol.max_pellets_count));
                assert_relative_eq!(calc.pellet_count, calc.final_dose_mg / protocol.pellet_unit_mg);
                let grid = if p.patient_demographics.biological_sex == BiologicalSex::Female
                    && pellet_type == PelletType::T100
                {
                    protocol.female_rounding_mg
                } else {
                    protocol.pellet_unit_mg
                };
                assert_relative_eq!(calc.final_dose_mg % grid, 0.0, epsilon = 1e-6);
            }
        }
    }

    fn run_stages_in_order(protocol: &ProtocolConfig, p: &TestosteroneDosageParams, order: &[usize]) -> RunningDose {
        let demographics = &p.patient_demographics;
        let bmi = calculate_bmi(demographics.weight_kg, demographics.height_cm);
        let base_dose_mg =
            demographics.weight_kg * protocol.tier_coefficients.get(p.tier) * protocol.t100_multiplier;

        let mut running = RunningDose::new(base_dose_mg, protocol.expected_duration_days);
        for &stage in order {
            running = match stage {
                0 => modifiers::apply_shbg(protocol, running, p.clinical.shbg_level).running,
                1 => modifiers::apply_bmi(protocol, running, bmi).running,
                2 => modifiers::apply_medications(protocol, running, &p.medications, &p.lifestyle_factors).running,
                3 => modifiers::apply_genetics(protocol, running, &p.genetic_data).running,
                4 => modifiers::apply_vitamin_d(protocol, running, &p.clinical, &p.genetic_data).running,
                5 => modifiers::apply_estradiol_feedback(protocol, running, &p.clinical, bmi).running,
                _ => modifiers::apply_psa(running, demographics, &p.clinical).0.running,
            };
        }
        running
    }

    #[test]
    fn test_shuffled_stage_order_gives_same_adjusted_dose() {
        let engine = engine();
        let mut rng = StdRng::seed_from_u64(11);
        let mut order: Vec<usize> = (0..7).collect();

        for pellet_type in [PelletType::T100, PelletType::T200] {
            let protocol = engine.config().protocol(pellet_type).clone();
            for _ in 0..100 {
                let mut p = random_params(&mut rng, pellet_type);
                p.clinical.vitamin_d_level = rng.gen_bool(0.3).then(|| rng.gen_range(10.0..50.0));
                p.clinical.baseline_estradiol = rng.gen_bool(0.3).then(|| rng.gen_range(10.0..60.0));
                order.shuffle(&mut rng);

                let calc = engine.calculate_dosage(&p).unwrap().dosing_calculation;
                let shuffled = run_stages_in_order(&protocol, &p, &order);
                assert_relative_eq!(shuffled.dose_mg, calc.adjusted_dose_mg, max_relative = 1e-12);
            }
        }
    }

    #[test]
    fn test_random_cohort_multipliers_explain_adjusted_dose() {
        let engine = engine();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..200 {
            // Deletion never triggers the dual-fast override.
            let p = random_params(&mut rng, PelletType::T100);
            let calc = engine.calculate_t100_dosage(&p).unwrap().dosing_calculation;
            assert_relative_eq!(
                calc.adjusted_dose_mg / calc.base_dose_mg,
                calc.combined_multiplier(),
                epsilon = 1e-9
            );
        }
    }
}
