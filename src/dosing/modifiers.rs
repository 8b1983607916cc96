//! Testosterone modifier stages.
//!
//! Each stage takes the running dose and its own slice of the patient data
//! and returns a [`StageOutcome`]. Stages never skip recording: when no
//! branch fires they leave a single no-op entry. T100 and T200 share every
//! stage and differ only in which advisory branches are active.

use log::{debug, warn};

use super::breakdown::{Advice, Advisories, BreakdownStep, RunningDose, StageOutcome};
use crate::config::ProtocolConfig;
use crate::models::{
    AntioxidantSnpsStatus, ClinicalParams, Cyp3a4Status, GeneticData, LifestyleFactors,
    Medications, PatientDemographics, Srd5a2Status, Ugt2b17Status,
};

const SHBG_HIGH: f64 = 50.0;
const SHBG_LOW: f64 = 20.0;
const BMI_OBESE: f64 = 30.0;
const BMI_SEVERELY_OBESE: f64 = 35.0;
const VITAMIN_D_INSUFFICIENT: f64 = 30.0;
const VITAMIN_D_DEFICIENT: f64 = 20.0;
const BASELINE_ESTRADIOL_HIGH: f64 = 40.0;
const POST_ESTRADIOL_HIGH: f64 = 60.0;
const POST_ESTRADIOL_VERY_HIGH: f64 = 80.0;
const POST_ESTRADIOL_LOW: f64 = 15.0;
const PSA_AGE_GATE: u32 = 40;
const PSA_CONTRAINDICATION: f64 = 4.0;
const PSA_BORDERLINE: f64 = 2.5;
const PSA_VELOCITY_URGENT: f64 = 1.5;
const PSA_VELOCITY_REFERRAL: f64 = 0.75;

const FAST_CLEARANCE_MULTIPLIER: f64 = 1.125;
const FAST_CLEARANCE_DAYS: i32 = -14;
const STIMULANT_SMOKING_DAYS: i32 = -30;

fn pick(t100: bool, t100_text: &str, t200_text: &str) -> String {
    if t100 { t100_text } else { t200_text }.to_string()
}

pub fn apply_shbg(protocol: &ProtocolConfig, running: RunningDose, shbg_level: Option<f64>) -> StageOutcome {
    let t100 = protocol.is_t100();
    let step = BreakdownStep::ShbgModifier;
    let mut outcome = StageOutcome::new(running);

    match shbg_level {
        Some(level) if level > SHBG_HIGH => {
            let mut advisories = Advisories::default();
            if t100 {
                advisories.push(Advice::Alert, "High SHBG level detected - increased dose or higher tier recommended.");
            }
            outcome.adjust(step, "SHBG level is greater than 50", 1.1, 0, advisories);
        }
        Some(level) if level < SHBG_LOW => {
            let advisories = if t100 {
                Advisories::default()
                    .with(Advice::Alert, "Low SHBG - patient may be sensitive to standard doses.")
                    .with(Advice::Suggestion, "Consider conservative tier or monitor closely at lower dose.")
            } else {
                Advisories::default()
                    .with(Advice::Alert, "Consider using conservative tier or lower end of selected tier.")
            };
            outcome.note(step, "SHBG level is less than 20", advisories);
        }
        _ => {}
    }

    debug!("SHBG stage: level {:?}, multiplier {:.3}", shbg_level, outcome.multiplier);
    outcome.or_unchanged(step, "SHBG level is within normal range or not provided")
}

pub fn apply_bmi(protocol: &ProtocolConfig, running: RunningDose, bmi: f64) -> StageOutcome {
    let t100 = protocol.is_t100();
    let step = BreakdownStep::BmiAromatizationModifier;
    let mut outcome = StageOutcome::new(running);

    if (BMI_OBESE..BMI_SEVERELY_OBESE).contains(&bmi) {
        let mut advisories = Advisories::default();
        if t100 {
            advisories.push(Advice::Alert, "Obesity detected - increased aromatization risk.");
        }
        advisories.push(Advice::Recommendation, pick(t100, "DIM supplementation 200-300mg daily", "DIM supplementation"));
        advisories.push(
            Advice::Recommendation,
            pick(t100, "Monitor estradiol at 6 week follow-up", "Monitor estradiol at follow-up"),
        );
        outcome.adjust(step, "BMI is between 30 and 35", 1.075, 0, advisories);
    } else if bmi >= BMI_SEVERELY_OBESE {
        let mut advisories = Advisories::default();
        if t100 {
            advisories.push(Advice::Alert, "Severe obesity detected - high aromatization risk.");
        }
        advisories.push(
            Advice::Recommendation,
            pick(t100, "Aromatase inhibitor (anastrozole) 0.5mg 2x/week", "Aromatase inhibitor (anastrozole)"),
        );
        advisories.push(Advice::Recommendation, pick(t100, "DIM supplementation 300mg daily", "DIM supplementation"));
        advisories.push(
            Advice::Recommendation,
            pick(t100, "Monitor estradiol closely at all follow-ups", "Monitor estradiol closely"),
        );
        outcome.adjust(step, "BMI is 35 or greater", 1.15, 0, advisories);
    }

    debug!("BMI stage: bmi {:.2}, multiplier {:.3}", bmi, outcome.multiplier);
    outcome.or_unchanged(step, "BMI is below 30")
}

pub fn apply_medications(
    protocol: &ProtocolConfig,
    running: RunningDose,
    medications: &Medications,
    lifestyle: &LifestyleFactors,
) -> StageOutcome {
    let t100 = protocol.is_t100();
    let step = BreakdownStep::MedicationModifier;
    let mut outcome = StageOutcome::new(running);

    if medications.opioids {
        let mut advisories = Advisories::default()
            .with(Advice::Alert, "Patient on opioids - increased dose needed due to HPG suppression.");
        if t100 {
            advisories.push(Advice::Warning, "Monitor for breakthrough symptoms.");
        }
        outcome.adjust(step, "Patient on opioids", 1.15, 0, advisories);
        outcome.t200_triggered = true;
    }

    if medications.adhd_stimulants {
        let mut advisories = Advisories::default().with(
            Advice::Alert,
            pick(t100, "Stimulant use - expect FASTER clearance with T100.", "Stimulant use - expect FASTER clearance."),
        );
        if t100 {
            advisories.push(Advice::Suggestion, "Consider T200 protocol for longer duration.");
        }
        outcome.adjust(step, "Patient on ADHD stimulants", 1.10, STIMULANT_SMOKING_DAYS, advisories);
        outcome.duration_warning = true;
        outcome.t200_triggered = true;
    }

    if lifestyle.is_current_smoker() {
        let mut advisories = Advisories::default().with(
            Advice::Alert,
            pick(t100, "Smoking reduces pellet duration significantly with T100.", "Smoking reduces pellet duration."),
        );
        if t100 {
            advisories.push(Advice::Suggestion, "Consider T200 protocol for longer duration.");
        }
        outcome.adjust(step, "Patient is a current smoker", 1.10, STIMULANT_SMOKING_DAYS, advisories);
        outcome.duration_warning = true;
        outcome.t200_triggered = true;
    }

    // Clamp, not a shift: a duration already under the cap is left as is.
    if t100 && !medications.other_medications.is_empty() {
        let current = outcome.running.duration_days;
        let capped = current.min(protocol.other_medications_duration_cap_days);
        let advisories = Advisories::default()
            .with(Advice::CriticalAlert, "MULTIPLE fast-clearance factors detected!")
            .with(Advice::Recommendation, "Strongly consider T200 protocol instead.");
        outcome.adjust(step, "Patient on other medications", 1.0, capped - current, advisories);
        outcome.duration_warning = true;
        outcome.t200_triggered = true;
        outcome.duration_alerts.push("Multiple fast-clearance factors detected!".to_string());
    }

    debug!(
        "Medication stage: multiplier {:.3}, duration {} days",
        outcome.multiplier, outcome.running.duration_days
    );
    outcome.or_unchanged(step, "No dose-relevant medications or lifestyle factors")
}

pub fn apply_genetics(protocol: &ProtocolConfig, running: RunningDose, genetics: &GeneticData) -> StageOutcome {
    let t100 = protocol.is_t100();
    let step = BreakdownStep::GeneticModifier;
    let mut outcome = StageOutcome::new(running);

    if genetics.cyp19a1_high() {
        let mut advisories = Advisories::default();
        if t100 {
            advisories.push(Advice::Supplement, "Aromatase inhibitor (anastrozole) or DIM");
            advisories.push(Advice::Monitoring, "Estradiol at all follow-ups");
        } else {
            advisories.push(Advice::Supplement, "Aromatase inhibitor (anastrozole)");
            advisories.push(Advice::Supplement, "DIM");
        }
        advisories.push(Advice::Alert, "High aromatization risk - monitor estradiol closely.");
        outcome.note(step, "CYP19A1 high expression", advisories);
    }

    if t100 {
        if genetics.cyp3a4_fast() {
            let advisories = Advisories::default()
                .with(Advice::Alert, "CYP3A4 fast metabolizer - increased dose and SHORTER duration.")
                .with(Advice::Warning, "T100 duration may be only 10-12 weeks for this patient.");
            outcome.adjust(step, "CYP3A4 fast metabolizer", FAST_CLEARANCE_MULTIPLIER, FAST_CLEARANCE_DAYS, advisories);
            outcome.duration_warning = true;
            outcome.t200_triggered = true;
            outcome
                .duration_alerts
                .push("CYP3A4 fast metabolizer - increased dose and SHORTER duration.".to_string());
        }

        if genetics.ugt2b17_fast_or_deleted() {
            let advisories = Advisories::default()
                .with(Advice::CriticalAlert, "UGT2B17 fast metabolizer DETECTED!")
                .with(Advice::Warning, "This is a HIGH-IMPACT genotype for T100 protocol.")
                .with(Advice::Suggestion, "Expected duration may be only 9-11 weeks.")
                .with(Advice::Recommendation, "STRONGLY consider T200 protocol for longer duration.");
            outcome.adjust(step, "UGT2B17 fast metabolizer", FAST_CLEARANCE_MULTIPLIER, FAST_CLEARANCE_DAYS, advisories);
            outcome.duration_warning = true;
            outcome.t200_triggered = true;
        }

        // Runs after the individual stages it overrides. The dose keeps the
        // individual 1.125 factors; only the reported multiplier is reset.
        if genetics.cyp3a4_fast() && genetics.ugt2b17_fast() {
            let before = outcome.running;
            let after = before.with_duration(protocol.dual_fast_duration_days);
            let advisories = Advisories::default()
                .with(Advice::CriticalAlert, "DUAL fast metabolizer genotype!")
                .with(Advice::Warning, "T100 duration likely <10 weeks for this patient.")
                .with(Advice::Recommendation, "T200 protocol strongly recommended over T100.");
            outcome.adjust(
                step,
                "CYP3A4 and UGT2B17 fast metabolizers",
                1.0,
                after.duration_days - before.duration_days,
                advisories,
            );
            outcome.multiplier = 1.0;
            outcome.duration_warning = true;
            outcome.t200_triggered = true;
        }
    } else if genetics.cyp3a4_fast() || genetics.ugt2b17_fast() {
        let advisories = Advisories::default()
            .with(Advice::Alert, "Fast metabolizer detected - increased dose recommended.");
        outcome.adjust(
            step,
            "CYP3A4 or UGT2B17 fast metabolizer",
            FAST_CLEARANCE_MULTIPLIER,
            FAST_CLEARANCE_DAYS,
            advisories,
        );
    }

    if t100 && genetics.cyp3a4 == Some(Cyp3a4Status::Slow) && genetics.ugt2b17 == Some(Ugt2b17Status::Normal) {
        let advisories = Advisories::default()
            .with(Advice::Alert, "Slow metabolizer detected.")
            .with(Advice::Note, "T100 effects may extend to 4-5 months (similar to T200).")
            .with(Advice::Suggestion, "This patient may do well with T100 protocol.");
        outcome.note(step, "CYP3A4 slow metabolizer and UGT2B17 normal metabolizer", advisories);
    }

    if matches!(genetics.srd5a2, Some(Srd5a2Status::High | Srd5a2Status::HighActivity)) {
        let mut advisories = Advisories::default()
            .with(Advice::Alert, "Monitor for DHT-related side effects (acne, hair loss, oily skin).")
            .with(Advice::Monitoring, "DHT levels at follow-up");
        let supplements: [&str; 3] = if t100 {
            ["Zinc 30mg daily", "Saw palmetto 320mg daily", "DIM 200-300mg daily"]
        } else {
            ["Zinc", "Saw palmetto", "DIM"]
        };
        for supplement in supplements {
            advisories.push(Advice::Supplement, supplement);
        }
        outcome.note(step, "SRD5A2 high activity", advisories);
    }

    if genetics.vdr_low_function() {
        let mut advisories = Advisories::default()
            .with(Advice::Alert, "Low VDR function - optimize vitamin D before treatment.")
            .with(Advice::Prerequisite, "Vitamin D >30 ng/mL required before insertion");
        if t100 {
            advisories.push(Advice::Recommendation, "Target Vitamin D 40-50 ng/mL for optimal response.");
        }
        outcome.note(step, "VDR low function", advisories);
    }

    if genetics.antioxidant_snps == Some(AntioxidantSnpsStatus::PoorFunction) {
        let mut advisories = Advisories::default();
        if t100 {
            advisories.push(Advice::Note, "Antioxidant support recommended for optimal response.");
            advisories.push(Advice::Supplement, "NAC (N-acetylcysteine) 600mg daily");
            advisories.push(Advice::Supplement, "Zinc 30mg daily");
        } else {
            advisories.push(Advice::Supplement, "NAC (N-acetylcysteine)");
            advisories.push(Advice::Supplement, "Zinc");
        }
        outcome.note(step, "Antioxidant SNPs poor function", advisories);
    }

    debug!(
        "Genetic stage: multiplier {:.3}, duration {} days",
        outcome.multiplier, outcome.running.duration_days
    );
    outcome.or_unchanged(step, "No dose-relevant genetic findings")
}

pub fn apply_vitamin_d(
    protocol: &ProtocolConfig,
    running: RunningDose,
    clinical: &ClinicalParams,
    genetics: &GeneticData,
) -> StageOutcome {
    let t100 = protocol.is_t100();
    let step = BreakdownStep::VitaminDLevelVdrConsiderationsModifier;
    let mut outcome = StageOutcome::new(running);

    if let Some(level) = clinical.vitamin_d_level.filter(|level| *level < VITAMIN_D_INSUFFICIENT) {
        let mut advisories = Advisories::default()
            .with(Advice::Alert, "Vitamin D deficiency/insufficiency detected.")
            .with(
                Advice::Recommendation,
                pick(
                    t100,
                    "Supplement with Vitamin D3 (5000 IU daily) + K2 (100-200 mcg)",
                    "Supplement with Vitamin D3 (5000 IU daily) + K2",
                ),
            );

        if level < VITAMIN_D_DEFICIENT {
            advisories.push(Advice::StrongRecommendation, "Delay pellet insertion 4-8 weeks to optimize vitamin D");
            if t100 {
                advisories.push(Advice::Warning, "SEVERE Vitamin D deficiency");
                advisories.push(Advice::Note, "Suboptimal testosterone response expected without correction.");
            } else {
                advisories.push(Advice::Warning, "Suboptimal testosterone response expected");
            }
        } else if t100 {
            advisories.push(Advice::Caution, "May proceed but response may be suboptimal.");
            advisories.push(Advice::Recommendation, "Aggressive Vitamin D supplementation (10,000 IU daily x 4 weeks).");
        }

        outcome.note(step, "Vitamin D level is less than 30", advisories);
    }

    if genetics.vdr_low_function() {
        let mut advisories = Advisories::default()
            .with(Advice::Alert, "VDR polymorphism detected - may reduce treatment response.")
            .with(
                Advice::Recommendation,
                pick(t100, "Target Vitamin D >40 ng/mL (higher than standard).", "Target Vitamin D >40 ng/mL for this patient"),
            )
            .with(Advice::Monitoring, "Monitor response closely at 6-week labs");
        if t100 {
            advisories.push(Advice::Note, "Patient may require higher testosterone doses due to reduced receptor sensitivity.");
        }
        outcome.note(step, "VDR low function", advisories);
    }

    outcome.or_unchanged(step, "Vitamin D adequate or not provided")
}

pub fn apply_estradiol_feedback(
    protocol: &ProtocolConfig,
    running: RunningDose,
    clinical: &ClinicalParams,
    bmi: f64,
) -> StageOutcome {
    let t100 = protocol.is_t100();
    let step = BreakdownStep::EstradiolMonitoringManagementModifier;
    let mut outcome = StageOutcome::new(running);

    if clinical.baseline_estradiol.is_some_and(|e2| e2 >= BASELINE_ESTRADIOL_HIGH) {
        let mut advisories = Advisories::default()
            .with(Advice::Alert, "Elevated baseline Estradiol - high aromatase activity suspected.")
            .with(
                Advice::Recommendation,
                pick(t100, "DIM supplementation 200-300mg daily from day 1", "DIM supplementation from day 1"),
            )
            .with(Advice::Monitoring, "Check Estradiol at 6-week follow-up");
        if t100 && bmi >= BMI_OBESE {
            advisories.push(Advice::StrongRecommendation, "Consider aromatase inhibitor due to obesity + elevated E2");
        }
        outcome.note(step, "Baseline Estradiol is 40 or greater", advisories);
    }

    if let Some(e2) = clinical.post_insertion_estradiol.filter(|e2| *e2 >= POST_ESTRADIOL_HIGH) {
        let mut advisories = Advisories::default()
            .with(Advice::Alert, "Excessive Estradiol detected at peak.")
            .with(Advice::Monitoring, "Recheck Estradiol in 4-6 weeks")
            .with(
                Advice::Warning,
                pick(
                    t100,
                    "Monitor for symptoms: water retention, gynecomastia, mood changes, sexual dysfunction",
                    "Monitor for symptoms: water retention, mood changes, breast tenderness",
                ),
            )
            .with(Advice::Treatment, "Initiate anastrozole 0.5mg twice weekly")
            .with(
                Advice::Treatment,
                pick(t100, "Continue or add DIM supplementation 300mg daily", "Continue DIM supplementation"),
            );
        if t100 && e2 >= POST_ESTRADIOL_VERY_HIGH {
            advisories.push(Advice::CriticalAlert, "VERY high estradiol - immediate intervention required.");
            advisories.push(Advice::Treatment, "Anastrozole 0.5mg THREE times weekly");
            advisories.push(Advice::UrgentMonitoring, "Recheck estradiol in 2-3 weeks");
        }
        outcome.note(step, "Post-insertion Estradiol is 60 or greater", advisories);
    }

    if t100 && clinical.post_insertion_estradiol.is_some_and(|e2| e2 < POST_ESTRADIOL_LOW) {
        let advisories = Advisories::default()
            .with(Advice::Alert, "Estradiol may be too low.")
            .with(Advice::Note, "Some estradiol is beneficial for bone health, libido, cardiovascular health.")
            .with(Advice::Action, "Reduce or discontinue AI if currently using");
        outcome.note(step, "Post-insertion Estradiol is less than 15", advisories);
    }

    outcome.or_unchanged(step, "Estradiol within range or not provided")
}

/// PSA velocity in ng/mL per year, when both readings and their spacing are known.
pub fn psa_velocity(clinical: &ClinicalParams) -> Option<f64> {
    match (clinical.current_psa, clinical.previous_psa, clinical.months_between_psa) {
        (Some(current), Some(previous), Some(months)) if months > 0.0 => {
            Some((current - previous) / months * 12.0)
        }
        _ => None,
    }
}

pub fn apply_psa(
    running: RunningDose,
    demographics: &PatientDemographics,
    clinical: &ClinicalParams,
) -> (StageOutcome, Option<f64>) {
    let step = BreakdownStep::PsaProstateMonitoringModifier;
    let mut outcome = StageOutcome::new(running);

    if !demographics.is_male() {
        let outcome = outcome.or_unchanged(step, "PSA monitoring not applicable");
        return (outcome, None);
    }

    if demographics.age >= PSA_AGE_GATE && clinical.current_psa.is_none() {
        outcome.note(
            step,
            "Patient is 40 or older with no PSA on file",
            Advisories::default().with(Advice::Requirement, "PSA test required before testosterone therapy"),
        );
    }

    if let Some(psa) = clinical.current_psa {
        if psa > PSA_CONTRAINDICATION {
            warn!("PSA {:.2} exceeds contraindication threshold; hold recorded", psa);
            outcome.note(
                step,
                "PSA is greater than 4",
                Advisories::default()
                    .with(Advice::Contraindication, "PSA >4.0 - urological clearance required before TRT")
                    .with(Advice::Action, "Refer to urologist for evaluation")
                    .with(Advice::Hold, "Do not proceed with pellet insertion"),
            );
        } else if psa >= PSA_BORDERLINE {
            outcome.note(
                step,
                "PSA is between 2.5 and 4",
                Advisories::default()
                    .with(Advice::Caution, "Borderline elevated PSA")
                    .with(Advice::Requirement, "Digital rectal exam (DRE) recommended")
                    .with(Advice::Monitoring, "PSA at 6 weeks and 12 weeks post-insertion"),
            );
        }
    }

    let velocity = psa_velocity(clinical);
    match velocity {
        Some(v) if v > PSA_VELOCITY_URGENT => {
            warn!("PSA velocity {:.2} ng/mL/year requires urgent referral", v);
            outcome.note(
                step,
                "PSA velocity is greater than 1.5",
                Advisories::default()
                    .with(Advice::CriticalAlert, "Rapid PSA rise detected.")
                    .with(Advice::UrgentAction, "Immediate urological referral")
                    .with(Advice::Hold, "Consider holding further testosterone until evaluated"),
            );
        }
        Some(v) if v > PSA_VELOCITY_REFERRAL => {
            outcome.note(
                step,
                "PSA velocity is greater than 0.75",
                Advisories::default()
                    .with(Advice::Alert, "PSA velocity exceeds 0.75 ng/mL/year.")
                    .with(Advice::Action, "Urological referral recommended")
                    .with(Advice::Consideration, "May need to hold testosterone therapy pending evaluation"),
            );
        }
        _ => {}
    }

    (outcome.or_unchanged(step, "No PSA findings"), velocity)
}
