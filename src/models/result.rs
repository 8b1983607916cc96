use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::patient::{DosageTier, PelletType};
use crate::dosing::breakdown::BreakdownEntry;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplement {
    pub name: String,
    pub dose: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    #[serde(default)]
    pub is_core: bool,
}

impl Supplement {
    pub fn new(name: &str, dose: &str, frequency: &str, purpose: &str) -> Self {
        Self {
            name: name.to_string(),
            dose: dose.to_string(),
            unit: None,
            frequency: Some(frequency.to_string()),
            timing: None,
            purpose: Some(purpose.to_string()),
            is_core: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringScheduleEntry {
    pub timepoint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ideal_date: Option<NaiveDate>,
    pub tests_required: String,
    pub purpose: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DosageCalculation {
    /// Unrounded base dose (weight x tier coefficient, x T100 factor where applicable).
    pub base_dose_mg: f64,
    pub rounded_base_dose_mg: f64,
    pub base_pellet_count: f64,
    pub shbg_multiplier: f64,
    pub bmi_multiplier: f64,
    pub medication_multiplier: f64,
    pub genetic_multiplier: f64,
    /// Running dose after every modifier stage, before rounding.
    pub adjusted_dose_mg: f64,
    pub preliminary_dose_mg: f64,
    pub final_dose_mg: f64,
    /// Fractional only on the female T100 path, which rounds to 12.5 mg.
    pub pellet_count: f64,
    pub calculation_breakdown: Vec<BreakdownEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t100_multiplier: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dose_after_t100_factor: Option<f64>,
}

impl DosageCalculation {
    pub fn combined_multiplier(&self) -> f64 {
        self.shbg_multiplier * self.bmi_multiplier * self.medication_multiplier * self.genetic_multiplier
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClinicalRecommendations {
    pub supplements: Vec<Supplement>,
    pub monitoring_schedules: Vec<MonitoringScheduleEntry>,
    pub expected_duration_days: i32,
    pub alerts: Vec<String>,
    pub warnings: Vec<String>,
    pub critical_alerts: Vec<String>,
    pub suggestions: Vec<String>,
    pub recommendations: Vec<String>,
    pub contraindications: Vec<String>,
    pub holds: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FollowUpSchedule {
    pub peak_labs_date: Option<NaiveDate>,
    pub midpoint_labs_date: Option<NaiveDate>,
    pub trough_labs_date: Option<NaiveDate>,
    pub symptom_check_date: Option<NaiveDate>,
    pub psa_check_date: Option<NaiveDate>,
    pub next_insertion_estimated_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProstateMonitoring {
    pub baseline_psa: Option<f64>,
    pub psa_threshold_alert: bool,
    pub psa_velocity: Option<f64>,
    pub psa_monitoring_frequency: String,
    pub urological_referral_needed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolComparison {
    pub t100_duration_estimated_days: i32,
    pub t200_duration_estimated_days: i32,
    pub t100_pellet_count: f64,
    pub t200_pellet_count: f64,
    pub recommend_switch_to_t200: bool,
    pub switch_rationale: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DurationPrediction {
    pub base_duration_days: i32,
    pub medication_adjustment_days: i32,
    pub genetic_adjustment_days: i32,
    /// Duration after the modifier stages, before the final-dose floor.
    pub final_expected_duration_days: i32,
    pub duration_warning: bool,
    pub duration_alert: String,
    pub t200_recommendation_triggered: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestosteroneDosageResult {
    pub pellet_type: PelletType,
    pub tier: DosageTier,
    pub dosing_calculation: DosageCalculation,
    pub clinical_recommendations: ClinicalRecommendations,
    pub follow_up_schedule: FollowUpSchedule,
    pub prostate_monitoring: ProstateMonitoring,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol_comparison: Option<ProtocolComparison>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_prediction: Option<DurationPrediction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternativeDose {
    pub dose_mg: f64,
    pub pellet_count: u32,
    pub rationale: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstradiolDosageCalculation {
    pub base_dose_mg: f64,
    pub shbg_multiplier: f64,
    pub bmi_multiplier: f64,
    pub genetic_multiplier: f64,
    pub age_multiplier: f64,
    pub adjusted_dose_mg: f64,
    pub final_dose_mg: f64,
    pub pellet_count: u32,
    pub pellet_configuration: String,
    pub alternative_doses: Vec<AlternativeDose>,
    pub calculation_breakdown: Vec<BreakdownEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstradiolDosageResult {
    pub tier: DosageTier,
    pub dosing_calculation: EstradiolDosageCalculation,
    pub clinical_recommendations: ClinicalRecommendations,
}
