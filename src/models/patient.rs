use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{DoseError, DoseResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiologicalSex {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DosageTier {
    Conservative,
    Standard,
    Aggressive,
    HighPerformance,
}

impl DosageTier {
    pub const ALL: [DosageTier; 4] = [
        DosageTier::Conservative,
        DosageTier::Standard,
        DosageTier::Aggressive,
        DosageTier::HighPerformance,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PelletType {
    T100,
    T200,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SmokingStatus {
    #[default]
    Never,
    Former,
    Current,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseLevel {
    Sedentary,
    Light,
    Moderate,
    Vigorous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cyp19a1Status {
    Normal,
    HighExpression,
    LowExpression,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cyp3a4Status {
    Normal,
    Intermediate,
    Fast,
    Slow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ugt2b17Status {
    Normal,
    Intermediate,
    Fast,
    Deletion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Srd5a2Status {
    Normal,
    HighActivity,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VdrStatus {
    Normal,
    LowFunction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AntioxidantSnpsStatus {
    Normal,
    PoorFunction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientDemographics {
    pub weight_kg: f64,
    pub height_cm: f64,
    pub age: u32,
    pub biological_sex: BiologicalSex,
}

impl PatientDemographics {
    pub fn is_male(&self) -> bool {
        self.biological_sex == BiologicalSex::Male
    }

    pub fn validate(&self) -> DoseResult<()> {
        if !(self.weight_kg.is_finite() && self.weight_kg > 0.0) {
            return Err(DoseError::InvalidInput(
                "Weight must be a positive number of kilograms".to_string()
            ));
        }
        if !(self.height_cm.is_finite() && self.height_cm > 0.0) {
            return Err(DoseError::InvalidInput(
                "Height must be a positive number of centimeters".to_string()
            ));
        }
        Ok(())
    }
}

/// Optional lab values. A missing value turns its modifier stage into a no-op.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClinicalParams {
    pub shbg_level: Option<f64>,
    pub vitamin_d_level: Option<f64>,
    pub baseline_estradiol: Option<f64>,
    pub post_insertion_estradiol: Option<f64>,
    pub current_psa: Option<f64>,
    pub previous_psa: Option<f64>,
    pub months_between_psa: Option<f64>,
    pub hematocrit: Option<f64>,
    pub insertion_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LifestyleFactors {
    pub smoking_status: SmokingStatus,
    pub exercise_level: Option<ExerciseLevel>,
}

impl LifestyleFactors {
    pub fn is_current_smoker(&self) -> bool {
        self.smoking_status == SmokingStatus::Current
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Medications {
    pub opioids: bool,
    pub adhd_stimulants: bool,
    /// Only the presence of entries matters, not their content.
    pub other_medications: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneticData {
    pub cyp19a1: Option<Cyp19a1Status>,
    pub cyp3a4: Option<Cyp3a4Status>,
    pub ugt2b17: Option<Ugt2b17Status>,
    pub srd5a2: Option<Srd5a2Status>,
    pub vdr: Option<VdrStatus>,
    pub antioxidant_snps: Option<AntioxidantSnpsStatus>,
}

impl GeneticData {
    pub fn cyp3a4_fast(&self) -> bool {
        self.cyp3a4 == Some(Cyp3a4Status::Fast)
    }

    pub fn ugt2b17_fast(&self) -> bool {
        self.ugt2b17 == Some(Ugt2b17Status::Fast)
    }

    pub fn ugt2b17_fast_or_deleted(&self) -> bool {
        matches!(self.ugt2b17, Some(Ugt2b17Status::Fast | Ugt2b17Status::Deletion))
    }

    pub fn cyp19a1_high(&self) -> bool {
        self.cyp19a1 == Some(Cyp19a1Status::HighExpression)
    }

    pub fn vdr_low_function(&self) -> bool {
        self.vdr == Some(VdrStatus::LowFunction)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolSelection {
    pub pellet_type: PelletType,
    /// Advisory tag; never used in dose arithmetic.
    #[serde(default)]
    pub t100_indication: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestosteroneDosageParams {
    pub patient_demographics: PatientDemographics,
    #[serde(default)]
    pub clinical: ClinicalParams,
    #[serde(default)]
    pub lifestyle_factors: LifestyleFactors,
    #[serde(default)]
    pub medications: Medications,
    #[serde(default)]
    pub genetic_data: GeneticData,
    pub tier: DosageTier,
    pub protocol_selection: ProtocolSelection,
}

impl TestosteroneDosageParams {
    pub fn validate(&self) -> DoseResult<()> {
        self.patient_demographics.validate()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstradiolDosageParams {
    pub patient_demographics: PatientDemographics,
    #[serde(default)]
    pub clinical: ClinicalParams,
    pub tier: DosageTier,
    #[serde(default)]
    pub genetic_data: GeneticData,
}

impl EstradiolDosageParams {
    pub fn validate(&self) -> DoseResult<()> {
        self.patient_demographics.validate()
    }
}
