use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{DoseError, DoseResult};
use crate::models::{DosageTier, PelletType, Supplement};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub t100: ProtocolConfig,
    pub t200: ProtocolConfig,
    pub estradiol: EstradiolConfig,
}

/// mg/kg coefficient per dosage tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierCoefficients {
    pub conservative: f64,
    pub standard: f64,
    pub aggressive: f64,
    pub high_performance: f64,
}

impl TierCoefficients {
    pub fn get(&self, tier: DosageTier) -> f64 {
        match tier {
            DosageTier::Conservative => self.conservative,
            DosageTier::Standard => self.standard,
            DosageTier::Aggressive => self.aggressive,
            DosageTier::HighPerformance => self.high_performance,
        }
    }

    fn validate(&self, label: &str) -> DoseResult<()> {
        for tier in DosageTier::ALL {
            if self.get(tier) <= 0.0 {
                return Err(DoseError::InvalidConfig(
                    format!("{} tier coefficient for {:?} must be positive", label, tier)
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolConfig {
    pub pellet_type: PelletType,
    pub pellet_unit_mg: f64,
    pub max_dose_mg: f64,
    pub max_pellets_count: u32,
    /// Applied to the base dose on top of the tier coefficient; 1.0 for T200.
    pub t100_multiplier: f64,
    pub expected_duration_days: i32,
    pub duration_floor_days: i32,
    pub short_duration_threshold_days: i32,
    pub other_medications_duration_cap_days: i32,
    pub dual_fast_duration_days: i32,
    pub female_rounding_mg: f64,
    pub peak_labs_days: i64,
    pub trough_assessment_days: i64,
    pub symptom_check_days: i64,
    pub psa_check_days: i64,
    pub tier_coefficients: TierCoefficients,
    pub core_supplements: Vec<Supplement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstradiolConfig {
    pub increment_mg: f64,
    pub expected_duration_days: i32,
    pub tier_coefficients: TierCoefficients,
    pub core_supplements: Vec<Supplement>,
}

fn vitamin_d3() -> Supplement {
    Supplement {
        name: "Vitamin D3".to_string(),
        dose: "5000".to_string(),
        unit: Some("IU".to_string()),
        frequency: Some("Daily".to_string()),
        timing: Some("Start pre-treatment if <30ng/mL".to_string()),
        purpose: Some("Optimize receptor function".to_string()),
        is_core: true,
    }
}

impl ProtocolConfig {
    pub fn t100() -> Self {
        Self {
            pellet_type: PelletType::T100,
            pellet_unit_mg: 100.0,
            max_dose_mg: 1700.0,
            max_pellets_count: 17,
            t100_multiplier: 0.6,
            expected_duration_days: 105,
            duration_floor_days: 60,
            short_duration_threshold_days: 75,
            other_medications_duration_cap_days: 75,
            dual_fast_duration_days: 70,
            female_rounding_mg: 12.5,
            peak_labs_days: 42,
            trough_assessment_days: 70,
            symptom_check_days: 6,
            psa_check_days: 6,
            tier_coefficients: TierCoefficients {
                conservative: 7.0,
                standard: 9.0,
                aggressive: 12.0,
                high_performance: 15.0,
            },
            core_supplements: vec![vitamin_d3()],
        }
    }

    pub fn t200() -> Self {
        Self {
            pellet_type: PelletType::T200,
            pellet_unit_mg: 200.0,
            max_dose_mg: 2800.0,
            max_pellets_count: 14,
            t100_multiplier: 1.0,
            expected_duration_days: 150,
            tier_coefficients: TierCoefficients {
                conservative: 11.0,
                standard: 15.0,
                aggressive: 18.0,
                high_performance: 23.0,
            },
            ..Self::t100()
        }
    }

    pub fn is_t100(&self) -> bool {
        self.pellet_type == PelletType::T100
    }

    fn validate(&self) -> DoseResult<()> {
        let label = format!("{:?}", self.pellet_type);

        if self.pellet_unit_mg <= 0.0 {
            return Err(DoseError::InvalidConfig(
                format!("{} pellet unit must be positive", label)
            ));
        }

        if self.max_dose_mg < self.pellet_unit_mg {
            return Err(DoseError::InvalidConfig(
                format!("{} maximum dose must hold at least one pellet", label)
            ));
        }

        if (self.max_dose_mg % self.pellet_unit_mg).abs() > f64::EPSILON {
            return Err(DoseError::InvalidConfig(
                format!("{} maximum dose must be a whole number of pellets", label)
            ));
        }

        if f64::from(self.max_pellets_count) * self.pellet_unit_mg < self.max_dose_mg {
            return Err(DoseError::InvalidConfig(
                format!("{} maximum dose needs more than {} pellets", label, self.max_pellets_count)
            ));
        }

        if self.t100_multiplier <= 0.0 {
            return Err(DoseError::InvalidConfig(
                format!("{} base-dose multiplier must be positive", label)
            ));
        }

        if self.expected_duration_days <= 0 || self.duration_floor_days <= 0 {
            return Err(DoseError::InvalidConfig(
                format!("{} durations must be positive", label)
            ));
        }

        self.tier_coefficients.validate(&label)
    }
}

impl Default for EstradiolConfig {
    fn default() -> Self {
        Self {
            increment_mg: 6.25,
            expected_duration_days: 90,
            tier_coefficients: TierCoefficients {
                conservative: 0.10,
                standard: 0.15,
                aggressive: 0.20,
                high_performance: 0.25,
            },
            core_supplements: vec![vitamin_d3()],
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            t100: ProtocolConfig::t100(),
            t200: ProtocolConfig::t200(),
            estradiol: EstradiolConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> DoseResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn protocol(&self, pellet_type: PelletType) -> &ProtocolConfig {
        match pellet_type {
            PelletType::T100 => &self.t100,
            PelletType::T200 => &self.t200,
        }
    }

    pub fn validate(&self) -> DoseResult<()> {
        if self.t100.pellet_type != PelletType::T100 || self.t200.pellet_type != PelletType::T200 {
            return Err(DoseError::InvalidConfig(
                "Protocol sections must match their pellet types".to_string()
            ));
        }

        self.t100.validate()?;
        self.t200.validate()?;

        if self.estradiol.increment_mg <= 0.0 {
            return Err(DoseError::InvalidConfig(
                "Estradiol pellet increment must be positive".to_string()
            ));
        }
        self.estradiol.tier_coefficients.validate("Estradiol")
    }
}
