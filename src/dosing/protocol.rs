//! T100 vs T200 recommendation for male patients.

use serde::{Deserialize, Serialize};

use crate::models::{GeneticData, LifestyleFactors, Medications, PelletType, ProtocolSelection};

pub const VALID_T100_INDICATIONS: [&str; 5] = [
    "first_time_pellet_trial",
    "prefer_shorter_duration",
    "athlete_precise_control",
    "frequent_monitoring_preference",
    "specific_metabolic_profile",
];

pub fn is_valid_t100_indication(indication: Option<&str>) -> bool {
    indication.is_some_and(|tag| VALID_T100_INDICATIONS.contains(&tag))
}

/// Ordered weakest to strongest push towards T200.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationStrength {
    Acceptable,
    Standard,
    Recommended,
    StronglyRecommended,
}

impl RecommendationStrength {
    pub fn label(&self) -> &'static str {
        match self {
            RecommendationStrength::StronglyRecommended => "strongly recommended",
            RecommendationStrength::Recommended => "recommended",
            RecommendationStrength::Acceptable => "acceptable",
            RecommendationStrength::Standard => "standard",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolRecommendation {
    pub protocol: PelletType,
    pub strength: RecommendationStrength,
    pub rationale: String,
    pub estimated_t100_duration: i32,
    pub estimated_t200_duration: i32,
    pub allow_t100_override: bool,
    pub fast_clearance_factors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t200_alternative: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t100_note: Option<String>,
}

/// Fast-clearance factors counted by the recommendation tree. UGT2B17
/// deletion is deliberately not counted here.
pub fn fast_clearance_factors(
    genetics: &GeneticData,
    medications: &Medications,
    lifestyle: &LifestyleFactors,
) -> Vec<String> {
    let mut factors = Vec::new();
    if genetics.cyp3a4_fast() {
        factors.push("CYP3A4 fast metabolizer".to_string());
    }
    if genetics.ugt2b17_fast() {
        factors.push("UGT2B17 fast metabolizer".to_string());
    }
    if medications.adhd_stimulants {
        factors.push("ADHD stimulants use".to_string());
    }
    if lifestyle.is_current_smoker() {
        factors.push("Current smoker".to_string());
    }
    factors
}

pub fn recommend_pellet_protocol_for_male(
    lifestyle: &LifestyleFactors,
    medications: &Medications,
    genetics: &GeneticData,
    selection: &ProtocolSelection,
) -> ProtocolRecommendation {
    let factors = fast_clearance_factors(genetics, medications, lifestyle);
    let indication = selection.t100_indication.as_deref();
    let has_t100_indication = is_valid_t100_indication(indication);
    let listed = factors.join(", ");

    let recommendation = |protocol, strength, rationale: String, t100_days, t200_days, allow_override| {
        ProtocolRecommendation {
            protocol,
            strength,
            rationale,
            estimated_t100_duration: t100_days,
            estimated_t200_duration: t200_days,
            allow_t100_override: allow_override,
            fast_clearance_factors: factors.clone(),
            t200_alternative: None,
            t100_note: None,
        }
    };

    match factors.len() {
        n if n >= 3 => recommendation(
            PelletType::T200,
            RecommendationStrength::StronglyRecommended,
            format!(
                "Multiple fast-clearance factors detected: {}. T100 duration would be <10 weeks. T200 is recommended.",
                listed
            ),
            60,
            90,
            false,
        ),
        2 => recommendation(
            PelletType::T200,
            RecommendationStrength::Recommended,
            format!(
                "Two fast-clearance factors present: {}. T100 duration would be 10-12 weeks. T200 is recommended.",
                listed
            ),
            75,
            105,
            false,
        ),
        1 if !has_t100_indication => recommendation(
            PelletType::T200,
            RecommendationStrength::Recommended,
            format!("One fast-clearance factor present: {}. T200 is standard protocol for males.", listed),
            90,
            120,
            true,
        ),
        _ if has_t100_indication => ProtocolRecommendation {
            t200_alternative: Some("T200 remains the standard protocol and provides longer duration".to_string()),
            ..recommendation(
                PelletType::T100,
                RecommendationStrength::Acceptable,
                format!("Valid T100 indication present: {}.", indication.unwrap_or_default()),
                105,
                150,
                true,
            )
        },
        _ => ProtocolRecommendation {
            t100_note: Some(
                "T100 acceptable if patient has specific preference, but requires valid clinical indication."
                    .to_string(),
            ),
            ..recommendation(
                PelletType::T200,
                RecommendationStrength::Standard,
                "T200 is the standard protocol for male patients. Provides 5-6 month duration with stable hormone levels."
                    .to_string(),
                90,
                120,
                true,
            )
        },
    }
}
