//! Runs an engine once per dosage tier so a clinician can compare them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::estradiol::EstradiolEngine;
use super::testosterone::TestosteroneEngine;
use crate::error::DoseResult;
use crate::models::{
    DosageTier, EstradiolDosageParams, EstradiolDosageResult, PelletType, TestosteroneDosageParams,
    TestosteroneDosageResult,
};

/// Headline numbers for one tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierSummary {
    pub tier: DosageTier,
    pub final_dose_mg: f64,
    pub pellet_count: f64,
    pub expected_duration_days: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pellet_type: Option<PelletType>,
}

impl From<&TestosteroneDosageResult> for TierSummary {
    fn from(result: &TestosteroneDosageResult) -> Self {
        Self {
            tier: result.tier,
            final_dose_mg: result.dosing_calculation.final_dose_mg,
            pellet_count: result.dosing_calculation.pellet_count,
            expected_duration_days: result.clinical_recommendations.expected_duration_days,
            pellet_type: Some(result.pellet_type),
        }
    }
}

impl From<&EstradiolDosageResult> for TierSummary {
    fn from(result: &EstradiolDosageResult) -> Self {
        Self {
            tier: result.tier,
            final_dose_mg: result.dosing_calculation.final_dose_mg,
            pellet_count: f64::from(result.dosing_calculation.pellet_count),
            expected_duration_days: result.clinical_recommendations.expected_duration_days,
            pellet_type: None,
        }
    }
}

pub fn suggest_testosterone_dosing(
    engine: &TestosteroneEngine,
    params: &TestosteroneDosageParams,
) -> DoseResult<BTreeMap<DosageTier, TestosteroneDosageResult>> {
    DosageTier::ALL
        .into_iter()
        .map(|tier| {
            let tiered = TestosteroneDosageParams { tier, ..params.clone() };
            engine.calculate_dosage(&tiered).map(|result| (tier, result))
        })
        .collect()
}

pub fn suggest_estradiol_dosing(
    engine: &EstradiolEngine,
    params: &EstradiolDosageParams,
) -> DoseResult<BTreeMap<DosageTier, EstradiolDosageResult>> {
    DosageTier::ALL
        .into_iter()
        .map(|tier| {
            let tiered = EstradiolDosageParams { tier, ..params.clone() };
            engine.calculate_dosage(&tiered).map(|result| (tier, result))
        })
        .collect()
}

pub fn summarize<'a, R: 'a>(results: &'a BTreeMap<DosageTier, R>) -> Vec<TierSummary>
where
    TierSummary: From<&'a R>,
{
    results.values().map(TierSummary::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::models::{
        BiologicalSex, ClinicalParams, GeneticData, LifestyleFactors, Medications, PatientDemographics,
        ProtocolSelection,
    };

    fn demographics(sex: BiologicalSex) -> PatientDemographics {
        PatientDemographics {
            weight_kg: 80.0,
            height_cm: 175.0,
            age: 35,
            biological_sex: sex,
        }
    }

    #[test]
    fn test_testosterone_suggestions_cover_every_tier_in_order() {
        let engine = TestosteroneEngine::new(EngineConfig::default()).unwrap();
        let params = TestosteroneDosageParams {
            patient_demographics: demographics(BiologicalSex::Male),
            clinical: ClinicalParams::default(),
            lifestyle_factors: LifestyleFactors::default(),
            medications: Medications::default(),
            genetic_data: GeneticData::default(),
            tier: DosageTier::Conservative,
            protocol_selection: ProtocolSelection {
                pellet_type: PelletType::T100,
                t100_indication: None,
            },
        };

        let suggestions = suggest_testosterone_dosing(&engine, &params).unwrap();
        assert_eq!(suggestions.len(), 4);

        let summary = summarize(&suggestions);
        let doses: Vec<f64> = summary.iter().map(|s| s.final_dose_mg).collect();
        // 80 kg x 7/9/12/15 x 0.6 = 336, 432, 576, 720.
        assert_eq!(doses, vec![300.0, 400.0, 600.0, 700.0]);
        assert_eq!(summary[3].tier, DosageTier::HighPerformance);
        assert_eq!(summary[0].pellet_type, Some(PelletType::T100));
    }

    #[test]
    fn test_estradiol_suggestions_never_decrease_with_tier() {
        let engine = EstradiolEngine::new(&EngineConfig::default()).unwrap();
        let params = EstradiolDosageParams {
            patient_demographics: demographics(BiologicalSex::Female),
            clinical: ClinicalParams::default(),
            tier: DosageTier::Standard,
            genetic_data: GeneticData::default(),
        };

        let summary = summarize(&suggest_estradiol_dosing(&engine, &params).unwrap());
        assert_eq!(summary.len(), 4);
        assert!(summary.windows(2).all(|pair| pair[0].final_dose_mg <= pair[1].final_dose_mg));
        assert!(summary.iter().all(|s| s.pellet_type.is_none()));
    }
}
