//! Supplement and monitoring-schedule builders.
//!
//! Both lists start from a fixed core and only ever grow; later findings
//! never remove an earlier item. A supplement already on the list by name is
//! not added twice.

use chrono::{Duration, NaiveDate};

use crate::config::ProtocolConfig;
use crate::models::{
    AntioxidantSnpsStatus, ClinicalParams, GeneticData, MonitoringScheduleEntry, Srd5a2Status,
    Supplement,
};

fn add_once(supplements: &mut Vec<Supplement>, supplement: Supplement) {
    if !supplements.iter().any(|existing| existing.name == supplement.name) {
        supplements.push(supplement);
    }
}

pub fn build_supplements(
    protocol: &ProtocolConfig,
    bmi: f64,
    genetics: &GeneticData,
    clinical: &ClinicalParams,
) -> Vec<Supplement> {
    let mut supplements = protocol.core_supplements.clone();

    if bmi >= 35.0 {
        add_once(&mut supplements, Supplement::new("DIM", "300mg", "Daily", "Reduce estrogen conversion"));
        add_once(
            &mut supplements,
            Supplement::new("Anastrozole", "0.5mg", "2x/week", "Aromatase inhibition for severe obesity"),
        );
    } else if bmi >= 30.0 {
        add_once(&mut supplements, Supplement::new("DIM", "200-300mg", "Daily", "Reduce estrogen conversion"));
    }

    if genetics.cyp19a1_high() {
        add_once(
            &mut supplements,
            Supplement::new("DIM", "200-300mg", "Daily", "Offset high CYP19A1 aromatase expression"),
        );
    }

    if matches!(genetics.srd5a2, Some(Srd5a2Status::High | Srd5a2Status::HighActivity)) {
        add_once(&mut supplements, Supplement::new("Zinc", "30mg", "Daily", "Moderate DHT conversion"));
        add_once(&mut supplements, Supplement::new("Saw palmetto", "320mg", "Daily", "Moderate DHT conversion"));
    }

    let low_vitamin_d = clinical.vitamin_d_level.is_some_and(|level| level < 30.0);
    if genetics.vdr_low_function() || low_vitamin_d {
        add_once(
            &mut supplements,
            Supplement::new("Vitamin K2", "100-200mcg", "Daily", "Pair with high-dose vitamin D3"),
        );
    }

    if genetics.antioxidant_snps == Some(AntioxidantSnpsStatus::PoorFunction) {
        add_once(
            &mut supplements,
            Supplement::new("NAC (N-acetylcysteine)", "600mg", "Daily", "Antioxidant support"),
        );
        add_once(&mut supplements, Supplement::new("Zinc", "30mg", "Daily", "Antioxidant support"));
    }

    if clinical.post_insertion_estradiol.is_some_and(|e2| e2 >= 60.0) {
        add_once(&mut supplements, Supplement::new("DIM", "300mg", "Daily", "Lower peak estradiol"));
    }

    supplements
}

struct ScheduleBuilder {
    insertion_date: Option<NaiveDate>,
    entries: Vec<MonitoringScheduleEntry>,
}

impl ScheduleBuilder {
    fn add(&mut self, timepoint: &str, offset_days: Option<i64>, tests: &str, purpose: &str, notes: Option<&str>) {
        let ideal_date = match (self.insertion_date, offset_days) {
            (Some(date), Some(days)) => Some(date + Duration::days(days)),
            _ => None,
        };
        self.entries.push(MonitoringScheduleEntry {
            timepoint: timepoint.to_string(),
            ideal_date,
            tests_required: tests.to_string(),
            purpose: purpose.to_string(),
            notes: notes.map(str::to_string),
        });
    }
}

pub fn build_monitoring_schedule(
    protocol: &ProtocolConfig,
    genetics: &GeneticData,
    clinical: &ClinicalParams,
    unfloored_duration_days: i32,
) -> Vec<MonitoringScheduleEntry> {
    let mut schedule = ScheduleBuilder {
        insertion_date: clinical.insertion_date,
        entries: Vec::new(),
    };

    schedule.add(
        "Baseline",
        Some(0),
        "Total testosterone, free testosterone, estradiol, CBC, PSA",
        "Establish pre-insertion reference values",
        None,
    );
    schedule.add(
        "Peak (6 weeks)",
        Some(protocol.peak_labs_days),
        "Total testosterone, estradiol, hematocrit",
        "Confirm peak levels and screen for erythrocytosis",
        None,
    );
    schedule.add(
        "Trough",
        Some(protocol.trough_assessment_days),
        "Total testosterone, symptom review",
        "Assess duration and plan next insertion",
        None,
    );
    schedule.add(
        "Re-insertion",
        Some(i64::from(unfloored_duration_days)),
        "Symptom review",
        "Expected end of pellet effect",
        None,
    );

    if genetics.cyp19a1_high() {
        schedule.add(
            "Every follow-up",
            None,
            "Estradiol",
            "High CYP19A1 aromatase expression",
            None,
        );
    }

    if matches!(genetics.srd5a2, Some(Srd5a2Status::High | Srd5a2Status::HighActivity)) {
        schedule.add(
            "Peak (6 weeks)",
            Some(protocol.peak_labs_days),
            "DHT",
            "High SRD5A2 activity",
            Some("Watch for acne, hair loss, oily skin"),
        );
    }

    if genetics.vdr_low_function() || clinical.vitamin_d_level.is_some_and(|level| level < 30.0) {
        schedule.add(
            "Peak (6 weeks)",
            Some(protocol.peak_labs_days),
            "25-OH vitamin D",
            "Confirm vitamin D repletion",
            Some("Target >40 ng/mL"),
        );
    }

    if let Some(e2) = clinical.post_insertion_estradiol {
        if protocol.is_t100() && e2 >= 80.0 {
            schedule.add(
                "2-3 weeks",
                Some(17),
                "Estradiol",
                "Urgent recheck of very high estradiol",
                Some("Anastrozole 0.5mg three times weekly in the meantime"),
            );
        } else if e2 >= 60.0 {
            schedule.add("4-6 weeks", Some(35), "Estradiol", "Recheck high estradiol", None);
        }
    }

    if clinical.current_psa.is_some_and(|psa| (2.5..=4.0).contains(&psa)) {
        schedule.add("6 weeks", Some(42), "PSA", "Borderline PSA follow-up", None);
        schedule.add("12 weeks", Some(84), "PSA", "Borderline PSA follow-up", None);
    }

    schedule.entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Cyp19a1Status, VdrStatus};

    #[test]
    fn test_core_supplements_come_first() {
        let supplements = build_supplements(
            &ProtocolConfig::t100(),
            36.0,
            &GeneticData::default(),
            &ClinicalParams::default(),
        );
        assert_eq!(supplements[0].name, "Vitamin D3");
        assert!(supplements[0].is_core);
        assert_eq!(supplements[1].name, "DIM");
        assert_eq!(supplements[2].name, "Anastrozole");
    }

    #[test]
    fn test_supplements_are_not_duplicated() {
        let genetics = GeneticData {
            cyp19a1: Some(Cyp19a1Status::HighExpression),
            srd5a2: Some(Srd5a2Status::High),
            antioxidant_snps: Some(AntioxidantSnpsStatus::PoorFunction),
            ..Default::default()
        };
        let clinical = ClinicalParams {
            post_insertion_estradiol: Some(70.0),
            ..Default::default()
        };

        let supplements = build_supplements(&ProtocolConfig::t100(), 31.0, &genetics, &clinical);
        let names: Vec<&str> = supplements.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Vitamin D3", "DIM", "Zinc", "Saw palmetto", "NAC (N-acetylcysteine)"]
        );
    }

    #[test]
    fn test_schedule_dates_follow_insertion_date() {
        let clinical = ClinicalParams {
            insertion_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            ..Default::default()
        };

        let schedule = build_monitoring_schedule(&ProtocolConfig::t100(), &GeneticData::default(), &clinical, 105);
        assert_eq!(schedule.len(), 4);
        assert_eq!(schedule[1].ideal_date, NaiveDate::from_ymd_opt(2024, 2, 12));
        assert_eq!(schedule[3].ideal_date, NaiveDate::from_ymd_opt(2024, 4, 15));
    }

    #[test]
    fn test_schedule_without_insertion_date_has_no_dates() {
        let genetics = GeneticData {
            vdr: Some(VdrStatus::LowFunction),
            ..Default::default()
        };
        let schedule = build_monitoring_schedule(&ProtocolConfig::t200(), &genetics, &ClinicalParams::default(), 150);
        assert_eq!(schedule.len(), 5);
        assert!(schedule.iter().all(|entry| entry.ideal_date.is_none()));
        assert_eq!(schedule[4].tests_required, "25-OH vitamin D");
    }

    #[test]
    fn test_very_high_estradiol_gets_urgent_recheck() {
        let clinical = ClinicalParams {
            post_insertion_estradiol: Some(90.0),
            ..Default::default()
        };
        let schedule = build_monitoring_schedule(&ProtocolConfig::t100(), &GeneticData::default(), &clinical, 105);
        assert_eq!(schedule.last().unwrap().timepoint, "2-3 weeks");

        let schedule = build_monitoring_schedule(&ProtocolConfig::t200(), &GeneticData::default(), &clinical, 150);
        assert_eq!(schedule.last().unwrap().timepoint, "4-6 weeks");
    }
}
