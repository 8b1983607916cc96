//! Append-only audit trail of a dosing calculation.
//!
//! Every modifier stage returns its entries instead of mutating a shared
//! list; the engine concatenates them in stage order. The order matters for
//! display (each entry's `previous_value` is the prior entry's
//! `adjusted_value`) but not for the final dose, since every numeric effect
//! is a multiplication.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakdownStep {
    BaseDose,
    ShbgModifier,
    AgeModifier,
    BmiAromatizationModifier,
    MedicationModifier,
    GeneticModifier,
    VitaminDLevelVdrConsiderationsModifier,
    EstradiolMonitoringManagementModifier,
    PsaProstateMonitoringModifier,
    FinalDose,
}

/// Advisory category attached to a breakdown entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advice {
    Alert,
    CriticalAlert,
    Warning,
    Caution,
    Suggestion,
    Recommendation,
    StrongRecommendation,
    Consideration,
    Note,
    Contraindication,
    Hold,
    Treatment,
    Action,
    UrgentAction,
    Prerequisite,
    Requirement,
    Supplement,
    Monitoring,
    UrgentMonitoring,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Advisories {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alerts: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub critical_alerts: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cautions: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub recommendations: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub strong_recommendations: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub considerations: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub contraindications: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub holds: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub treatments: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub urgent_actions: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub prerequisites: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub requirements: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub supplements: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub monitoring: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub urgent_monitoring: Vec<String>,
}

impl Advisories {
    pub fn with(mut self, kind: Advice, message: impl Into<String>) -> Self {
        self.push(kind, message);
        self
    }

    pub fn push(&mut self, kind: Advice, message: impl Into<String>) {
        self.list_mut(kind).push(message.into());
    }

    pub fn list(&self, kind: Advice) -> &[String] {
        match kind {
            Advice::Alert => &self.alerts,
            Advice::CriticalAlert => &self.critical_alerts,
            Advice::Warning => &self.warnings,
            Advice::Caution => &self.cautions,
            Advice::Suggestion => &self.suggestions,
            Advice::Recommendation => &self.recommendations,
            Advice::StrongRecommendation => &self.strong_recommendations,
            Advice::Consideration => &self.considerations,
            Advice::Note => &self.notes,
            Advice::Contraindication => &self.contraindications,
            Advice::Hold => &self.holds,
            Advice::Treatment => &self.treatments,
            Advice::Action => &self.actions,
            Advice::UrgentAction => &self.urgent_actions,
            Advice::Prerequisite => &self.prerequisites,
            Advice::Requirement => &self.requirements,
            Advice::Supplement => &self.supplements,
            Advice::Monitoring => &self.monitoring,
            Advice::UrgentMonitoring => &self.urgent_monitoring,
        }
    }

    fn list_mut(&mut self, kind: Advice) -> &mut Vec<String> {
        match kind {
            Advice::Alert => &mut self.alerts,
            Advice::CriticalAlert => &mut self.critical_alerts,
            Advice::Warning => &mut self.warnings,
            Advice::Caution => &mut self.cautions,
            Advice::Suggestion => &mut self.suggestions,
            Advice::Recommendation => &mut self.recommendations,
            Advice::StrongRecommendation => &mut self.strong_recommendations,
            Advice::Consideration => &mut self.considerations,
            Advice::Note => &mut self.notes,
            Advice::Contraindication => &mut self.contraindications,
            Advice::Hold => &mut self.holds,
            Advice::Treatment => &mut self.treatments,
            Advice::Action => &mut self.actions,
            Advice::UrgentAction => &mut self.urgent_actions,
            Advice::Prerequisite => &mut self.prerequisites,
            Advice::Requirement => &mut self.requirements,
            Advice::Supplement => &mut self.supplements,
            Advice::Monitoring => &mut self.monitoring,
            Advice::UrgentMonitoring => &mut self.urgent_monitoring,
        }
    }
}

/// Dose and expected pellet duration as they flow through the stages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunningDose {
    pub dose_mg: f64,
    pub duration_days: i32,
}

impl RunningDose {
    pub fn new(dose_mg: f64, duration_days: i32) -> Self {
        Self { dose_mg, duration_days }
    }

    pub fn scaled(self, multiplier: f64) -> Self {
        Self { dose_mg: self.dose_mg * multiplier, ..self }
    }

    pub fn shifted(self, days: i32) -> Self {
        Self { duration_days: self.duration_days + days, ..self }
    }

    pub fn with_duration(self, days: i32) -> Self {
        Self { duration_days: days, ..self }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownEntry {
    pub step: BreakdownStep,
    pub condition: String,
    pub previous_value: f64,
    pub multiplier: f64,
    pub adjusted_value: f64,
    pub previous_duration_days: i32,
    pub adjusted_duration_days: i32,
    pub additional_duration_days: i32,
    #[serde(flatten)]
    pub advisories: Advisories,
}

impl BreakdownEntry {
    /// Entry for a stage that moved the running dose from `before` to `after`.
    pub fn transition(
        step: BreakdownStep,
        condition: impl Into<String>,
        before: RunningDose,
        multiplier: f64,
        after: RunningDose,
        advisories: Advisories,
    ) -> Self {
        Self {
            step,
            condition: condition.into(),
            previous_value: before.dose_mg,
            multiplier,
            adjusted_value: after.dose_mg,
            previous_duration_days: before.duration_days,
            adjusted_duration_days: after.duration_days,
            additional_duration_days: after.duration_days - before.duration_days,
            advisories,
        }
    }

    /// Entry for a stage that recorded advice but left dose and duration alone.
    pub fn unchanged(
        step: BreakdownStep,
        condition: impl Into<String>,
        running: RunningDose,
        advisories: Advisories,
    ) -> Self {
        Self::transition(step, condition, running, 1.0, running, advisories)
    }
}

/// What one modifier stage hands back to the engine.
#[derive(Debug, Clone)]
pub struct StageOutcome {
    pub running: RunningDose,
    pub multiplier: f64,
    pub entries: Vec<BreakdownEntry>,
    pub duration_warning: bool,
    pub t200_triggered: bool,
    pub duration_alerts: Vec<String>,
}

impl StageOutcome {
    pub fn new(running: RunningDose) -> Self {
        Self {
            running,
            multiplier: 1.0,
            entries: Vec::new(),
            duration_warning: false,
            t200_triggered: false,
            duration_alerts: Vec::new(),
        }
    }

    /// Scale the dose and shift the duration, recording the transition.
    pub fn adjust(
        &mut self,
        step: BreakdownStep,
        condition: &str,
        multiplier: f64,
        duration_shift_days: i32,
        advisories: Advisories,
    ) {
        let before = self.running;
        let after = before.scaled(multiplier).shifted(duration_shift_days);
        self.entries.push(BreakdownEntry::transition(
            step, condition, before, multiplier, after, advisories,
        ));
        self.running = after;
        self.multiplier *= multiplier;
    }

    /// Record advice without touching dose or duration.
    pub fn note(&mut self, step: BreakdownStep, condition: &str, advisories: Advisories) {
        self.entries.push(BreakdownEntry::unchanged(step, condition, self.running, advisories));
    }

    /// Record a no-op entry if no branch of the stage fired.
    pub fn or_unchanged(mut self, step: BreakdownStep, condition: &str) -> Self {
        if self.entries.is_empty() {
            self.entries.push(BreakdownEntry::unchanged(
                step,
                condition,
                self.running,
                Advisories::default(),
            ));
        }
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct Breakdown {
    entries: Vec<BreakdownEntry>,
}

impl Breakdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, entry: BreakdownEntry) {
        self.entries.push(entry);
    }

    pub fn extend(&mut self, entries: impl IntoIterator<Item = BreakdownEntry>) {
        self.entries.extend(entries);
    }

    pub fn into_entries(self) -> Vec<BreakdownEntry> {
        self.entries
    }

    /// All messages of the given kinds, in entry order then kind order.
    pub fn collect(&self, kinds: &[Advice]) -> Vec<String> {
        collect_advice(&self.entries, kinds)
    }

    /// Net duration change contributed by every entry of `step`.
    pub fn additional_days(&self, step: BreakdownStep) -> i32 {
        self.entries
            .iter()
            .filter(|entry| entry.step == step)
            .map(|entry| entry.additional_duration_days)
            .sum()
    }
}

pub fn collect_advice(entries: &[BreakdownEntry], kinds: &[Advice]) -> Vec<String> {
    entries
        .iter()
        .flat_map(|entry| {
            kinds
                .iter()
                .flat_map(move |kind| entry.advisories.list(*kind).iter().cloned())
        })
        .collect()
}
