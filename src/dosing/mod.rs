pub mod breakdown;
pub mod estradiol;
pub mod final_dose;
pub mod modifiers;
pub mod protocol;
pub mod regimen;
pub mod suggestions;
pub mod testosterone;
pub mod validator;

pub use breakdown::{Advice, Advisories, Breakdown, BreakdownEntry, BreakdownStep, RunningDose, StageOutcome};
pub use estradiol::EstradiolEngine;
pub use protocol::{recommend_pellet_protocol_for_male, ProtocolRecommendation, RecommendationStrength};
pub use suggestions::{suggest_estradiol_dosing, suggest_testosterone_dosing, TierSummary};
pub use testosterone::TestosteroneEngine;
pub use validator::{validate_t100_male_calculation, ValidationReport};
