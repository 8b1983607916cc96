pub mod bmi;
pub mod config;
pub mod dosing;
pub mod error;
pub mod models;
pub mod output;

pub use config::EngineConfig;
pub use dosing::{EstradiolEngine, TestosteroneEngine};
pub use error::{DoseError, DoseResult};
