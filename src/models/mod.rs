pub mod patient;
pub mod result;

pub use patient::*;
pub use result::*;
