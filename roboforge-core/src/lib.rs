//! Volume calculation and worklist generation for NAAT (PCR/LAMP) and LFA
//! liquid-handling runs.
//!
//! The NAAT path goes through [`worklist::NaatWorklistBuilder`]; the LFA path
//! is a single call to [`lfa::generate_lfa_worklist`]. Both return plain row
//! vectors which [`export`] turns into the robot's CSV files.

pub mod error;
pub mod export;
pub mod lfa;
pub mod liquid_class;
pub mod plate;
pub mod solutions;
pub mod validation;
pub mod volume;
pub mod worklist;

pub use error::{CalculationError, RoboforgeError, VolumeError};
