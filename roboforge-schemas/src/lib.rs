pub mod experiment;
pub mod file_formats;
pub mod lfa;
pub mod mastermix;
pub mod plate;
pub mod reagent;
pub mod worklist;
