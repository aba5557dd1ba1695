use serde::{Deserialize, Serialize};

/// One physical pipetting instruction of a NAAT worklist.
///
/// Field order is the robot's column order and must not change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorklistRow {
    pub step: String,
    pub dx: f64,
    pub dz: f64,
    #[serde(rename = "volume_uL")]
    pub volume_ul: f64,
    pub liquid_class: String,
    pub timer_delta: f64,
    pub source: String,
    pub step_index: u32,
    pub destination: u32,
    pub group_number: u32,
    pub timer_group_check: u32,
    pub guid: u32,
    pub from_path: String,
    pub asp_mixing: u32,
    pub dispense_type: String,
    pub tip_type: u32,
    pub touchoff_dis: i32,
    pub to_plate: String,
    pub to_well: u32,
    pub from_plate: String,
    pub from_well: u32,
}

/// One pipetting instruction of an LFA worklist. Same robot columns as
/// [`WorklistRow`] plus the liquid-type trailer the LFA deck software reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LfaWorklistRow {
    pub step: String,
    pub dx: f64,
    pub dz: f64,
    pub volume_ul: f64,
    pub liquid_class: String,
    pub timer_delta: f64,
    pub source: String,
    pub step_index: u32,
    pub destination: u32,
    pub group_number: u32,
    pub timer_group_check: u32,
    pub guid: u32,
    pub from_path: String,
    pub asp_mixing: u32,
    pub dispense_type: String,
    pub tip_type: u32,
    pub touchoff_dis: i32,
    pub to_plate: String,
    pub to_well: u32,
    pub from_plate: String,
    pub from_well: u32,
    pub liquid_type_x: String,
    pub liquid_type_y: String,
    pub liquid_type: String,
}

/// "Load this volume of this solution into this well" line for the operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSolutionRow {
    pub solution: String,
    pub plate_well: String,
    pub user_input: f64,
}
