use serde::{Deserialize, Serialize};
use std::fmt;

/// The liquid family of a reagent. Drives liquid-class naming and tip rules.
///
/// Liquid types are lab-managed settings, so anything outside the built-in
/// set is carried verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LiquidType {
    Water,
    Buffer,
    Primers,
    Enzymes,
    Template,
    Organics,
    Detergent,
    /// The 20 µL mastermix class, which has its own fixed liquid class.
    Mastermix,
    Other(String),
}

impl LiquidType {
    pub fn as_str(&self) -> &str {
        match self {
            LiquidType::Water => "water",
            LiquidType::Buffer => "buffer",
            LiquidType::Primers => "primers",
            LiquidType::Enzymes => "enzymes",
            LiquidType::Template => "template",
            LiquidType::Organics => "organics",
            LiquidType::Detergent => "detergent",
            LiquidType::Mastermix => "mastermix",
            LiquidType::Other(name) => name,
        }
    }
}

impl From<&str> for LiquidType {
    fn from(value: &str) -> Self {
        let trimmed = value.trim();
        match trimmed.to_lowercase().as_str() {
            "water" => LiquidType::Water,
            "buffer" => LiquidType::Buffer,
            "primers" => LiquidType::Primers,
            "enzymes" => LiquidType::Enzymes,
            "template" => LiquidType::Template,
            "organics" => LiquidType::Organics,
            "detergent" => LiquidType::Detergent,
            "mastermix" => LiquidType::Mastermix,
            _ => LiquidType::Other(trimmed.to_string()),
        }
    }
}

impl From<String> for LiquidType {
    fn from(value: String) -> Self {
        LiquidType::from(value.as_str())
    }
}

impl From<LiquidType> for String {
    fn from(value: LiquidType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for LiquidType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DispenseType {
    #[serde(rename = "Jet_Empty", alias = "jet_empty", alias = "JetEmpty")]
    JetEmpty,
    #[default]
    #[serde(rename = "Surface_Empty", alias = "surface_empty", alias = "SurfaceEmpty")]
    SurfaceEmpty,
}

impl DispenseType {
    /// Value written to the `dispense_type` worklist column.
    pub fn as_str(&self) -> &'static str {
        match self {
            DispenseType::JetEmpty => "Jet_Empty",
            DispenseType::SurfaceEmpty => "Surface_Empty",
        }
    }

    /// Fragment used inside liquid-class names (first underscore dropped).
    pub fn class_fragment(&self) -> &'static str {
        match self {
            DispenseType::JetEmpty => "JetEmpty",
            DispenseType::SurfaceEmpty => "SurfaceEmpty",
        }
    }
}

impl fmt::Display for DispenseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TipWashing {
    Yes,
    #[default]
    No,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reagent {
    pub id: String,
    pub source: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub final_concentration: f64,
    #[serde(default)]
    pub stock_concentration: f64,
    pub liquid_type: LiquidType,
    #[serde(default)]
    pub dispense_type: DispenseType,
    #[serde(default)]
    pub tip_washing: TipWashing,
    #[serde(default)]
    pub order_index: Option<u32>,
}

impl Reagent {
    /// Water is volume-filled rather than concentration-computed.
    pub fn is_water(&self) -> bool {
        self.liquid_type == LiquidType::Water
    }

    /// Case-insensitive identity of the reagent's source tube.
    pub fn source_key(&self) -> String {
        self.source.trim().to_lowercase()
    }
}
