//! Drivers and vehicle models

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Driver profile. The vehicle a driver runs is a property of each trip,
/// not of the driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub id: Uuid,
    pub name: String,
}

/// Vehicle size class used to pick a rate table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleCategory {
    Small,
    Medium,
    Large,
    ExtraLarge,
    /// Anything the rate tables do not know; priced with the fallback rates.
    Other(String),
}

impl VehicleCategory {
    /// Parse the category label stored on vehicles_model. Never fails.
    pub fn parse(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "small" => VehicleCategory::Small,
            "medium" => VehicleCategory::Medium,
            "large" => VehicleCategory::Large,
            "extra large" | "extra_large" | "extra-large" | "xl" => VehicleCategory::ExtraLarge,
            _ => VehicleCategory::Other(label.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            VehicleCategory::Small => "small",
            VehicleCategory::Medium => "medium",
            VehicleCategory::Large => "large",
            VehicleCategory::ExtraLarge => "extra large",
            VehicleCategory::Other(label) => label,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AcType {
    #[serde(rename = "AC")]
    Ac,
    #[serde(rename = "Non AC")]
    NonAc,
}

impl AcType {
    /// Parse the AC label stored on vehicles_model; anything that is not a
    /// recognisable "non AC" spelling is treated as AC.
    pub fn parse(label: &str) -> Self {
        let normalized: String = label
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        if normalized == "nonac" {
            AcType::NonAc
        } else {
            AcType::Ac
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AcType::Ac => "AC",
            AcType::NonAc => "Non AC",
        }
    }
}

/// Row in vehicles_model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleModel {
    pub id: Uuid,
    pub name: String,
    pub category: VehicleCategory,
    pub ac_type: AcType,
    pub has_carrier: bool,
}
