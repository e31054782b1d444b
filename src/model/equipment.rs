use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::store::Record;

pub const DEFAULT_STATUS: &str = "available";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentKind {
    Mouse,
    Monitor,
    Blk2go,
    P40Scanner,
    Ipad,
    Pc,
    HdmiCable,
    PowerBank,
    TotalStation,
    IpadPro,
    Keyboard,
    MousePad,
}

impl EquipmentKind {
    pub const ALL: [EquipmentKind; 12] = [
        EquipmentKind::Mouse,
        EquipmentKind::Monitor,
        EquipmentKind::Blk2go,
        EquipmentKind::P40Scanner,
        EquipmentKind::Ipad,
        EquipmentKind::Pc,
        EquipmentKind::HdmiCable,
        EquipmentKind::PowerBank,
        EquipmentKind::TotalStation,
        EquipmentKind::IpadPro,
        EquipmentKind::Keyboard,
        EquipmentKind::MousePad,
    ];

    pub fn from_code(code: &str) -> Result<Self, AppError> {
        let code = code.to_lowercase();
        EquipmentKind::ALL
            .into_iter()
            .find(|kind| kind.code() == code)
            .ok_or_else(|| {
                AppError::BadRequest(format!(
                    "Unsupported equipment: '{}'. Supported: {}",
                    code,
                    EquipmentKind::ALL.map(|k| k.code()).join(", ")
                ))
            })
    }

    pub fn code(&self) -> &'static str {
        match self {
            EquipmentKind::Mouse => "mouse",
            EquipmentKind::Monitor => "monitor",
            EquipmentKind::Blk2go => "blk2go",
            EquipmentKind::P40Scanner => "p40_scanner",
            EquipmentKind::Ipad => "ipad",
            EquipmentKind::Pc => "pc",
            EquipmentKind::HdmiCable => "hdmi_cable",
            EquipmentKind::PowerBank => "power_bank",
            EquipmentKind::TotalStation => "total_station",
            EquipmentKind::IpadPro => "ipad_pro",
            EquipmentKind::Keyboard => "keyboard",
            EquipmentKind::MousePad => "mouse_pad",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            EquipmentKind::Mouse => "Mouse",
            EquipmentKind::Monitor => "Monitor",
            EquipmentKind::Blk2go => "BLK2GO",
            EquipmentKind::P40Scanner => "P40 Scanner",
            EquipmentKind::Ipad => "iPad",
            EquipmentKind::Pc => "PC",
            EquipmentKind::HdmiCable => "HDMI Cable",
            EquipmentKind::PowerBank => "Power Bank",
            EquipmentKind::TotalStation => "Total Station",
            EquipmentKind::IpadPro => "iPad Pro",
            EquipmentKind::Keyboard => "Keyboard",
            EquipmentKind::MousePad => "Mouse Pad",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Equipment {
    pub id: u64,
    pub name: EquipmentKind,
    pub description: Option<String>,
    pub status: String,
}

impl Equipment {
    /// Case-insensitive match on the kind code or display name.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.name.code().contains(&query)
            || self.name.display_name().to_lowercase().contains(&query)
    }
}

impl Record for Equipment {
    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }
}
