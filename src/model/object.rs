use std::fmt;

use serde::{Deserialize, Serialize};

use super::ids::{ObjectId, StageId};

/// Work status of an object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkStatus {
    #[default]
    NotStarted,
    InProgress,
    Paused,
    Completed,
}

impl WorkStatus {
    pub const ALL: [WorkStatus; 4] = [
        WorkStatus::NotStarted,
        WorkStatus::InProgress,
        WorkStatus::Paused,
        WorkStatus::Completed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WorkStatus::NotStarted => "not-started",
            WorkStatus::InProgress => "in-progress",
            WorkStatus::Paused => "paused",
            WorkStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<WorkStatus> {
        WorkStatus::ALL.into_iter().find(|ws| ws.as_str() == s)
    }
}

impl fmt::Display for WorkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handover phase of an object, `1` through `5`.
///
/// Independent of the project's stage list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeliveryStage(u8);

impl DeliveryStage {
    pub fn new(n: u8) -> Option<DeliveryStage> {
        (1..=5).contains(&n).then_some(DeliveryStage(n))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn parse(s: &str) -> Option<DeliveryStage> {
        s.trim().parse::<u8>().ok().and_then(DeliveryStage::new)
    }
}

impl TryFrom<String> for DeliveryStage {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        DeliveryStage::parse(&s).ok_or_else(|| format!("invalid delivery stage: {}", s))
    }
}

impl From<DeliveryStage> for String {
    fn from(d: DeliveryStage) -> String {
        d.0.to_string()
    }
}

impl fmt::Display for DeliveryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Telecom operator serving an object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "МТС")]
    Mts,
    #[serde(rename = "Мегафон")]
    Megafon,
    #[serde(rename = "Билайн")]
    Beeline,
    #[serde(rename = "Ростелеком")]
    Rostelecom,
    #[default]
    #[serde(rename = "Другой")]
    Other,
}

impl Operator {
    pub const ALL: [Operator; 5] = [
        Operator::Mts,
        Operator::Megafon,
        Operator::Beeline,
        Operator::Rostelecom,
        Operator::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Operator::Mts => "МТС",
            Operator::Megafon => "Мегафон",
            Operator::Beeline => "Билайн",
            Operator::Rostelecom => "Ростелеком",
            Operator::Other => "Другой",
        }
    }

    /// Accepts the display label or an ASCII alias (`mts`, `megafon`, ...)
    pub fn parse(s: &str) -> Option<Operator> {
        let s = s.trim();
        let alias = match s.to_lowercase().as_str() {
            "mts" => Some(Operator::Mts),
            "megafon" => Some(Operator::Megafon),
            "beeline" => Some(Operator::Beeline),
            "rostelecom" => Some(Operator::Rostelecom),
            "other" => Some(Operator::Other),
            _ => None,
        };
        alias.or_else(|| Operator::ALL.into_iter().find(|op| op.label() == s))
    }
}

/// Channel type of an object's telecom link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConnectionType {
    #[serde(rename = "GSM")]
    Gsm,
    #[serde(rename = "Оптический канал")]
    Optical,
    #[serde(rename = "WI-FI")]
    WiFi,
    #[default]
    #[serde(rename = "Другое")]
    Other,
}

impl ConnectionType {
    pub const ALL: [ConnectionType; 4] = [
        ConnectionType::Gsm,
        ConnectionType::Optical,
        ConnectionType::WiFi,
        ConnectionType::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ConnectionType::Gsm => "GSM",
            ConnectionType::Optical => "Оптический канал",
            ConnectionType::WiFi => "WI-FI",
            ConnectionType::Other => "Другое",
        }
    }

    /// Accepts the display label or an ASCII alias (`gsm`, `optical`, `wifi`, `other`)
    pub fn parse(s: &str) -> Option<ConnectionType> {
        let s = s.trim();
        let alias = match s.to_lowercase().as_str() {
            "gsm" => Some(ConnectionType::Gsm),
            "optical" | "fiber" => Some(ConnectionType::Optical),
            "wifi" | "wi-fi" => Some(ConnectionType::WiFi),
            "other" => Some(ConnectionType::Other),
            _ => None,
        };
        alias.or_else(|| ConnectionType::ALL.into_iter().find(|ct| ct.label() == s))
    }
}

/// A physical installation or work site tracked within a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectObject {
    pub id: ObjectId,
    pub name: String,

    // --- Location ---
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub district: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub coordinates: String,

    // --- Permits ---
    #[serde(default)]
    pub inspection: bool,
    #[serde(default)]
    pub pole_installation_permit: bool,
    #[serde(default)]
    pub power_connection_permit: bool,
    #[serde(default)]
    pub other_permits: String,

    // --- Equipment ---
    #[serde(default)]
    pub equipment_number: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,

    // --- Work checklist ---
    #[serde(default)]
    pub verification_certificate: bool,
    #[serde(default)]
    pub executive_documentation: bool,
    #[serde(default)]
    pub construction_work: bool,
    #[serde(default)]
    pub commissioning_work: bool,
    #[serde(default)]
    pub traffic_arrangement: bool,
    #[serde(default)]
    pub web_upload: bool,
    #[serde(default)]
    pub violation_recording: bool,
    /// Codes from the violation catalog, no duplicates
    #[serde(default)]
    pub violation_types: Vec<String>,

    #[serde(default)]
    pub documentation_url: String,
    #[serde(default)]
    pub messenger_link: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub work_status: WorkStatus,

    /// Weak reference into the owning project's stage list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage_id: Option<StageId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_stage: Option<DeliveryStage>,

    // --- Telecom ---
    #[serde(default)]
    pub operator: Operator,
    #[serde(default)]
    pub connection_type: ConnectionType,
    #[serde(default)]
    pub tariff_cost: f64,
}

fn default_quantity() -> u32 {
    1
}

impl ProjectObject {
    /// An object with the given identity and name, every other field defaulted
    pub fn blank(id: ObjectId, name: impl Into<String>) -> Self {
        ProjectObject {
            id,
            name: name.into(),
            region: String::new(),
            district: String::new(),
            location: String::new(),
            coordinates: String::new(),
            inspection: false,
            pole_installation_permit: false,
            power_connection_permit: false,
            other_permits: String::new(),
            equipment_number: String::new(),
            quantity: default_quantity(),
            verification_certificate: false,
            executive_documentation: false,
            construction_work: false,
            commissioning_work: false,
            traffic_arrangement: false,
            web_upload: false,
            violation_recording: false,
            violation_types: Vec::new(),
            documentation_url: String::new(),
            messenger_link: String::new(),
            notes: String::new(),
            work_status: WorkStatus::NotStarted,
            stage_id: None,
            delivery_stage: None,
            operator: Operator::default(),
            connection_type: ConnectionType::default(),
            tariff_cost: 0.0,
        }
    }

    /// All three permit flags are set
    pub fn has_all_permits(&self) -> bool {
        self.inspection && self.pole_installation_permit && self.power_connection_permit
    }
}
