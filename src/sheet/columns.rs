/// One column of the object workbook, in sheet order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Id,
    Name,
    /// Stage name, written on export and ignored on import
    Stage,
    DeliveryStage,
    Region,
    District,
    Location,
    Coordinates,
    Inspection,
    PoleInstallationPermit,
    PowerConnectionPermit,
    OtherPermits,
    EquipmentNumber,
    Quantity,
    VerificationCertificate,
    ExecutiveDocumentation,
    ConstructionWork,
    CommissioningWork,
    TrafficArrangement,
    WebUpload,
    ViolationRecording,
    ViolationTypes,
    DocumentationUrl,
    WorkStatus,
    Notes,
    MessengerLink,
    Operator,
    ConnectionType,
    TariffCost,
}

pub const COLUMNS: [Column; 29] = [
    Column::Id,
    Column::Name,
    Column::Stage,
    Column::DeliveryStage,
    Column::Region,
    Column::District,
    Column::Location,
    Column::Coordinates,
    Column::Inspection,
    Column::PoleInstallationPermit,
    Column::PowerConnectionPermit,
    Column::OtherPermits,
    Column::EquipmentNumber,
    Column::Quantity,
    Column::VerificationCertificate,
    Column::ExecutiveDocumentation,
    Column::ConstructionWork,
    Column::CommissioningWork,
    Column::TrafficArrangement,
    Column::WebUpload,
    Column::ViolationRecording,
    Column::ViolationTypes,
    Column::DocumentationUrl,
    Column::WorkStatus,
    Column::Notes,
    Column::MessengerLink,
    Column::Operator,
    Column::ConnectionType,
    Column::TariffCost,
];

/// How a column's cells are written and read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Flag,
    Number,
}

impl Column {
    /// Header label written to the sheet
    pub fn label(self) -> &'static str {
        match self {
            Column::Id => "ID",
            Column::Name => "Название",
            Column::Stage => "Этап",
            Column::DeliveryStage => "Этап сдачи",
            Column::Region => "Регион",
            Column::District => "Район",
            Column::Location => "Местоположение",
            Column::Coordinates => "Координаты",
            Column::Inspection => "Обследование",
            Column::PoleInstallationPermit => "Разрешение на установку опор",
            Column::PowerConnectionPermit => "Разрешение на подключение питания",
            Column::OtherPermits => "Прочие разрешения",
            Column::EquipmentNumber => "Номер оборудования",
            Column::Quantity => "Количество",
            Column::VerificationCertificate => "Свидетельство о поверке",
            Column::ExecutiveDocumentation => "Исполнительная документация",
            Column::ConstructionWork => "Строительно-монтажные работы",
            Column::CommissioningWork => "Пусконаладочные работы",
            Column::TrafficArrangement => "ОДД",
            Column::WebUpload => "Выгрузка на веб",
            Column::ViolationRecording => "Фиксация нарушений",
            Column::ViolationTypes => "Виды нарушений",
            Column::DocumentationUrl => "Документация",
            Column::WorkStatus => "Статус работ",
            Column::Notes => "Примечания",
            Column::MessengerLink => "Мессенджер",
            Column::Operator => "Оператор",
            Column::ConnectionType => "Тип подключения",
            Column::TariffCost => "Стоимость тарифа",
        }
    }

    /// Field name as stored in the portfolio document
    pub fn key(self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::Name => "name",
            Column::Stage => "stage",
            Column::DeliveryStage => "deliveryStage",
            Column::Region => "region",
            Column::District => "district",
            Column::Location => "location",
            Column::Coordinates => "coordinates",
            Column::Inspection => "inspection",
            Column::PoleInstallationPermit => "poleInstallationPermit",
            Column::PowerConnectionPermit => "powerConnectionPermit",
            Column::OtherPermits => "otherPermits",
            Column::EquipmentNumber => "equipmentNumber",
            Column::Quantity => "quantity",
            Column::VerificationCertificate => "verificationCertificate",
            Column::ExecutiveDocumentation => "executiveDocumentation",
            Column::ConstructionWork => "constructionWork",
            Column::CommissioningWork => "commissioningWork",
            Column::TrafficArrangement => "trafficArrangement",
            Column::WebUpload => "webUpload",
            Column::ViolationRecording => "violationRecording",
            Column::ViolationTypes => "violationTypes",
            Column::DocumentationUrl => "documentationUrl",
            Column::WorkStatus => "workStatus",
            Column::Notes => "notes",
            Column::MessengerLink => "messengerLink",
            Column::Operator => "operator",
            Column::ConnectionType => "connectionType",
            Column::TariffCost => "tariffCost",
        }
    }

    pub fn kind(self) -> ColumnKind {
        match self {
            Column::Inspection
            | Column::PoleInstallationPermit
            | Column::PowerConnectionPermit
            | Column::VerificationCertificate
            | Column::ExecutiveDocumentation
            | Column::ConstructionWork
            | Column::CommissioningWork
            | Column::TrafficArrangement
            | Column::WebUpload
            | Column::ViolationRecording => ColumnKind::Flag,
            Column::Quantity | Column::TariffCost => ColumnKind::Number,
            _ => ColumnKind::Text,
        }
    }

    /// Display width used for the exported column
    pub fn width(self) -> f64 {
        match self.kind() {
            ColumnKind::Flag => 14.0,
            ColumnKind::Number => 12.0,
            ColumnKind::Text => match self {
                Column::Name | Column::Location | Column::Notes | Column::DocumentationUrl => 32.0,
                _ => 18.0,
            },
        }
    }

    /// Match a header cell by label or field key, ignoring case and
    /// surrounding whitespace.
    pub fn from_header(header: &str) -> Option<Column> {
        let h = header.trim().to_lowercase();
        if h.is_empty() {
            return None;
        }
        COLUMNS
            .into_iter()
            .find(|c| c.label().to_lowercase() == h || c.key().to_lowercase() == h)
    }
}
