use serde::{Deserialize, Serialize};

use super::object::WorkStatus;

/// Error type for status registry updates
#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    #[error("status list cannot be empty")]
    Empty,
    #[error("status {0} is listed more than once")]
    Duplicate(WorkStatus),
}

/// Display settings for one work status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusOption {
    pub value: WorkStatus,
    pub label: String,
    pub color: String,
    pub bg_class: String,
    pub text_class: String,
    pub border_class: String,
}

impl StatusOption {
    /// Build an option whose classes follow the `<kind>-<color>-<shade>` scheme
    pub fn with_color(value: WorkStatus, label: impl Into<String>, color: &str) -> Self {
        StatusOption {
            value,
            label: label.into(),
            color: color.to_string(),
            bg_class: format!("bg-{}-500", color),
            text_class: format!("text-{}-700", color),
            border_class: format!("border-{}-500/20", color),
        }
    }

    /// Combined badge classes
    pub fn badge_classes(&self) -> String {
        format!("{}/10 {} {}", self.bg_class, self.text_class, self.border_class)
    }
}

pub fn default_status_options() -> Vec<StatusOption> {
    vec![
        StatusOption::with_color(WorkStatus::NotStarted, "Не начато", "gray"),
        StatusOption::with_color(WorkStatus::InProgress, "В работе", "blue"),
        StatusOption::with_color(WorkStatus::Paused, "Приостановлено", "orange"),
        StatusOption::with_color(WorkStatus::Completed, "Завершено", "green"),
    ]
}

/// Maps work statuses to labels and colors.
///
/// Always holds at least one option; lookups for a value that is not listed
/// fall back to the first option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRegistry {
    options: Vec<StatusOption>,
}

impl Default for StatusRegistry {
    fn default() -> Self {
        StatusRegistry {
            options: default_status_options(),
        }
    }
}

impl StatusRegistry {
    /// Build a registry from a stored list, falling back to defaults when the
    /// list would be rejected by [`StatusRegistry::set_options`].
    pub fn from_stored(options: Option<Vec<StatusOption>>) -> Self {
        let mut registry = StatusRegistry::default();
        if let Some(options) = options
            && registry.set_options(options).is_err()
        {
            tracing::warn!("stored status options are invalid, using defaults");
        }
        registry
    }

    pub fn options(&self) -> &[StatusOption] {
        &self.options
    }

    pub fn set_options(&mut self, options: Vec<StatusOption>) -> Result<(), StatusError> {
        if options.is_empty() {
            return Err(StatusError::Empty);
        }
        for (i, opt) in options.iter().enumerate() {
            if options[..i].iter().any(|o| o.value == opt.value) {
                return Err(StatusError::Duplicate(opt.value));
            }
        }
        self.options = options;
        Ok(())
    }

    pub fn reset_options(&mut self) {
        self.options = default_status_options();
    }

    pub fn option(&self, value: WorkStatus) -> &StatusOption {
        self.options
            .iter()
            .find(|o| o.value == value)
            .unwrap_or(&self.options[0])
    }

    pub fn label(&self, value: WorkStatus) -> &str {
        &self.option(value).label
    }

    /// Reverse lookup: accepts a label (case-insensitive) or the status value itself
    pub fn parse_label(&self, text: &str) -> Option<WorkStatus> {
        let text = text.trim();
        if let Some(ws) = WorkStatus::parse(text) {
            return Some(ws);
        }
        let lower = text.to_lowercase();
        self.options
            .iter()
            .find(|o| o.label.to_lowercase() == lower)
            .map(|o| o.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_work_status() {
        let reg = StatusRegistry::default();
        for ws in WorkStatus::ALL {
            assert_eq!(reg.option(ws).value, ws);
        }
        assert_eq!(reg.label(WorkStatus::Paused), "Приостановлено");
    }

    #[test]
    fn unknown_value_falls_back_to_first_option() {
        let mut reg = StatusRegistry::default();
        reg.set_options(vec![StatusOption::with_color(
            WorkStatus::Completed,
            "Готово",
            "emerald",
        )])
        .unwrap();
        assert_eq!(reg.label(WorkStatus::NotStarted), "Готово");
    }

    #[test]
    fn set_options_rejects_empty_and_duplicates() {
        let mut reg = StatusRegistry::default();
        assert!(matches!(reg.set_options(vec![]), Err(StatusError::Empty)));
        let dup = vec![
            StatusOption::with_color(WorkStatus::Paused, "a", "red"),
            StatusOption::with_color(WorkStatus::Paused, "b", "red"),
        ];
        assert!(matches!(
            reg.set_options(dup),
            Err(StatusError::Duplicate(WorkStatus::Paused))
        ));
        assert_eq!(reg, StatusRegistry::default());
    }

    #[test]
    fn reset_restores_defaults() {
        let mut reg = StatusRegistry::default();
        reg.set_options(vec![StatusOption::with_color(
            WorkStatus::Paused,
            "Стоп",
            "red",
        )])
        .unwrap();
        reg.reset_options();
        assert_eq!(reg.options(), default_status_options().as_slice());
    }

    #[test]
    fn parse_label_accepts_label_or_value() {
        let reg = StatusRegistry::default();
        assert_eq!(reg.parse_label("в работе"), Some(WorkStatus::InProgress));
        assert_eq!(reg.parse_label("paused"), Some(WorkStatus::Paused));
        assert_eq!(reg.parse_label("???"), None);
    }

    #[test]
    fn badge_classes_compose() {
        let opt = StatusOption::with_color(WorkStatus::Completed, "Завершено", "green");
        assert_eq!(
            opt.badge_classes(),
            "bg-green-500/10 text-green-700 border-green-500/20"
        );
    }

    #[test]
    fn from_stored_ignores_invalid_lists() {
        assert_eq!(StatusRegistry::from_stored(Some(vec![])), StatusRegistry::default());
        assert_eq!(StatusRegistry::from_stored(None), StatusRegistry::default());
    }
}
