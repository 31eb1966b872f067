//! Inline error panel shown in place of the map

use crate::{ui::popup::escape_html, ErrorKind, MapError};

/// What the panel's retry button does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetryAction {
    /// Validate the same props again
    Revalidate,
    /// Invoke the bootstrap loader again
    ReloadEngine,
    /// Attempt engine creation again
    Reinitialize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorPanel {
    pub title: String,
    pub message: String,
    pub action: RetryAction,
}

impl ErrorPanel {
    pub fn from_error(err: &MapError) -> Self {
        let (title, action) = match err.kind() {
            ErrorKind::InvalidCenter => ("Location unavailable", RetryAction::Revalidate),
            ErrorKind::Bootstrap => ("Map failed to load", RetryAction::ReloadEngine),
            ErrorKind::Initialization => ("Map could not start", RetryAction::Reinitialize),
            _ => ("Map unavailable", RetryAction::Revalidate),
        };

        let message = match err {
            MapError::InvalidCenterCoordinates { label, .. } => {
                format!("{} has no valid coordinates to show on the map.", label)
            }
            other => other.to_string(),
        };

        Self {
            title: title.to_string(),
            message,
            action,
        }
    }

    pub fn retry_label(&self) -> &'static str {
        match self.action {
            RetryAction::Revalidate => "Try again",
            RetryAction::ReloadEngine => "Reload map",
            RetryAction::Reinitialize => "Retry",
        }
    }

    pub fn to_html(&self) -> String {
        format!(
            "<div class=\"map-error\" role=\"alert\"><strong>{}</strong><p>{}</p><button type=\"button\">{}</button></div>",
            escape_html(&self.title),
            escape_html(&self.message),
            self.retry_label()
        )
    }
}
