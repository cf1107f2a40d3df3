use std::path::PathBuf;

/// Failures that leave the session without a catalog.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Failed to open {}: {message}", .path.display())]
    Open { path: PathBuf, message: String },

    #[error(
        "Worksheet '{sheet}' not found in {}. Available sheets: {}",
        .path.display(),
        .available.join(", ")
    )]
    SheetMissing {
        path: PathBuf,
        sheet: String,
        available: Vec<String>,
    },

    #[error("Failed to read worksheet '{sheet}': {message}")]
    Sheet { sheet: String, message: String },

    #[error("Failed to read {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Unsupported source format '{0}'. Expected .xlsx, .xlsm, .xls, .ods or .csv")]
    UnsupportedFormat(String),

    #[error("Source has no header row")]
    NoHeader,

    #[error("Required column '{0}' is missing from the header row")]
    MissingColumn(&'static str),
}

/// Failures of a single weather lookup. Converted to an `Unavailable` outcome at the
/// provider boundary.
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("{message}")]
    Provider { status: u16, message: String },

    #[error("{0}")]
    Transport(String),

    #[error("Malformed weather response: {0}")]
    Malformed(String),
}

/// The request URL carries the API key, so it is stripped from the message.
impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        WeatherError::Transport(err.without_url().to_string())
    }
}

impl From<WeatherError> for crate::model::Unavailable {
    fn from(err: WeatherError) -> Self {
        let status = match &err {
            WeatherError::Provider { status, .. } => Some(*status),
            _ => None,
        };

        crate::model::Unavailable {
            status,
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Unavailable;

    #[test]
    fn provider_error_keeps_message_verbatim() {
        let unavailable: Unavailable = WeatherError::Provider {
            status: 401,
            message: "Invalid API key".into(),
        }
        .into();

        assert_eq!(unavailable.status, Some(401));
        assert_eq!(unavailable.message, "Invalid API key");
    }

    #[test]
    fn sheet_missing_lists_available_sheets() {
        let err = IngestError::SheetMissing {
            path: PathBuf::from("schools.xlsx"),
            sheet: "II.EE_COORDENADAS".into(),
            available: vec!["Hoja1".into(), "Resumen".into()],
        };

        let msg = err.to_string();
        assert!(msg.contains("II.EE_COORDENADAS"));
        assert!(msg.contains("Hoja1, Resumen"));
    }
}
