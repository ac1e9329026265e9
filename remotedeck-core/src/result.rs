//! Structured result returned across the UI boundary.
//!
//! Import, export, backup and launch failures never escape as errors to the
//! shell; they are folded into an `OperationResult` carrying a short error
//! title and a detail message.

use serde::{Deserialize, Serialize};

/// Outcome of a user-facing operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResult<T = ()> {
    /// Whether the operation succeeded
    pub success: bool,
    /// Payload on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Short error title on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Human-readable detail (also used for warnings on success)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> OperationResult<T> {
    /// Creates a successful result carrying `data`
    #[must_use]
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
        }
    }

    /// Creates a failed result
    #[must_use]
    pub fn failure(error: impl Into<String>, message: Option<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            message,
        }
    }

    /// Attaches a detail message
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Converts into a standard `Result`, using the error title on failure
    ///
    /// # Errors
    ///
    /// Returns the error title (and message, if any) when `success` is false.
    pub fn into_result(self) -> std::result::Result<Option<T>, String> {
        if self.success {
            Ok(self.data)
        } else {
            let title = self.error.unwrap_or_else(|| "Operation failed".to_string());
            Err(match self.message {
                Some(message) => format!("{title}: {message}"),
                None => title,
            })
        }
    }
}

impl<T, E: std::fmt::Display> From<std::result::Result<T, E>> for OperationResult<T> {
    fn from(result: std::result::Result<T, E>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::failure(e.to_string(), None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_serializes_without_data() {
        let result: OperationResult<u32> =
            OperationResult::failure("Import failed", Some("missing groups".to_string()));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Import failed");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_into_result_joins_title_and_message() {
        let result: OperationResult<()> =
            OperationResult::failure("Launch failed", Some("not found".to_string()));
        assert_eq!(result.into_result().unwrap_err(), "Launch failed: not found");
    }

    #[test]
    fn test_from_result() {
        let ok: OperationResult<u8> = Ok::<u8, std::io::Error>(3).into();
        assert!(ok.success);
        assert_eq!(ok.data, Some(3));
    }
}
