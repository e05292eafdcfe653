use crate::conversion::{ConversionOutcome, ConvertedFile, SkippedFile};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One converted file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ConvertedFileResponse {
    /// Output filename, e.g. `legacy_oracle.sql`
    pub name: String,
    /// Generated Oracle SQL, or the no-response placeholder when the model call failed
    pub content: String,
}

/// An uploaded file that was not converted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SkippedFileResponse {
    /// Filename as uploaded
    pub name: String,
    pub reason: String,
}

/// Result of `POST /convert-multiple`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ConvertResponse {
    /// Converted files in upload order
    pub files: Vec<ConvertedFileResponse>,
    /// Files ignored because of their extension. Omitted when empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedFileResponse>,
}

/// Error body returned with every non-2xx status
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

impl From<ConvertedFile> for ConvertedFileResponse {
    fn from(file: ConvertedFile) -> Self {
        Self {
            name: file.name,
            content: file.content,
        }
    }
}

impl From<SkippedFile> for SkippedFileResponse {
    fn from(file: SkippedFile) -> Self {
        Self {
            name: file.name,
            reason: file.reason.to_string(),
        }
    }
}

impl From<ConversionOutcome> for ConvertResponse {
    fn from(outcome: ConversionOutcome) -> Self {
        Self {
            files: outcome.converted.into_iter().map(Into::into).collect(),
            skipped: outcome.skipped.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::SkipReason;
    use serde_json::json;

    #[test]
    fn test_skipped_omitted_when_empty() {
        let response = ConvertResponse::from(ConversionOutcome {
            converted: vec![ConvertedFile {
                name: "a_oracle.sql".to_string(),
                content: "SELECT 1 FROM DUAL;".to_string(),
            }],
            skipped: Vec::new(),
        });

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({ "files": [{ "name": "a_oracle.sql", "content": "SELECT 1 FROM DUAL;" }] })
        );
    }

    #[test]
    fn test_skipped_listed_with_reason() {
        let response = ConvertResponse::from(ConversionOutcome {
            converted: Vec::new(),
            skipped: vec![SkippedFile {
                name: "diagram.png".to_string(),
                reason: SkipReason::UnsupportedExtension,
            }],
        });

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["files"], json!([]));
        assert_eq!(value["skipped"][0]["name"], "diagram.png");
        assert!(value["skipped"][0]["reason"].as_str().unwrap().contains(".sql"));
    }
}
