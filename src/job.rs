//! Wire types for the job envelope and response payload.

use serde::{Deserialize, Serialize};

/// One unit of work submitted by the hosting runtime.
///
/// `input` is kept as raw JSON; normalization happens in
/// [`crate::params::GenerationParams::from_input`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,

    #[serde(default)]
    pub input: serde_json::Value,
}

/// Response returned for every job, success or error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Response {
    Success {
        /// Base64-encoded audio artifact.
        audio_base64: String,
        /// Effective (clamped) requested duration.
        duration_ms: u64,
        inference_time_sec: f64,
        file_size_mb: f64,
    },
    Error {
        message: String,
    },
}

impl Response {
    pub fn err(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serializes_with_status_tag() {
        let json = serde_json::to_value(Response::err("lyrics is required")).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "lyrics is required");
    }

    #[test]
    fn test_success_serializes_with_status_tag() {
        let response = Response::Success {
            audio_base64: "aGk=".into(),
            duration_ms: 120_000,
            inference_time_sec: 45.2,
            file_size_mb: 1.25,
        };
        let json = serde_json::to_value(response).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["duration_ms"], 120_000);
        assert_eq!(json["inference_time_sec"], 45.2);
    }

    #[test]
    fn test_job_input_defaults_to_null() {
        let job: Job = serde_json::from_str(r#"{"id": "abc"}"#).unwrap();
        assert_eq!(job.id, "abc");
        assert!(job.input.is_null());
    }
}
