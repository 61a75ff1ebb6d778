//! Job input validation and normalization.
//!
//! `lyrics` and `tags` are required; everything else is optional with a
//! documented default. Numeric parsing is forgiving: a malformed value becomes
//! the default rather than an error, and every number is clamped into its
//! fixed valid range before it reaches the pipeline.

use serde_json::Value;

use crate::config::WorkerConfig;
use crate::{Error, Result};

pub const DEFAULT_DURATION_MS: i64 = 120_000;
pub const MIN_DURATION_MS: i64 = 1_000;

pub const DEFAULT_TEMPERATURE: f64 = 1.0;
pub const MIN_TEMPERATURE: f64 = 0.1;
pub const MAX_TEMPERATURE: f64 = 5.0;

pub const DEFAULT_TOPK: i64 = 50;
pub const MIN_TOPK: i64 = 1;
pub const MAX_TOPK: i64 = 200;

pub const DEFAULT_CFG_SCALE: f64 = 1.5;
pub const MIN_CFG_SCALE: f64 = 0.1;
pub const MAX_CFG_SCALE: f64 = 10.0;

/// A validated, normalized generation request.
///
/// Field names follow the pipeline call contract.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub lyrics: String,
    pub tags: String,
    pub max_audio_length_ms: u64,
    pub temperature: f64,
    pub topk: u32,
    pub cfg_scale: f64,
}

impl GenerationParams {
    /// Derive normalized parameters from a job's input mapping.
    ///
    /// Returns `Error::Validation` only for missing/blank `lyrics` or `tags`;
    /// numeric fields never fail.
    pub fn from_input(input: &Value, config: &WorkerConfig) -> Result<Self> {
        let lyrics = required_text(input, "lyrics")?;
        let tags = required_text(input, "tags")?;

        // A misconfigured ceiling below the floor collapses to the floor.
        let duration_ceiling_ms = (config.max_duration_ms as i64).max(MIN_DURATION_MS);
        let max_audio_length_ms = parse_i64(input.get("duration_ms"), DEFAULT_DURATION_MS)
            .clamp(MIN_DURATION_MS, duration_ceiling_ms) as u64;
        let temperature = parse_f64(input.get("temperature"), DEFAULT_TEMPERATURE)
            .clamp(MIN_TEMPERATURE, MAX_TEMPERATURE);
        let topk = parse_i64(input.get("topk"), DEFAULT_TOPK).clamp(MIN_TOPK, MAX_TOPK) as u32;
        let cfg_scale =
            parse_f64(input.get("cfg_scale"), DEFAULT_CFG_SCALE).clamp(MIN_CFG_SCALE, MAX_CFG_SCALE);

        Ok(Self {
            lyrics,
            tags,
            max_audio_length_ms,
            temperature,
            topk,
            cfg_scale,
        })
    }
}

/// Fetch a required text field, trimmed. Missing, non-string, or blank after
/// trimming is a validation error.
fn required_text(input: &Value, field: &str) -> Result<String> {
    let text = input
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim();
    if text.is_empty() {
        return Err(Error::Validation(format!("{field} is required")));
    }
    Ok(text.to_string())
}

/// Forgiving integer parse: accepts JSON numbers (floats truncate) and numeric
/// strings; anything else becomes `default`. Clamping happens at the call site.
fn parse_i64(value: Option<&Value>, default: i64) -> i64 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(default),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(default),
        _ => default,
    }
}

/// Forgiving float parse, same policy as [`parse_i64`].
fn parse_f64(value: Option<&Value>, default: f64) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(default),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(default),
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> WorkerConfig {
        WorkerConfig::default()
    }

    #[test]
    fn test_defaults_when_optionals_omitted() {
        let input = json!({"lyrics": "la la la", "tags": "pop, happy"});
        let params = GenerationParams::from_input(&input, &config()).unwrap();
        assert_eq!(params.lyrics, "la la la");
        assert_eq!(params.tags, "pop, happy");
        assert_eq!(params.max_audio_length_ms, 120_000);
        assert_eq!(params.temperature, 1.0);
        assert_eq!(params.topk, 50);
        assert_eq!(params.cfg_scale, 1.5);
    }

    #[test]
    fn test_missing_lyrics_rejected() {
        let input = json!({"tags": "pop"});
        let err = GenerationParams::from_input(&input, &config()).unwrap_err();
        assert!(matches!(err, Error::Validation(ref m) if m == "lyrics is required"));
    }

    #[test]
    fn test_blank_tags_rejected() {
        let input = json!({"lyrics": "la", "tags": "   "});
        let err = GenerationParams::from_input(&input, &config()).unwrap_err();
        assert!(matches!(err, Error::Validation(ref m) if m == "tags is required"));
    }

    #[test]
    fn test_non_object_input_rejected() {
        let err = GenerationParams::from_input(&json!("not a map"), &config()).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_out_of_bounds_values_clamp() {
        let input = json!({
            "lyrics": "la",
            "tags": "pop",
            "duration_ms": 999_999_999,
            "temperature": -5,
            "topk": 10_000,
            "cfg_scale": 0.0,
        });
        let params = GenerationParams::from_input(&input, &config()).unwrap();
        assert_eq!(params.max_audio_length_ms, config().max_duration_ms);
        assert_eq!(params.temperature, MIN_TEMPERATURE);
        assert_eq!(params.topk, MAX_TOPK as u32);
        assert_eq!(params.cfg_scale, MIN_CFG_SCALE);
    }

    #[test]
    fn test_duration_clamps_to_configured_ceiling() {
        let mut cfg = config();
        cfg.max_duration_ms = 30_000;
        let input = json!({"lyrics": "la", "tags": "pop", "duration_ms": 60_000});
        let params = GenerationParams::from_input(&input, &cfg).unwrap();
        assert_eq!(params.max_audio_length_ms, 30_000);
    }

    #[test]
    fn test_malformed_numerics_fall_back_to_defaults() {
        let input = json!({
            "lyrics": "la",
            "tags": "pop",
            "duration_ms": "soon",
            "temperature": {},
            "topk": "abc",
            "cfg_scale": null,
        });
        let params = GenerationParams::from_input(&input, &config()).unwrap();
        assert_eq!(params.max_audio_length_ms, DEFAULT_DURATION_MS as u64);
        assert_eq!(params.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(params.topk, DEFAULT_TOPK as u32);
        assert_eq!(params.cfg_scale, DEFAULT_CFG_SCALE);
    }

    #[test]
    fn test_numeric_strings_accepted() {
        let input = json!({
            "lyrics": "la",
            "tags": "pop",
            "duration_ms": "45000",
            "temperature": "0.7",
        });
        let params = GenerationParams::from_input(&input, &config()).unwrap();
        assert_eq!(params.max_audio_length_ms, 45_000);
        assert_eq!(params.temperature, 0.7);
    }

    #[test]
    fn test_float_duration_truncates() {
        let input = json!({"lyrics": "la", "tags": "pop", "duration_ms": 45000.9});
        let params = GenerationParams::from_input(&input, &config()).unwrap();
        assert_eq!(params.max_audio_length_ms, 45_000);
    }
}
