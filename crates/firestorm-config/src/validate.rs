//! Configuration validation errors and semantic validation.

use std::collections::HashSet;

use firestorm_common::Category;
use thiserror::Error;

use crate::engine::EngineConfig;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },

    #[error("Unknown category: column '{column}' has no value '{value}'")]
    UnknownCategory { column: String, value: String },

    #[error("Unknown firestorm: {0}")]
    UnknownFirestorm(String),
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::SemanticError(_) => 63,
            ValidationError::MissingField(_) => 64,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
            ValidationError::UnknownCategory { .. } => 67,
            ValidationError::UnknownFirestorm(_) => 68,
        }
    }
}

impl From<ValidationError> for firestorm_common::Error {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::UnknownCategory { column, value } => {
                firestorm_common::Error::UnknownCategory { column, value }
            }
            ValidationError::IoError(msg) => {
                firestorm_common::Error::Io(std::io::Error::other(msg))
            }
            other => firestorm_common::Error::Config(other.to_string()),
        }
    }
}

/// Validate an engine configuration semantically.
pub fn validate_engine_config(config: &EngineConfig) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    config.zone()?;

    validate_tracked_rates(config)?;

    let window = &config.window;
    validate_non_negative("window.min_threshold", window.min_threshold)?;
    if !(0.0..=1.0).contains(&window.factor) {
        return Err(ValidationError::InvalidValue {
            field: "window.factor".to_string(),
            message: format!("Must be in [0, 1], got {}", window.factor),
        });
    }

    let seg = &config.segmentation;
    // infinite penalty is allowed and disables splitting
    if seg.penalty.is_nan() || seg.penalty < 0.0 {
        return Err(ValidationError::InvalidValue {
            field: "segmentation.penalty".to_string(),
            message: format!("Must be >= 0, got {}", seg.penalty),
        });
    }
    if seg.min_size == 0 {
        return Err(ValidationError::InvalidValue {
            field: "segmentation.min_size".to_string(),
            message: "Must be >= 1".to_string(),
        });
    }
    if seg.jump == 0 {
        return Err(ValidationError::InvalidValue {
            field: "segmentation.jump".to_string(),
            message: "Must be >= 1".to_string(),
        });
    }
    if seg.max_intervals < 2 {
        return Err(ValidationError::InvalidValue {
            field: "segmentation.max_intervals".to_string(),
            message: format!("Must be >= 2, got {}", seg.max_intervals),
        });
    }
    if let Some(gamma) = seg.gamma {
        if !(gamma.is_finite() && gamma > 0.0) {
            return Err(ValidationError::InvalidValue {
                field: "segmentation.gamma".to_string(),
                message: format!("Must be > 0, got {}", gamma),
            });
        }
    }
    if seg.analysis_columns.is_empty() {
        return Err(ValidationError::MissingField(
            "segmentation.analysis_columns".to_string(),
        ));
    }
    let tracked: HashSet<&str> = config
        .aggregation
        .tracked_rates
        .iter()
        .map(|r| r.name.as_str())
        .collect();
    for column in &seg.analysis_columns {
        if !tracked.contains(column.as_str()) {
            return Err(ValidationError::SemanticError(format!(
                "Analysis column '{}' is not a tracked rate",
                column
            )));
        }
    }

    if let Some(lang) = &config.filters.language {
        if lang.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "filters.language".to_string(),
                message: "Must not be empty".to_string(),
            });
        }
    }

    Ok(())
}

fn validate_tracked_rates(config: &EngineConfig) -> ValidationResult<()> {
    let mut seen = HashSet::new();
    for spec in &config.aggregation.tracked_rates {
        if spec.name.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "aggregation.tracked_rates.name".to_string(),
                message: "Must not be empty".to_string(),
            });
        }
        if !seen.insert(spec.name.as_str()) {
            return Err(ValidationError::SemanticError(format!(
                "Duplicate tracked rate '{}'",
                spec.name
            )));
        }
        Category::parse(&spec.column, &spec.value).map_err(|e| match e {
            firestorm_common::Error::UnknownCategory { column, value } => {
                ValidationError::UnknownCategory { column, value }
            }
            other => ValidationError::SemanticError(other.to_string()),
        })?;
    }
    Ok(())
}

fn validate_non_negative(field: &str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            message: format!("Must be finite and >= 0, got {}", value),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::TrackedRateSpec;

    #[test]
    fn defaults_validate() {
        validate_engine_config(&EngineConfig::default()).unwrap();
    }

    #[test]
    fn rejects_unknown_category_value() {
        let mut config = EngineConfig::default();
        config
            .aggregation
            .tracked_rates
            .push(TrackedRateSpec::new("bot_pct", "user_type", "bot"));
        let err = validate_engine_config(&config).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::UnknownCategory { ref column, ref value }
                if column == "user_type" && value == "bot"
        ));
    }

    #[test]
    fn rejects_unknown_column() {
        let mut config = EngineConfig::default();
        config.aggregation.tracked_rates =
            vec![TrackedRateSpec::new("mood_pct", "mood", "happy")];
        config.segmentation.analysis_columns = vec!["mood_pct".to_string()];
        assert!(matches!(
            validate_engine_config(&config),
            Err(ValidationError::UnknownCategory { .. })
        ));
    }

    #[test]
    fn open_language_category_accepts_any_value() {
        let mut config = EngineConfig::default();
        config
            .aggregation
            .tracked_rates
            .push(TrackedRateSpec::new("tr_pct", "lang", "tr"));
        validate_engine_config(&config).unwrap();
    }

    #[test]
    fn rejects_duplicate_rate_names() {
        let mut config = EngineConfig::default();
        config
            .aggregation
            .tracked_rates
            .push(TrackedRateSpec::new("reply_pct", "tweet_type", "reply"));
        assert!(matches!(
            validate_engine_config(&config),
            Err(ValidationError::SemanticError(_))
        ));
    }

    #[test]
    fn rejects_analysis_column_not_tracked() {
        let mut config = EngineConfig::default();
        config.segmentation.analysis_columns.push("bogus_pct".to_string());
        assert!(matches!(
            validate_engine_config(&config),
            Err(ValidationError::SemanticError(_))
        ));
    }

    #[test]
    fn rejects_bad_numbers() {
        let mut config = EngineConfig::default();
        config.window.factor = 1.5;
        assert_eq!(validate_engine_config(&config).unwrap_err().code(), 65);

        let mut config = EngineConfig::default();
        config.segmentation.penalty = -1.0;
        assert!(validate_engine_config(&config).is_err());

        let mut config = EngineConfig::default();
        config.segmentation.penalty = f64::INFINITY;
        validate_engine_config(&config).unwrap();

        let mut config = EngineConfig::default();
        config.segmentation.gamma = Some(0.0);
        assert!(validate_engine_config(&config).is_err());

        let mut config = EngineConfig::default();
        config.segmentation.min_size = 0;
        assert!(validate_engine_config(&config).is_err());

        let mut config = EngineConfig::default();
        config.segmentation.max_intervals = 1;
        let err = validate_engine_config(&config).unwrap_err();
        assert!(err.to_string().contains("segmentation.max_intervals"));
    }

    #[test]
    fn rejects_version_mismatch() {
        let config = EngineConfig {
            schema_version: "0.9.0".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            validate_engine_config(&config),
            Err(ValidationError::VersionMismatch { .. })
        ));
    }

    #[test]
    fn converts_into_common_error() {
        let err: firestorm_common::Error = ValidationError::UnknownCategory {
            column: "user_type".into(),
            value: "bot".into(),
        }
        .into();
        assert!(matches!(err, firestorm_common::Error::UnknownCategory { .. }));

        let err: firestorm_common::Error = ValidationError::MissingField("x".into()).into();
        assert_eq!(err.code(), 10);

        let err: firestorm_common::Error =
            ValidationError::IoError("Failed to read catalog.json".into()).into();
        assert!(matches!(err, firestorm_common::Error::Io(_)));
        assert!(err.to_string().contains("catalog.json"));
    }
}
