//! Configuration validation
//!
//! Collects every violation before failing so a broken file is fixed in one pass.

use crate::{AtlasConfig, ConfigError, ConfigResult};

/// Validation errors that can occur during config validation
#[derive(Debug, Clone)]
pub enum ConfigValidationError {
    MissingRequired { field: String },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every failed check
pub fn validate_config(config: &AtlasConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_required_fields(config, &mut errors);
    validate_value_ranges(config, &mut errors);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

fn validate_required_fields(config: &AtlasConfig, errors: &mut Vec<ConfigValidationError>) {
    let required = [
        ("catalog.api_url", config.catalog.api_url.as_str()),
        ("catalog.version", config.catalog.version.as_str()),
        ("ontology.structure_graph_url", config.ontology.structure_graph_url.as_str()),
        ("geometry.mesh_url_template", config.geometry.mesh_url_template.as_str()),
        ("sync.species_taxon", config.sync.species_taxon.as_str()),
        ("extractor.program", config.extractor.program.as_str()),
    ];

    for (field, value) in required {
        if value.trim().is_empty() {
            errors.push(ConfigValidationError::MissingRequired {
                field: field.to_string(),
            });
        }
    }

    if !config.geometry.mesh_url_template.is_empty()
        && !config.geometry.mesh_url_template.contains("{structure_id}")
    {
        errors.push(ConfigValidationError::InvalidValue {
            field: "geometry.mesh_url_template".to_string(),
            reason: "must contain the {structure_id} placeholder".to_string(),
        });
    }
}

fn validate_value_ranges(config: &AtlasConfig, errors: &mut Vec<ConfigValidationError>) {
    let at_least_one = [
        ("sync.workers", config.sync.workers),
        ("sync.probe_size", config.sync.probe_size),
        ("catalog.dataset_page_size", config.catalog.dataset_page_size),
        ("catalog.asset_page_size", config.catalog.asset_page_size),
        ("retry.max_attempts", config.retry.max_attempts as usize),
    ];

    for (field, value) in at_least_one {
        if value == 0 {
            errors.push(ConfigValidationError::InvalidValue {
                field: field.to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
    }

    if config.catalog.request_timeout_secs == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "catalog.request_timeout_secs".to_string(),
            reason: "must be greater than 0".to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_workers_rejected() {
        let mut config = AtlasConfig::default();
        config.sync.workers = 0;

        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("sync.workers"));
    }

    #[test]
    fn test_all_violations_reported_together() {
        let mut config = AtlasConfig::default();
        config.sync.probe_size = 0;
        config.retry.max_attempts = 0;
        config.geometry.mesh_url_template = "http://meshes/static.obj".to_string();

        let message = validate_config(&config).unwrap_err().to_string();
        assert!(message.contains("sync.probe_size"));
        assert!(message.contains("retry.max_attempts"));
        assert!(message.contains("{structure_id}"));
    }

    #[test]
    fn test_blank_species_is_missing() {
        let mut config = AtlasConfig::default();
        config.sync.species_taxon = "  ".to_string();

        let message = validate_config(&config).unwrap_err().to_string();
        assert!(message.contains("Missing required configuration: sync.species_taxon"));
    }
}
