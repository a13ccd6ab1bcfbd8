//! API Configuration Module
//!
//! Configuration for CORS and API-level behavior, loaded from environment
//! variables with development defaults.

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// API configuration for CORS and API-level toggles.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,

    /// Whether attribute values are checked against the declared catalog
    /// type before writing. Off by default: the EAV design stores values
    /// as text and treats declared types as advisory metadata.
    pub enforce_value_types: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            cors_origins: Vec::new(), // Empty = allow all
            cors_max_age_secs: 86400, // 24 hours
            enforce_value_types: false,
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `FACET_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `FACET_CORS_MAX_AGE_SECS`: Preflight cache duration (default: 86400)
    /// - `FACET_ENFORCE_VALUE_TYPES`: "true" or "false" (default: false)
    pub fn from_env() -> Self {
        let cors_origins = std::env::var("FACET_CORS_ORIGINS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let cors_max_age_secs = std::env::var("FACET_CORS_MAX_AGE_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(86400);

        let enforce_value_types = std::env::var("FACET_ENFORCE_VALUE_TYPES")
            .ok()
            .map(|s| s.to_lowercase() == "true")
            .unwrap_or(false);

        Self {
            cors_origins,
            cors_max_age_secs,
            enforce_value_types,
        }
    }

    /// Check if running with strict CORS (origins configured).
    pub fn is_production(&self) -> bool {
        !self.cors_origins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert!(config.cors_origins.is_empty());
        assert_eq!(config.cors_max_age_secs, 86400);
        assert!(!config.enforce_value_types);
    }

    #[test]
    fn test_is_production() {
        let mut config = ApiConfig::default();
        assert!(!config.is_production());

        config.cors_origins = vec!["https://facet.example".to_string()];
        assert!(config.is_production());
    }
}
