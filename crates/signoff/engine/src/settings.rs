//! Configuration for the signoff engine

use serde::{Deserialize, Serialize};
use signoff_signer::SignerConfig;
use signoff_types::{ResourceLocation, DEFAULT_EDITORS_GROUP, DEFAULT_REVIEWERS_GROUP};
use std::collections::BTreeMap;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignoffSettings {
    /// Enforce editors/reviewers group membership
    #[serde(default = "default_true")]
    pub group_check_enabled: bool,

    /// Require a review by someone else before signing
    #[serde(default = "default_true")]
    pub to_review_enabled: bool,

    /// Editors group name template
    #[serde(default = "default_editors_group")]
    pub editors_group: String,

    /// Reviewers group name template
    #[serde(default = "default_reviewers_group")]
    pub reviewers_group: String,

    /// Page size used when reading record sets during replication
    #[serde(default = "default_chunk_size")]
    pub replication_chunk_size: usize,

    /// Signer backends by name
    #[serde(default)]
    pub signers: BTreeMap<String, SignerConfig>,

    /// Signer used by resources that do not name one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_signer: Option<String>,

    /// Signed resources
    #[serde(default)]
    pub resources: Vec<ResourceSettings>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for SignoffSettings {
    fn default() -> Self {
        Self {
            group_check_enabled: true,
            to_review_enabled: true,
            editors_group: default_editors_group(),
            reviewers_group: default_reviewers_group(),
            replication_chunk_size: default_chunk_size(),
            signers: BTreeMap::new(),
            default_signer: None,
            resources: Vec::new(),
            logging: LoggingConfig::default(),
        }
    }
}

/// One signed resource: where a source replicates to, plus policy overrides.
///
/// A source without `collection` declares a per-bucket resource; its preview
/// and destination must then omit `collection` too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSettings {
    pub source: ResourceLocation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<ResourceLocation>,
    pub destination: ResourceLocation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_check_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_review_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editors_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewers_group: Option<String>,
}

impl ResourceSettings {
    pub fn new(source: ResourceLocation, destination: ResourceLocation) -> Self {
        Self {
            source,
            preview: None,
            destination,
            signer: None,
            group_check_enabled: None,
            to_review_enabled: None,
            editors_group: None,
            reviewers_group: None,
        }
    }

    pub fn with_preview(mut self, preview: ResourceLocation) -> Self {
        self.preview = Some(preview);
        self
    }

    pub fn with_signer(mut self, signer: impl Into<String>) -> Self {
        self.signer = Some(signer.into());
        self
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_true() -> bool {
    true
}

fn default_editors_group() -> String {
    DEFAULT_EDITORS_GROUP.to_string()
}

fn default_reviewers_group() -> String {
    DEFAULT_REVIEWERS_GROUP.to_string()
}

fn default_chunk_size() -> usize {
    500
}

fn default_log_level() -> String {
    "info".to_string()
}

impl SignoffSettings {
    /// Load configuration: defaults, then an optional file, then `SIGNOFF_*`
    /// environment variables (`__` separates nested keys).
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&SignoffSettings::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("SIGNOFF")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `config.level`. Returns `false` when a subscriber
/// was already installed.
pub fn init_tracing(config: &LoggingConfig) -> bool {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.level));

    let result = if config.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
    };
    result.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = SignoffSettings::default();
        assert!(settings.group_check_enabled);
        assert!(settings.to_review_enabled);
        assert_eq!(settings.editors_group, "{collection_id}-editors");
        assert_eq!(settings.reviewers_group, "{collection_id}-reviewers");
        assert_eq!(settings.replication_chunk_size, 500);
        assert!(settings.resources.is_empty());
    }

    #[test]
    fn test_deserialize_resources() {
        let settings: SignoffSettings = serde_json::from_value(serde_json::json!({
            "to_review_enabled": false,
            "resources": [
                {
                    "source": {"bucket": "stage"},
                    "preview": {"bucket": "preview"},
                    "destination": {"bucket": "prod"},
                    "signer": "stage-key",
                    "reviewers_group": "{bucket_id}-reviewers"
                }
            ]
        }))
        .unwrap();

        assert!(settings.group_check_enabled);
        assert!(!settings.to_review_enabled);
        let resource = &settings.resources[0];
        assert!(resource.source.is_per_bucket());
        assert_eq!(resource.signer.as_deref(), Some("stage-key"));
        assert_eq!(
            resource.reviewers_group.as_deref(),
            Some("{bucket_id}-reviewers")
        );
        assert!(resource.editors_group.is_none());
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let settings = SignoffSettings::load(None).unwrap();
        assert_eq!(settings.replication_chunk_size, 500);
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn test_init_tracing_twice_is_harmless() {
        let config = LoggingConfig::default();
        let _ = init_tracing(&config);
        assert!(!init_tracing(&config));
    }
}
