use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub naming: NamingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamingConfig {
    /// Pattern an operation name must match before its descriptor is built
    pub operation_pattern: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            naming: NamingConfig::default(),
        }
    }
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            operation_pattern: "^[a-z][a-zA-Z0-9]*$".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables and config file
    pub fn load() -> anyhow::Result<Self> {
        let mut config = config::Config::builder();

        // Add default configuration
        config = config.add_source(config::Config::try_from(&EngineConfig::default())?);

        // Add config file if it exists
        config = config.add_source(config::File::with_name("metadesc").required(false));

        // Add environment variables with prefix "METADESC"
        // (double separator keeps multi-word keys like operation_pattern intact)
        config = config.add_source(
            config::Environment::with_prefix("METADESC")
                .separator("__")
                .prefix_separator("_"),
        );

        let config = config.build()?;
        let engine_config: EngineConfig = config.try_deserialize()?;

        Ok(engine_config)
    }

    /// Load configuration from an explicit config file path
    pub fn load_from(path: &str) -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Config::try_from(&EngineConfig::default())?)
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Get the operation-name validation pattern
    pub fn operation_pattern(&self) -> &str {
        &self.naming.operation_pattern
    }
}
