use clipt_graph::prebuilt::{default_system_prompt, DEFAULT_REASON_INSTRUCTION};
use clipt_graph::stream_gate::DEFAULT_SINK_CAPACITY;
use clipt_graph::types::DEFAULT_MAX_STEPS;
use clipt_graph::{GraphConfig, ReactOptions, UnknownToolPolicy, DEFAULT_FINISH_MARKER, DEFAULT_KEYWORDS};
use config::{Config as ConfigLoader, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Agent configuration.
///
/// Every field has a default, so an empty file (or no file) is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Seeds every run's transcript; derived from the finish marker when unset
    pub system_prompt: Option<String>,
    pub reason_instruction: String,
    pub observe_instruction: Option<String>,
    pub finish_marker: String,
    pub max_steps: usize,
    pub execution_timeout_secs: Option<u64>,
    pub unknown_tools: UnknownToolPolicy,
    pub stream: StreamConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Empty means the built-in defaults
    pub keywords: Vec<String>,
    pub sink_capacity: usize,
    pub trim_lone_colon: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `"pretty"` or `"json"`
    pub format: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: None,
            reason_instruction: DEFAULT_REASON_INSTRUCTION.to_string(),
            observe_instruction: None,
            finish_marker: DEFAULT_FINISH_MARKER.to_string(),
            max_steps: DEFAULT_MAX_STEPS,
            execution_timeout_secs: None,
            unknown_tools: UnknownToolPolicy::default(),
            stream: StreamConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            sink_capacity: DEFAULT_SINK_CAPACITY,
            trim_lone_colon: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AgentConfig {
    /// Load configuration from an optional TOML file and the environment
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. Built-in defaults
    /// 2. `path`, if given and present
    /// 3. `CLIPT_`-prefixed environment variables, `__` between levels
    ///    (e.g. `CLIPT_STREAM__SINK_CAPACITY=64`)
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigLoader::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }

        builder.add_source(env_source()).build()?.try_deserialize()
    }

    /// Load config from a specific file, ignoring the environment
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        ConfigLoader::builder()
            .add_source(File::from(path.as_ref()))
            .build()?
            .try_deserialize()
    }

    /// Parse a TOML document (useful for testing)
    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    /// Layer a TOML document over the defaults, then the environment
    pub fn from_toml_str_with_env(source: &str) -> Result<Self, ConfigError> {
        ConfigLoader::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .add_source(env_source())
            .build()?
            .try_deserialize()
    }

    pub fn system_prompt(&self) -> String {
        self.system_prompt
            .clone()
            .unwrap_or_else(|| default_system_prompt(&self.finish_marker))
    }

    pub fn graph_config(&self) -> GraphConfig {
        let config = GraphConfig::new().with_max_steps(self.max_steps);
        match self.execution_timeout_secs {
            Some(secs) => config.with_timeout(Duration::from_secs(secs)),
            None => config,
        }
    }

    pub fn react_options(&self) -> ReactOptions {
        let mut options = ReactOptions::new()
            .with_reason_instruction(self.reason_instruction.clone())
            .with_finish_marker(self.finish_marker.clone())
            .with_unknown_tool_policy(self.unknown_tools)
            .with_config(self.graph_config());

        if let Some(instruction) = &self.observe_instruction {
            options = options.with_observe_instruction(instruction.clone());
        }

        options
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("CLIPT")
        .prefix_separator("_")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("stream.keywords")
        .try_parsing(true)
}
