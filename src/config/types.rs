// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;
use std::collections::HashMap;

use crate::logger::AccessLogFormat;
use crate::resource::ProcessorKind;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub performance: PerformanceConfig,
    #[serde(default)]
    pub mounts: Vec<MountConfig>,
    #[serde(default)]
    pub data: Vec<DataConfig>,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    /// Listen backlog passed to `listen(2)`
    pub backlog: i32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            workers: None,
            backlog: 128,
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    /// `debug` turns on diagnostic notes; anything else keeps them quiet
    pub level: String,
    pub access_log: bool,
    pub access_log_format: AccessLogFormat,
    /// Access log file path (stdout if not set)
    pub access_log_file: Option<String>,
    /// Error log file path (stderr if not set)
    pub error_log_file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            access_log: true,
            access_log_format: AccessLogFormat::default(),
            access_log_file: None,
            error_log_file: None,
        }
    }
}

impl LoggingConfig {
    pub fn is_debug(&self) -> bool {
        self.level.eq_ignore_ascii_case("debug")
    }
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Zero disables keep-alive
    pub keep_alive_timeout: u64,
    /// Seconds allowed for a client to send request headers
    pub read_timeout: u64,
    pub max_connections: Option<u64>,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            keep_alive_timeout: 75,
            read_timeout: 30,
            max_connections: None,
        }
    }
}

/// One directory served below a URL prefix
#[derive(Debug, Deserialize, Clone)]
pub struct MountConfig {
    /// URL prefix, e.g. `/` or `/static`
    pub prefix: String,
    /// Directory on disk
    pub root: String,
    #[serde(default = "default_content_type")]
    pub default_type: String,
    #[serde(default = "default_index_names")]
    pub index_names: Vec<String>,
    /// Extensions tried after a name is not found; `*` matches any
    #[serde(default)]
    pub ignored_exts: Vec<String>,
    /// Extension (without dot) to processor
    #[serde(default)]
    pub processors: HashMap<String, ProcessorKind>,
    /// Extension (without dot) to content type, over the built-in table
    #[serde(default)]
    pub content_types: HashMap<String, String>,
    /// Extension (without dot) to content encoding, over the built-in table
    #[serde(default)]
    pub content_encodings: HashMap<String, String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_content_type() -> String {
    crate::resource::root::DEFAULT_TYPE.to_string()
}

fn default_index_names() -> Vec<String> {
    crate::resource::root::default_index_names()
}

/// A fixed in-memory response at an exact path
#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    pub path: String,
    pub content_type: String,
    pub body: String,
}
