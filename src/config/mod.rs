// Configuration module entry point
// Loads configuration and turns it into the shared serving state

mod state;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::error::ServeError;
use crate::resource::ServingRoot;

pub use state::{AppState, Mount};
pub use types::{
    Config, DataConfig, LoggingConfig, MountConfig, PerformanceConfig, ServerConfig,
};

/// Environment variable prefix, e.g. `FILESERVE_SERVER__PORT=9000`
pub const ENV_PREFIX: &str = "FILESERVE";

impl Config {
    /// Load configuration from specified file path (without extension)
    ///
    /// A missing file is not an error; defaults and the environment still apply.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .build()?;

        settings.try_deserialize()
    }

    /// Parse configuration from TOML text, without file or environment lookup
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, ServeError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| ServeError::Address(format!("{}:{}: {e}", self.server.host, self.server.port)))
    }
}

impl MountConfig {
    /// Build the serving root this mount describes
    pub fn to_serving_root(&self) -> ServingRoot {
        let mut root = ServingRoot::new(&self.root)
            .with_default_type(self.default_type.clone())
            .with_index_names(self.index_names.clone())
            .with_ignored_exts(self.ignored_exts.clone())
            .with_content_types(&self.content_types)
            .with_content_encodings(&self.content_encodings);
        for (ext, kind) in &self.processors {
            root = root.with_processor(ext, *kind);
        }
        root
    }
}

/// Shared state for `config`, with every mount built
pub fn build_state(config: &Config) -> Arc<AppState> {
    Arc::new(AppState::new(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::AccessLogFormat;
    use crate::resource::ProcessorKind;

    const SAMPLE: &str = r#"
[server]
host = "0.0.0.0"
port = 9000

[logging]
level = "debug"
access_log_format = "common"

[[mounts]]
prefix = "/static"
root = "/srv/static"
ignored_exts = [".html", "*"]
processors = { asis = "asis", rs = "source" }
content_types = { log = "text/plain" }

[[mounts]]
prefix = "/"
root = "/srv/www"
index_names = ["home.html"]

[[data]]
path = "/robots.txt"
content_type = "text/plain"
body = "User-agent: *\n"
"#;

    #[test]
    fn test_from_toml_str() {
        let config = Config::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.backlog, 128);
        assert!(config.logging.is_debug());
        assert!(config.logging.access_log);
        assert_eq!(config.logging.access_log_format, AccessLogFormat::Common);
        assert_eq!(config.performance.keep_alive_timeout, 75);

        assert_eq!(config.mounts.len(), 2);
        let statics = &config.mounts[0];
        assert_eq!(statics.default_type, "text/html");
        assert_eq!(statics.index_names, ["index", "index.html", "index.htm"]);
        assert_eq!(statics.processors.get("rs"), Some(&ProcessorKind::Source));
        assert_eq!(config.mounts[1].index_names, ["home.html"]);
        assert_eq!(config.data[0].path, "/robots.txt");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert!(config.mounts.is_empty());
        assert!(!config.logging.is_debug());
    }

    #[test]
    fn test_unknown_processor_rejected() {
        let text = "[[mounts]]\nprefix = \"/\"\nroot = \".\"\nprocessors = { php = \"cgi\" }\n";
        assert!(Config::from_toml_str(text).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fileserve.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        let stem = dir.path().join("fileserve");

        let config = Config::load_from(stem.to_str().unwrap()).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.mounts[0].prefix, "/static");
    }

    #[test]
    fn test_socket_addr() {
        let mut config = Config::from_toml_str("").unwrap();
        assert_eq!(config.get_socket_addr().unwrap().port(), 8080);
        config.server.host = "not a host".to_string();
        assert!(matches!(config.get_socket_addr(), Err(ServeError::Address(_))));
    }

    #[test]
    fn test_mount_to_serving_root() {
        let config = Config::from_toml_str(SAMPLE).unwrap();
        let root = config.mounts[0].to_serving_root();
        assert_eq!(root.ignored_exts(), [".html", "*"]);
        assert_eq!(root.media_for_name("app.log").content_type, "text/plain");
        assert_eq!(root.processors().lookup("page.asis"), Some(ProcessorKind::Asis));
    }
}
