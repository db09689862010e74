use anyhow::{bail, Context, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Environment variable that selects the listening port.
pub const PORT_ENV: &str = "PORT";

/// Main application configuration with strongly-typed global sections
/// and a flexible per-module configuration bag.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Core server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Logging configuration (optional, uses defaults if None).
    pub logging: Option<LoggingConfig>,
    /// Per-module configuration bag: module_name → arbitrary JSON/YAML value.
    #[serde(default)]
    pub modules: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Logging configuration - maps subsystem names to their logging settings.
/// Key "default" is the catch-all for logs that don't match explicit subsystems.
pub type LoggingConfig = HashMap<String, Section>;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Section {
    pub console_level: String, // "info", "debug", "error", "off"
    #[serde(default)]
    pub file: String, // "logs/users.log", empty disables the file sink
    #[serde(default)]
    pub file_level: String,
    #[serde(default)]
    pub max_backups: Option<usize>, // How many rotated files to keep
    #[serde(default)]
    pub max_size_mb: Option<u64>, // Max size of the file in MB
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
        }
    }
}

/// Create a default logging configuration.
pub fn default_logging_config() -> LoggingConfig {
    let mut logging = HashMap::new();
    logging.insert(
        "default".to_string(),
        Section {
            console_level: "info".to_string(),
            file: String::new(),
            file_level: "debug".to_string(),
            max_backups: Some(3),
            max_size_mb: Some(100),
        },
    );
    logging
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: Some(default_logging_config()),
            modules: HashMap::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration with layered loading:
    /// defaults → YAML file → `APP__` environment variables → `PORT`.
    pub fn load_layered<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let path = config_path.as_ref();
        if !path.is_file() {
            bail!("config file not found: {}", path.display());
        }
        Self::extract(Some(path))
    }

    /// Load configuration from file, or from defaults + environment when no file is given.
    pub fn load_or_default<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_layered(path),
            None => Self::extract(None),
        }
    }

    fn extract(config_path: Option<&Path>) -> Result<Self> {
        use figment::{
            providers::{Env, Format, Serialized, Yaml},
            Figment,
        };

        // Optional sections stay None unless YAML/ENV provide them; logging falls back
        // to the defaults at init time.
        let base = AppConfig {
            logging: None,
            ..AppConfig::default()
        };

        let mut figment = Figment::new().merge(Serialized::defaults(base));
        if let Some(path) = config_path {
            figment = figment.merge(Yaml::file(path));
        }
        // Example: APP__SERVER__PORT=8087 maps to server.port
        let figment = figment.merge(Env::prefixed("APP__").split("__"));

        let mut config: AppConfig = figment
            .extract()
            .with_context(|| "Failed to extract config from figment".to_string())?;

        config.apply_port_env()?;
        Ok(config)
    }

    /// `PORT` takes precedence over file and `APP__` settings.
    fn apply_port_env(&mut self) -> Result<()> {
        if let Ok(raw) = std::env::var(PORT_ENV) {
            let raw = raw.trim();
            if !raw.is_empty() {
                self.server.port = raw
                    .parse()
                    .with_context(|| format!("invalid {PORT_ENV} value '{raw}'"))?;
            }
        }
        Ok(())
    }

    /// Serialize configuration to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config to YAML")
    }

    /// Deserialize a module's section from the bag, or its defaults when absent.
    pub fn module_config<T>(&self, module_name: &str) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        match self.modules.get(module_name) {
            Some(raw) => serde_json::from_value(raw.clone())
                .with_context(|| format!("invalid config for module '{module_name}'")),
            None => Ok(T::default()),
        }
    }

    /// Apply overrides from command line arguments.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(port) = args.port {
            self.server.port = port;
        }

        // Set logging level based on verbose flags for "default" section.
        let logging = self.logging.get_or_insert_with(default_logging_config);
        if let Some(default_section) = logging.get_mut("default") {
            default_section.console_level = match args.verbose {
                0 => default_section.console_level.clone(), // keep
                1 => "debug".to_string(),
                _ => "trace".to_string(),
            };
        }
    }

    /// Address the HTTP listener binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Command line arguments structure.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config: Option<String>,
    pub port: Option<u16>,
    pub print_config: bool,
    pub verbose: u8,
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use serde::Deserialize;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_structure() {
        let config = AppConfig::default();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 4000);

        let logging = config.logging.as_ref().unwrap();
        let default_section = &logging["default"];
        assert_eq!(default_section.console_level, "info");
        assert!(default_section.file.is_empty());

        assert!(config.modules.is_empty());
    }

    #[test]
    fn test_load_layered_reads_yaml() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "cfg.yaml",
                r#"
server:
  host: "127.0.0.1"
  port: 9090

logging:
  default:
    console_level: debug
    file: "logs/default.log"

modules:
  users_info:
    data_file: "db/users.json"
"#,
            )?;

            let config = AppConfig::load_layered("cfg.yaml").unwrap();
            assert_eq!(config.server.host, "127.0.0.1");
            assert_eq!(config.server.port, 9090);

            let logging = config.logging.as_ref().unwrap();
            let def = &logging["default"];
            assert_eq!(def.console_level, "debug");
            assert_eq!(def.file, "logs/default.log");

            assert_eq!(config.modules["users_info"]["data_file"], "db/users.json");
            Ok(())
        });
    }

    #[test]
    fn test_minimal_yaml_keeps_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file("cfg.yaml", "server:\n  port: 8080\n")?;

            let config = AppConfig::load_layered("cfg.yaml").unwrap();
            assert_eq!(config.server.host, "0.0.0.0");
            assert_eq!(config.server.port, 8080);
            assert!(config.logging.is_none());
            assert!(config.modules.is_empty());
            Ok(())
        });
    }

    #[test]
    fn test_port_env_overrides_file_and_prefixed_env() {
        Jail::expect_with(|jail| {
            jail.create_file("cfg.yaml", "server:\n  port: 8080\n")?;
            jail.set_env("APP__SERVER__PORT", "8081");
            jail.set_env("PORT", "5005");

            let config = AppConfig::load_layered("cfg.yaml").unwrap();
            assert_eq!(config.server.port, 5005);
            Ok(())
        });
    }

    #[test]
    fn test_prefixed_env_without_file() {
        Jail::expect_with(|jail| {
            jail.set_env("APP__SERVER__HOST", "127.0.0.2");

            let config = AppConfig::load_or_default(None::<&str>).unwrap();
            assert_eq!(config.server.host, "127.0.0.2");
            assert_eq!(config.server.port, 4000);
            Ok(())
        });
    }

    #[test]
    fn test_invalid_port_env_is_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("PORT", "not-a-port");

            let err = AppConfig::load_or_default(None::<&str>).unwrap_err();
            assert!(err.to_string().contains("PORT"));
            Ok(())
        });
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let tmp = tempdir().unwrap();
        let err = AppConfig::load_layered(tmp.path().join("absent.yaml")).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn test_unknown_top_level_key_is_rejected() {
        let tmp = tempdir().unwrap();
        let cfg_path = tmp.path().join("cfg.yaml");
        fs::write(&cfg_path, "database:\n  url: \"sqlite://x.db\"\n").unwrap();

        assert!(AppConfig::load_layered(&cfg_path).is_err());
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = AppConfig::default();

        let args = CliArgs {
            port: Some(3000),
            verbose: 2,
            ..Default::default()
        };

        config.apply_cli_overrides(&args);

        assert_eq!(config.server.port, 3000);
        let logging = config.logging.as_ref().unwrap();
        assert_eq!(logging["default"].console_level, "trace");
    }

    #[test]
    fn test_cli_verbose_levels_matrix() {
        for (verbose_level, expected_log_level) in [(0, "info"), (1, "debug"), (2, "trace"), (3, "trace")] {
            let mut config = AppConfig::default();
            let args = CliArgs {
                verbose: verbose_level,
                ..Default::default()
            };

            config.apply_cli_overrides(&args);

            let logging = config.logging.as_ref().unwrap();
            assert_eq!(logging["default"].console_level, expected_log_level);
        }
    }

    #[derive(Debug, Default, Deserialize)]
    struct DemoModuleConfig {
        #[serde(default)]
        data_file: String,
    }

    #[test]
    fn test_module_config_falls_back_to_default() {
        let mut config = AppConfig::default();
        let cfg: DemoModuleConfig = config.module_config("users_info").unwrap();
        assert!(cfg.data_file.is_empty());

        config.modules.insert(
            "users_info".to_string(),
            serde_json::json!({ "data_file": "x.json" }),
        );
        let cfg: DemoModuleConfig = config.module_config("users_info").unwrap();
        assert_eq!(cfg.data_file, "x.json");
    }

    #[test]
    fn test_to_yaml_roundtrip_basic() {
        let config = AppConfig::default();
        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("server:"));
        assert!(yaml.contains("logging:"));

        let roundtrip: AppConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(roundtrip.server.port, config.server.port);
        assert_eq!(config.bind_addr(), "0.0.0.0:4000");
    }
}
