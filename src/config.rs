//! Configuration file parsing for `quarry.toml`.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use quarry_migrate::GeneratorOptions;
use quarry_query::Dialect;
use regex_lite::{Captures, Regex};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for [`QuarryConfig`].
    #[error("Invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// The environment-variable pattern failed to build.
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex_lite::Error),
}

/// Main configuration structure for `quarry.toml`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QuarryConfig {
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Migration settings.
    #[serde(default)]
    pub migrations: MigrationConfig,

    /// Seeding configuration.
    #[serde(default)]
    pub seed: SeedConfig,

    /// Debug/logging settings.
    #[serde(default)]
    pub debug: DebugConfig,

    /// Environment-specific overrides.
    #[serde(default)]
    pub environments: HashMap<String, EnvironmentOverride>,
}

impl QuarryConfig {
    /// Load configuration from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        debug!(path = %path.display(), "loading configuration");
        content.parse()
    }

    /// Parse configuration, resolving `${VAR}` references with `lookup`
    /// instead of the process environment.
    pub fn from_str_with(
        content: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(content, lookup)?;
        Ok(toml::from_str(&expanded)?)
    }

    /// The database URL, if configured.
    pub fn database_url(&self) -> Option<&str> {
        self.database.url.as_deref()
    }

    /// SQL dialect for the configured provider.
    pub fn dialect(&self) -> Dialect {
        self.database.provider
    }

    /// Generator options for schema and seed scripts.
    pub fn generator_options(&self) -> GeneratorOptions {
        GeneratorOptions::new(self.dialect())
            .with_version_table(&self.migrations.version_table)
            .with_marker_table(&self.seed.marker_table)
    }

    /// Log level implied by the debug section.
    ///
    /// An explicit `log_level` wins; otherwise `log_queries` means `debug`.
    pub fn log_level(&self) -> Option<&str> {
        match (&self.debug.log_level, self.debug.log_queries) {
            (Some(level), _) => Some(level),
            (None, true) => Some("debug"),
            (None, false) => None,
        }
    }

    /// Install the tracing subscriber for the configured level, if any.
    pub fn init_logging(&self) {
        match self.log_level() {
            Some(level) => quarry_query::logging::init_with_level(level),
            None => quarry_query::logging::init(),
        }
    }

    /// Apply environment-specific overrides.
    pub fn with_environment(mut self, env: &str) -> Self {
        let Some(overrides) = self.environments.remove(env) else {
            return self;
        };
        if let Some(db) = overrides.database {
            if let Some(provider) = db.provider {
                self.database.provider = provider;
            }
            if let Some(url) = db.url {
                self.database.url = Some(url);
            }
        }
        if let Some(debug) = overrides.debug {
            if let Some(log_queries) = debug.log_queries {
                self.debug.log_queries = log_queries;
            }
            if let Some(level) = debug.log_level {
                self.debug.log_level = Some(level);
            }
        }
        self
    }
}

impl FromStr for QuarryConfig {
    type Err = ConfigError;

    /// Parse configuration from TOML, expanding `${VAR}` from the environment.
    fn from_str(content: &str) -> Result<Self, Self::Err> {
        Self::from_str_with(content, |name| std::env::var(name).ok())
    }
}

/// Database configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// `postgresql` (`postgres`), `mysql` or `sqlite` (`sqlite3`).
    #[serde(default)]
    pub provider: Dialect,

    /// Connection URL, handed to the executor implementation.
    #[serde(default)]
    pub url: Option<String>,
}

/// Migration configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MigrationConfig {
    /// Directory holding migration descriptions.
    #[serde(default = "default_migrations_dir")]
    pub directory: String,

    /// Ledger table of applied versions.
    #[serde(default = "default_version_table")]
    pub version_table: String,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            directory: default_migrations_dir(),
            version_table: default_version_table(),
        }
    }
}

fn default_migrations_dir() -> String {
    "./migrations".to_string()
}

fn default_version_table() -> String {
    quarry_migrate::history::DEFAULT_VERSION_TABLE.to_string()
}

/// Seed configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SeedConfig {
    /// Seed description file.
    #[serde(default)]
    pub script: Option<String>,

    /// Marker table recording that seeds ran.
    #[serde(default = "default_marker_table")]
    pub marker_table: String,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            script: None,
            marker_table: default_marker_table(),
        }
    }
}

fn default_marker_table() -> String {
    quarry_migrate::sql::DEFAULT_MARKER_TABLE.to_string()
}

/// Debug configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DebugConfig {
    /// Log every compiled query.
    #[serde(default)]
    pub log_queries: bool,

    /// Explicit log level (`trace`, `debug`, `info`, `warn`, `error`).
    #[serde(default)]
    pub log_level: Option<String>,
}

/// Environment-specific configuration overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentOverride {
    /// Database overrides.
    pub database: Option<DatabaseOverride>,

    /// Debug overrides.
    pub debug: Option<DebugOverride>,
}

/// Database configuration overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseOverride {
    pub provider: Option<Dialect>,
    pub url: Option<String>,
}

/// Debug configuration overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DebugOverride {
    pub log_queries: Option<bool>,
    pub log_level: Option<String>,
}

/// Expand `${VAR_NAME}` references. Unknown variables are left as written.
fn expand_env_vars(
    content: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String, ConfigError> {
    let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}")?;
    let expanded = re.replace_all(content, |caps: &Captures<'_>| {
        lookup(&caps[1]).unwrap_or_else(|| caps[0].to_string())
    });
    Ok(expanded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(name: &str) -> Option<String> {
        match name {
            "DB_URL" => Some("postgres://test".to_string()),
            _ => None,
        }
    }

    #[test]
    fn test_default_config() {
        let config = QuarryConfig::default();
        assert_eq!(config.dialect(), Dialect::SQLite);
        assert_eq!(config.migrations.version_table, "schema_migrations");
        assert_eq!(config.seed.marker_table, "_seeds_applied");
        assert_eq!(config.log_level(), None);
    }

    #[test]
    fn test_env_var_expansion() {
        let expanded = expand_env_vars("url = \"${DB_URL}\" # ${MISSING}", vars).unwrap();
        assert_eq!(expanded, "url = \"postgres://test\" # ${MISSING}");
    }

    #[test]
    fn test_provider_aliases() {
        for (name, dialect) in [
            ("postgres", Dialect::PostgreSQL),
            ("postgresql", Dialect::PostgreSQL),
            ("mysql", Dialect::MySQL),
            ("sqlite3", Dialect::SQLite),
        ] {
            let toml = format!("[database]\nprovider = \"{}\"", name);
            let config = QuarryConfig::from_str_with(&toml, vars).unwrap();
            assert_eq!(config.dialect(), dialect);
        }
    }

    #[test]
    fn test_log_queries_implies_debug() {
        let config = QuarryConfig::from_str_with("[debug]\nlog_queries = true", vars).unwrap();
        assert_eq!(config.log_level(), Some("debug"));
    }
}
