//! Module: config
//! Responsibility: client settings that select how translated queries are executed.
//! Does not own: connection or authentication handling; those settings pass through opaquely.

use serde::Deserialize;
use std::fmt;
use thiserror::Error as ThisError;

///
/// ExecutionTarget
///
/// `Query` produces one filter + projection pair; `Pipeline` produces
/// ordered aggregation stage documents.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionTarget {
    #[default]
    Query,
    Pipeline,
}

impl fmt::Display for ExecutionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Query => "query",
            Self::Pipeline => "pipeline",
        };
        write!(f, "{label}")
    }
}

///
/// QuerySettings
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct QuerySettings {
    #[serde(default)]
    pub target: ExecutionTarget,

    #[serde(default)]
    pub database: Option<String>,
}

///
/// ClientSettings
///
/// `[query]` is interpreted; `[connection]` is carried without inspection
/// for the execution layer.
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ClientSettings {
    #[serde(default)]
    pub query: QuerySettings,

    #[serde(default)]
    pub connection: toml::Table,
}

impl ClientSettings {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        toml::from_str(input).map_err(|err| ConfigError::Parse {
            message: err.to_string(),
        })
    }

    #[must_use]
    pub const fn execution_target(&self) -> ExecutionTarget {
        self.query.target
    }
}

///
/// ConfigError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ConfigError {
    #[error("invalid client settings: {message}")]
    Parse { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_settings_default_to_query_target() {
        let settings = ClientSettings::from_toml_str("").unwrap();

        assert_eq!(settings.execution_target(), ExecutionTarget::Query);
        assert!(settings.connection.is_empty());
    }

    #[test]
    fn pipeline_target_and_opaque_connection_table() {
        let settings = ClientSettings::from_toml_str(
            r#"
            [query]
            target = "pipeline"
            database = "app"

            [connection]
            host = "db.internal"
            mechanism = "SCRAM-SHA-256"
            "#,
        )
        .unwrap();

        assert_eq!(settings.execution_target(), ExecutionTarget::Pipeline);
        assert_eq!(settings.query.database.as_deref(), Some("app"));
        assert_eq!(
            settings
                .connection
                .get("mechanism")
                .and_then(toml::Value::as_str),
            Some("SCRAM-SHA-256")
        );
    }

    #[test]
    fn unknown_query_keys_are_rejected() {
        let err = ClientSettings::from_toml_str(
            r#"
            [query]
            mode = "fast"
            "#,
        )
        .unwrap_err();

        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn unknown_target_is_rejected() {
        let err = ClientSettings::from_toml_str("[query]\ntarget = \"stream\"\n").unwrap_err();

        assert!(err.to_string().starts_with("invalid client settings"));
    }
}
