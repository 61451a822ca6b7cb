use serde::{Deserialize, Serialize};

pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const ENV_WHISPER_MODEL_PATH: &str = "SPEAK_COACH_WHISPER_MODEL";

/// Path to the speech model loaded once at process start.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelPath(String);

impl ModelPath {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, ConfigError> {
        let v = value.into();
        if v.trim().is_empty() {
            return Err(ConfigError::EmptyModelPath);
        }
        Ok(Self(v))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("model path must not be empty")]
    EmptyModelPath,
}

/// Environment lookup seam so config resolution is testable without
/// touching process state.
pub trait Env {
    fn var(&self, key: &str) -> Option<String>;
}

#[derive(Clone, Debug, Default)]
pub struct StdEnv;

impl Env for StdEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Clone, Debug, Default)]
pub struct MapEnv {
    vars: std::collections::BTreeMap<String, String>,
}

impl MapEnv {
    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_owned(), value.to_owned());
        self
    }
}

impl Env for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

/// CLI value wins over the environment; the environment wins over nothing.
pub fn resolve_model_path(
    cli_value: Option<String>,
    env: &impl Env,
) -> Result<Option<ModelPath>, ConfigError> {
    match cli_value {
        Some(v) => Ok(Some(ModelPath::new(v)?)),
        None => match env.var(ENV_WHISPER_MODEL_PATH) {
            Some(v) => Ok(Some(ModelPath::new(v)?)),
            None => Ok(None),
        },
    }
}

pub fn resolve_string_with_default(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
    default: &str,
) -> String {
    match cli_value {
        Some(v) => v,
        None => env.var(env_key).unwrap_or_else(|| default.to_owned()),
    }
}
