use config::{Config, Environment};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_HOST: &str = "https://api.siliconflow.cn";
pub const DEFAULT_MODEL: &str = "deepseek-ai/DeepSeek-R1";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },

    #[error(transparent)]
    Other(#[from] config::ConfigError),
}

/// A model the client knows about, with the completion budget it allows
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelOption {
    pub label: &'static str,
    pub value: &'static str,
    pub max_tokens: u32,
}

pub const MODEL_OPTIONS: &[ModelOption] = &[
    ModelOption {
        label: "DeepSeek-R1",
        value: "deepseek-ai/DeepSeek-R1",
        max_tokens: 16384,
    },
    ModelOption {
        label: "DeepSeek-V3",
        value: "deepseek-ai/DeepSeek-V3",
        max_tokens: 4096,
    },
    ModelOption {
        label: "DeepSeek-V2.5",
        value: "deepseek-ai/DeepSeek-V2.5",
        max_tokens: 4096,
    },
    ModelOption {
        label: "Qwen2.5-72B-Instruct-128K",
        value: "Qwen/Qwen2.5-72B-Instruct-128K",
        max_tokens: 4096,
    },
    ModelOption {
        label: "QwQ-32B-Preview",
        value: "Qwen/QwQ-32B-Preview",
        max_tokens: 8192,
    },
    ModelOption {
        label: "glm-4-9b-chat",
        value: "THUDM/glm-4-9b-chat",
        max_tokens: 4096,
    },
    ModelOption {
        label: "glm-4-9b-chat(Pro)",
        value: "Pro/THUDM/glm-4-9b-chat",
        max_tokens: 4096,
    },
];

impl ModelOption {
    pub fn find(value: &str) -> Option<&'static ModelOption> {
        MODEL_OPTIONS.iter().find(|option| option.value == value)
    }
}

/// Generation settings, read by every turn and never mutated by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_stream")]
    pub stream: bool,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_top_k")]
    pub top_k: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: default_host(),
            model: default_model(),
            api_key: String::new(),
            stream: default_stream(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            top_k: default_top_k(),
        }
    }
}

impl Settings {
    /// Load settings from defaults layered under `LLMCHAT_*` environment variables
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("host", default_host())?
            .set_default("model", default_model())?
            .set_default("api_key", "")?
            .set_default("stream", default_stream())?
            .set_default("max_tokens", i64::from(default_max_tokens()))?
            .set_default("temperature", f64::from(default_temperature()))?
            .set_default("top_p", f64::from(default_top_p()))?
            .set_default("top_k", i64::from(default_top_k()))?
            .add_source(
                Environment::with_prefix("LLMCHAT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        tracing::debug!(model = %settings.model, stream = settings.stream, "loaded settings");
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::InvalidValue {
                field: "temperature",
                value: self.temperature.to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(ConfigError::InvalidValue {
                field: "top_p",
                value: self.top_p.to_string(),
            });
        }
        if self.max_tokens == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_tokens",
                value: self.max_tokens.to_string(),
            });
        }
        Ok(())
    }

    /// `max_tokens` capped at what the selected model allows, when the model is known
    pub fn effective_max_tokens(&self) -> u32 {
        match ModelOption::find(&self.model) {
            Some(option) => self.max_tokens.min(option.max_tokens),
            None => self.max_tokens,
        }
    }
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_stream() -> bool {
    true
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_p() -> f32 {
    0.7
}

fn default_top_k() -> u32 {
    50
}
