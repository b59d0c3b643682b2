#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::env;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::ArgMatches;
use clap::Command;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;
use tokio::fs;

use crate::domain::models::DEFAULT_INSTRUCTIONS;
use crate::domain::models::FEEDBACK_CATEGORIES;

static CONFIG: Lazy<DashMap<String, String>> = Lazy::new(DashMap::new);

#[derive(Clone, Copy, Eq, PartialEq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ConfigKey {
    BackendHealthCheckTimeout,
    ConfigFile,
    FeedbackFocus,
    HostedModelPrefixes,
    Instructions,
    Model,
    OllamaURL,
    OpenAiToken,
    OpenAiURL,
    SessionDir,
    Theme,
    Username,
    WritingType,
}

pub struct Config {}

impl Config {
    pub fn get(key: ConfigKey) -> String {
        if let Some(val) = CONFIG.get(&key.to_string()) {
            return val.to_string();
        }

        return "".to_string();
    }

    pub fn set(key: ConfigKey, value: &str) {
        CONFIG.insert(key.to_string(), value.to_string());
    }

    pub fn default(key: ConfigKey) -> String {
        if key == ConfigKey::Username {
            let mut user = env::var("USER").unwrap_or_else(|_| return "".to_string());
            if user.is_empty() {
                user = "Writer".to_string();
            }

            return user;
        }

        if key == ConfigKey::OpenAiToken {
            return env::var("OPENAI_API_KEY").unwrap_or_else(|_| return "".to_string());
        }

        let default_focus = FEEDBACK_CATEGORIES.join(",");

        #[cfg(not(target_os = "macos"))]
        let config_path = dirs::cache_dir().unwrap().join("redpen/config.toml");
        #[cfg(target_os = "macos")]
        let config_path =
            path::PathBuf::from(env::var("HOME").unwrap()).join(".config/redpen/config.toml");

        let res = match key {
            ConfigKey::BackendHealthCheckTimeout => "1000",
            ConfigKey::FeedbackFocus => &default_focus,
            ConfigKey::HostedModelPrefixes => "gpt-",
            ConfigKey::Instructions => DEFAULT_INSTRUCTIONS,
            ConfigKey::Model => "llama3.1:8b",
            ConfigKey::OllamaURL => "http://localhost:11434",
            ConfigKey::OpenAiURL => "https://api.openai.com",
            ConfigKey::SessionDir => "writing_sessions",
            ConfigKey::Theme => "dark",
            ConfigKey::WritingType => "Essay",

            // Special
            ConfigKey::ConfigFile => config_path.to_str().unwrap(),
            ConfigKey::OpenAiToken => "",
            ConfigKey::Username => "",
        };

        return res.to_string();
    }

    pub async fn load(cmd: Command, clap_arg_matches: Vec<&ArgMatches>) -> Result<()> {
        for key in ConfigKey::iter() {
            Config::set(key, &Config::default(key))
        }

        let mut config_file = Config::default(ConfigKey::ConfigFile);
        for matches in clap_arg_matches.as_slice() {
            if let Some(arg_config_file) =
                matches.get_one::<String>(&ConfigKey::ConfigFile.to_string())
            {
                config_file = arg_config_file.to_string();
            }
        }

        let config_path = path::PathBuf::from(config_file);
        if config_path.exists() {
            let toml_str = fs::read_to_string(config_path).await?;
            let doc = toml_str.parse::<toml_edit::Document>()?;

            for key in ConfigKey::iter() {
                if let Some(val) = doc.get(&key.to_string()) {
                    // Use clap value parsers to do validation.
                    let mut possible_values = vec![];
                    if let Some(arg) = cmd
                        .get_arguments()
                        .find(|e| return e.get_long().unwrap_or_default() == key.to_string())
                    {
                        if !arg.get_possible_values().is_empty() {
                            possible_values = arg
                                .get_possible_values()
                                .iter()
                                .map(|e| return e.get_name().to_string())
                                .collect::<Vec<String>>();
                        }
                    }

                    if let Some(val_int) = val.as_integer() {
                        Config::set(key, &val_int.to_string());
                    } else if let Some(val_str) = val.as_str() {
                        if val_str.is_empty() {
                            continue;
                        }
                        if !possible_values.is_empty()
                            && !possible_values.contains(&val_str.to_string())
                        {
                            bail!(format!("config.toml has an invalid value for key '{key}': {val_str}\nPossible values are: {}", possible_values.join(", ")));
                        }
                        Config::set(key, val_str);
                    }
                }
            }
        }

        for key in ConfigKey::iter() {
            for matches in clap_arg_matches.as_slice() {
                if let Ok(Some(val)) = matches.try_get_one::<String>(&key.to_string()) {
                    if val.is_empty() {
                        continue;
                    }
                    Config::set(key, val)
                }
            }
        }

        tracing::debug!(
            username = Config::get(ConfigKey::Username),
            model = Config::get(ConfigKey::Model),
            writing_type = Config::get(ConfigKey::WritingType),
            feedback_focus = Config::get(ConfigKey::FeedbackFocus),
            theme = Config::get(ConfigKey::Theme),
            session_dir = Config::get(ConfigKey::SessionDir),
            "config"
        );

        return Ok(());
    }

    pub fn serialize_default(cmd: Command) -> String {
        let toml_str = ConfigKey::iter()
            .filter_map(|key| {
                if key == ConfigKey::ConfigFile {
                    return None;
                }

                // Never serialize the ambient token into a config file.
                if key == ConfigKey::OpenAiToken {
                    return Some(
                        "# OpenAI API token for hosted models. Defaults to the OPENAI_API_KEY environment variable.\n# open-ai-token = \"\""
                            .to_string(),
                    );
                }

                let arg = cmd
                    .get_arguments()
                    .find(|e| return e.get_long().unwrap_or_default() == key.to_string())?;

                let mut description = arg
                    .get_help()
                    .map(|help| return help.to_string())
                    .unwrap_or_default();

                description = description
                    .split("[default:")
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_string();

                if !arg.get_possible_values().is_empty() {
                    let possible_values = arg
                        .get_possible_values()
                        .iter()
                        .map(|e| return e.get_name())
                        .collect::<Vec<_>>()
                        .join(", ");
                    description = format!("{description} [possible values: {}]", possible_values);
                }

                let default = Config::default(key);
                let val = if default.is_empty() {
                    format!("# {key} = \"\"")
                } else if default.parse::<i64>().is_ok() {
                    format!("{key} = {default}")
                } else {
                    // toml_edit handles quoting and escaping, which matters
                    // for the multi-line instructions default.
                    format!("{key} = {}", toml_edit::Value::from(default.as_str()))
                };

                return Some(format!("# {description}\n{val}"));
            })
            .collect::<Vec<String>>()
            .join("\n\n");

        return toml_str;
    }
}
