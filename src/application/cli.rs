use std::io;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use yansi::Paint;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::BackendName;
use crate::domain::models::CoachSettings;
use crate::domain::models::StoredSession;
use crate::domain::models::ThemeName;
use crate::domain::models::WRITING_TYPES;
use crate::domain::services::actions::help_text;
use crate::domain::services::Sessions;
use crate::infrastructure::backends::register_model_route;

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
    std::process::exit(0);
}

fn format_stored_session(idx: usize, session: &StoredSession) -> String {
    let n = idx + 1;
    let mut res = format!(
        "- ({n}) {}, {} messages",
        session.timestamp,
        session.messages.len()
    );

    if let Some(first) = session.messages.first() {
        let mut line = first.content.split('\n').collect::<Vec<_>>()[0].to_string();
        if line.len() >= 70 {
            line = format!("{}...", &line[..67]);
        }
        res = format!("{res}, {line}");
    }

    return res;
}

async fn print_session_dir_listing() -> Result<()> {
    let session_dir = Sessions::default().session_dir;
    if !session_dir.exists() {
        println!("There are no saved writing sessions yet. Save your first one with /save.");
        return Ok(());
    }

    let mut entries: Vec<String> = vec![];
    let mut dir = fs::read_dir(&session_dir).await?;
    while let Some(file) = dir.next_entry().await? {
        let filename = file.file_name().to_string_lossy().to_string();
        if !filename.ends_with(".json") {
            continue;
        }

        match Sessions::load_file(&file.path().to_string_lossy()).await {
            Ok(sessions) => {
                let last_saved = sessions
                    .last()
                    .map(|session| return session.timestamp.to_string())
                    .unwrap_or_else(|| return "never".to_string());
                entries.push(format!(
                    "- {filename}: {} sessions, last saved {last_saved}",
                    sessions.len()
                ));
            }
            Err(_) => {
                entries.push(format!(
                    "- {filename}: unreadable, will be overwritten on the next save"
                ));
            }
        }
    }

    entries.sort();

    if entries.is_empty() {
        println!("There are no saved writing sessions yet. Save your first one with /save.");
    } else {
        println!("{}", entries.join("\n"));
    }

    return Ok(());
}

async fn print_session_file_listing(file_path: &str) -> Result<()> {
    let sessions = Sessions::load_file(file_path).await?;

    let listing = sessions
        .iter()
        .enumerate()
        .map(|(idx, session)| {
            return format_stored_session(idx, session);
        })
        .collect::<Vec<String>>();

    if listing.is_empty() {
        println!("No writing sessions found in {file_path}.");
    } else {
        println!("{}", listing.join("\n"));
    }

    return Ok(());
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(config_file_path.clone()).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    let config_path_display = config_file_path.to_string_lossy();
    println!("Created default config file at {config_path_display}");
    return Ok(());
}

fn arg_model() -> Arg {
    return Arg::new(ConfigKey::Model.to_string())
        .short('m')
        .long(ConfigKey::Model.to_string())
        .env("REDPEN_MODEL")
        .num_args(1)
        .help(format!(
            "The model to request feedback from. Hosted model names route to the hosted backend, everything else to the local one. [default: {}]",
            Config::default(ConfigKey::Model)
        ));
}

fn arg_username() -> Arg {
    return Arg::new(ConfigKey::Username.to_string())
        .short('u')
        .long(ConfigKey::Username.to_string())
        .env("REDPEN_USERNAME")
        .num_args(1)
        .help("Your name, prefixed to every submission and shown on your chat bubbles.");
}

fn arg_writing_type() -> Arg {
    return Arg::new(ConfigKey::WritingType.to_string())
        .short('w')
        .long(ConfigKey::WritingType.to_string())
        .env("REDPEN_WRITING_TYPE")
        .num_args(1)
        .help(format!(
            "The kind of writing feedback is tailored to. [default: {}]",
            Config::default(ConfigKey::WritingType)
        ))
        .value_parser(PossibleValuesParser::new(WRITING_TYPES));
}

fn arg_feedback_focus() -> Arg {
    return Arg::new(ConfigKey::FeedbackFocus.to_string())
        .short('f')
        .long(ConfigKey::FeedbackFocus.to_string())
        .env("REDPEN_FEEDBACK_FOCUS")
        .num_args(1)
        .help("Comma-separated feedback categories to concentrate on. Defaults to all of them.");
}

fn arg_backend_health_check_timeout() -> Arg {
    return Arg::new(ConfigKey::BackendHealthCheckTimeout.to_string())
        .long(ConfigKey::BackendHealthCheckTimeout.to_string())
        .env("REDPEN_BACKEND_HEALTH_CHECK_TIMEOUT")
        .num_args(1)
        .help(
            format!("Time to wait in milliseconds before timing out when doing a healthcheck for a backend. [default: {}]", Config::default(ConfigKey::BackendHealthCheckTimeout)),
        );
}

fn subcommand_chat() -> Command {
    return Command::new("chat")
        .about("Start a new writing session.")
        .arg(arg_model())
        .arg(arg_username())
        .arg(arg_writing_type())
        .arg(arg_feedback_focus())
        .arg(arg_backend_health_check_timeout());
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn subcommand_sessions() -> Command {
    return Command::new("sessions")
        .about("Inspect saved writing sessions.")
        .arg_required_else_help(true)
        .subcommand(Command::new("dir").about("Print the session directory path."))
        .subcommand(
            Command::new("list")
                .about("List saved session files, or the sessions inside one file.")
                .arg(
                    clap::Arg::new("file")
                        .short('F')
                        .long("file")
                        .help("A session file to list the contents of.")
                        .num_args(1),
                ),
        );
}

pub fn build() -> Command {
    let commands_text = help_text()
        .split('\n')
        .map(|line| {
            if line.starts_with('-') {
                return format!("  {line}");
            }
            if line.starts_with("COMMANDS:") || line.starts_with("HOTKEYS:") {
                return Paint::new(format!("CHAT {line}"))
                    .underline()
                    .bold()
                    .to_string();
            }
            return line.to_string();
        })
        .collect::<Vec<String>>()
        .join("\n");

    let about = format!(
        "{}\n\nVersion: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
    );

    return Command::new("redpen")
        .about(about)
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(commands_text)
        .arg_required_else_help(false)
        .subcommand(subcommand_chat())
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .subcommand(subcommand_sessions())
        .arg(arg_model())
        .arg(arg_username())
        .arg(arg_writing_type())
        .arg(arg_feedback_focus())
        .arg(arg_backend_health_check_timeout())
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("REDPEN_CONFIG_FILE")
                .num_args(1)
                .help(format!("Path to configuration file [default: {}]", Config::default(ConfigKey::ConfigFile)))
                .global(true)
        )
        .arg(
            Arg::new(ConfigKey::Theme.to_string())
                .short('t')
                .long(ConfigKey::Theme.to_string())
                .env("REDPEN_THEME")
                .num_args(1)
                .help(format!("The chat palette. [default: {}]", Config::default(ConfigKey::Theme)))
                .value_parser(PossibleValuesParser::new(ThemeName::VARIANTS))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::Instructions.to_string())
                .long(ConfigKey::Instructions.to_string())
                .env("REDPEN_INSTRUCTIONS")
                .num_args(1)
                .help("Custom coaching instructions sent as the leading system message.")
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::SessionDir.to_string())
                .long(ConfigKey::SessionDir.to_string())
                .env("REDPEN_SESSION_DIR")
                .num_args(1)
                .help(format!("Directory writing sessions are saved to. [default: {}]", Config::default(ConfigKey::SessionDir)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::HostedModelPrefixes.to_string())
                .long(ConfigKey::HostedModelPrefixes.to_string())
                .env("REDPEN_HOSTED_MODEL_PREFIXES")
                .num_args(1)
                .help(format!("Comma-separated model-name prefixes that route to the hosted backend instead of the local one. [default: {}]", Config::default(ConfigKey::HostedModelPrefixes)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::OllamaURL.to_string())
                .long(ConfigKey::OllamaURL.to_string())
                .env("REDPEN_OLLAMA_URL")
                .num_args(1)
                .help(format!("Ollama API URL for locally served models. [default: {}]", Config::default(ConfigKey::OllamaURL)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::OpenAiURL.to_string())
                .long(ConfigKey::OpenAiURL.to_string())
                .env("REDPEN_OPENAI_URL")
                .num_args(1)
                .help(format!("OpenAI API URL for hosted models. Can be swapped to a compatible proxy. [default: {}]", Config::default(ConfigKey::OpenAiURL)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::OpenAiToken.to_string())
                .long(ConfigKey::OpenAiToken.to_string())
                .env("REDPEN_OPENAI_TOKEN")
                .num_args(1)
                .help("OpenAI API token for hosted models. Defaults to the OPENAI_API_KEY environment variable.")
                .global(true),
        );
}

fn validate_settings() -> Result<()> {
    CoachSettings::parse_focus(&Config::get(ConfigKey::FeedbackFocus))?;

    // Extends the hosted allow-list from config before the first dispatch.
    for prefix in Config::get(ConfigKey::HostedModelPrefixes).split(',') {
        let prefix = prefix.trim();
        if !prefix.is_empty() {
            register_model_route(prefix, BackendName::OpenAI);
        }
    }

    return Ok(());
}

pub async fn parse() -> Result<bool> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("chat", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            validate_settings()?;
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
                return Ok(false);
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
                return Ok(false);
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
                return Ok(false);
            }
            _ => {
                subcommand_config().print_long_help()?;
                return Ok(false);
            }
        },
        Some(("sessions", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("dir", dir_matches)) => {
                Config::load(build(), vec![&matches, dir_matches]).await?;
                let dir = Sessions::default().session_dir.to_string_lossy().to_string();
                println!("{dir}");
                return Ok(false);
            }
            Some(("list", list_matches)) => {
                Config::load(build(), vec![&matches, list_matches]).await?;
                if let Some(file_path) = list_matches.get_one::<String>("file") {
                    print_session_file_listing(file_path).await?;
                } else {
                    print_session_dir_listing().await?;
                }
                return Ok(false);
            }
            _ => {
                subcommand_sessions().print_long_help()?;
                return Ok(false);
            }
        },
        _ => {
            Config::load(build(), vec![&matches]).await?;
            validate_settings()?;
        }
    }

    return Ok(true);
}
