//! Run configuration: which files, which backend.
//!
//! Values come from the environment (`NPC_INPUT`, `NPC_OUTPUT`,
//! `NPC_BACKEND`, `NPC_MODEL`) and are overridden by command-line flags.
//! The API key is only read when the remote backend is built.

use crate::mood::KeywordClassifier;
use crate::processor::ChatProcessor;
use crate::remote::{RemoteClassifier, RemoteReplier};
use crate::reply::TemplateReplier;
use claude::Claude;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_INPUT: &str = "players.json";
pub const DEFAULT_OUTPUT: &str = "npc_logs.json";

/// Errors in configuration. All of them are fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown backend {0:?} (expected `rules` or `remote`)")]
    UnknownBackend(String),

    #[error("missing value for {0}")]
    MissingValue(String),

    #[error("unknown argument {0:?}")]
    UnknownArgument(String),

    #[error("remote backend unavailable: {0}")]
    Claude(#[from] claude::Error),
}

/// Which classifier/generator pair to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Backend {
    /// Keyword moods and templated replies. No network.
    #[default]
    Rules,
    /// Claude for both moods and replies.
    Remote,
}

impl FromStr for Backend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rules" => Ok(Backend::Rules),
            "remote" => Ok(Backend::Remote),
            _ => Err(ConfigError::UnknownBackend(s.to_string())),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Rules => write!(f, "rules"),
            Backend::Remote => write!(f, "remote"),
        }
    }
}

/// Configuration for one batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Chat log to read.
    pub input: PathBuf,
    /// Annotated log to write.
    pub output: PathBuf,
    pub backend: Backend,
    /// Model override for the remote backend.
    pub model: Option<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            output: PathBuf::from(DEFAULT_OUTPUT),
            backend: Backend::Rules,
            model: None,
        }
    }
}

/// What the command line asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run(ChatConfig),
    Help,
}

impl ChatConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input(mut self, path: impl Into<PathBuf>) -> Self {
        self.input = path.into();
        self
    }

    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = path.into();
        self
    }

    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(input) = get("NPC_INPUT") {
            config.input = input.into();
        }
        if let Some(output) = get("NPC_OUTPUT") {
            config.output = output.into();
        }
        if let Some(backend) = get("NPC_BACKEND") {
            config.backend = backend.parse()?;
        }
        config.model = get("NPC_MODEL");
        Ok(config)
    }

    /// Apply command-line flags on top of this configuration.
    ///
    /// `args` excludes the program name.
    pub fn parse_args<I, S>(mut self, args: I) -> Result<Command, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let arg = arg.as_ref();
            let mut value = || {
                args.next()
                    .map(|v| v.as_ref().to_string())
                    .ok_or_else(|| ConfigError::MissingValue(arg.to_string()))
            };
            match arg {
                "-h" | "--help" => return Ok(Command::Help),
                "-i" | "--input" => self.input = value()?.into(),
                "-o" | "--output" => self.output = value()?.into(),
                "-b" | "--backend" => self.backend = value()?.parse()?,
                "-m" | "--model" => self.model = Some(value()?),
                other => return Err(ConfigError::UnknownArgument(other.to_string())),
            }
        }
        Ok(Command::Run(self))
    }

    /// Build the processor for the configured backend.
    ///
    /// For the remote backend this is where a missing API key surfaces.
    pub fn build_processor(&self) -> Result<ChatProcessor, ConfigError> {
        self.build_processor_with(|key| std::env::var(key).ok())
    }

    /// Build the processor, reading the API key through `lookup`.
    pub fn build_processor_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<ChatProcessor, ConfigError> {
        match self.backend {
            Backend::Rules => Ok(ChatProcessor::new(
                KeywordClassifier::default(),
                TemplateReplier,
            )),
            Backend::Remote => {
                let mut client = Claude::from_lookup(lookup)?;
                if let Some(model) = &self.model {
                    client = client.with_model(model);
                }
                tracing::info!(model = client.model(), "using remote backend");
                Ok(ChatProcessor::new(
                    RemoteClassifier::new(client.clone()),
                    RemoteReplier::new(client),
                ))
            }
        }
    }
}

/// Usage text for `--help`.
pub fn usage() -> &'static str {
    "npc - replay a player chat log through NPC mood tracking\n\
     \n\
     USAGE:\n\
     \x20 npc [OPTIONS]\n\
     \n\
     OPTIONS:\n\
     \x20 -i, --input <PATH>      Chat log to read (default: players.json, env NPC_INPUT)\n\
     \x20 -o, --output <PATH>     Annotated log to write (default: npc_logs.json, env NPC_OUTPUT)\n\
     \x20 -b, --backend <NAME>    rules | remote (default: rules, env NPC_BACKEND)\n\
     \x20 -m, --model <MODEL>     Model for the remote backend (env NPC_MODEL)\n\
     \x20 -h, --help              Show this help message\n\
     \n\
     The remote backend needs ANTHROPIC_API_KEY (a .env file is read if present).\n"
}
