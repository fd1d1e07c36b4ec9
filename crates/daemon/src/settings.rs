//! Daemon settings
//!
//! Layered with the `config` crate: defaults, optional TOML file,
//! `LINKRELAY__SECTION__KEY` environment, then the legacy single-name
//! variables (`BOT_TOKEN`, `GROUP_CHAT_ID`, `PORT`) on top.

use anyhow::{bail, Context, Result};
use linkrelay_api_rpc::RpcServerConfig;
use linkrelay_core::application::{DispatcherConfig, IngestionConfig};
use linkrelay_core::domain::{ChatId, IntervalMinutes, LinkExtractor, DEFAULT_ACCEPTED_HOSTS};
use linkrelay_infra_telegram::TelegramConfig;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

const DEFAULT_CONFIG_PATH: &str = "~/.linkrelay/config.toml";
const ENV_PREFIX: &str = "LINKRELAY";

#[derive(Clone, Deserialize)]
pub struct TelegramSettings {
    #[serde(default)]
    pub bot_token: String,
    pub api_base: String,
    pub poll_timeout_secs: u64,
}

impl fmt::Debug for TelegramSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramSettings")
            .field("bot_token", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelaySettings {
    #[serde(default)]
    pub destination_chat_id: String,
    pub interval_minutes: u64,
    pub message_prefix: String,
    #[serde(default = "default_accepted_hosts")]
    pub accepted_hosts: Vec<String>,
    pub acknowledge: bool,
    pub channel_posts_only: bool,
}

fn default_accepted_hosts() -> Vec<String> {
    DEFAULT_ACCEPTED_HOSTS.iter().map(|h| h.to_string()).collect()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub telegram: TelegramSettings,
    pub relay: RelaySettings,
    pub server: ServerSettings,
}

impl Settings {
    /// Load from the real process environment
    pub fn load() -> Result<Self> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        let path = vars
            .get("LINKRELAY_CONFIG")
            .cloned()
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
        let path = PathBuf::from(shellexpand::tilde(&path).into_owned());

        Self::load_from(Some(path), vars)
    }

    /// Load from an explicit file and variable set
    pub fn load_from(file: Option<PathBuf>, vars: HashMap<String, String>) -> Result<Self> {
        let mut builder = config::Config::builder()
            .set_default("telegram.api_base", linkrelay_infra_telegram::client::DEFAULT_API_BASE)?
            .set_default(
                "telegram.poll_timeout_secs",
                linkrelay_infra_telegram::client::DEFAULT_POLL_TIMEOUT_SECS,
            )?
            .set_default("relay.interval_minutes", IntervalMinutes::default().get())?
            .set_default(
                "relay.message_prefix",
                linkrelay_core::application::dispatcher::DEFAULT_MESSAGE_PREFIX,
            )?
            .set_default("relay.acknowledge", false)?
            .set_default("relay.channel_posts_only", true)?
            .set_default("server.host", RpcServerConfig::default().host)?
            .set_default("server.port", i64::from(RpcServerConfig::default().port))?;

        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(false));
        }

        let legacy_port = match vars.get("PORT") {
            Some(raw) => Some(
                raw.trim()
                    .parse::<u16>()
                    .with_context(|| format!("PORT must be a TCP port number, got {raw:?}"))?,
            ),
            None => None,
        };

        let settings: Settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("relay.accepted_hosts")
                    .try_parsing(true)
                    .source(Some(vars.clone())),
            )
            .set_override_option("telegram.bot_token", vars.get("BOT_TOKEN").cloned())?
            .set_override_option("relay.destination_chat_id", vars.get("GROUP_CHAT_ID").cloned())?
            .set_override_option("server.port", legacy_port.map(i64::from))?
            .build()
            .context("Failed to assemble configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the relay cannot start with
    pub fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.trim().is_empty() {
            bail!("Bot token is missing (set BOT_TOKEN or telegram.bot_token)");
        }
        if self.relay.destination_chat_id.trim().is_empty() {
            bail!("Destination chat is missing (set GROUP_CHAT_ID or relay.destination_chat_id)");
        }
        if self.relay.interval_minutes == 0 {
            bail!("relay.interval_minutes must be a positive number");
        }
        if self.relay.accepted_hosts.iter().all(|h| h.trim().is_empty()) {
            bail!("relay.accepted_hosts must name at least one host");
        }
        Ok(())
    }

    pub fn initial_interval(&self) -> Result<IntervalMinutes> {
        IntervalMinutes::new(self.relay.interval_minutes).context("Invalid initial interval")
    }

    pub fn extractor(&self) -> LinkExtractor {
        LinkExtractor::new(&self.relay.accepted_hosts)
    }

    pub fn telegram_config(&self) -> TelegramConfig {
        TelegramConfig {
            bot_token: self.telegram.bot_token.trim().to_string(),
            api_base: self.telegram.api_base.trim_end_matches('/').to_string(),
            poll_timeout_secs: self.telegram.poll_timeout_secs,
        }
    }

    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            message_prefix: self.relay.message_prefix.clone(),
            ..DispatcherConfig::new(ChatId::from(self.relay.destination_chat_id.trim()))
        }
    }

    pub fn ingestion_config(&self) -> IngestionConfig {
        IngestionConfig {
            acknowledge: self.relay.acknowledge,
            channel_posts_only: self.relay.channel_posts_only,
        }
    }

    pub fn rpc_config(&self) -> RpcServerConfig {
        RpcServerConfig {
            host: self.server.host.clone(),
            port: self.server.port,
        }
    }
}
