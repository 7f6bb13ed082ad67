//! Bot configuration, read from the environment.

use anyhow::{anyhow, Context, Error};

use std::env;

use twilight_model::id::{marker::ChannelMarker, Id};

/// The environment variable holding the `env_logger` filter.
pub const LOG_ENV: &str = "INVITE_RACE_LOG";

/// Bot configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// The bot token.
    pub token: String,
    /// Where to post race announcements instead of the system channel.
    pub announce_channel: Option<Id<ChannelMarker>>,
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Config, Error> {
        Config::from_lookup(|key| env::var(key).ok())
    }

    /// Reads the configuration through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Config, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup("DISCORD_TOKEN").ok_or_else(|| anyhow!("DISCORD_TOKEN is not set"))?;

        let announce_channel = lookup("INVITE_RACE_CHANNEL")
            .map(|id| parse_id(&id).context("INVITE_RACE_CHANNEL is not a valid channel id"))
            .transpose()?;

        Ok(Config {
            token,
            announce_channel,
        })
    }
}

/// Parses a nonzero Discord snowflake.
pub fn parse_id<T>(id: &str) -> Result<Id<T>, Error> {
    let id = id.trim().parse::<u64>()?;

    Id::new_checked(id).ok_or_else(|| anyhow!("id must be nonzero"))
}
