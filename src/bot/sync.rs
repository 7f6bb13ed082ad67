//! Slash command registration.

use super::invite_link;
use crate::command;
use crate::service::{Error, Event, Service, ServiceFuture};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use twilight_http::Client;
use twilight_model::id::{
    marker::{ApplicationMarker, GuildMarker},
    Id,
};

/// Registers the race commands the first time the bot is ready.
#[derive(Clone)]
pub struct CommandSync {
    client: Arc<Client>,
    guild: Option<Id<GuildMarker>>,
    synced: Arc<AtomicBool>,
}

impl CommandSync {
    /// Create a new `CommandSync`.
    ///
    /// Commands are registered in `guild` if it is set, otherwise globally.
    pub fn new(client: Arc<Client>, guild: Option<Id<GuildMarker>>) -> CommandSync {
        CommandSync {
            client,
            guild,
            synced: Arc::default(),
        }
    }

    /// Overwrites the application's commands, returning their names.
    pub async fn sync(&self, application_id: Id<ApplicationMarker>) -> Result<Vec<String>, Error> {
        let commands = command::commands();
        let interaction = self.client.interaction(application_id);

        let synced = match self.guild {
            Some(guild_id) => {
                interaction
                    .set_guild_commands(guild_id, &commands)
                    .await?
                    .models()
                    .await?
            }
            None => interaction.set_global_commands(&commands).await?.models().await?,
        };

        Ok(synced.into_iter().map(|command| command.name).collect())
    }
}

impl Service for CommandSync {
    fn handle<'f>(&'f self, ev: &'f Event) -> ServiceFuture<'f> {
        Box::pin(async move {
            let ready = match ev {
                Event::Ready(ready) => ready,
                _ => return,
            };

            // ready fires again on every new session
            if self.synced.swap(true, Ordering::AcqRel) {
                return;
            }

            let application_id = ready.application.id;
            info!("invite the bot with {}", invite_link(application_id));

            match self.sync(application_id).await {
                Ok(names) => info!("synced {} commands: {:?}", names.len(), names),
                Err(err) => {
                    self.synced.store(false, Ordering::Release);
                    error!("failed to sync commands: {:#}", err);
                }
            }
        })
    }
}
