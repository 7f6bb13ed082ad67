//! Calls out to the chat platform.
//!
//! Handlers only talk to Discord through [`Platform`], so they can be driven
//! without a live connection.

use crate::command::Response;
use crate::race::PlatformInvite;

use anyhow::Error;

use chrono::{DateTime, Utc};

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use twilight_cache_inmemory::InMemoryCache;
use twilight_http::Client;
use twilight_model::channel::message::{AllowedMentions, MentionType};
use twilight_model::guild::invite::Invite;
use twilight_model::id::marker::{ApplicationMarker, ChannelMarker, GuildMarker, InteractionMarker};
use twilight_model::id::Id;
use twilight_model::util::Timestamp;

pub type PlatformFuture<'f, T> = Pin<Box<dyn Future<Output = Result<T, Error>> + Send + 'f>>;

/// The interaction a response answers.
#[derive(Clone, Debug)]
pub struct Invocation {
    pub application_id: Id<ApplicationMarker>,
    pub id: Id<InteractionMarker>,
    pub token: String,
}

/// Outbound calls a race needs.
pub trait Platform: Send + Sync {
    /// Fetches every invite of a guild, as Discord currently reports them.
    fn guild_invites<'f>(&'f self, guild_id: Id<GuildMarker>) -> PlatformFuture<'f, Vec<PlatformInvite>>;

    /// Posts a message in a guild's announcement channel.
    ///
    /// `@everyone` pings in `content` are allowed.
    fn announce<'f>(&'f self, guild_id: Id<GuildMarker>, content: String) -> PlatformFuture<'f, ()>;

    /// Responds to a command invocation.
    fn respond<'f>(&'f self, invocation: &'f Invocation, response: Response) -> PlatformFuture<'f, ()>;
}

/// The Discord platform, reached through Twilight.
pub struct Discord {
    http: Arc<Client>,
    cache: Arc<InMemoryCache>,
    announce_channel: Option<Id<ChannelMarker>>,
}

impl Discord {
    /// Create a new `Discord`.
    ///
    /// Announcements go to `announce_channel` if it is set, otherwise to the
    /// guild's system channel.
    pub fn new(
        http: Arc<Client>,
        cache: Arc<InMemoryCache>,
        announce_channel: Option<Id<ChannelMarker>>,
    ) -> Discord {
        Discord {
            http,
            cache,
            announce_channel,
        }
    }

    fn cached_system_channel(&self, guild_id: Id<GuildMarker>) -> Option<Id<ChannelMarker>> {
        self.cache
            .guild(guild_id)
            .and_then(|guild| guild.system_channel_id())
    }

    async fn announce_channel(
        &self,
        guild_id: Id<GuildMarker>,
    ) -> Result<Option<Id<ChannelMarker>>, Error> {
        if let Some(channel_id) = self.announce_channel {
            return Ok(Some(channel_id));
        }

        if let Some(channel_id) = self.cached_system_channel(guild_id) {
            return Ok(Some(channel_id));
        }

        // the guild may not be cached yet
        let guild = self.http.guild(guild_id).await?.model().await?;

        Ok(guild.system_channel_id)
    }
}

impl Platform for Discord {
    fn guild_invites<'f>(&'f self, guild_id: Id<GuildMarker>) -> PlatformFuture<'f, Vec<PlatformInvite>> {
        Box::pin(async move {
            let invites = self.http.guild_invites(guild_id).await?.models().await?;

            Ok(invites.into_iter().map(platform_invite).collect())
        })
    }

    fn announce<'f>(&'f self, guild_id: Id<GuildMarker>, content: String) -> PlatformFuture<'f, ()> {
        Box::pin(async move {
            let channel_id = match self.announce_channel(guild_id).await? {
                Some(channel_id) => channel_id,
                None => {
                    warn!("guild {} has no announcement channel, skipping: {}", guild_id, content);
                    return Ok(());
                }
            };

            let allowed_mentions = AllowedMentions {
                parse: vec![MentionType::Everyone, MentionType::Users],
                ..AllowedMentions::default()
            };

            self.http
                .create_message(channel_id)
                .content(&content)?
                .allowed_mentions(Some(&allowed_mentions))
                .await?;

            Ok(())
        })
    }

    fn respond<'f>(&'f self, invocation: &'f Invocation, response: Response) -> PlatformFuture<'f, ()> {
        Box::pin(async move {
            let response = response.into_interaction_response();

            self.http
                .interaction(invocation.application_id)
                .create_response(invocation.id, &invocation.token, &response)
                .await?;

            Ok(())
        })
    }
}

/// Converts a Twilight timestamp.
pub fn timestamp(ts: Timestamp) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_micros(ts.as_micros())
}

fn platform_invite(invite: Invite) -> PlatformInvite {
    PlatformInvite {
        code: invite.code,
        uses: invite.uses.unwrap_or(0),
        created_at: invite.created_at.and_then(timestamp),
        inviter: invite.inviter.map(|user| user.id),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    use std::sync::Mutex;

    use anyhow::anyhow;

    /// A platform that records what it is asked to do.
    #[derive(Default)]
    pub struct FakePlatform {
        pub invites: Mutex<Vec<PlatformInvite>>,
        pub fail_invites: Mutex<bool>,
        pub announcements: Mutex<Vec<(Id<GuildMarker>, String)>>,
        pub responses: Mutex<Vec<Response>>,
    }

    impl FakePlatform {
        pub fn set_invites(&self, invites: Vec<PlatformInvite>) {
            *self.invites.lock().unwrap() = invites;
        }

        pub fn announcements(&self) -> Vec<String> {
            self.announcements
                .lock()
                .unwrap()
                .iter()
                .map(|(_, content)| content.clone())
                .collect()
        }

        pub fn last_response(&self) -> Option<Response> {
            self.responses.lock().unwrap().last().cloned()
        }
    }

    impl Platform for FakePlatform {
        fn guild_invites<'f>(&'f self, _guild_id: Id<GuildMarker>) -> PlatformFuture<'f, Vec<PlatformInvite>> {
            Box::pin(async move {
                if *self.fail_invites.lock().unwrap() {
                    return Err(anyhow!("Missing Permissions"));
                }

                Ok(self.invites.lock().unwrap().clone())
            })
        }

        fn announce<'f>(&'f self, guild_id: Id<GuildMarker>, content: String) -> PlatformFuture<'f, ()> {
            Box::pin(async move {
                self.announcements.lock().unwrap().push((guild_id, content));
                Ok(())
            })
        }

        fn respond<'f>(&'f self, _invocation: &'f Invocation, response: Response) -> PlatformFuture<'f, ()> {
            Box::pin(async move {
                self.responses.lock().unwrap().push(response);
                Ok(())
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_timestamps() {
        let ts = Timestamp::parse("2024-03-01T12:30:00.250000+00:00").unwrap();
        let converted = timestamp(ts).unwrap();

        assert_eq!(converted.to_rfc3339(), "2024-03-01T12:30:00.250+00:00");
    }
}
