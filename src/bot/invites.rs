//! Invite use tracking.

use super::win_message;
use crate::platform::{timestamp, Platform};
use crate::races::Races;
use crate::service::{Error, Event, Service, ServiceFuture};

use anyhow::anyhow;

use chrono::{DateTime, Utc};

use std::sync::Arc;

use twilight_model::id::{marker::GuildMarker, Id};

/// Watches invites and member joins for running races.
pub struct InviteTracking<P> {
    races: Races,
    platform: Arc<P>,
}

impl<P> Clone for InviteTracking<P> {
    fn clone(&self) -> Self {
        InviteTracking {
            races: self.races.clone(),
            platform: self.platform.clone(),
        }
    }
}

impl<P> InviteTracking<P>
where
    P: Platform,
{
    pub fn new(races: Races, platform: Arc<P>) -> InviteTracking<P> {
        InviteTracking { races, platform }
    }

    /// Handles an invite being created.
    pub fn invite_created(
        &self,
        guild_id: Id<GuildMarker>,
        code: &str,
        created_at: DateTime<Utc>,
        uses: u64,
    ) {
        let tracked = self
            .races
            .with(guild_id, |race| race.on_invite_created(code, created_at, uses));

        if tracked {
            info!("guild {}: new invite created after race start: {}", guild_id, code);
        }
    }

    /// Handles an invite being deleted.
    pub fn invite_deleted(&self, guild_id: Id<GuildMarker>, code: &str) {
        if self.races.with(guild_id, |race| race.on_invite_deleted(code)) {
            info!("guild {}: stopped tracking deleted invite {}", guild_id, code);
        }
    }

    /// Handles a member joining, announcing the winner if the join ended the
    /// race.
    pub async fn member_joined(&self, guild_id: Id<GuildMarker>) -> Result<(), Error> {
        if !self.races.is_active(guild_id) {
            return Ok(());
        }

        let invites = self.platform.guild_invites(guild_id).await?;

        let winner = self
            .races
            .with(guild_id, |race| race.on_member_join(&invites));

        if let Some(winner) = winner {
            info!(
                "guild {}: RACE COMPLETE: {} has reached {} uses and won the race",
                guild_id, winner.code, winner.goal,
            );

            self.platform.announce(guild_id, win_message(&winner)).await?;
        }

        Ok(())
    }

    async fn handle_event(&self, ev: &Event) -> Result<(), Error> {
        match ev {
            Event::InviteCreate(invite) => {
                let created_at = timestamp(invite.created_at)
                    .ok_or_else(|| anyhow!("invite {} has an invalid creation time", invite.code))?;

                self.invite_created(invite.guild_id, &invite.code, created_at, u64::from(invite.uses));
                Ok(())
            }
            Event::InviteDelete(invite) => {
                self.invite_deleted(invite.guild_id, &invite.code);
                Ok(())
            }
            Event::MemberAdd(member) => self.member_joined(member.guild_id).await,
            _ => Ok(()),
        }
    }
}

impl<P> Service for InviteTracking<P>
where
    P: Platform + 'static,
{
    fn handle<'f>(&'f self, ev: &'f Event) -> ServiceFuture<'f> {
        Box::pin(async move {
            if let Err(err) = self.handle_event(ev).await {
                error!("invite tracking: {:#}", err);
            }
        })
    }
}
