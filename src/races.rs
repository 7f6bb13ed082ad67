//! Per-guild race state.

use crate::race::RaceTracker;

use std::sync::Arc;

use dashmap::DashMap;

use twilight_model::id::{marker::GuildMarker, Id};

/// A table of races, one for each guild.
///
/// A guild's tracker is locked for the duration of [`Races::with`], so
/// handlers running on different tasks never see a half-applied transition.
/// Never hold it across an await.
#[derive(Clone, Default)]
pub struct Races(Arc<DashMap<Id<GuildMarker>, RaceTracker>>);

impl Races {
    /// Create a new `Races`.
    pub fn new() -> Races {
        Races::default()
    }

    /// Runs `f` with exclusive access to a guild's tracker, creating an
    /// inactive one if the guild has never had a race.
    pub fn with<F, R>(&self, guild_id: Id<GuildMarker>, f: F) -> R
    where
        F: FnOnce(&mut RaceTracker) -> R,
    {
        let mut tracker = self.0.entry(guild_id).or_default();
        f(&mut tracker)
    }

    /// Whether a race is running in a guild.
    pub fn is_active(&self, guild_id: Id<GuildMarker>) -> bool {
        self.0
            .get(&guild_id)
            .map(|tracker| tracker.is_active())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guilds_race_independently() {
        let races = Races::new();
        let (a, b) = (Id::new(1), Id::new(2));

        races.with(a, |t| t.start_race(3)).unwrap();

        assert!(races.is_active(a));
        assert!(!races.is_active(b));
        assert!(races.with(b, |t| t.start_race(3)).is_ok());
        assert!(races.clone().is_active(b));
    }
}
