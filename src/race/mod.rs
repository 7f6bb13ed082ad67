//! Invite race state.
//!
//! A race tracks every invite created after it started and watches their use
//! counts as members join. The first tracked invite to reach the goal wins,
//! which ends the race.

pub mod leaderboard;

pub use leaderboard::{build_leaderboard, Leaderboard};

use chrono::{DateTime, Utc};

use std::collections::HashMap;
use std::error::Error;
use std::fmt::{self, Display, Formatter};

use twilight_model::id::{marker::UserMarker, Id};

/// An invite as the platform currently reports it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlatformInvite {
    pub code: String,
    pub uses: u64,
    /// When the invite was created.
    ///
    /// The platform omits this for some invites, such as vanity urls.
    pub created_at: Option<DateTime<Utc>>,
    pub inviter: Option<Id<UserMarker>>,
}

/// The last known use count of a tracked invite.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InviteRecord {
    code: String,
    uses: u64,
}

impl InviteRecord {
    /// The invite code.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// How many times the invite had been used when it was last seen.
    pub fn uses(&self) -> u64 {
        self.uses
    }
}

/// The invite that won a race.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Winner {
    pub code: String,
    pub uses: u64,
    pub goal: u64,
    pub inviter: Option<Id<UserMarker>>,
}

/// The state of a single race.
///
/// A tracker starts inactive. [`RaceTracker::start_race`] activates it, and it
/// goes inactive again when it is stopped or an invite reaches the goal.
#[derive(Debug, Default)]
pub struct RaceTracker {
    active: bool,
    goal: u64,
    start_time: Option<DateTime<Utc>>,
    invites: HashMap<String, InviteRecord>,
}

impl RaceTracker {
    /// Create a new, inactive `RaceTracker`.
    pub fn new() -> RaceTracker {
        RaceTracker::default()
    }

    /// Whether a race is running.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The number of uses an invite needs to win.
    pub fn goal(&self) -> u64 {
        self.goal
    }

    /// When the last race was started.
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    /// Gets the record of a tracked invite.
    pub fn invite(&self, code: &str) -> Option<&InviteRecord> {
        self.invites.get(code)
    }

    /// The invites currently tracked, in no particular order.
    pub fn invites(&self) -> impl Iterator<Item = &InviteRecord> {
        self.invites.values()
    }

    /// Starts a race now.
    pub fn start_race(&mut self, goal: i64) -> Result<DateTime<Utc>, RaceError> {
        self.start_race_at(goal, Utc::now())
    }

    /// Starts a race at a specific time.
    ///
    /// Any invites tracked by a previous race are forgotten.
    pub fn start_race_at(
        &mut self,
        goal: i64,
        now: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, RaceError> {
        if self.active {
            return Err(RaceError::AlreadyActive);
        }

        let goal = match u64::try_from(goal) {
            Ok(goal) if goal > 0 => goal,
            _ => return Err(RaceError::InvalidGoal(goal)),
        };

        self.invites.clear();
        self.active = true;
        self.goal = goal;
        self.start_time = Some(now);

        Ok(now)
    }

    /// Stops the running race.
    pub fn stop_race(&mut self) -> Result<(), RaceError> {
        if !self.active {
            return Err(RaceError::NotActive);
        }

        self.active = false;
        Ok(())
    }

    /// Records a newly created invite.
    ///
    /// Returns `true` if the invite is now tracked. Only invites created
    /// strictly after the race started are tracked.
    pub fn on_invite_created(
        &mut self,
        code: &str,
        created_at: DateTime<Utc>,
        uses: u64,
    ) -> bool {
        match self.start_time {
            Some(start_time) if self.active && created_at > start_time => {
                self.invites.insert(
                    code.to_owned(),
                    InviteRecord {
                        code: code.to_owned(),
                        uses,
                    },
                );
                true
            }
            _ => false,
        }
    }

    /// Forgets a deleted invite, whether or not a race is running.
    ///
    /// Returns `true` if the invite was tracked.
    pub fn on_invite_deleted(&mut self, code: &str) -> bool {
        self.invites.remove(code).is_some()
    }

    /// Evaluates a member join against the current invites of the guild.
    ///
    /// The first tracked invite, in the order given, whose use count went up
    /// is credited with the join. Only that invite is updated, even if others
    /// went up as well. If it reached the goal, the race ends and the winner
    /// is returned.
    pub fn on_member_join(&mut self, current: &[PlatformInvite]) -> Option<Winner> {
        if !self.active {
            return None;
        }

        let invite = current.iter().find(|invite| {
            self.invites
                .get(&invite.code)
                .map(|record| invite.uses > record.uses)
                .unwrap_or(false)
        })?;

        if let Some(record) = self.invites.get_mut(&invite.code) {
            record.uses = invite.uses;
        }

        debug!("join attributed to {} ({} uses)", invite.code, invite.uses);

        if invite.uses >= self.goal {
            self.active = false;

            Some(Winner {
                code: invite.code.clone(),
                uses: invite.uses,
                goal: self.goal,
                inviter: invite.inviter,
            })
        } else {
            None
        }
    }

    /// Builds a leaderboard of the invites created since the race started.
    ///
    /// Invites this tracker has seen deleted are left out, even if `current`
    /// still lists them. Returns `None` if no race was ever started.
    pub fn leaderboard(&self, current: &[PlatformInvite]) -> Option<Leaderboard> {
        let start_time = self.start_time?;

        let current: Vec<PlatformInvite> = current
            .iter()
            .filter(|invite| self.invites.contains_key(&invite.code))
            .cloned()
            .collect();

        Some(build_leaderboard(&current, start_time))
    }
}

/// An error returned by the state transitions of [`RaceTracker`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RaceError {
    AlreadyActive,
    InvalidGoal(i64),
    NotActive,
}

impl Display for RaceError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            RaceError::AlreadyActive => f.write_str("The invite race is already in progress!"),
            RaceError::InvalidGoal(_) => {
                f.write_str("Please provide a valid positive number for the goal.")
            }
            RaceError::NotActive => f.write_str("The invite race is not currently running."),
        }
    }
}

impl Error for RaceError {}
