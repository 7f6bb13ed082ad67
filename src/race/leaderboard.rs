//! Race standings, grouped by who created the invites.

use super::PlatformInvite;

use chrono::{DateTime, Utc};

use std::fmt::{self, Display, Formatter};

use twilight_mention::Mention;
use twilight_model::id::{marker::UserMarker, Id};

/// The standings of a race.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Leaderboard {
    /// No invites were created since the race started.
    Empty,
    /// Invites grouped by inviter, most total uses first.
    Standings(Vec<Entry>),
}

/// All of the race invites a single user created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub inviter: Option<Id<UserMarker>>,
    /// `(code, uses)` in the order the platform listed them.
    pub invites: Vec<(String, u64)>,
}

impl Entry {
    /// The sum of the uses of this user's invites.
    pub fn total_uses(&self) -> u64 {
        self.invites.iter().map(|(_, uses)| uses).sum()
    }
}

/// Builds a leaderboard from the current invites of a guild.
///
/// Invites without a creation time, or created at or before `start_time`, are
/// left out. Ties between inviters keep the order they first appeared in.
pub fn build_leaderboard(current: &[PlatformInvite], start_time: DateTime<Utc>) -> Leaderboard {
    let mut entries: Vec<Entry> = Vec::new();

    let qualifying = current.iter().filter(|invite| {
        invite
            .created_at
            .map(|created_at| created_at > start_time)
            .unwrap_or(false)
    });

    for invite in qualifying {
        let record = (invite.code.clone(), invite.uses);

        match entries.iter_mut().find(|e| e.inviter == invite.inviter) {
            Some(entry) => entry.invites.push(record),
            None => entries.push(Entry {
                inviter: invite.inviter,
                invites: vec![record],
            }),
        }
    }

    if entries.is_empty() {
        Leaderboard::Empty
    } else {
        // stable, so ties stay in order of appearance
        entries.sort_by(|a, b| b.total_uses().cmp(&a.total_uses()));
        Leaderboard::Standings(entries)
    }
}

impl Display for Leaderboard {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let entries = match self {
            Leaderboard::Empty => {
                return f.write_str("No invites have been created since the race started.")
            }
            Leaderboard::Standings(entries) => entries,
        };

        for (i, entry) in entries.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }

            match entry.inviter {
                Some(id) => write!(f, "{}: ", id.mention())?,
                None => f.write_str("unknown: ")?,
            }

            for (j, (code, uses)) in entry.invites.iter().enumerate() {
                if j > 0 {
                    f.write_str(", ")?;
                }

                write!(f, "`{}` ({} {})", code, uses, if *uses == 1 { "use" } else { "uses" })?;
            }
        }

        Ok(())
    }
}
