//! The actual services used by the bot.

pub mod invites;
pub mod race;
pub mod sync;

use crate::race::Winner;

use twilight_mention::Mention;
use twilight_model::guild::Permissions;
use twilight_model::id::{marker::ApplicationMarker, Id};

/// The permissions the bot needs to run a race.
pub const REQUIRED_PERMISSIONS: Permissions = Permissions::MANAGE_GUILD
    .union(Permissions::VIEW_CHANNEL)
    .union(Permissions::SEND_MESSAGES)
    .union(Permissions::MENTION_EVERYONE);

/// Generates a bot invite link.
pub fn invite_link(id: Id<ApplicationMarker>) -> String {
    format!(
        "https://discord.com/api/oauth2/authorize?client_id={}&permissions={}&scope=bot%20applications.commands",
        id,
        REQUIRED_PERMISSIONS.bits(),
    )
}

/// The announcement posted when a race starts.
pub fn start_message(goal: u64) -> String {
    format!(
        "@everyone The invite race has started! First invite to reach {} uses wins. \
         **Any invites created starting NOW will count toward this!**",
        goal,
    )
}

/// The announcement posted when an invite wins.
pub fn win_message(winner: &Winner) -> String {
    let inviter = match winner.inviter {
        Some(id) => id.mention().to_string(),
        None => String::from("an unknown user"),
    };

    format!(
        "@everyone The invite code **`{}`** created by {} has reached **{}** uses first and won the race!",
        winner.code, inviter, winner.goal,
    )
}
