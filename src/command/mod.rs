//! Command utilities.

pub mod chat;

use chat::{ArgError, Arguments};

use twilight_model::application::command::{Command, CommandType};
use twilight_model::channel::message::MessageFlags;
use twilight_model::guild::Permissions;
use twilight_model::http::interaction::{InteractionResponse, InteractionResponseType};
use twilight_util::builder::command::{CommandBuilder, IntegerBuilder};
use twilight_util::builder::InteractionResponseDataBuilder;

/// A response to an interaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    content: String,
    ephemeral: bool,
}

impl Response {
    /// Creates a new response, visible to everyone in the channel.
    pub fn new(content: impl Into<String>) -> Self {
        Response {
            content: content.into(),
            ephemeral: false,
        }
    }

    /// Marks the response as ephemeral.
    pub fn ephemeral(mut self) -> Self {
        self.ephemeral = true;
        self
    }

    /// The response's content.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Whether only the invoking user can see the response.
    pub fn is_ephemeral(&self) -> bool {
        self.ephemeral
    }

    /// Converts the response into a message-with-source callback.
    pub fn into_interaction_response(self) -> InteractionResponse {
        let mut data = InteractionResponseDataBuilder::new().content(self.content);

        if self.ephemeral {
            data = data.flags(MessageFlags::EPHEMERAL);
        }

        InteractionResponse {
            kind: InteractionResponseType::ChannelMessageWithSource,
            data: Some(data.build()),
        }
    }
}

/// The commands the bot understands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RaceCommand {
    /// `/race_start goal`
    Start { goal: i64 },
    /// `/stop_race`
    Stop,
    /// `/leaderboard`
    Leaderboard,
}

impl RaceCommand {
    /// Parses an invoked chat command.
    ///
    /// Returns `Ok(None)` for commands this bot does not handle.
    pub fn parse(args: &Arguments<'_>) -> Result<Option<RaceCommand>, ArgError> {
        let command = match args.name() {
            "race_start" => RaceCommand::Start {
                goal: args.require_integer("goal")?,
            },
            "stop_race" => RaceCommand::Stop,
            "leaderboard" => RaceCommand::Leaderboard,
            _ => return Ok(None),
        };

        Ok(Some(command))
    }
}

/// The slash commands to register with Discord.
pub fn commands() -> Vec<Command> {
    vec![
        CommandBuilder::new(
            "race_start",
            "Start the invite tracking race with a specific goal.",
            CommandType::ChatInput,
        )
        .default_member_permissions(Permissions::ADMINISTRATOR)
        .dm_permission(false)
        .option(
            IntegerBuilder::new("goal", "Number of invite uses to win the race.")
                .required(true)
                .min_value(1),
        )
        .build(),
        CommandBuilder::new(
            "stop_race",
            "Stop the invite tracking race.",
            CommandType::ChatInput,
        )
        .default_member_permissions(Permissions::ADMINISTRATOR)
        .dm_permission(false)
        .build(),
        CommandBuilder::new(
            "leaderboard",
            "Show the invites created since the race started.",
            CommandType::ChatInput,
        )
        .default_member_permissions(Permissions::ADMINISTRATOR)
        .dm_permission(false)
        .build(),
    ]
}
