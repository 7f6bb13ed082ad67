//! The race commands.
//!
//! ```txt
//! /race_start goal - Starts a race. The first invite to reach `goal` uses wins.
//! /stop_race       - Stops the running race.
//! /leaderboard     - Lists the invites created since the race started.
//! ```

use super::start_message;
use crate::command::chat::{ArgError, Arguments};
use crate::command::{RaceCommand, Response};
use crate::platform::{Invocation, Platform};
use crate::race::RaceError;
use crate::races::Races;
use crate::service::{Error, Event, Service, ServiceFuture};

use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use twilight_model::application::interaction::{Interaction, InteractionData};
use twilight_model::guild::Permissions;
use twilight_model::id::{marker::GuildMarker, Id};

/// Who invoked a command, and where.
#[derive(Clone, Debug)]
pub struct Invoker {
    pub guild_id: Option<Id<GuildMarker>>,
    /// The invoking member's permissions in the channel.
    pub permissions: Permissions,
    /// The bot's permissions in the channel, if Discord sent them.
    pub app_permissions: Option<Permissions>,
}

impl Invoker {
    pub fn from_interaction(interaction: &Interaction) -> Invoker {
        Invoker {
            guild_id: interaction.guild_id,
            permissions: interaction
                .member
                .as_ref()
                .and_then(|member| member.permissions)
                .unwrap_or_else(Permissions::empty),
            app_permissions: interaction.app_permissions,
        }
    }

    fn guild_id(&self) -> Result<Id<GuildMarker>, CommandError> {
        self.guild_id.ok_or(CommandError::NotInGuild)
    }

    fn is_admin(&self) -> bool {
        self.permissions.contains(Permissions::ADMINISTRATOR)
    }

    fn bot_can_manage_guild(&self) -> bool {
        self.app_permissions
            .map(|perms| perms.intersects(Permissions::ADMINISTRATOR | Permissions::MANAGE_GUILD))
            .unwrap_or(false)
    }
}

/// What a successful command produced.
struct Outcome {
    response: Response,
    /// Posted publicly after the response is sent.
    announcement: Option<String>,
}

impl From<Response> for Outcome {
    fn from(response: Response) -> Outcome {
        Outcome {
            response,
            announcement: None,
        }
    }
}

/// Service that enables the race commands.
pub struct RaceCommands<P> {
    races: Races,
    platform: Arc<P>,
}

impl<P> Clone for RaceCommands<P> {
    fn clone(&self) -> Self {
        RaceCommands {
            races: self.races.clone(),
            platform: self.platform.clone(),
        }
    }
}

impl<P> RaceCommands<P>
where
    P: Platform,
{
    pub fn new(races: Races, platform: Arc<P>) -> RaceCommands<P> {
        RaceCommands { races, platform }
    }

    /// Runs a command and responds to it.
    ///
    /// Failures are reported to the invoking user; only errors from talking to
    /// Discord after the fact are returned.
    pub async fn command(
        &self,
        invocation: &Invocation,
        invoker: &Invoker,
        command: RaceCommand,
    ) -> Result<(), Error> {
        let outcome = match self.run(invoker, &command).await {
            Ok(outcome) => outcome,
            Err(err) => {
                info!("{:?} rejected: {}", command, err);
                Response::new(err.to_string()).ephemeral().into()
            }
        };

        self.platform.respond(invocation, outcome.response).await?;

        if let (Some(announcement), Some(guild_id)) = (outcome.announcement, invoker.guild_id) {
            self.platform.announce(guild_id, announcement).await?;
        }

        Ok(())
    }

    async fn run(&self, invoker: &Invoker, command: &RaceCommand) -> Result<Outcome, CommandError> {
        match *command {
            RaceCommand::Start { goal } => self.start(invoker, goal),
            RaceCommand::Stop => self.stop(invoker),
            RaceCommand::Leaderboard => self.leaderboard(invoker).await,
        }
    }

    fn start(&self, invoker: &Invoker, goal: i64) -> Result<Outcome, CommandError> {
        let guild_id = invoker.guild_id()?;

        if !invoker.is_admin() {
            return Err(CommandError::MissingPermissions);
        }

        if !invoker.bot_can_manage_guild() {
            return Err(CommandError::BotMissingPermissions);
        }

        let (start_time, goal) = self.races.with(guild_id, |race| {
            race.start_race(goal).map(|start_time| (start_time, race.goal()))
        })?;

        info!("guild {}: race started with goal {} uses at {}", guild_id, goal, start_time);

        Ok(Outcome {
            response: Response::new("Starting invite race...").ephemeral(),
            announcement: Some(start_message(goal)),
        })
    }

    fn stop(&self, invoker: &Invoker) -> Result<Outcome, CommandError> {
        let guild_id = invoker.guild_id()?;

        if !invoker.is_admin() {
            return Err(CommandError::MissingPermissions);
        }

        self.races.with(guild_id, |race| race.stop_race())?;

        info!("guild {}: race stopped", guild_id);

        Ok(Response::new("The invite race has been stopped.").into())
    }

    async fn leaderboard(&self, invoker: &Invoker) -> Result<Outcome, CommandError> {
        let guild_id = invoker.guild_id()?;

        if !self.races.is_active(guild_id) {
            return Err(CommandError::Race(RaceError::NotActive));
        }

        let invites = self
            .platform
            .guild_invites(guild_id)
            .await
            .map_err(CommandError::Platform)?;

        let leaderboard = self
            .races
            .with(guild_id, |race| race.leaderboard(&invites))
            .ok_or(CommandError::Race(RaceError::NotActive))?;

        Ok(Response::new(leaderboard.to_string()).into())
    }

    async fn handle_event(&self, ev: &Event) -> Result<(), Error> {
        let interaction = match ev {
            Event::InteractionCreate(interaction) => interaction,
            _ => return Ok(()),
        };

        let data = match &interaction.data {
            Some(InteractionData::ApplicationCommand(data)) => data,
            _ => return Ok(()),
        };

        let invocation = Invocation {
            application_id: interaction.application_id,
            id: interaction.id,
            token: interaction.token.clone(),
        };

        let command = match RaceCommand::parse(&Arguments::new(data)) {
            Ok(Some(command)) => command,
            Ok(None) => return Ok(()),
            Err(err) => {
                let response = Response::new(CommandError::from(err).to_string()).ephemeral();
                return self.platform.respond(&invocation, response).await;
            }
        };

        info!("received {:?} in guild {:?}", command, interaction.guild_id);

        let invoker = Invoker::from_interaction(interaction);

        self.command(&invocation, &invoker, command).await
    }
}

impl<P> Service for RaceCommands<P>
where
    P: Platform + 'static,
{
    fn handle<'f>(&'f self, ev: &'f Event) -> ServiceFuture<'f> {
        Box::pin(async move {
            if let Err(err) = self.handle_event(ev).await {
                error!("race commands: {:#}", err);
            }
        })
    }
}

/// Why a command was refused.
///
/// The `Display` impl is what the invoking user sees.
#[derive(Debug)]
pub enum CommandError {
    MissingPermissions,
    BotMissingPermissions,
    NotInGuild,
    Argument(ArgError),
    Race(RaceError),
    Platform(Error),
}

impl Display for CommandError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            CommandError::MissingPermissions => {
                f.write_str("You must have Administrator permissions to use this command.")
            }
            CommandError::BotMissingPermissions => {
                f.write_str("I need the 'Manage Server' permission to access invites.")
            }
            CommandError::NotInGuild => f.write_str(
                "This command can only be used in a server. Please run this command in a valid server.",
            ),
            CommandError::Argument(err) => write!(f, "Invalid command arguments: {}", err),
            CommandError::Race(err) => Display::fmt(err, f),
            CommandError::Platform(err) => {
                write!(f, "An error occurred while retrieving invites: {}", err)
            }
        }
    }
}

impl std::error::Error for CommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CommandError::Argument(err) => Some(err),
            CommandError::Race(err) => Some(err),
            CommandError::Platform(err) => Some(&**err),
            _ => None,
        }
    }
}

impl From<ArgError> for CommandError {
    fn from(err: ArgError) -> CommandError {
        CommandError::Argument(err)
    }
}

impl From<RaceError> for CommandError {
    fn from(err: RaceError) -> CommandError {
        CommandError::Race(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::platform::testing::FakePlatform;
    use crate::race::PlatformInvite;

    use chrono::Duration;

    const GUILD: u64 = 100;

    fn setup() -> (RaceCommands<FakePlatform>, Arc<FakePlatform>) {
        let platform = Arc::new(FakePlatform::default());
        (RaceCommands::new(Races::new(), platform.clone()), platform)
    }

    fn invocation() -> Invocation {
        Invocation {
            application_id: Id::new(1),
            id: Id::new(2),
            token: String::from("token"),
        }
    }

    fn admin() -> Invoker {
        Invoker {
            guild_id: Some(Id::new(GUILD)),
            permissions: Permissions::ADMINISTRATOR,
            app_permissions: Some(Permissions::MANAGE_GUILD | Permissions::SEND_MESSAGES),
        }
    }

    async fn respond_to(
        commands: &RaceCommands<FakePlatform>,
        platform: &FakePlatform,
        invoker: &Invoker,
        command: RaceCommand,
    ) -> Response {
        commands.command(&invocation(), invoker, command).await.unwrap();
        platform.last_response().unwrap()
    }

    #[tokio::test]
    async fn start_announces_race() {
        let (commands, platform) = setup();

        let response = respond_to(&commands, &platform, &admin(), RaceCommand::Start { goal: 5 }).await;

        assert_eq!(response, Response::new("Starting invite race...").ephemeral());
        assert_eq!(platform.announcements(), vec![start_message(5)]);
        assert!(commands.races.is_active(Id::new(GUILD)));
    }

    #[tokio::test]
    async fn start_rejections() {
        let (commands, platform) = setup();

        let member = Invoker {
            permissions: Permissions::SEND_MESSAGES,
            ..admin()
        };
        let response = respond_to(&commands, &platform, &member, RaceCommand::Start { goal: 5 }).await;
        assert_eq!(response, Response::new(CommandError::MissingPermissions.to_string()).ephemeral());

        let powerless_bot = Invoker {
            app_permissions: Some(Permissions::SEND_MESSAGES),
            ..admin()
        };
        let response = respond_to(&commands, &platform, &powerless_bot, RaceCommand::Start { goal: 5 }).await;
        assert_eq!(response.content(), CommandError::BotMissingPermissions.to_string());

        let dm = Invoker {
            guild_id: None,
            ..admin()
        };
        let response = respond_to(&commands, &platform, &dm, RaceCommand::Start { goal: 5 }).await;
        assert_eq!(response.content(), CommandError::NotInGuild.to_string());

        let response = respond_to(&commands, &platform, &admin(), RaceCommand::Start { goal: 0 }).await;
        assert_eq!(response.content(), RaceError::InvalidGoal(0).to_string());
        assert!(response.is_ephemeral());

        assert!(platform.announcements().is_empty());
        assert!(!commands.races.is_active(Id::new(GUILD)));
    }

    #[tokio::test]
    async fn start_twice_is_rejected() {
        let (commands, platform) = setup();

        respond_to(&commands, &platform, &admin(), RaceCommand::Start { goal: 5 }).await;
        let response = respond_to(&commands, &platform, &admin(), RaceCommand::Start { goal: 8 }).await;

        assert_eq!(response.content(), RaceError::AlreadyActive.to_string());
        assert_eq!(platform.announcements().len(), 1);
        assert_eq!(commands.races.with(Id::new(GUILD), |race| race.goal()), 5);
    }

    #[tokio::test]
    async fn stop_race() {
        let (commands, platform) = setup();

        let response = respond_to(&commands, &platform, &admin(), RaceCommand::Stop).await;
        assert_eq!(response.content(), "The invite race is not currently running.");

        respond_to(&commands, &platform, &admin(), RaceCommand::Start { goal: 5 }).await;
        let response = respond_to(&commands, &platform, &admin(), RaceCommand::Stop).await;

        assert_eq!(response, Response::new("The invite race has been stopped."));
        assert!(!commands.races.is_active(Id::new(GUILD)));
    }

    #[tokio::test]
    async fn leaderboard_lists_race_invites() {
        let (commands, platform) = setup();

        let response = respond_to(&commands, &platform, &admin(), RaceCommand::Leaderboard).await;
        assert_eq!(response.content(), "The invite race is not currently running.");

        respond_to(&commands, &platform, &admin(), RaceCommand::Start { goal: 5 }).await;
        let start = commands
            .races
            .with(Id::new(GUILD), |race| race.start_time())
            .unwrap();

        let response = respond_to(&commands, &platform, &admin(), RaceCommand::Leaderboard).await;
        assert_eq!(
            response.content(),
            "No invites have been created since the race started."
        );

        commands.races.with(Id::new(GUILD), |race| {
            race.on_invite_created("new", start + Duration::seconds(5), 0);
            race.on_invite_created("gone", start + Duration::seconds(6), 0);
            race.on_invite_deleted("gone");
        });

        platform.set_invites(vec![
            PlatformInvite {
                code: String::from("gone"),
                uses: 9,
                created_at: Some(start + Duration::seconds(6)),
                inviter: Some(Id::new(5)),
            },
            PlatformInvite {
                code: String::from("old"),
                uses: 30,
                created_at: Some(start - Duration::days(1)),
                inviter: Some(Id::new(3)),
            },
            PlatformInvite {
                code: String::from("new"),
                uses: 2,
                created_at: Some(start + Duration::seconds(5)),
                inviter: Some(Id::new(4)),
            },
        ]);

        let response = respond_to(&commands, &platform, &admin(), RaceCommand::Leaderboard).await;
        assert_eq!(response.content(), "<@4>: `new` (2 uses)");
        assert!(!response.is_ephemeral());
    }

    #[tokio::test]
    async fn leaderboard_reports_platform_errors() {
        let (commands, platform) = setup();

        respond_to(&commands, &platform, &admin(), RaceCommand::Start { goal: 5 }).await;
        *platform.fail_invites.lock().unwrap() = true;

        let response = respond_to(&commands, &platform, &admin(), RaceCommand::Leaderboard).await;

        assert!(response.is_ephemeral());
        assert_eq!(
            response.content(),
            "An error occurred while retrieving invites: Missing Permissions"
        );
    }
}
