use log::{debug, info, warn, LevelFilter};

use std::error::Error;
use std::sync::Arc;

use structopt::StructOpt;

use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use twilight_cache_inmemory::{InMemoryCache, ResourceType};
use twilight_gateway::{Shard, ShardId};
use twilight_http::Client;
use twilight_model::gateway::Intents;
use twilight_model::id::{marker::GuildMarker, Id};

use invite_race::bot::{invites::InviteTracking, race::RaceCommands, sync::CommandSync};
use invite_race::config::{self, Config};
use invite_race::platform::Discord;
use invite_race::races::Races;
use invite_race::service::Services;

#[derive(Debug, StructOpt)]
#[structopt(name = "invite-race", about = "Runs invite races on Discord.")]
struct Opt {
    /// Register the commands in this guild only, instead of globally.
    #[structopt(long, parse(try_from_str = parse_guild))]
    guild: Option<Id<GuildMarker>>,
    /// Do not register the commands on startup.
    #[structopt(long)]
    no_sync: bool,
}

fn parse_guild(id: &str) -> Result<Id<GuildMarker>, anyhow::Error> {
    config::parse_id(id)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let opt = Opt::from_args();

    // .env may set the log filter
    let dotenv = dotenv::dotenv();

    env_logger::Builder::new()
        .filter(None, LevelFilter::Info)
        .parse_env(config::LOG_ENV)
        .init();

    if let Err(err) = dotenv {
        debug!("no .env file loaded: {}", err);
    }

    let config = Config::from_env()?;

    info!("starting invite-race {}", invite_race::VERSION);

    let intents = Intents::GUILDS | Intents::GUILD_INVITES | Intents::GUILD_MEMBERS;

    let http = Arc::new(Client::new(config.token.clone()));
    let cache = Arc::new(
        InMemoryCache::builder()
            .resource_types(ResourceType::GUILD)
            .build(),
    );

    let mut shard = Shard::new(ShardId::ONE, config.token.clone(), intents);

    // pump gateway events in the background
    let (tx, rx) = mpsc::unbounded_channel();
    let cache_pump = cache.clone();

    tokio::spawn(async move {
        loop {
            let event = match shard.next_event().await {
                Ok(event) => event,
                Err(source) => {
                    warn!("error receiving event: {}", source);

                    if source.is_fatal() {
                        break;
                    }

                    continue;
                }
            };

            cache_pump.update(&event);

            if tx.send(event).is_err() {
                break;
            }
        }
    });

    // create our services
    let races = Races::new();
    let platform = Arc::new(Discord::new(http.clone(), cache, config.announce_channel));

    let services = Services::new()
        .add(InviteTracking::new(races.clone(), platform.clone()))
        .add(RaceCommands::new(races, platform));

    let events = UnboundedReceiverStream::new(rx);

    if opt.no_sync {
        services.run(events).await;
    } else {
        services
            .add(CommandSync::new(http, opt.guild))
            .run(events)
            .await;
    }

    info!("gateway connection lost, shutting down");

    Ok(())
}
