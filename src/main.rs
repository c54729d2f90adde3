// Venue Feed - CLI
//
//   venue-feed init
//   venue-feed feed <lat> <lng> [page] [limit]
//   venue-feed favorite <user_id> <place_id>
//   venue-feed events <place_id>

use anyhow::{anyhow, bail, Result};
use std::env;
use tracing_subscriber::EnvFilter;

use venue_feed::{
    add_favorite, get_events_for_entity, get_record_by_place_id, open_shared, FeedConfig, FeedQuery,
    FeedService, SharedConnection,
};

const USAGE: &str = "usage: venue-feed <init | feed <lat> <lng> [page] [limit] | favorite <user_id> <place_id> | events <place_id>>";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let config = FeedConfig::from_env()?;

    match args.first().map(String::as_str) {
        Some("init") => run_init(&config),
        Some("feed") => run_feed(&config, &args[1..]).await,
        Some("favorite") => run_favorite(&config, &args[1..]),
        Some("events") => run_events(&config, &args[1..]),
        _ => bail!(USAGE),
    }
}

fn open(config: &FeedConfig) -> Result<SharedConnection> {
    open_shared(&config.database_path)
}

fn run_init(config: &FeedConfig) -> Result<()> {
    open(config)?;
    println!("✓ Database ready at {}", config.database_path.display());
    Ok(())
}

async fn run_feed(config: &FeedConfig, args: &[String]) -> Result<()> {
    let (lat, lng) = match args {
        [lat, lng, ..] => (lat, lng),
        _ => bail!(USAGE),
    };

    let query = FeedQuery {
        lat: Some(lat.clone()),
        lng: Some(lng.clone()),
        page: args.get(2).cloned(),
        limit: args.get(3).cloned(),
    };
    let user_id = env::var("FEED_USER_ID").unwrap_or_else(|_| "cli".to_string());

    let service = FeedService::from_config(config, open(config)?);
    let response = service.home(&user_id, &query).await?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn run_favorite(config: &FeedConfig, args: &[String]) -> Result<()> {
    let (user_id, place_id) = match args {
        [user_id, place_id, ..] => (user_id, place_id),
        _ => bail!(USAGE),
    };

    let conn = open(config)?;
    let guard = conn.lock().map_err(|_| anyhow!("database connection lock poisoned"))?;

    let record = get_record_by_place_id(&guard, place_id)?
        .ok_or_else(|| anyhow!("No catalog record for place {} (run `feed` first)", place_id))?;

    if add_favorite(&guard, user_id, &record.id)? {
        println!("⭐ {} is now a favorite of {}", record.name, user_id);
    } else {
        println!("✓ {} was already a favorite of {}", record.name, user_id);
    }
    Ok(())
}

fn run_events(config: &FeedConfig, args: &[String]) -> Result<()> {
    let place_id = args.first().ok_or_else(|| anyhow!(USAGE))?;

    let conn = open(config)?;
    let guard = conn.lock().map_err(|_| anyhow!("database connection lock poisoned"))?;
    let events = get_events_for_entity(&guard, "catalog_record", place_id)?;

    if events.is_empty() {
        println!("No events for {}", place_id);
    }
    for event in events {
        println!(
            "{}  {:<24} {:<14} {}",
            event.timestamp.to_rfc3339(),
            event.event_type,
            event.actor,
            event.data
        );
    }
    Ok(())
}
