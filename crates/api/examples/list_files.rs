use magnet_feed_api::{FeedApi, FeedConfig, HttpFeedClient};
use std::error::Error;

#[async_std::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let base_url = std::env::args().nth(1);
    let config = FeedConfig::load(base_url.as_deref())?;
    println!("Using feed at {}", config.base_url);

    let client = HttpFeedClient::new(&config);

    let locations = client.list_locations().await?;
    println!("--- Locations ({}) ---", locations.len());
    for location in &locations {
        println!("{:<12} {}", location.id, location.name);
    }

    let files = client.list_files().await?;
    println!("--- Files ({}) ---", files.len());
    for file in &files {
        let location = file.location.as_deref().unwrap_or("-");
        println!(
            "{:<12} {} [{}] updated {}",
            file.id, file.name, location, file.torrent_updated_at
        );
    }

    Ok(())
}
