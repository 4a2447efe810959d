use futures::StreamExt;
use magnet_feed::sync::SyncEvent;
use magnet_feed::MagnetFeed;

#[async_std::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    // 1. Resolve the base URL and connect
    let feed = MagnetFeed::from_env(std::env::args().nth(1).as_deref())?;

    // 2. Print every change as it happens
    let mut events = feed.subscribe();
    async_std::task::spawn(async move {
        while let Some(event) = events.next().await {
            match event {
                SyncEvent::Directory(d) => println!(
                    "[Directory] {} files, loading={}, error={:?}",
                    d.files.len(),
                    d.loading,
                    d.error.map(|e| e.to_string())
                ),
                SyncEvent::Registry(r) => println!(
                    "[Registry] {} locations, loading={}",
                    r.locations.len(),
                    r.loading
                ),
            }
        }
    });

    // 3. Initial load
    feed.start().await;

    // 4. Render
    println!("--- Files ---");
    for row in feed.view().await.rows {
        println!(
            "{} [{}] {}",
            row.file.name,
            row.location_label.as_deref().unwrap_or("-"),
            row.comment_label()
        );
    }

    Ok(())
}
