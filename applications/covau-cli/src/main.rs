/// Covau - play queue with autoplay, driven from the terminal
mod config;
mod player;
mod state;

use anyhow::Context;
use clap::{Parser, Subcommand};
use covau_core::{
    txn, Backend, CovauError, Database, DbAble, Player, SearchSource, SharedItem,
    Song, SourceFactory, SourceQuery,
};
use covau_queue::{
    spawn_driver, AutoplayQueue, AutoplayState, LocalSyncQueue, PlayQueue, PlayState, QueueEvent,
    QueueEvents, QueueHandle, QueueManager,
};
use covau_storage::{LocalSourceFactory, SqliteDatabase};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AppConfig;
use crate::player::SimulatedPlayer;

#[derive(Parser)]
#[command(name = "covau")]
#[command(about = "Music queue with autoplay over a local song catalog", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add songs from a JSON file to the catalog
    Import {
        /// JSON array of songs
        file: PathBuf,
    },
    /// Search the catalog
    Search {
        query: String,
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// Queue search results and play them, or resume the saved queue
    Play {
        query: Option<String>,
        /// Stop once the queue runs out instead of autoplaying
        #[arg(long)]
        no_autoplay: bool,
        /// Stop after this many tracks
        #[arg(short, long)]
        tracks: Option<usize>,
    },
    /// Show the saved queue
    Queue,
    /// Never autoplay the artists of the top search hit
    Ban { query: String },
    /// Clear the saved queue and its seen songs
    Reset,
}

/// Everything a command needs
struct App {
    config: AppConfig,
    db: Arc<dyn Database>,
    factory: Arc<dyn SourceFactory>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let sqlite = SqliteDatabase::connect(&config.database_url)
        .await
        .with_context(|| format!("Failed to open {}", config.database_url))?;
    let factory: Arc<dyn SourceFactory> =
        Arc::new(LocalSourceFactory::new(sqlite.pool().clone()));
    let app = App {
        config,
        db: Arc::new(sqlite),
        factory,
    };

    match cli.command {
        Commands::Import { file } => import(&app, &file).await?,
        Commands::Search { query, limit } => {
            for item in search(&app, &query, limit).await? {
                println!("{:>6}  {}", item.key(), item.title());
            }
        }
        Commands::Play {
            query,
            no_autoplay,
            tracks,
        } => play(&app, query, no_autoplay, tracks).await?,
        Commands::Queue => show_queue(&app).await?,
        Commands::Ban { query } => ban(&app, &query).await?,
        Commands::Reset => {
            let mut queue = load_queue(&app, idle_player(), false).await?;
            queue.reset().await?;
            state::save_ids(&app.config.state_path, queue.ids()).await?;
            println!("Queue cleared");
        }
    }

    Ok(())
}

async fn import(app: &App, file: &Path) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let songs: Vec<Song> = serde_json::from_slice(&bytes)
        .with_context(|| format!("{} is not a list of songs", file.display()))?;
    let total = songs.len();

    let db = app.db.clone();
    let added = txn(&app.db, |ops| async move {
        let mut added = 0;
        for song in &songs {
            if db.insert_or_get(ops.txn_id(), song.to_entity()?).await?.is_new() {
                added += 1;
            }
        }
        Ok::<_, CovauError>(added)
    })
    .await?;

    info!("Imported {} of {} songs", added, total);
    println!("Added {added} new songs ({} already known)", total - added);
    Ok(())
}

async fn search(app: &App, query: &str, limit: usize) -> anyhow::Result<Vec<SharedItem>> {
    let source = app
        .factory
        .open(
            SourceQuery::Search {
                backend: Backend::Local,
                query: query.to_string(),
            },
            limit,
        )
        .await?;
    Ok(source.next_page().await?)
}

/// Player for commands that edit the queue without playing it
fn idle_player() -> Arc<dyn Player> {
    Arc::new(SimulatedPlayer::new(Duration::ZERO))
}

async fn load_queue(
    app: &App,
    player: Arc<dyn Player>,
    no_autoplay: bool,
) -> anyhow::Result<LocalSyncQueue> {
    let mut queue_config = app.config.queue.clone();
    if no_autoplay {
        queue_config.autoplay = false;
    }
    let manager = QueueManager::new(player, QueueEvents::new());
    let autoplay = AutoplayQueue::new(manager, app.factory.clone(), queue_config);

    let ids = state::load_ids(&app.config.state_path).await?;
    let queue = LocalSyncQueue::load(app.db.clone(), autoplay, ids).await?;
    state::save_ids(&app.config.state_path, queue.ids()).await?;
    Ok(queue)
}

async fn play(
    app: &App,
    query: Option<String>,
    no_autoplay: bool,
    tracks: Option<usize>,
) -> anyhow::Result<()> {
    let player = Arc::new(SimulatedPlayer::new(Duration::from_millis(
        app.config.player.track_millis,
    )));
    let queue = load_queue(app, player.clone(), no_autoplay).await?;
    let mut rx = queue.manager().events().subscribe();

    let handle = QueueHandle::new(queue);
    let driver = spawn_driver(handle.clone(), player.as_ref());

    {
        let mut queue = handle.lock().await;
        match query {
            Some(query) => {
                let found = search(app, &query, app.config.queue.search_page_size).await?;
                let Some(first) = found.first().cloned() else {
                    println!("Nothing matches \"{query}\"");
                    driver.abort();
                    return Ok(());
                };
                let starts = matches!(queue.state(), PlayState::Unstarted | PlayState::Finished);
                queue.add(found).await?;
                // a restored queue keeps its cursor; jump to the new items
                if !starts {
                    if let Some(index) = queue.get_item_index(&first) {
                        queue.play(index).await?;
                    }
                }
            }
            None => match queue.playing_index() {
                Some(index) => queue.play(index).await?,
                None if !queue.items().is_empty() => queue.play(0).await?,
                None => {
                    println!("The queue is empty");
                    driver.abort();
                    return Ok(());
                }
            },
        }
    }

    // a track is overdue once it has run twice its length
    let idle = Duration::from_millis(app.config.player.track_millis.saturating_mul(2))
        + Duration::from_secs(1);
    let mut started = 0;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = tokio::time::timeout(idle, rx.recv()) => match event {
                Ok(Ok(QueueEvent::NowPlaying(item))) => {
                    started += 1;
                    if tracks.is_some_and(|limit| started > limit) {
                        break;
                    }
                    println!("> {}", item.title());
                }
                Ok(Ok(QueueEvent::Notify { level, message })) => {
                    eprintln!("[{level:?}] {message}");
                }
                Ok(Ok(QueueEvent::Changed)) | Err(_) => {
                    if handle.lock().await.state() == PlayState::Finished {
                        println!("Queue finished");
                        break;
                    }
                }
                Ok(Err(RecvError::Lagged(missed))) => warn!("Missed {} queue events", missed),
                Ok(Err(RecvError::Closed)) => break,
            },
        }
    }

    driver.abort();
    player.pause().await?;
    let ids = handle.lock().await.ids();
    state::save_ids(&app.config.state_path, ids).await?;
    Ok(())
}

async fn show_queue(app: &App) -> anyhow::Result<()> {
    let queue = load_queue(app, idle_player(), false).await?;

    println!("Queue {} ({:?})", queue.entity().id, queue.state());
    for (index, item) in queue.items().iter().enumerate() {
        let marker = if queue.playing_index() == Some(index) {
            ">"
        } else {
            " "
        };
        println!("{marker} {index:>3}  {}", item.title());
    }

    let autoplay = queue.autoplay();
    let status = match autoplay.autoplay_state() {
        AutoplayState::Uninit => "waiting for a seed".to_string(),
        AutoplayState::Disabled { .. } => "off".to_string(),
        AutoplayState::DisabledWithSeed { seed } => format!("off, seeded by {}", seed.title()),
        AutoplayState::Init(info) => format!(
            "from {} ({} left)",
            info.seed().title(),
            info.remaining().len()
        ),
        AutoplayState::Finished { .. } => "out of recommendations".to_string(),
    };
    println!("Autoplay: {status}");
    println!(
        "Blacklisted: {} songs, {} artists",
        autoplay.blacklist().songs().len(),
        autoplay.blacklist().artists().len()
    );
    Ok(())
}

async fn ban(app: &App, query: &str) -> anyhow::Result<()> {
    let Some(item) = search(app, query, 1).await?.into_iter().next() else {
        println!("Nothing matches \"{query}\"");
        return Ok(());
    };
    if item.artist_ids().is_empty() {
        println!("\"{}\" has no artists", item.title());
        return Ok(());
    }

    let mut queue = load_queue(app, idle_player(), true).await?;
    queue.add_artists_to_blacklist(&item).await?;
    info!("Blacklisted artists of {}", item.title());
    println!("Autoplay will skip the artists of \"{}\"", item.title());
    Ok(())
}
