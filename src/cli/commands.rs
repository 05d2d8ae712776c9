//! Command handlers for Movie Feed CLI
//!
//! This module implements the command handlers that connect CLI arguments
//! to the client, the list orchestrator and the browse session.

use std::path::PathBuf;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::app::{
    BrowseSession, ConnectivityMonitor, FetchOutcome, FetchState, ListEvent, Movie, MovieClient,
    PopularMoviesOrchestrator, SessionEvent, SignalListener, create_shutdown_channel,
};
use crate::cli::{
    ConfigAction, ConfigArgs, DetailArgs, PopularArgs, ProgressConfig, ThumbnailProgress, WatchArgs,
};
use crate::config::AppConfig;
use crate::errors::{AppError, Result};

/// Concurrent thumbnail downloads of the popular command
const THUMBNAIL_CONCURRENCY: usize = 8;

/// Handle the popular command
///
/// Fetches the requested number of pages, prints one row per movie and
/// optionally downloads the thumbnails.
pub async fn handle_popular(args: PopularArgs, config: &AppConfig) -> Result<()> {
    args.validate().map_err(AppError::generic)?;
    let (client, _, list_config) = build_runtime(config)?;
    let list = PopularMoviesOrchestrator::new(client, list_config);

    load_pages(&list, args.pages).await?;

    let movies = list.movies().await;
    if movies.is_empty() {
        println!("No popular movies returned.");
        return Ok(());
    }
    for (index, movie) in movies.iter().enumerate() {
        println!("{}", format_row(index, movie));
    }

    if args.thumbnails {
        let progress = ThumbnailProgress::start(movies.len(), ProgressConfig::default());
        stream::iter(0..movies.len())
            .map(|index| {
                let list = list.clone();
                async move { list.download_thumbnail(index).await }
            })
            .buffer_unordered(THUMBNAIL_CONCURRENCY)
            .for_each(|downloaded| {
                progress.record(downloaded);
                async {}
            })
            .await;

        let summary = progress.finish();
        println!(
            "Thumbnails: {} downloaded, {} unavailable in {:.1}s",
            summary.downloaded,
            summary.unavailable,
            summary.elapsed.as_secs_f64()
        );
    }

    Ok(())
}

/// Handle the detail command
pub async fn handle_detail(args: DetailArgs, config: &AppConfig) -> Result<()> {
    let (client, _, _) = build_runtime(config)?;

    let movie = client.fetch_movie_details(args.id).await.map_err(|e| {
        warn!("Detail of movie {} failed: {}", args.id, e);
        AppError::Client(e)
    })?;

    println!("{} ({})", movie.title, year_label(&movie));
    if let Some(overview) = movie.overview.as_deref().filter(|o| !o.is_empty()) {
        println!();
        println!("{}", overview);
    }

    println!();
    println!("Cast ({}):", movie.cast_members.len());
    for member in &movie.cast_members {
        println!("  {:>8}  {}", member.id, member.name);
    }

    println!();
    println!("Related ({}):", movie.related_movies.len());
    for related in &movie.related_movies {
        println!("  {:>8}  {}", related.id, related.title);
    }

    Ok(())
}

/// Handle the watch command
///
/// Loads the first pages, then follows connectivity changes and list events
/// until Ctrl+C. Failed fetches are retried when the network comes back.
pub async fn handle_watch(args: WatchArgs, config: &AppConfig) -> Result<()> {
    args.validate().map_err(AppError::generic)?;
    let (client, monitor_config, list_config) = build_runtime(config)?;

    let session = Arc::new(BrowseSession::new(client, list_config));
    let monitor = ConnectivityMonitor::new();
    let (shutdown_tx, shutdown_rx) = create_shutdown_channel();
    let _signals = SignalListener::new(shutdown_tx.clone()).spawn();

    let mut list_events = session.list().subscribe();
    let mut session_events = session.subscribe();
    let mut shutdown = shutdown_tx.subscribe();

    let runner = {
        let session = Arc::clone(&session);
        let connectivity = monitor.subscribe();
        tokio::spawn(async move { session.run(connectivity, shutdown_rx).await })
    };
    monitor.start_with_config(&monitor_config);
    info!("Watching {}; press Ctrl+C to stop", monitor_config.probe_address);

    for _ in 0..args.pages {
        if let FetchOutcome::Completed(Err(_)) = session.list().fetch_popular_movies().await {
            // Retried on reconnect
            break;
        }
    }

    loop {
        tokio::select! {
            _ = shutdown.recv() => break,
            event = list_events.recv() => match event {
                Ok(ListEvent::PopularMoviesResult(Ok(page))) => {
                    println!("page {}: +{} movies ({} total)", page.page, page.added, page.total);
                }
                Ok(ListEvent::PopularMoviesResult(Err(e))) => {
                    println!("fetch failed: {}; waiting for connectivity", e);
                }
                Ok(ListEvent::MovieThumbnailReady { index, movie_id, .. }) => {
                    debug!("thumbnail ready for row {} (movie {})", index, movie_id);
                }
                Err(RecvError::Lagged(n)) => warn!("Missed {} list events", n),
                Err(RecvError::Closed) => break,
            },
            event = session_events.recv() => match event {
                Ok(SessionEvent::ConnectivityChanged(status)) => println!("network {}", status),
                Err(RecvError::Lagged(n)) => warn!("Missed {} session events", n),
                Err(RecvError::Closed) => break,
            },
        }
    }

    monitor.stop();
    let _ = runner.await;
    println!(
        "Loaded {} movies ({})",
        session.list().len().await,
        session.list().fetch_state().await
    );
    Ok(())
}

/// Handle configuration management
pub async fn handle_config(args: ConfigArgs, config: &AppConfig, path: Option<PathBuf>) -> Result<()> {
    match args.action {
        ConfigAction::Init { force } => {
            let path = match path {
                Some(path) => path,
                None => AppConfig::default_config_path()?,
            };
            AppConfig::write_default(&path, force).await?;
            println!("Created configuration file:");
            println!("   {}", path.display());
            Ok(())
        }
        ConfigAction::Show => {
            print!("{}", config.to_redacted_toml()?);
            Ok(())
        }
    }
}

/// Validate configuration and build the shared client
fn build_runtime(
    config: &AppConfig,
) -> Result<(Arc<MovieClient>, crate::app::MonitorConfig, crate::app::ListConfig)> {
    config.validate()?;
    let (client_config, monitor_config, list_config) = config.to_runtime_config();
    let client = Arc::new(MovieClient::new(client_config)?);
    Ok((client, monitor_config, list_config))
}

/// Fetch up to `pages` pages, stopping early when the feed runs dry
async fn load_pages(list: &PopularMoviesOrchestrator, pages: u32) -> Result<()> {
    for _ in 0..pages {
        match list.fetch_popular_movies().await {
            FetchOutcome::Completed(Ok(page)) if page.added == 0 => break,
            FetchOutcome::Completed(Ok(_)) => {}
            FetchOutcome::Completed(Err(e)) => return Err(e.into()),
            FetchOutcome::Ignored | FetchOutcome::Superseded => break,
        }
        if list.fetch_state().await == FetchState::NoResults {
            break;
        }
    }
    Ok(())
}

fn year_label(movie: &Movie) -> String {
    movie
        .release_year()
        .map(|y| y.to_string())
        .unwrap_or_else(|| "----".to_string())
}

fn format_row(index: usize, movie: &Movie) -> String {
    format!("{:>4}  {:>8}  {}  {}", index + 1, movie.id, year_label(movie), movie.title)
}
