//! Tests for the popular-movies orchestrator
//!
//! These tests run the orchestrator against a wiremock server and check the
//! state machine, the published events and the thumbnail path together.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::TryRecvError;
use wiremock::matchers::{path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;
use crate::app::test_support::{mock_client, png_bytes, popular_page};

fn orchestrator(server: &MockServer) -> PopularMoviesOrchestrator {
    PopularMoviesOrchestrator::new(Arc::new(mock_client(&server.uri())), ListConfig::default())
}

async fn mount_page(server: &MockServer, page: u32, first_id: u64, count: usize) {
    Mock::given(path("/3/movie/popular"))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(popular_page(page, first_id, count)))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_page_failure_then_reconnect_retry() {
    let server = MockServer::start().await;
    mount_page(&server, 1, 1, 20).await;
    Mock::given(path("/3/movie/popular"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_page(&server, 2, 21, 20).await;

    let list = orchestrator(&server);
    let mut events = list.subscribe();
    assert_eq!(list.fetch_state().await, FetchState::Initialized);

    let first = list.fetch_popular_movies().await.loaded().unwrap();
    assert_eq!(first.added, 20);
    assert_eq!(list.fetch_state().await, FetchState::LoadedMovies);
    assert_eq!(list.page_cursor().await, 2);

    let second = list.fetch_popular_movies().await;
    assert_eq!(second, FetchOutcome::Completed(Err(ServerError::General)));
    assert_eq!(list.fetch_state().await, FetchState::Error);
    assert_eq!(list.len().await, 20);
    assert_eq!(list.page_cursor().await, 2);

    let retry = list.retry_after_reconnect().await.loaded().unwrap();
    assert_eq!(retry.page, 2);
    assert_eq!(list.len().await, 40);
    assert_eq!(list.page_cursor().await, 3);
    assert_eq!(list.fetch_state().await, FetchState::LoadedMovies);

    let ids: Vec<_> = list.movies().await.iter().map(|m| m.id).collect();
    assert_eq!(ids, (1..=40).collect::<Vec<_>>());

    // Exactly one event per completed fetch, in order
    assert!(matches!(events.try_recv(), Ok(ListEvent::PopularMoviesResult(Ok(p))) if p.page == 1));
    assert!(matches!(
        events.try_recv(),
        Ok(ListEvent::PopularMoviesResult(Err(ServerError::General)))
    ));
    assert!(matches!(events.try_recv(), Ok(ListEvent::PopularMoviesResult(Ok(p))) if p.total == 40));
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_fetch_is_ignored_while_fetching() {
    let server = MockServer::start().await;
    Mock::given(path("/3/movie/popular"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(popular_page(1, 1, 20))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let list = orchestrator(&server);
    let pending = list.spawn_fetch_popular_movies();
    while list.fetch_state().await != FetchState::FetchingMovies {
        tokio::task::yield_now().await;
    }

    assert_eq!(list.fetch_popular_movies().await, FetchOutcome::Ignored);
    assert_eq!(list.refresh().await, FetchOutcome::Ignored);

    assert!(pending.await.unwrap().is_completed());
    assert_eq!(list.len().await, 20);
}

#[tokio::test]
async fn test_reconnect_leaves_loaded_list_alone() {
    let server = MockServer::start().await;
    mount_page(&server, 1, 1, 20).await;

    let list = orchestrator(&server);
    assert_eq!(list.retry_after_reconnect().await, FetchOutcome::Ignored);

    list.fetch_popular_movies().await;
    assert_eq!(list.retry_after_reconnect().await, FetchOutcome::Ignored);
    assert_eq!(list.len().await, 20);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_reconnect_supersedes_pending_fetch() {
    let server = MockServer::start().await;
    Mock::given(path("/3/movie/popular"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(popular_page(1, 1, 20))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(2)
        .mount(&server)
        .await;

    let list = orchestrator(&server);
    let mut events = list.subscribe();

    let stalled = list.spawn_fetch_popular_movies();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let retried = list.retry_after_reconnect().await;
    assert!(retried.is_completed());
    assert_eq!(stalled.await.unwrap(), FetchOutcome::Superseded);

    // The superseded page was never applied
    assert_eq!(list.len().await, 20);
    assert_eq!(list.page_cursor().await, 2);
    assert!(matches!(events.try_recv(), Ok(ListEvent::PopularMoviesResult(Ok(_)))));
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_dropped_fetch_leaves_list_retryable() {
    let server = MockServer::start().await;
    Mock::given(path("/3/movie/popular"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(popular_page(1, 1, 20))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let list = orchestrator(&server);
    let mut events = list.subscribe();

    let timed_out = tokio::time::timeout(Duration::from_millis(50), list.fetch_popular_movies()).await;
    assert!(timed_out.is_err());
    assert_eq!(list.fetch_state().await, FetchState::Error);
    assert_eq!(list.page_cursor().await, 1);

    let aborted = list.spawn_fetch_popular_movies();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(list.fetch_state().await, FetchState::FetchingMovies);
    aborted.abort();
    assert!(aborted.await.unwrap_err().is_cancelled());
    assert_eq!(list.fetch_state().await, FetchState::Error);

    // Neither dropped fetch published anything, and the list still loads
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    let loaded = list.refresh().await.loaded().unwrap();
    assert_eq!(loaded.page, 1);
    assert_eq!(list.len().await, 20);
    assert_eq!(list.fetch_state().await, FetchState::LoadedMovies);
}

#[tokio::test]
async fn test_empty_later_page_advances_cursor() {
    let server = MockServer::start().await;
    mount_page(&server, 1, 1, 20).await;
    mount_page(&server, 2, 21, 0).await;
    mount_page(&server, 3, 21, 5).await;

    let list = orchestrator(&server);
    list.fetch_popular_movies().await;
    let empty = list.fetch_popular_movies().await.loaded().unwrap();
    assert_eq!((empty.page, empty.added, empty.total), (2, 0, 20));
    assert_eq!(list.fetch_state().await, FetchState::LoadedMovies);
    assert_eq!(list.page_cursor().await, 3);

    let next = list.fetch_popular_movies().await.loaded().unwrap();
    assert_eq!(next.page, 3);
    assert_eq!(list.len().await, 25);
    assert_eq!(list.page_cursor().await, 4);
}

#[tokio::test]
async fn test_empty_first_page_is_no_results() {
    let server = MockServer::start().await;
    mount_page(&server, 1, 1, 0).await;

    let list = orchestrator(&server);
    let loaded = list.fetch_popular_movies().await.loaded().unwrap();
    assert_eq!(loaded.added, 0);
    assert_eq!(list.fetch_state().await, FetchState::NoResults);
    assert_eq!(list.page_cursor().await, 2);
}

#[tokio::test]
async fn test_prefetch_near_end_of_list() {
    let server = MockServer::start().await;
    mount_page(&server, 1, 1, 20).await;
    mount_page(&server, 2, 21, 20).await;

    let list = orchestrator(&server);
    list.fetch_popular_movies().await;

    assert!(list.item_displayed(5).await.is_none());
    assert!(list.item_displayed(19).await.is_none());

    let handle = list.item_displayed(10).await.unwrap();
    assert!(handle.await.unwrap().is_completed());
    assert_eq!(list.len().await, 40);
}

#[tokio::test]
async fn test_thumbnail_ready_event() {
    let server = MockServer::start().await;
    mount_page(&server, 1, 1, 3).await;
    Mock::given(path("/images/poster-2.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png_bytes(5, 8).to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let list = orchestrator(&server);
    list.fetch_popular_movies().await;
    let mut events = list.subscribe();

    assert!(list.download_thumbnail(1).await);
    match events.try_recv() {
        Ok(ListEvent::MovieThumbnailReady { index, movie_id, image }) => {
            assert_eq!(index, 1);
            assert_eq!(movie_id, 2);
            assert_eq!((image.width, image.height), (5, 8));
        }
        other => panic!("unexpected event: {:?}", other),
    }

    // The shared movie record now carries the image
    let movie = list.movie_at(1).await.unwrap();
    assert_eq!(movie.poster_image().unwrap().height, 8);

    // Already resolved: no second request, no event
    assert!(!list.download_thumbnail(1).await);
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_thumbnail_failure_is_silent() {
    let server = MockServer::start().await;
    mount_page(&server, 1, 1, 2).await;
    Mock::given(path("/images/poster-1.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let list = orchestrator(&server);
    list.fetch_popular_movies().await;
    let mut events = list.subscribe();

    assert!(!list.download_thumbnail(0).await);
    assert!(!list.download_thumbnail(99).await);
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    assert_eq!(list.fetch_state().await, FetchState::LoadedMovies);
    assert!(!list.movie_at(0).await.unwrap().has_poster_image());
}

#[tokio::test]
async fn test_concurrent_thumbnail_requests_share_one_download() {
    let server = MockServer::start().await;
    mount_page(&server, 1, 1, 1).await;
    Mock::given(path("/images/poster-1.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(png_bytes(2, 2).to_vec())
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let list = orchestrator(&server);
    list.fetch_popular_movies().await;

    let first = list.spawn_download_thumbnail(0);
    let second = list.spawn_download_thumbnail(0);
    let (first, second) = (first.await.unwrap(), second.await.unwrap());

    // Exactly one caller stores the image; the other is dropped
    assert!(first ^ second);
    assert!(list.movie_at(0).await.unwrap().has_poster_image());
}

#[tokio::test]
async fn test_spawns_on_supplied_runtime() {
    let server = MockServer::start().await;
    mount_page(&server, 1, 1, 4).await;

    let list = PopularMoviesOrchestrator::on_runtime(
        Arc::new(mock_client(&server.uri())),
        ListConfig { prefetch_distance: 2 },
        Handle::current(),
    );
    let outcome = list.spawn_fetch_popular_movies().await.unwrap();
    assert!(outcome.is_completed());
    assert!(list.item_displayed(2).await.is_some());
}
