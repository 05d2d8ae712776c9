//! Client tests against a mock movie API
//!
//! These tests drive `MovieClient` end to end over HTTP using wiremock,
//! covering URL construction, single-flight supersession and image
//! de-duplication.

use std::sync::Arc;
use std::time::Duration;

use url::Url;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;
use crate::app::test_support::{mock_client, movie_details, png_bytes, popular_page};
use crate::errors::ClientError;

#[test]
fn test_popular_movies_url() {
    let client = MovieClient::new(ClientConfig::default()).unwrap();
    let url = client.popular_movies_url(3).unwrap();
    assert_eq!(
        url.as_str(),
        "https://api.themoviedb.org/3/movie/popular?language=en-US&page=3"
    );
}

#[test]
fn test_movie_details_url() {
    let client = MovieClient::new(ClientConfig::default()).unwrap();
    let url = client.movie_details_url(550).unwrap();
    assert_eq!(
        url.as_str(),
        "https://api.themoviedb.org/3/movie/550?append_to_response=similar%2Ccredits&language=en-US"
    );
}

#[test]
fn test_base_url_without_trailing_slash() {
    let config = ClientConfig::with_hosts("https://api.themoviedb.org/3", "https://image.tmdb.org/t/p/w780", "t");
    let client = MovieClient::new(config).unwrap();
    assert_eq!(
        client.popular_movies_url(1).unwrap().as_str(),
        "https://api.themoviedb.org/3/movie/popular?language=en-US&page=1"
    );
    assert_eq!(
        client.movie_details_url(550).unwrap().path(),
        "/3/movie/550"
    );
}

#[tokio::test]
async fn test_unslashed_base_url_reaches_versioned_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/3/movie/popular"))
        .respond_with(ResponseTemplate::new(200).set_body_json(popular_page(1, 1, 2)))
        .expect(1)
        .mount(&server)
        .await;

    let config = ClientConfig::with_hosts(format!("{}/3", server.uri()), format!("{}/images", server.uri()), "t");
    let client = MovieClient::new(config).unwrap();
    let movies = client.fetch_popular_movies(1).await.unwrap();
    assert_eq!(movies.len(), 2);
}

#[tokio::test]
async fn test_invalid_base_url_is_invalid_url() {
    let client = MovieClient::new(ClientConfig::with_hosts("not a url", "x", "t")).unwrap();
    let err = client.fetch_popular_movies(1).await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Request(ApiRequestError::InvalidUrl { .. })
    ));

    let client = MovieClient::new(ClientConfig::with_hosts("mailto:someone", "x", "t")).unwrap();
    let err = client.fetch_movie_details(1).await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Request(ApiRequestError::InvalidUrl { .. })
    ));
}

#[tokio::test]
async fn test_fetch_popular_movies_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/3/movie/popular"))
        .and(query_param("page", "2"))
        .and(query_param("language", "en-US"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(popular_page(2, 21, 20)))
        .expect(1)
        .mount(&server)
        .await;

    let client = mock_client(&server.uri());
    let movies = client.fetch_popular_movies(2).await.unwrap();

    assert_eq!(movies.len(), 20);
    assert_eq!(movies[0].id, 21);
    assert_eq!(
        movies[0].poster_url.as_ref().unwrap().as_str(),
        format!("{}/images/poster-21.png", server.uri())
    );
}

#[tokio::test]
async fn test_fetch_popular_movies_bad_payload_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(path("/3/movie/popular"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"movies": []}"#))
        .mount(&server)
        .await;

    let client = mock_client(&server.uri());
    let err = client.fetch_popular_movies(1).await.unwrap_err();
    assert!(matches!(err, ClientError::Parse(_)));
    assert_eq!(err.normalize(), Some(ServerError::General));
}

#[tokio::test]
async fn test_fetch_popular_movies_server_error() {
    let server = MockServer::start().await;
    Mock::given(path("/3/movie/popular"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = mock_client(&server.uri());
    let err = client.fetch_popular_movies(1).await.unwrap_err();
    assert!(matches!(err, ClientError::Server(ServerError::General)));
}

#[tokio::test]
async fn test_newer_page_request_supersedes_older() {
    let server = MockServer::start().await;
    Mock::given(path("/3/movie/popular"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(popular_page(1, 1, 20))
                .set_delay(Duration::from_millis(400)),
        )
        .mount(&server)
        .await;
    Mock::given(path("/3/movie/popular"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(popular_page(2, 21, 20)))
        .mount(&server)
        .await;

    let client = Arc::new(mock_client(&server.uri()));

    let first = {
        let client = Arc::clone(&client);
        tokio::spawn(async move { client.fetch_popular_movies(1).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let second = client.fetch_popular_movies(2).await.unwrap();
    assert_eq!(second[0].id, 21);

    let first = first.await.unwrap();
    assert!(first.unwrap_err().is_superseded());
}

#[tokio::test]
async fn test_detail_and_list_slots_are_independent() {
    let server = MockServer::start().await;
    Mock::given(path("/3/movie/popular"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(popular_page(1, 1, 5))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;
    Mock::given(path("/3/movie/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(movie_details(42, 3, 2)))
        .mount(&server)
        .await;

    let client = Arc::new(mock_client(&server.uri()));
    let list = {
        let client = Arc::clone(&client);
        tokio::spawn(async move { client.fetch_popular_movies(1).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    let movie = client.fetch_movie_details(42).await.unwrap();
    assert_eq!(movie.cast_members.len(), 3);
    assert_eq!(movie.related_movies.len(), 2);

    // The detail call did not cancel the pending list call
    assert_eq!(list.await.unwrap().unwrap().len(), 5);
}

#[tokio::test]
async fn test_fetch_movie_details_request_shape() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/3/movie/7"))
        .and(query_param("append_to_response", "similar,credits"))
        .and(query_param("language", "en-US"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": 7, "title": "Seven" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = mock_client(&server.uri());
    let movie = client.fetch_movie_details(7).await.unwrap();
    assert_eq!(movie.title, "Seven");
    assert!(movie.cast_members.is_empty());
    assert!(movie.related_movies.is_empty());
}

#[tokio::test]
async fn test_duplicate_image_download_issues_one_request() {
    let server = MockServer::start().await;
    Mock::given(path("/images/poster-1.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(png_bytes(3, 4).to_vec())
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = Arc::new(mock_client(&server.uri()));
    let url = Url::parse(&format!("{}/images/poster-1.png", server.uri())).unwrap();

    let first = {
        let client = Arc::clone(&client);
        let url = url.clone();
        tokio::spawn(async move { client.download_image(&url).await })
    };
    while !client.is_downloading(&url) {
        tokio::task::yield_now().await;
    }

    // The second caller is dropped without a request or a result
    assert!(client.download_image(&url).await.unwrap().is_none());

    let image = first.await.unwrap().unwrap().unwrap();
    assert_eq!((image.width, image.height), (3, 4));
    assert_eq!(client.in_flight_image_count(), 0);
}

#[tokio::test]
async fn test_failed_image_download_leaves_in_flight_set() {
    // Every exit path removes the URL, so a later retry issues a new request
    let server = MockServer::start().await;
    Mock::given(path("/images/broken.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"definitely not a png".to_vec()))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(path("/images/missing.png"))
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&server)
        .await;

    let client = mock_client(&server.uri());
    for name in ["broken.png", "missing.png"] {
        let url = Url::parse(&format!("{}/images/{}", server.uri(), name)).unwrap();
        for _ in 0..2 {
            let err = client.download_image(&url).await.unwrap_err();
            assert!(matches!(err, ClientError::Server(ServerError::ImageDownloadFailure)));
            assert!(!client.is_downloading(&url));
        }
    }
}

#[tokio::test]
async fn test_flush_allows_parallel_redownload() {
    let server = MockServer::start().await;
    Mock::given(path("/images/poster-9.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(png_bytes(1, 1).to_vec())
                .set_delay(Duration::from_millis(200)),
        )
        .expect(2)
        .mount(&server)
        .await;

    let client = Arc::new(mock_client(&server.uri()));
    let url = Url::parse(&format!("{}/images/poster-9.png", server.uri())).unwrap();

    let first = {
        let client = Arc::clone(&client);
        let url = url.clone();
        tokio::spawn(async move { client.download_image(&url).await })
    };
    while !client.is_downloading(&url) {
        tokio::task::yield_now().await;
    }

    assert_eq!(client.flush_image_downloads(), 1);
    let second = client.download_image(&url).await.unwrap();
    assert!(second.is_some());

    // The flushed download still delivers its own result
    assert!(first.await.unwrap().unwrap().is_some());
}
