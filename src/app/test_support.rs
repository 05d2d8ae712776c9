//! Fixtures shared by unit tests

use std::io::Cursor;

use serde_json::json;

use crate::app::client::{ClientConfig, MovieClient};

/// Encode a solid-color PNG of the given size
pub fn png_bytes(width: u32, height: u32) -> bytes::Bytes {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 30, 30, 255]));
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    bytes::Bytes::from(out.into_inner())
}

/// Popular-movies body whose movies have ids `first_id..first_id + count`
///
/// Every movie gets a poster path `/poster-<id>.png`.
pub fn popular_page(page: u32, first_id: u64, count: usize) -> serde_json::Value {
    let results: Vec<_> = (0..count as u64)
        .map(|offset| {
            let id = first_id + offset;
            json!({
                "id": id,
                "title": format!("Movie {}", id),
                "overview": "Overview",
                "release_date": "2023-07-21",
                "poster_path": format!("/poster-{}.png", id),
            })
        })
        .collect();

    json!({
        "page": page,
        "total_pages": 500,
        "total_results": 10000,
        "results": results,
    })
}

/// Detail body with the given number of cast members and related titles
pub fn movie_details(id: u64, cast: usize, related: usize) -> serde_json::Value {
    let cast: Vec<_> = (0..cast as u64)
        .map(|n| json!({ "id": 1000 + n, "name": format!("Actor {}", n) }))
        .collect();
    let related: Vec<_> = (0..related as u64)
        .map(|n| json!({ "id": 2000 + n, "title": format!("Related {}", n), "poster_path": "/r.png" }))
        .collect();

    json!({
        "id": id,
        "title": format!("Movie {}", id),
        "credits": { "cast": cast },
        "similar": { "page": 1, "results": related },
    })
}

/// Client pointed at a mock server; images are served from `/images`
pub fn mock_client(server_uri: &str) -> MovieClient {
    let config = ClientConfig::with_hosts(
        format!("{}/3/", server_uri),
        format!("{}/images", server_uri),
        "test-token",
    );
    MovieClient::new(config).unwrap()
}
