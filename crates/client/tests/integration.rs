use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use rustplex_client::ClientContext;
use rustplex_core::config::ClientConfig;
use rustplex_core::settings::MemorySettings;
use rustplex_core::{ContentItem, ContentKind, MediaKind, MediaServer, SectionKind, ServerRegistry};
use rustplex_remote::HttpRemoteApi;
use rustplex_resolver::NoBusyIndicator;
use rustplex_transcoder::TranscodeSettings;

const MOVIES: &str = "plexserver://abc/library/sections/1";

async fn context(mock: &MockServer) -> ClientContext {
    let servers = Arc::new(ServerRegistry::new());
    servers.add(MediaServer::new("abc", mock.uri()));
    let remote = Arc::new(HttpRemoteApi::new(servers.clone()));
    ClientContext::new(
        ClientConfig::default(),
        servers,
        remote,
        Arc::new(MemorySettings::new()),
        TranscodeSettings::default(),
    )
}

fn listing(titles: &[&str]) -> serde_json::Value {
    let metadata: Vec<_> = titles
        .iter()
        .enumerate()
        .map(|(i, t)| json!({ "key": format!("/library/metadata/{i}"), "title": t, "type": "movie" }))
        .collect();
    json!({ "MediaContainer": { "Metadata": metadata } })
}

#[tokio::test]
async fn movie_section_is_loaded_over_http() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/library/sections/1/recentlyAdded"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing(&["New"])))
        .mount(&mock)
        .await;
    Mock::given(method("GET"))
        .and(path("/library/sections/1/onDeck"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing(&["Half", "Way"])))
        .mount(&mock)
        .await;
    Mock::given(method("GET"))
        .and(path("/library/sections/1/arts"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock)
        .await;

    let ctx = context(&mock).await;
    let late = ctx
        .refresh_and_wait(&[(MOVIES.to_string(), SectionKind::Movie)], Duration::from_secs(5))
        .await;
    assert!(late.is_empty());

    let recent = ctx.cache.content_list(MOVIES, ContentKind::RecentlyAdded);
    assert_eq!(recent.first().unwrap().label, "New");
    assert_eq!(ctx.cache.content_list(MOVIES, ContentKind::OnDeck).len(), 2);
    assert!(ctx.cache.section(MOVIES).unwrap().outstanding_jobs() == 0);
}

#[tokio::test]
async fn item_resolves_to_part_stream() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/library/metadata/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "MediaContainer": {
                "Metadata": [{
                    "key": "/library/metadata/7",
                    "title": "Heat",
                    "type": "movie",
                    "Media": [{
                        "videoCodec": "h264",
                        "container": "mkv",
                        "Part": [{ "key": "/library/parts/70/file.mkv" }]
                    }]
                }]
            }
        })))
        .mount(&mock)
        .await;

    let ctx = context(&mock).await;
    let item = ContentItem::new("plexserver://abc/library/metadata/7", "Heat", MediaKind::Video);
    let resolved = ctx
        .engine
        .resolve(&item, CancellationToken::new(), &NoBusyIndicator)
        .await
        .unwrap();

    assert_eq!(resolved.path, format!("{}/library/parts/70/file.mkv", mock.uri()));
    assert!(!resolved.transcoded);
}
