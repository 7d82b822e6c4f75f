use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use rustplex_core::config::ClientConfig;
use rustplex_core::{
    ContentItem, ContentList, MediaAlternative, MediaKind, MediaPart, MediaServer, ServerRegistry,
    TransportError,
};
use rustplex_remote::{RawResponse, RemoteApi};
use rustplex_resolver::{
    BusyIndicator, LocalFs, MediaDecisionEngine, NoBusyIndicator, ResolveError, ResolveState,
};
use rustplex_transcoder::{CapsTranscodePolicy, TranscodeSettings};

const DETAIL: &str = "plexserver://abc/library/metadata/1";

#[derive(Default)]
struct FakeRemote {
    listings: HashMap<String, ContentList>,
    requests: Mutex<Vec<(String, Option<String>)>>,
    raw_requests: Mutex<Vec<(String, Option<String>)>>,
    hang: bool,
}

impl FakeRemote {
    fn with(mut self, url: &str, list: ContentList) -> Self {
        self.listings.insert(url.to_string(), list);
        self
    }

    fn fetches(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl RemoteApi for FakeRemote {
    async fn fetch_directory(
        &self,
        url: &str,
        body: Option<&str>,
    ) -> Result<ContentList, TransportError> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), body.map(str::to_string)));
        if self.hang {
            std::future::pending::<()>().await;
        }
        self.listings.get(url).cloned().ok_or(TransportError::Status {
            status: 404,
            url: url.to_string(),
        })
    }

    async fn fetch_raw(
        &self,
        url: &str,
        user_agent: Option<&str>,
    ) -> Result<RawResponse, TransportError> {
        self.raw_requests
            .lock()
            .unwrap()
            .push((url.to_string(), user_agent.map(str::to_string)));
        Ok(RawResponse {
            headers: "Set-Cookie: s=1\r\n\r\n".into(),
            body: "form".into(),
        })
    }
}

#[derive(Default)]
struct RecordingBusy {
    shown: AtomicUsize,
    closed: AtomicUsize,
    cancel_on_show: bool,
}

impl BusyIndicator for RecordingBusy {
    fn show(&self) -> CancellationToken {
        self.shown.fetch_add(1, Ordering::SeqCst);
        let token = CancellationToken::new();
        if self.cancel_on_show {
            token.cancel();
        }
        token
    }

    fn close(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

fn part(key: &str) -> MediaPart {
    MediaPart {
        unprocessed_key: Some(key.to_string()),
        ..MediaPart::new(key)
    }
}

fn alternative(indirect: bool, parts: Vec<MediaPart>) -> MediaAlternative {
    MediaAlternative {
        indirect,
        parts,
        ..MediaAlternative::default()
    }
}

fn listing(alt: MediaAlternative) -> ContentList {
    let mut item = ContentItem::new(DETAIL, "Film", MediaKind::Video);
    item.server = Some("abc".into());
    item.unprocessed_key = Some("/library/metadata/1".into());
    item.media = vec![alt];
    ContentList::new(vec![item])
}

fn engine(remote: Arc<FakeRemote>, settings: TranscodeSettings) -> MediaDecisionEngine {
    let servers = Arc::new(ServerRegistry::new());
    servers.add(MediaServer::new("abc", "http://nas:32400"));
    MediaDecisionEngine::new(
        remote,
        servers,
        Arc::new(CapsTranscodePolicy::new(settings)),
        Arc::new(LocalFs),
        &ClientConfig::default(),
    )
}

fn server_item() -> ContentItem {
    let mut item = ContentItem::new(DETAIL, "Film", MediaKind::Video);
    item.server = Some("abc".into());
    item
}

#[tokio::test]
async fn synthesized_item_needs_no_network() {
    let remote = Arc::new(FakeRemote::default());
    let engine = engine(remote.clone(), TranscodeSettings::default());

    let mut item = ContentItem::new("/media/a.mkv", "a", MediaKind::Video);
    item.synthesized = true;
    item.media = vec![alternative(false, vec![MediaPart::new("/media/a.mkv")])];

    let resolved = engine
        .resolve(&item, CancellationToken::new(), &NoBusyIndicator)
        .await
        .unwrap();
    assert_eq!(resolved.path, "/media/a.mkv");
    assert_eq!(remote.fetches(), 0);
    assert_eq!(engine.state(), ResolveState::Resolved);
}

#[tokio::test]
async fn navigation_node_resolves_to_itself() {
    let remote = Arc::new(FakeRemote::default());
    let engine = engine(remote.clone(), TranscodeSettings::default());
    let folder = ContentItem::new("plexserver://abc/library/sections/1/all", "All", MediaKind::Directory);

    let resolved = engine
        .resolve(&folder, CancellationToken::new(), &NoBusyIndicator)
        .await
        .unwrap();
    assert_eq!(resolved, folder);
    assert_eq!(remote.fetches(), 0);
}

#[tokio::test]
async fn follows_each_indirect_hop_once() {
    let remote = FakeRemote::default()
        .with(DETAIL, listing(alternative(true, vec![part("/hop/1")])))
        .with("plexserver://abc/hop/1", listing(alternative(true, vec![part("/hop/2")])))
        .with("plexserver://abc/hop/2", listing(alternative(true, vec![part("/hop/3")])))
        .with(
            "plexserver://abc/hop/3",
            listing(alternative(false, vec![part("http://cdn/final.mp4")])),
        );
    let remote = Arc::new(remote);
    let engine = engine(remote.clone(), TranscodeSettings::default());

    let resolved = engine
        .resolve(&server_item(), CancellationToken::new(), &NoBusyIndicator)
        .await
        .unwrap();

    assert_eq!(resolved.path, "http://cdn/final.mp4");
    // One detail fetch plus three hops.
    assert_eq!(remote.fetches(), 4);
    assert!(!resolved.transcoded);
}

#[tokio::test]
async fn multi_part_indirect_is_a_data_error() {
    let remote = FakeRemote::default().with(
        DETAIL,
        listing(alternative(true, vec![part("/a"), part("/b")])),
    );
    let engine = engine(Arc::new(remote), TranscodeSettings::default());

    let err = engine
        .resolve(&server_item(), CancellationToken::new(), &NoBusyIndicator)
        .await
        .unwrap_err();
    assert_eq!(err, ResolveError::AmbiguousIndirect(2));
    assert!(!err.is_cancelled());
    assert_eq!(engine.state(), ResolveState::Failed);
}

#[tokio::test]
async fn indirect_loop_is_bounded() {
    let remote = FakeRemote::default()
        .with(DETAIL, listing(alternative(true, vec![part("/loop")])))
        .with("plexserver://abc/loop", listing(alternative(true, vec![part("/loop")])));
    let remote = Arc::new(remote);
    let engine = engine(remote.clone(), TranscodeSettings::default());

    let err = engine
        .resolve(&server_item(), CancellationToken::new(), &NoBusyIndicator)
        .await
        .unwrap_err();
    assert_eq!(err, ResolveError::IndirectDepthExceeded(10));
    assert_eq!(remote.fetches(), 11);
}

#[tokio::test]
async fn empty_indirect_reply_fails() {
    let remote = FakeRemote::default()
        .with(DETAIL, listing(alternative(true, vec![part("/gone")])))
        .with("plexserver://abc/gone", ContentList::empty());
    let engine = engine(Arc::new(remote), TranscodeSettings::default());

    let err = engine
        .resolve(&server_item(), CancellationToken::new(), &NoBusyIndicator)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "empty_indirect");
}

#[tokio::test]
async fn post_url_is_submitted_before_following() {
    let mut indirect = part("/system/services/url/lookup");
    indirect.post_url = Some("http://site/login".into());
    let mut reply = listing(alternative(false, vec![part("http://cdn/v.mp4")]));
    reply.http_headers = Some("Referer=http%3A%2F%2Fsite".into());

    let remote = FakeRemote::default()
        .with(DETAIL, listing(alternative(true, vec![indirect])))
        .with(
            "plexserver://abc/system/services/url/lookup?postURL=http%3A%2F%2Fsite%2Flogin",
            reply,
        );
    let remote = Arc::new(remote);
    let engine = engine(remote.clone(), TranscodeSettings::default());

    let resolved = engine
        .resolve(&server_item(), CancellationToken::new(), &NoBusyIndicator)
        .await
        .unwrap();

    let raw = remote.raw_requests.lock().unwrap().clone();
    assert_eq!(raw.len(), 1);
    assert_eq!(raw[0].0, "http://site/login");
    assert!(raw[0].1.as_deref().unwrap().starts_with("Mozilla/5.0"));

    let requests = remote.requests.lock().unwrap().clone();
    assert_eq!(
        requests[1].1.as_deref(),
        Some("Set-Cookie: s=1\r\n\r\nform")
    );
    assert_eq!(resolved.path, "http://cdn/v.mp4|Referer=http%3A%2F%2Fsite");
}

#[tokio::test]
async fn multi_part_alternative_is_stacked() {
    let remote = Arc::new(FakeRemote::default());
    let engine = engine(remote.clone(), TranscodeSettings::default());
    let mut item = ContentItem::new("/library/film", "Film", MediaKind::Video);
    item.media = vec![alternative(
        false,
        vec![MediaPart::new("A.mkv"), MediaPart::new("B.mkv")],
    )];

    let resolved = engine
        .resolve(&item, CancellationToken::new(), &NoBusyIndicator)
        .await
        .unwrap();
    assert_eq!(resolved.path, "stack://A.mkv , B.mkv");
    assert_eq!(rustplex_resolver::expand_stack(&resolved).unwrap().len(), 2);
}

#[tokio::test]
async fn forced_transcode_rewrites_path() {
    let remote = FakeRemote::default().with(
        DETAIL,
        listing(alternative(false, vec![part("/library/parts/1/file.mkv")])),
    );
    let settings = TranscodeSettings {
        force: true,
        ..TranscodeSettings::default()
    };
    let engine = engine(Arc::new(remote), settings);

    let resolved = engine
        .resolve(&server_item(), CancellationToken::new(), &NoBusyIndicator)
        .await
        .unwrap();
    assert!(resolved.transcoded);
    assert!(resolved
        .path
        .starts_with("http://nas:32400/video/:/transcode/universal/start.m3u8?"));
}

#[tokio::test]
async fn local_file_is_played_without_transcoding() {
    let file = std::env::temp_dir().join("rustplex-resolve-local.mkv");
    std::fs::write(&file, b"").unwrap();
    let file = file.to_string_lossy().into_owned();

    let mut local = part("/library/parts/1/file.mkv");
    local.file = Some(file.clone());
    let mut alt = alternative(false, vec![local]);
    alt.video_codec = Some("vp9".into());
    let remote = FakeRemote::default().with(DETAIL, listing(alt.clone()));
    let resolver = engine(Arc::new(remote), TranscodeSettings::default());

    let resolved = resolver
        .resolve(&server_item(), CancellationToken::new(), &NoBusyIndicator)
        .await
        .unwrap();
    assert_eq!(resolved.path, file);
    assert!(!resolved.transcoded);

    // Without the local file the same media streams from the server and is transcoded.
    alt.parts[0].file = Some("/nonexistent/rustplex/file.mkv".into());
    let remote = FakeRemote::default().with(DETAIL, listing(alt));
    let resolver = engine(Arc::new(remote), TranscodeSettings::default());
    let resolved = resolver
        .resolve(&server_item(), CancellationToken::new(), &NoBusyIndicator)
        .await
        .unwrap();
    assert!(resolved.transcoded);
}

#[tokio::test]
async fn external_stream_is_never_transcoded() {
    let remote = FakeRemote::default().with(
        DETAIL,
        listing(alternative(false, vec![MediaPart::new("http://cdn/v.mp4")])),
    );
    let settings = TranscodeSettings {
        force: true,
        ..TranscodeSettings::default()
    };
    let engine = engine(Arc::new(remote), settings);

    let resolved = engine
        .resolve(&server_item(), CancellationToken::new(), &NoBusyIndicator)
        .await
        .unwrap();
    assert_eq!(resolved.path, "http://cdn/v.mp4");
    assert!(!resolved.transcoded);
}

#[tokio::test]
async fn transport_failure_is_reported() {
    let engine = engine(Arc::new(FakeRemote::default()), TranscodeSettings::default());
    let err = engine
        .resolve(&server_item(), CancellationToken::new(), &NoBusyIndicator)
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::Transport(TransportError::Status { status: 404, .. })));
}

#[tokio::test(start_paused = true)]
async fn cancel_during_grace_period() {
    let remote = Arc::new(FakeRemote {
        hang: true,
        ..FakeRemote::default()
    });
    let engine = engine(remote, TranscodeSettings::default());
    let busy = RecordingBusy::default();
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let started = tokio::time::Instant::now();
    let err = engine.resolve(&server_item(), cancel, &busy).await.unwrap_err();
    assert!(err.is_cancelled());
    assert!(started.elapsed() < Duration::from_millis(100));
    assert_eq!(busy.shown.load(Ordering::SeqCst), 0);
    assert_eq!(engine.state(), ResolveState::Cancelled);
}

#[tokio::test(start_paused = true)]
async fn busy_indicator_shown_once_and_can_cancel() {
    let remote = Arc::new(FakeRemote {
        hang: true,
        ..FakeRemote::default()
    });
    let engine = engine(remote, TranscodeSettings::default());
    let busy = RecordingBusy {
        cancel_on_show: true,
        ..RecordingBusy::default()
    };

    let err = engine
        .resolve(&server_item(), CancellationToken::new(), &busy)
        .await
        .unwrap_err();
    assert_eq!(err, ResolveError::Cancelled);
    assert_eq!(busy.shown.load(Ordering::SeqCst), 1);
    assert_eq!(busy.closed.load(Ordering::SeqCst), 1);
}
