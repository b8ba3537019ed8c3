//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the forum and drive full crawl
//! cycles end-to-end through the HTTP fetcher and the SQLite store.

use async_trait::async_trait;
use floorwatch::config::{parse_config, ForumConfig, DEFAULT_USER_AGENT};
use floorwatch::crawler::{build_engine, CrawlEngine, EngineSettings, HttpFetcher, PageSource};
use floorwatch::output::{
    ForumTag, PublishError, PublishPayload, PublishRequest, PublishResult, Publisher,
    ThreadHandle, MESSAGE_FILE,
};
use floorwatch::storage::{CycleStatus, SqliteStore, TargetStore};
use floorwatch::{CrawlTarget, FetchError};
use std::sync::Mutex;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ===== Forum fixtures =====

/// Markup of one post section
fn post_section(floor: u32, body: &str) -> String {
    format!(
        r#"<section class="c-section" id="post_{floor}">
          <div class="c-post__header">
            <a class="floor tippy-gpbp" data-floor="{floor}" href="//forum.gamer.com.tw/Co.php?bsn=60076&amp;sn={floor}">{floor} 樓</a>
            <a class="username">poster{floor}</a><a class="userid">uid{floor}</a>
            <span class="postgp"><i>GP</i><span>-</span></span>
            <span class="postbp"><i>BP</i><span>-</span></span>
          </div>
          <div class="c-article__content"><div>Post number {floor}</div>{body}</div>
        </section>"#,
        floor = floor,
        body = body
    )
}

/// Post section with the given GP and BP counters
fn scored_section(floor: u32, gp: &str, bp: &str) -> String {
    post_section(floor, "")
        .replace("<i>GP</i><span>-</span>", &format!("<i>GP</i><span>{}</span>", gp))
        .replace("<i>BP</i><span>-</span>", &format!("<i>BP</i><span>{}</span>", bp))
}

/// Markup of a thread page holding the given sections
fn thread_page(title: &str, total_pages: u32, sections: &[String]) -> String {
    let pagination: String = (1..=total_pages)
        .map(|p| format!(r#"<a href="?page={0}">{0}</a>"#, p))
        .collect();
    format!(
        r#"<!DOCTYPE html><html><head><title>{title}</title></head><body>
        <div class="c-menu__scrolldown"><h1 class="title">{title}</h1></div>
        <p class="BH-pagebtnA">{pagination}</p>
        <section class="c-section"><div class="advert">ad</div></section>
        {sections}
        </body></html>"#,
        title = title,
        pagination = pagination,
        sections = sections.concat()
    )
}

/// Full page `page` of a thread with 20 posts per page
fn full_page(title: &str, total_pages: u32, page: u32) -> String {
    let sections: Vec<String> = ((page - 1) * 20 + 1..=page * 20)
        .map(|floor| post_section(floor, ""))
        .collect();
    thread_page(title, total_pages, &sections)
}

async fn mount_page(server: &MockServer, thread_id: u64, page: u32, html: String) {
    Mock::given(method("GET"))
        .and(path("/C.php"))
        .and(query_param("snA", thread_id.to_string()))
        .and(query_param("page", page.to_string()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html)
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

/// Mounts a page that must never be requested
async fn forbid_page(server: &MockServer, thread_id: u64, page: u32) {
    Mock::given(method("GET"))
        .and(path("/C.php"))
        .and(query_param("snA", thread_id.to_string()))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(server)
        .await;
}

fn forum_config(server: &MockServer) -> ForumConfig {
    ForumConfig {
        base_url: server.uri(),
        request_timeout: 5,
        min_request_interval: 0,
        ..ForumConfig::default()
    }
}

// ===== Recording publisher =====

/// Publisher that keeps every request in memory
#[derive(Default)]
struct RecordingPublisher {
    published: Mutex<Vec<(u64, PublishRequest)>>,
    fail_on_floor: Mutex<Option<u32>>,
}

impl RecordingPublisher {
    fn failing_on(floor: u32) -> Self {
        Self {
            fail_on_floor: Mutex::new(Some(floor)),
            ..Default::default()
        }
    }

    fn clear_failure(&self) {
        *self.fail_on_floor.lock().unwrap() = None;
    }

    fn requests(&self) -> Vec<(u64, PublishRequest)> {
        self.published.lock().unwrap().clone()
    }

    /// Floors in publish order, read back from the thread names
    fn floors(&self) -> Vec<u32> {
        self.requests()
            .iter()
            .map(|(_, request)| {
                let name = request.name.trim_end_matches('樓');
                name.rsplit(' ').next().unwrap().parse().unwrap()
            })
            .collect()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn available_tags(&self, _channel_id: u64) -> PublishResult<Vec<ForumTag>> {
        Ok(vec![ForumTag::new(10, "VTuber"), ForumTag::new(11, "collab")])
    }

    async fn publish(
        &self,
        channel_id: u64,
        request: PublishRequest,
    ) -> PublishResult<ThreadHandle> {
        if let Some(floor) = *self.fail_on_floor.lock().unwrap() {
            if request.name.ends_with(&format!(" {}樓", floor)) {
                return Err(PublishError::Unavailable("channel is busy".to_string()));
            }
        }
        let mut published = self.published.lock().unwrap();
        published.push((channel_id, request));
        Ok(ThreadHandle(format!("thread-{}", published.len())))
    }
}

type TestEngine = CrawlEngine<HttpFetcher, RecordingPublisher, SqliteStore>;

fn create_engine(
    server: &MockServer,
    publisher: RecordingPublisher,
    targets: &[CrawlTarget],
) -> TestEngine {
    let mut store = SqliteStore::open_in_memory().expect("Failed to open store");
    for target in targets {
        store.upsert_target(target).expect("Failed to seed target");
    }

    let fetcher = HttpFetcher::new(&forum_config(server)).expect("Failed to build fetcher");
    let settings = EngineSettings {
        pages_per_batch: 2,
        post_delay: Duration::ZERO,
    };

    let mut engine = CrawlEngine::new(settings, fetcher, publisher, store);
    engine.load_targets().expect("Failed to load targets");
    engine
}

// ===== Tests =====

#[tokio::test]
async fn test_two_full_pages_from_the_start() {
    let server = MockServer::start().await;
    mount_page(&server, 4242, 1, full_page("Gossip", 2, 1)).await;
    mount_page(&server, 4242, 2, full_page("Gossip", 2, 2)).await;

    let mut engine = create_engine(
        &server,
        RecordingPublisher::default(),
        &[CrawlTarget::new(7, 60076, 4242)],
    );

    let summary = engine.run_cycle().await.expect("Cycle failed");

    assert_eq!(summary.status, CycleStatus::Completed);
    assert_eq!(summary.targets_attempted, 1);
    assert_eq!(summary.posts_forwarded, 40);
    assert!(summary.failed_targets.is_empty());

    assert_eq!(engine.publisher().floors(), (1..=40).collect::<Vec<_>>());

    let (channel, first) = &engine.publisher().requests()[0];
    assert_eq!(*channel, 7);
    assert_eq!(first.name, "Gossip 1樓");
    match &first.payload {
        PublishPayload::Inline { text } => {
            assert!(text.starts_with("Gossip #1\nAuthor: poster1(uid1)\n"));
            assert!(text.contains("https://forum.gamer.com.tw/Co.php?bsn=60076&sn=1"));
            assert!(text.ends_with("Post number 1"));
        }
        other => panic!("expected inline payload, got {:?}", other),
    }

    let stored = engine.store().load_targets().unwrap();
    assert_eq!(stored[0].last_floor, 40);
}

#[tokio::test]
async fn test_resume_without_new_posts() {
    let server = MockServer::start().await;
    mount_page(&server, 4242, 1, full_page("Gossip", 2, 1)).await;
    forbid_page(&server, 4242, 2).await;
    forbid_page(&server, 4242, 3).await;

    let target = CrawlTarget::new(7, 60076, 4242).with_last_floor(40);
    let mut engine = create_engine(&server, RecordingPublisher::default(), &[target]);

    let summary = engine.run_cycle().await.expect("Cycle failed");

    assert_eq!(summary.status, CycleStatus::Completed);
    assert_eq!(summary.posts_forwarded, 0);
    assert!(engine.publisher().requests().is_empty());
    assert_eq!(engine.store().load_targets().unwrap()[0].last_floor, 40);
}

#[tokio::test]
async fn test_resume_mid_page() {
    let server = MockServer::start().await;
    mount_page(&server, 4242, 1, full_page("Gossip", 3, 1)).await;
    mount_page(&server, 4242, 2, full_page("Gossip", 3, 2)).await;
    mount_page(&server, 4242, 3, full_page("Gossip", 3, 3)).await;

    let target = CrawlTarget::new(7, 60076, 4242).with_last_floor(35);
    let mut engine = create_engine(&server, RecordingPublisher::default(), &[target]);

    engine.run_cycle().await.expect("Cycle failed");

    assert_eq!(engine.publisher().floors(), (36..=60).collect::<Vec<_>>());
    assert_eq!(engine.snapshot_targets()[0].last_floor, 60);
}

#[tokio::test]
async fn test_failing_target_does_not_block_others() {
    let server = MockServer::start().await;
    // Thread 1 has no mock and answers 404
    mount_page(&server, 2, 1, full_page("Healthy", 1, 1)).await;

    let mut engine = create_engine(
        &server,
        RecordingPublisher::default(),
        &[CrawlTarget::new(7, 60076, 1), CrawlTarget::new(7, 60076, 2)],
    );

    let summary = engine.run_cycle().await.expect("Cycle failed");

    assert_eq!(summary.status, CycleStatus::Completed);
    assert_eq!(summary.targets_attempted, 2);
    assert_eq!(summary.posts_forwarded, 20);
    assert_eq!(summary.failed_targets.len(), 1);
    assert_eq!(summary.failed_targets[0].label, "bsn=60076 snA=1");
    assert!(summary.failed_targets[0].reason.contains("404"));

    let targets = engine.snapshot_targets();
    assert_eq!(targets[0].last_floor, 0);
    assert_eq!(targets[1].last_floor, 20);
}

#[tokio::test]
async fn test_deleted_thread_fails_target() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        4242,
        1,
        "<html><body><p>This thread has been removed</p></body></html>".to_string(),
    )
    .await;

    let mut engine = create_engine(
        &server,
        RecordingPublisher::default(),
        &[CrawlTarget::new(7, 60076, 4242)],
    );

    let summary = engine.run_cycle().await.expect("Cycle failed");

    assert_eq!(summary.failed_targets.len(), 1);
    assert!(summary.failed_targets[0]
        .reason
        .contains("thread title not found"));
    assert!(engine.publisher().requests().is_empty());
}

#[tokio::test]
async fn test_publish_failure_resumes_from_failed_floor() {
    let server = MockServer::start().await;
    mount_page(&server, 4242, 1, full_page("Gossip", 1, 1)).await;

    let mut engine = create_engine(
        &server,
        RecordingPublisher::failing_on(5),
        &[CrawlTarget::new(7, 60076, 4242)],
    );

    let first = engine.run_cycle().await.expect("Cycle failed");
    assert_eq!(first.posts_forwarded, 4);
    assert_eq!(first.failed_targets.len(), 1);
    assert_eq!(engine.store().load_targets().unwrap()[0].last_floor, 4);

    engine.publisher().clear_failure();
    let second = engine.run_cycle().await.expect("Cycle failed");
    assert_eq!(second.posts_forwarded, 16);
    assert!(second.failed_targets.is_empty());

    assert_eq!(engine.publisher().floors(), (1..=20).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_score_thresholds() {
    let server = MockServer::start().await;
    let sections = vec![
        scored_section(1, "3", "-"),
        scored_section(2, "爆", "-"),
        scored_section(3, "50", "X"),
    ];
    mount_page(&server, 4242, 1, thread_page("Scores", 1, &sections)).await;

    let target = CrawlTarget::new(7, 60076, 4242).with_thresholds(10, 20);
    let mut engine = create_engine(&server, RecordingPublisher::default(), &[target]);

    let summary = engine.run_cycle().await.expect("Cycle failed");

    assert_eq!(engine.publisher().floors(), vec![2]);
    assert_eq!(summary.posts_skipped, 2);
    assert_eq!(engine.snapshot_targets()[0].last_floor, 2);
}

#[tokio::test]
async fn test_hashtags_pick_channel_tags() {
    let server = MockServer::start().await;
    let sections = vec![post_section(
        1,
        "<div>Great stream! #collab #VTuber #unknown</div>",
    )];
    mount_page(&server, 4242, 1, thread_page("Tags", 1, &sections)).await;

    let mut engine = create_engine(
        &server,
        RecordingPublisher::default(),
        &[CrawlTarget::new(7, 60076, 4242)],
    );
    engine.run_cycle().await.expect("Cycle failed");

    let (_, request) = &engine.publisher().requests()[0];
    assert_eq!(
        request.applied_tags,
        vec![ForumTag::new(10, "VTuber"), ForumTag::new(11, "collab")]
    );
}

#[tokio::test]
async fn test_cancel_interrupts_post_delay() {
    let server = MockServer::start().await;
    mount_page(&server, 4242, 1, full_page("Gossip", 1, 1)).await;

    let mut store = SqliteStore::open_in_memory().expect("Failed to open store");
    store
        .upsert_target(&CrawlTarget::new(7, 60076, 4242))
        .expect("Failed to seed target");

    // A long delay after every post leaves the cancel landing mid-wait
    let settings = EngineSettings {
        pages_per_batch: 1,
        post_delay: Duration::from_secs(60),
    };
    let fetcher = HttpFetcher::new(&forum_config(&server)).expect("Failed to build fetcher");
    let mut engine = CrawlEngine::new(settings, fetcher, RecordingPublisher::default(), store);
    engine.load_targets().expect("Failed to load targets");

    let control = engine.control();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        control.cancel();
    });

    let summary = tokio::time::timeout(Duration::from_secs(10), engine.run_cycle())
        .await
        .expect("Cancel did not interrupt the delay")
        .expect("Cycle failed");

    assert_eq!(summary.status, CycleStatus::Cancelled);
    assert_eq!(summary.posts_forwarded, 1);
    assert_eq!(engine.store().load_targets().unwrap()[0].last_floor, 1);
}

#[tokio::test]
async fn test_build_engine_archives_to_directory() {
    let server = MockServer::start().await;
    let long_body = format!("<div>{}</div>", "長".repeat(2500));
    let sections = vec![post_section(1, ""), post_section(2, &long_body)];
    mount_page(&server, 4242, 1, thread_page("Archive", 1, &sections)).await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("floorwatch.db");
    let archive = dir.path().join("archive");
    let config = parse_config(&format!(
        r#"
[forum]
base-url = {base:?}
min-request-interval = 0

[crawler]
post-delay = 0

[storage]
database-path = {db:?}

[output]
archive-dir = {archive:?}
tags = ["VTuber"]

[[target]]
channel-id = 3
board-id = 60076
thread-id = 4242
"#,
        base = server.uri(),
        db = db_path.display().to_string(),
        archive = archive.display().to_string(),
    ))
    .expect("Invalid test config");

    let mut engine = build_engine(&config, "test-hash").expect("Failed to build engine");
    let summary = engine.run_cycle().await.expect("Cycle failed");
    assert_eq!(summary.posts_forwarded, 2);

    let short = archive.join("3").join("Archive 1樓");
    let message = std::fs::read_to_string(short.join(MESSAGE_FILE)).unwrap();
    assert!(message.contains("Post number 1"));
    assert!(!short.join("content.txt").exists());

    let long = archive.join("3").join("Archive 2樓");
    let attached = std::fs::read_to_string(long.join("content.txt")).unwrap();
    assert!(attached.ends_with(&"長".repeat(2500)));

    let cycles = engine.store().recent_cycles(5).unwrap();
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0].config_hash, "test-hash");
    assert_eq!(cycles[0].posts_forwarded, 2);
}

#[tokio::test]
async fn test_fetcher_sends_browser_user_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/C.php"))
        .and(header("user-agent", DEFAULT_USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(&forum_config(&server)).unwrap();
    let body = fetcher
        .fetch_page(&fetcher.page_url(60076, 4242, 1))
        .await
        .unwrap();
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn test_fetcher_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(&forum_config(&server)).unwrap();
    let result = fetcher.fetch_page(&fetcher.page_url(1, 1, 1)).await;
    assert!(matches!(result, Err(FetchError::Status { status: 503, .. })));
}

#[tokio::test]
async fn test_fetcher_reports_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let config = ForumConfig {
        request_timeout: 1,
        ..forum_config(&server)
    };
    let fetcher = HttpFetcher::new(&config).unwrap();
    let result = fetcher.fetch_page(&fetcher.page_url(1, 1, 1)).await;
    assert!(matches!(result, Err(FetchError::Timeout { .. })));
}
