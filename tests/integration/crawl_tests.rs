//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock job sites and test the full
//! listing -> detail -> record cycle end-to-end.

use jobtrawl::config::{
    load_config, Config, CrawlerConfig, ListingSelectors, OutputConfig, SiteConfig,
    UserAgentConfig,
};
use jobtrawl::crawler::{crawl, start_crawl, CrawlEvent, FailureKind, ItemFailure};
use jobtrawl::extract::{ExtractionError, JobRecord};
use jobtrawl::output::{export_json_lines, RecordSink, SqliteSink};
use jobtrawl::storage::{RunStatus, SqliteStorage, Storage};
use jobtrawl::TrawlError;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration crawling the mock server from `/jobs`
fn create_test_config(base_url: &str, db_path: &str) -> Config {
    Config {
        site: SiteConfig {
            base_url: base_url.to_string(),
            start_urls: vec![format!("{}/jobs", base_url)],
        },
        crawler: CrawlerConfig {
            max_concurrent_requests: 4,
            politeness_delay: 0,
            request_timeout: 5,
            max_listing_pages: None,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            database_path: db_path.to_string(),
        },
        listing: ListingSelectors::default(),
        rules: Vec::new(),
    }
}

/// A results page in the markup of the crawled site
fn listing_page(detail_hrefs: &[&str], next_href: Option<&str>) -> String {
    let entries: String = detail_hrefs
        .iter()
        .map(|href| {
            format!(
                r#"<li><div class="info_box">
                    <h3>Posting</h3>
                    <div class="buttons"><a href="/shortlist">Shortlist</a> <a href="{}">View job</a></div>
                </div></li>"#,
                href
            )
        })
        .collect();
    let next = next_href
        .map(|href| format!(r#"<a href="{}">&gt;&gt;</a>"#, href))
        .unwrap_or_default();

    format!(
        r#"<html><body>
        <ul class="search_rez">{}</ul>
        <div id="pagination"><a href="/jobs">1</a>{}</div>
        </body></html>"#,
        entries, next
    )
}

/// A job-detail page; `title = None` leaves out the heading
fn detail_page(title: Option<&str>, company: &str, location: &str) -> String {
    let heading = title
        .map(|title| format!(r#"<h1 class="job_title">{}</h1>"#, title))
        .unwrap_or_default();

    format!(
        r#"<html><body>
        {}
        <div class="columns small-12 medium-4 large-4 details">
            <a href="http://firm.example" target="_blank">{}</a>
        </div>
        <p>
            <strong>Location: </strong><a href="/in/{}">{}</a><br>
            <strong>Salary:</strong> Competitive<br>
            <strong>Job type:</strong> Permanent<br>
        </p>
        <div class="description allow-bulletpoints hide-for-small">
            <p>A role in our {} office.</p>
            <ul><li>Busy caseload</li></ul>
        </div>
        </body></html>"#,
        heading, company, location, location, location
    )
}

async fn mount_page(server: &MockServer, page_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

fn split_events(events: Vec<CrawlEvent>) -> (Vec<JobRecord>, Vec<ItemFailure>) {
    let mut records = Vec::new();
    let mut failures = Vec::new();
    for event in events {
        match event {
            CrawlEvent::Record(record) => records.push(record),
            CrawlEvent::Failure(failure) => failures.push(failure),
        }
    }
    records.sort_by(|a, b| a.job_id.cmp(&b.job_id));
    (records, failures)
}

#[tokio::test]
async fn test_full_crawl_two_listing_pages() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/jobs",
        listing_page(
            &["/job/associate/101", "/job/paralegal/102"],
            Some("/jobs/page/2"),
        ),
    )
    .await;
    mount_page(
        &mock_server,
        "/jobs/page/2",
        listing_page(&["/job/clerk/103"], None),
    )
    .await;
    mount_page(
        &mock_server,
        "/job/associate/101",
        detail_page(Some("Associate"), "Acme LLP", "Leeds"),
    )
    .await;
    mount_page(
        &mock_server,
        "/job/paralegal/102",
        detail_page(Some("Paralegal"), "Bolt & Co", "York"),
    )
    .await;
    mount_page(
        &mock_server,
        "/job/clerk/103",
        detail_page(Some("Legal Clerk"), "Acme LLP", "Hull"),
    )
    .await;

    let config = create_test_config(&base_url, "unused.db");
    let (events, report) = crawl(config).await.expect("Crawl failed");
    let (records, failures) = split_events(events);

    assert!(failures.is_empty(), "unexpected failures: {:?}", failures);
    assert_eq!(records.len(), 3);
    assert_eq!(report.listing_pages, 2);
    assert_eq!(report.detail_pages, 3);
    assert_eq!(report.records, 3);
    assert!(!report.cancelled);

    let first_listing = format!("{}/jobs", base_url);
    let second_listing = format!("{}/jobs/page/2", base_url);

    assert_eq!(records[0].job_id, "101");
    assert_eq!(records[0].title, "Associate");
    assert_eq!(records[0].company, "Acme LLP");
    assert_eq!(records[0].location, "Leeds");
    assert_eq!(records[0].url, first_listing);
    assert_eq!(
        records[0].apply_url.as_deref(),
        Some(format!("{}/job/associate/101", base_url).as_str())
    );
    assert_eq!(
        records[0].description,
        "A role in our Leeds office. Busy caseload"
    );
    assert_eq!(records[0].base_salary.as_deref(), Some("Competitive"));
    assert_eq!(records[0].job_type.as_deref(), Some("Permanent"));

    assert_eq!(records[1].company, "Bolt & Co");
    assert_eq!(records[1].url, first_listing);

    assert_eq!(records[2].job_id, "103");
    assert_eq!(records[2].url, second_listing);
}

#[tokio::test]
async fn test_item_failures_do_not_abort_crawl() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/jobs",
        listing_page(&["/job/good/1", "/job/untitled/2", "/job/broken/3", ""], None),
    )
    .await;
    mount_page(
        &mock_server,
        "/job/good/1",
        detail_page(Some("Solicitor"), "Acme LLP", "Leeds"),
    )
    .await;
    mount_page(
        &mock_server,
        "/job/untitled/2",
        detail_page(None, "Acme LLP", "Leeds"),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/job/broken/3"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url, "unused.db");
    let (events, report) = crawl(config).await.expect("Crawl failed");
    let (records, failures) = split_events(events);

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].job_id, "1");
    assert_eq!(failures.len(), 3);
    assert_eq!(report.failures, 3);

    let listing_url = format!("{}/jobs", base_url);
    for failure in &failures {
        assert_eq!(failure.listing_url.as_deref(), Some(listing_url.as_str()));
    }

    let kinds: Vec<&FailureKind> = failures.iter().map(|f| &f.kind).collect();
    assert!(kinds.contains(&&FailureKind::Extraction(
        ExtractionError::MissingRequiredField("title")
    )));
    assert!(kinds.contains(&&FailureKind::FetchFailure("HTTP 500".to_string())));
    assert!(kinds
        .iter()
        .any(|kind| matches!(kind, FailureKind::UnresolvableLink(_))));
}

#[tokio::test]
async fn test_start_page_failure_is_fatal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/jobs"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), "unused.db");
    let result = crawl(config).await;

    match result {
        Err(TrawlError::StartPage { url, message }) => {
            assert!(url.ends_with("/jobs"));
            assert_eq!(message, "HTTP 503");
        }
        other => panic!("expected start page error, got {:?}", other.map(|(_, r)| r)),
    }
}

#[tokio::test]
async fn test_next_page_failure_is_reported_not_fatal() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/jobs",
        listing_page(&["/job/first/1"], Some("/jobs/page/2")),
    )
    .await;
    mount_page(
        &mock_server,
        "/job/first/1",
        detail_page(Some("Trainee Solicitor"), "Acme LLP", "York"),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/jobs/page/2"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url, "unused.db");
    let (events, report) = crawl(config).await.expect("Crawl failed");
    let (records, failures) = split_events(events);

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].job_id, "1");
    assert_eq!(report.listing_pages, 1);
    assert!(!report.cancelled);

    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].url, format!("{}/jobs/page/2", base_url));
    assert_eq!(failures[0].listing_url, None);
    assert_eq!(
        failures[0].kind,
        FailureKind::FetchFailure("HTTP 502".to_string())
    );
}

#[tokio::test]
async fn test_cancel_drains_in_flight_requests() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let hrefs: Vec<String> = (1..=20).map(|n| format!("/job/clerk/{}", n)).collect();
    let href_refs: Vec<&str> = hrefs.iter().map(String::as_str).collect();
    mount_page(&mock_server, "/jobs", listing_page(&href_refs, None)).await;
    for (n, href) in hrefs.iter().enumerate() {
        let title = format!("Clerk {}", n + 1);
        Mock::given(method("GET"))
            .and(path(href.as_str()))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(detail_page(Some(&title), "Acme LLP", "Leeds"))
                    .set_delay(Duration::from_millis(200)),
            )
            .mount(&mock_server)
            .await;
    }

    let mut config = create_test_config(&base_url, "unused.db");
    config.crawler.max_concurrent_requests = 2;

    let (cancel, handle, mut events) = start_crawl(config, 64).expect("Failed to start crawl");
    let first = events.recv().await.expect("No event before cancelling");
    cancel.cancel();

    let mut received = vec![first];
    while let Some(event) = events.recv().await {
        received.push(event);
    }
    let report = handle
        .await
        .expect("Crawl task panicked")
        .expect("Crawl failed");

    assert!(report.cancelled);
    assert!(report.detail_pages < 20);
    assert_eq!(report.records, received.len());

    let (records, failures) = split_events(received);
    assert!(failures.is_empty());
    let listing_url = format!("{}/jobs", base_url);
    for record in &records {
        assert_eq!(record.url, listing_url);
        assert!(record.title.starts_with("Clerk "));
        assert_eq!(record.company, "Acme LLP");
        assert_eq!(record.location, "Leeds");
        assert!(!record.description.is_empty());
    }
}

#[tokio::test]
async fn test_listing_page_limit() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/jobs",
        listing_page(&["/job/only/1"], Some("/jobs/page/2")),
    )
    .await;
    mount_page(
        &mock_server,
        "/job/only/1",
        detail_page(Some("Barrister"), "Chambers", "London"),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/jobs/page/2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[], None)))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&base_url, "unused.db");
    config.crawler.max_listing_pages = Some(1);

    let (events, report) = crawl(config).await.expect("Crawl failed");
    assert_eq!(events.len(), 1);
    assert_eq!(report.listing_pages, 1);
}

#[tokio::test]
async fn test_pagination_cycle_terminates() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/jobs"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(listing_page(&["/job/a/1"], Some("/jobs/page/2"))),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_page(
        &mock_server,
        "/jobs/page/2",
        listing_page(&["/job/a/1"], Some("/jobs")),
    )
    .await;
    mount_page(
        &mock_server,
        "/job/a/1",
        detail_page(Some("Associate"), "Acme LLP", "Leeds"),
    )
    .await;

    let config = create_test_config(&base_url, "unused.db");
    let (events, report) = crawl(config).await.expect("Crawl failed");

    assert_eq!(report.listing_pages, 2);
    assert_eq!(report.detail_pages, 1);
    assert_eq!(events.len(), 1);
}

#[tokio::test]
async fn test_crawl_into_sqlite_from_config_file() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/jobs",
        listing_page(&["/job/associate/101", "/job/missing/102"], None),
    )
    .await;
    mount_page(
        &mock_server,
        "/job/associate/101",
        detail_page(Some("Associate"), "Acme LLP", "Leeds"),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/job/missing/102"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("jobs.db");
    let config_path = dir.path().join("jobtrawl.toml");
    let mut config_file = std::fs::File::create(&config_path).unwrap();
    write!(
        config_file,
        r#"
[site]
base-url = "{base}"
start-urls = ["{base}/jobs"]

[crawler]
max-concurrent-requests = 2
politeness-delay = 0

[user-agent]
crawler-name = "TestBot"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"
contact-email = "test@example.com"

[output]
database-path = "{db}"
"#,
        base = base_url,
        db = db_path.display()
    )
    .unwrap();
    drop(config_file);

    let config = load_config(&config_path).expect("Failed to load config");

    let mut storage = SqliteStorage::new(&db_path).unwrap();
    let run_id = storage.create_run("test_hash").unwrap();
    let storage: Arc<Mutex<dyn Storage + Send>> = Arc::new(Mutex::new(storage));
    let sink = SqliteSink::new(Arc::clone(&storage), run_id);

    let (_cancel, handle, mut events) = start_crawl(config, 8).unwrap();
    while let Some(event) = events.recv().await {
        sink.record_event(&event).unwrap();
    }
    let report = handle.await.unwrap().unwrap();
    sink.finalize(RunStatus::Completed).unwrap();

    assert_eq!(report.records, 1);
    assert_eq!(report.failures, 1);

    let summary = sink.generate_summary().unwrap();
    assert_eq!(summary.records, 1);
    assert_eq!(
        summary.failures_by_kind,
        vec![("fetch_failure".to_string(), 1)]
    );

    let storage = storage.lock().unwrap();
    let run = storage.get_run(run_id).unwrap();
    assert_eq!(run.status, RunStatus::Completed);

    let failures = storage.get_failures(run_id).unwrap();
    assert_eq!(failures[0].message, "Fetch failed: HTTP 404");

    let mut exported = Vec::new();
    assert_eq!(export_json_lines(&*storage, run_id, &mut exported).unwrap(), 1);
    let line: serde_json::Value = serde_json::from_slice(&exported).unwrap();
    assert_eq!(line["jobId"], "101");
    assert_eq!(line["url"], format!("{}/jobs", base_url));
}
