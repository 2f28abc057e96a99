use conference_harvester::config::Config;
use conference_harvester::crawler::{harvest, RunOptions};
use conference_harvester::output::{load_index, IndexStatistics};
use conference_harvester::state::FailureKind;
use conference_harvester::HarvestError;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const INDEX_HTML: &str = r#"<html><head><title>IBIC 2025 Proceedings</title></head><body>
    <h1>Sessions</h1>
    <ul>
        <li><a href="session/1-moa/index.html">MOA - Opening Session</a></li>
        <li><a href="session/2-mob/index.html">MOB - Beam Diagnostics</a></li>
    </ul>
</body></html>"#;

const MOA_LISTING: &str = r#"<html><body><table>
    <tr><th>ID</th><th>Title</th></tr>
    <tr>
        <td class="paper_id"><a href="../../doi/MOA01.html">MOA01</a></td>
        <td class="title">Beam Instrumentation at the ESRF</td>
    </tr>
    <tr>
        <td class="paper_id"><a href="../../doi/MOA02.html">MOA02</a></td>
        <td class="title">Status of the SLS 2.0 Diagnostics</td>
    </tr>
</table></body></html>"#;

const MOB_LISTING: &str = r#"<html><body><table>
    <tr><th>ID</th><th>Title</th></tr>
    <tr>
        <td class="paper_id"><a href="../../doi/MOB01.html">MOB01</a></td>
        <td class="title">Cavity BPM Design</td>
    </tr>
</table></body></html>"#;

fn detail_html(paper_id: &str, title: &str) -> String {
    format!(
        r#"<html><head>
        <meta name="citation_title" content="{title}">
        <meta name="citation_author" content="Smith, Alice">
        <meta name="citation_author" content="Jones, Bob">
        <meta name="citation_author_institution" content="ESRF">
        <meta name="citation_pdf_url" content="/90/pdf/{id}.pdf">
        <meta name="citation_doi" content="10.18429/JACoW-IBIC2025-{id}">
        </head><body>
        <h1>{title}</h1>
        <div class="abstract">Abstract: Results of {id}.</div>
        <dl><dt>Received:</dt><dd>03 September 2025</dd></dl>
        </body></html>"#,
        id = paper_id,
        title = title
    )
}

fn pdf_body() -> Vec<u8> {
    let mut body = b"%PDF-1.4\n".to_vec();
    body.extend(std::iter::repeat(b'x').take(256));
    body
}

const PAPERS: [(&str, &str); 3] = [
    ("MOA01", "Beam Instrumentation at the ESRF"),
    ("MOA02", "Status of the SLS 2.0 Diagnostics"),
    ("MOB01", "Cavity BPM Design"),
];

/// Creates a test configuration pointing at the mock server, without delays
fn create_test_config(server: &MockServer, output_dir: &Path) -> Config {
    let mut config = Config::default();
    config.site.base_url = format!("{}/90/", server.uri());
    config.output.output_dir = output_dir.to_path_buf();
    config.fetch.delay_min_secs = 0.0;
    config.fetch.delay_max_secs = 0.0;
    config.fetch.backoff_base_secs = 0.0;
    config.fetch.request_timeout_secs = 5;
    config
}

async fn mount_html(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

/// Mounts listings and detail pages; PDFs and the index are left to the test
async fn mount_site_pages(server: &MockServer) {
    mount_html(server, "/90/session/1-moa/index.html", MOA_LISTING.to_string()).await;
    mount_html(server, "/90/session/2-mob/index.html", MOB_LISTING.to_string()).await;
    for (id, title) in PAPERS {
        mount_html(server, &format!("/90/doi/{}.html", id), detail_html(id, title)).await;
    }
}

async fn mount_pdfs(server: &MockServer, status: u16) {
    for (id, _) in PAPERS {
        let template = if status == 200 {
            ResponseTemplate::new(200)
                .set_body_bytes(pdf_body())
                .insert_header("content-type", "application/pdf")
        } else {
            ResponseTemplate::new(status)
        };
        Mock::given(method("GET"))
            .and(path(format!("/90/pdf/{}.pdf", id)))
            .respond_with(template)
            .mount(server)
            .await;
    }
}

#[tokio::test]
async fn test_full_harvest_two_sessions() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    let root = output.path().join("IBIC2025_Data");

    mount_html(&server, "/90/", INDEX_HTML.to_string()).await;
    mount_site_pages(&server).await;
    mount_pdfs(&server, 200).await;

    let config = create_test_config(&server, &root);
    let summary = harvest(config, RunOptions::default())
        .await
        .expect("harvest should succeed");

    assert_eq!(summary.total_papers, 3);
    assert_eq!(summary.stats.total_sessions(), 2);
    assert_eq!(summary.stats.pdfs_downloaded(), 3);
    assert_eq!(summary.stats.total_failures(), 0);
    // index + 2 listings + 3 detail pages + 3 PDFs
    assert_eq!(summary.stats.requests_sent, 9);

    let moa_data = root.join("Sessions/MOA - Opening Session");
    assert!(moa_data.join("papers_data.json").exists());
    assert!(moa_data.join("papers_data.csv").exists());
    assert!(moa_data.join("papers_summary.txt").exists());
    assert!(root.join("Sessions/MOB - Beam Diagnostics/papers_data.json").exists());

    let pdf = root.join("PDFs/MOA - Opening Session/MOA01 - Beam Instrumentation at the ESRF.pdf");
    assert_eq!(std::fs::read(&pdf).unwrap(), pdf_body());
    assert!(root
        .join("PDFs/MOB - Beam Diagnostics/MOB01 - Cavity BPM Design.pdf")
        .exists());

    let index = load_index(&summary.index_path).unwrap();
    assert_eq!(index.total_sessions, 2);
    assert_eq!(index.total_papers, 3);
    let moa01 = index.papers.iter().find(|p| p.paper_id == "MOA01").unwrap();
    assert_eq!(moa01.authors, vec!["Smith, Alice", "Jones, Bob"]);
    assert_eq!(
        moa01.doi.as_deref(),
        Some("https://doi.org/10.18429/JACoW-IBIC2025-MOA01")
    );
    assert_eq!(moa01.session_code, "MOA");

    let csv = std::fs::read_to_string(root.join("IBIC2025_Data_All_Papers.csv")).unwrap();
    assert_eq!(csv.lines().count(), 4);

    let report = std::fs::read_to_string(&summary.report_path).unwrap();
    assert!(report.contains("total_sessions=2"));
    assert!(report.contains("total_papers=3"));
    assert!(report.contains("pdfs_downloaded=3"));
}

#[tokio::test]
async fn test_missing_pdfs_are_counted_not_fatal() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    let root = output.path().join("Run");

    mount_html(&server, "/90/", INDEX_HTML.to_string()).await;
    mount_site_pages(&server).await;
    mount_pdfs(&server, 404).await;

    let summary = harvest(create_test_config(&server, &root), RunOptions::default())
        .await
        .unwrap();

    assert_eq!(summary.total_papers, 3);
    assert_eq!(summary.stats.pdfs_failed(), 3);
    assert_eq!(
        summary.stats.failure_totals()[&FailureKind::PdfDownload],
        3
    );

    let index = load_index(&summary.index_path).unwrap();
    assert_eq!(index.total_papers, 3);
    assert!(!root
        .join("PDFs/MOA - Opening Session/MOA01 - Beam Instrumentation at the ESRF.pdf")
        .exists());
}

#[tokio::test]
async fn test_rerun_skips_existing_pdf() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    let root = output.path().join("Run");

    let existing = root.join("PDFs/MOA - Opening Session");
    std::fs::create_dir_all(&existing).unwrap();
    std::fs::write(
        existing.join("MOA01 - Beam Instrumentation at the ESRF.pdf"),
        pdf_body(),
    )
    .unwrap();

    mount_html(&server, "/90/", INDEX_HTML.to_string()).await;
    mount_site_pages(&server).await;

    Mock::given(method("GET"))
        .and(path("/90/pdf/MOA01.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(pdf_body()))
        .expect(0)
        .mount(&server)
        .await;
    for id in ["MOA02", "MOB01"] {
        Mock::given(method("GET"))
            .and(path(format!("/90/pdf/{}.pdf", id)))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(pdf_body()))
            .expect(1)
            .mount(&server)
            .await;
    }

    let summary = harvest(create_test_config(&server, &root), RunOptions::default())
        .await
        .unwrap();

    assert_eq!(summary.stats.pdfs_already_present(), 1);
    assert_eq!(summary.stats.pdfs_downloaded(), 2);
    assert_eq!(summary.stats.requests_sent, 8);
}

#[tokio::test]
async fn test_skip_pdfs_and_limit_sessions() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    let root = output.path().join("Run");

    mount_html(&server, "/90/", INDEX_HTML.to_string()).await;
    mount_site_pages(&server).await;
    Mock::given(method("GET"))
        .and(path("/90/pdf/MOA01.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(pdf_body()))
        .expect(0)
        .mount(&server)
        .await;

    let options = RunOptions {
        limit_sessions: Some(1),
        skip_pdfs: true,
        config_hash: None,
    };
    let summary = harvest(create_test_config(&server, &root), options)
        .await
        .unwrap();

    assert_eq!(summary.stats.total_sessions(), 1);
    assert_eq!(summary.total_papers, 2);
    assert_eq!(summary.stats.pdfs_downloaded(), 0);
    assert_eq!(summary.stats.pdfs_unavailable(), 0);
    assert!(!root.join("Sessions/MOB - Beam Diagnostics").exists());

    let report = std::fs::read_to_string(&summary.report_path).unwrap();
    assert!(report.contains("PDF downloads: skipped for this run"));
}

#[tokio::test]
async fn test_transient_index_errors_are_retried() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    let root = output.path().join("Run");

    Mock::given(method("GET"))
        .and(path("/90/"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_html(&server, "/90/", INDEX_HTML.to_string()).await;
    mount_site_pages(&server).await;
    mount_pdfs(&server, 200).await;

    let options = RunOptions {
        limit_sessions: Some(1),
        skip_pdfs: true,
        config_hash: None,
    };
    let summary = harvest(create_test_config(&server, &root), options)
        .await
        .unwrap();

    assert_eq!(summary.stats.total_sessions(), 1);
    // 3 index attempts + 1 listing + 2 detail pages
    assert_eq!(summary.stats.requests_sent, 6);
}

#[tokio::test]
async fn test_unreachable_index_is_fatal() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/90/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let mut config = create_test_config(&server, &output.path().join("Run"));
    config.fetch.max_retries = 2;

    let result = harvest(config, RunOptions::default()).await;
    match result {
        Err(HarvestError::IndexUnavailable(e)) => assert_eq!(e.attempts, 2),
        other => panic!("expected IndexUnavailable, got {:?}", other.map(|s| s.total_papers)),
    }
}

#[tokio::test]
async fn test_broken_session_is_skipped() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    let root = output.path().join("Run");

    mount_html(&server, "/90/", INDEX_HTML.to_string()).await;
    mount_html(&server, "/90/session/1-moa/index.html", MOA_LISTING.to_string()).await;
    Mock::given(method("GET"))
        .and(path("/90/session/2-mob/index.html"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    for (id, title) in &PAPERS[..2] {
        mount_html(&server, &format!("/90/doi/{}.html", id), detail_html(id, title)).await;
    }

    let options = RunOptions {
        skip_pdfs: true,
        ..Default::default()
    };
    let summary = harvest(create_test_config(&server, &root), options)
        .await
        .unwrap();

    assert_eq!(summary.stats.total_sessions(), 2);
    assert_eq!(summary.total_papers, 2);
    assert_eq!(
        summary.stats.failure_totals()[&FailureKind::SessionFetch],
        1
    );

    let index = load_index(&summary.index_path).unwrap();
    assert_eq!(index.total_sessions, 1);
    assert_eq!(index.sessions[0].code, "MOA");
}

#[tokio::test]
async fn test_statistics_from_harvested_index() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    let root = output.path().join("Run");

    mount_html(&server, "/90/", INDEX_HTML.to_string()).await;
    mount_site_pages(&server).await;

    let options = RunOptions {
        skip_pdfs: true,
        ..Default::default()
    };
    let summary = harvest(create_test_config(&server, &root), options)
        .await
        .unwrap();

    let index = load_index(&summary.index_path).unwrap();
    let stats = IndexStatistics::from_index(&index);

    assert_eq!(stats.total_sessions, 2);
    assert_eq!(stats.total_papers, 3);
    assert_eq!(stats.with_doi, 3);
    assert_eq!(stats.with_abstract, 3);
    assert_eq!(stats.with_pdf_link, 3);
    assert_eq!(stats.unique_authors, 2);
    assert_eq!(stats.top_institutions[0], ("ESRF".to_string(), 3));
}

#[tokio::test]
async fn test_index_without_sessions_finishes_empty() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    let root = output.path().join("Run");

    mount_html(
        &server,
        "/90/",
        "<html><body><p>Proceedings coming soon</p></body></html>".to_string(),
    )
    .await;

    let summary = harvest(create_test_config(&server, &root), RunOptions::default())
        .await
        .expect("an unparseable index is not fatal");

    assert_eq!(summary.stats.total_sessions(), 0);
    assert_eq!(summary.total_papers, 0);
    assert_eq!(summary.stats.failure_totals()[&FailureKind::IndexParse], 1);
    assert!(root.join("Debug/index_parse_failure.html").exists());

    let report = std::fs::read_to_string(&summary.report_path).unwrap();
    assert!(report.contains("failures.index_parse=1\n"));
    assert_eq!(load_index(&summary.index_path).unwrap().total_papers, 0);
}

#[tokio::test]
async fn test_missing_detail_page_drops_paper() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    let root = output.path().join("Run");

    mount_html(&server, "/90/", INDEX_HTML.to_string()).await;
    mount_html(&server, "/90/session/1-moa/index.html", MOA_LISTING.to_string()).await;
    mount_html(&server, "/90/session/2-mob/index.html", MOB_LISTING.to_string()).await;
    mount_html(&server, "/90/doi/MOA01.html", detail_html(PAPERS[0].0, PAPERS[0].1)).await;
    mount_html(&server, "/90/doi/MOB01.html", detail_html(PAPERS[2].0, PAPERS[2].1)).await;
    Mock::given(method("GET"))
        .and(path("/90/doi/MOA02.html"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let options = RunOptions {
        skip_pdfs: true,
        ..Default::default()
    };
    let summary = harvest(create_test_config(&server, &root), options)
        .await
        .unwrap();

    assert_eq!(summary.total_papers, 2);
    assert_eq!(summary.stats.failure_totals()[&FailureKind::DetailFetch], 1);

    let index = load_index(&summary.index_path).unwrap();
    assert!(index.papers.iter().all(|p| p.paper_id != "MOA02"));
    let csv = std::fs::read_to_string(root.join("Run_All_Papers.csv")).unwrap();
    assert!(!csv.contains("MOA02"));
    let session_csv =
        std::fs::read_to_string(root.join("Sessions/MOA - Opening Session/papers_data.csv"))
            .unwrap();
    assert_eq!(session_csv.lines().count(), 2);
}

#[tokio::test]
async fn test_listing_without_table_skips_session() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    let root = output.path().join("Run");

    mount_html(&server, "/90/", INDEX_HTML.to_string()).await;
    mount_html(&server, "/90/session/1-moa/index.html", MOA_LISTING.to_string()).await;
    mount_html(
        &server,
        "/90/session/2-mob/index.html",
        "<html><body><p>Programme to be announced</p></body></html>".to_string(),
    )
    .await;
    for (id, title) in &PAPERS[..2] {
        mount_html(&server, &format!("/90/doi/{}.html", id), detail_html(id, title)).await;
    }

    let options = RunOptions {
        skip_pdfs: true,
        ..Default::default()
    };
    let summary = harvest(create_test_config(&server, &root), options)
        .await
        .unwrap();

    assert_eq!(summary.stats.total_sessions(), 2);
    assert_eq!(summary.stats.failure_totals()[&FailureKind::SessionParse], 1);
    assert!(root.join("Debug/MOB_listing_parse_failure.html").exists());

    let index = load_index(&summary.index_path).unwrap();
    let codes: Vec<&str> = index.sessions.iter().map(|s| s.code.as_str()).collect();
    assert_eq!(codes, vec!["MOA"]);
    assert_eq!(index.total_papers, 2);
}

#[tokio::test]
async fn test_detail_page_without_metadata_is_counted() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    let root = output.path().join("Run");

    mount_html(&server, "/90/", INDEX_HTML.to_string()).await;
    mount_html(&server, "/90/session/1-moa/index.html", MOA_LISTING.to_string()).await;
    mount_html(&server, "/90/doi/MOA01.html", detail_html(PAPERS[0].0, PAPERS[0].1)).await;
    mount_html(
        &server,
        "/90/doi/MOA02.html",
        "<html><body></body></html>".to_string(),
    )
    .await;

    let options = RunOptions {
        limit_sessions: Some(1),
        skip_pdfs: true,
        config_hash: None,
    };
    let summary = harvest(create_test_config(&server, &root), options)
        .await
        .unwrap();

    // The paper is kept with its listing data
    assert_eq!(summary.total_papers, 2);
    assert_eq!(summary.stats.failure_totals()[&FailureKind::DetailParse], 1);
    assert_eq!(summary.stats.total_failures(), 1);
    assert!(root.join("Debug/MOA02_detail_parse_failure.html").exists());

    let report = std::fs::read_to_string(&summary.report_path).unwrap();
    assert!(report.contains("failures.detail_parse=1\n"));

    let index = load_index(&summary.index_path).unwrap();
    let moa02 = index.papers.iter().find(|p| p.paper_id == "MOA02").unwrap();
    assert_eq!(moa02.title, "Status of the SLS 2.0 Diagnostics");
    assert!(moa02.authors.is_empty());
}
