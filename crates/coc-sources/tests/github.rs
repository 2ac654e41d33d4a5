//! Integration tests for `GithubClient` using wiremock HTTP mocks.

use chrono::{NaiveDate, TimeZone, Utc};
use coc_sources::{GithubClient, HttpSettings, SourceError};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> GithubClient {
    GithubClient::with_base_url(base_url, "ghp_test", "octocat", &HttpSettings::for_tests())
        .expect("client construction should not fail")
}

fn repo(owner: &str, name: &str) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "full_name": format!("{owner}/{name}"),
        "owner": { "login": owner },
        "fork": false
    })
}

fn commit(sha: &str, date: &str) -> serde_json::Value {
    serde_json::json!({
        "sha": sha,
        "commit": {
            "author": { "date": date },
            "committer": { "date": date }
        }
    })
}

async fn mount_branches(server: &MockServer, full_name: &str, branches: &[&str]) {
    let body: Vec<serde_json::Value> = branches
        .iter()
        .map(|b| serde_json::json!({ "name": b }))
        .collect();
    Mock::given(method("GET"))
        .and(path(format!("/repos/{full_name}/branches")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_commits(
    server: &MockServer,
    full_name: &str,
    branch: &str,
    commits: Vec<serde_json::Value>,
) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/{full_name}/commits")))
        .and(query_param("sha", branch))
        .and(query_param("author", "octocat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(commits))
        .mount(server)
        .await;
}

fn jan_first() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 8, 0, 0).unwrap()
}

#[tokio::test]
async fn list_user_repos_sends_github_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/repos"))
        .and(header("authorization", "Bearer ghp_test"))
        .and(header("accept", "application/vnd.github+json"))
        .and(header("x-github-api-version", "2022-11-28"))
        .and(query_param("type", "all"))
        .and(query_param("per_page", "100"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(vec![repo("octocat", "hello")]),
        )
        .mount(&server)
        .await;

    let repos = test_client(&server.uri())
        .list_user_repos()
        .await
        .expect("should list repos");
    assert_eq!(repos.len(), 1);
    assert_eq!(repos[0].full_name, "octocat/hello");
    assert_eq!(repos[0].owner.login, "octocat");
}

#[tokio::test]
async fn list_user_repos_follows_link_header() {
    let server = MockServer::start().await;
    let next = format!(
        "<{}/user/repos?type=all&per_page=100&page=2>; rel=\"next\"",
        server.uri()
    );
    Mock::given(method("GET"))
        .and(path("/user/repos"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("link", next.as_str())
                .set_body_json(vec![repo("octocat", "one")]),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/user/repos"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![repo("octocat", "two")]))
        .mount(&server)
        .await;

    let repos = test_client(&server.uri()).list_user_repos().await.unwrap();
    let names: Vec<&str> = repos.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["one", "two"]);
}

#[tokio::test]
async fn list_user_repos_increments_page_without_link_header() {
    let server = MockServer::start().await;
    let full_page: Vec<serde_json::Value> =
        (0..100).map(|i| repo("octocat", &format!("r{i}"))).collect();
    Mock::given(method("GET"))
        .and(path("/user/repos"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(full_page))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/user/repos"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![repo("octocat", "last")]))
        .mount(&server)
        .await;

    let repos = test_client(&server.uri()).list_user_repos().await.unwrap();
    assert_eq!(repos.len(), 101);
    assert_eq!(repos[100].name, "last");
}

#[tokio::test]
async fn list_all_repos_dedupes_user_and_org() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/repos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![
            repo("octocat", "hello"),
            repo("acme", "shared"),
        ]))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/orgs/acme/repos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![
            repo("acme", "shared"),
            repo("acme", "tools"),
        ]))
        .mount(&server)
        .await;

    let repos = test_client(&server.uri())
        .list_all_repos(Some("acme"))
        .await
        .unwrap();
    let names: Vec<&str> = repos.iter().map(|r| r.full_name.as_str()).collect();
    assert_eq!(names, ["octocat/hello", "acme/shared", "acme/tools"]);
}

#[tokio::test]
async fn count_commits_dedupes_shas_across_branches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/repos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![repo("octocat", "hello")]))
        .mount(&server)
        .await;
    mount_branches(&server, "octocat/hello", &["main", "feature"]).await;
    mount_commits(
        &server,
        "octocat/hello",
        "main",
        vec![
            commit("a1", "2026-02-01T10:00:00Z"),
            commit("a2", "2026-02-02T10:00:00Z"),
        ],
    )
    .await;
    mount_commits(
        &server,
        "octocat/hello",
        "feature",
        vec![
            commit("a2", "2026-02-02T10:00:00Z"),
            commit("b1", "2026-02-03T10:00:00Z"),
        ],
    )
    .await;

    let tally = test_client(&server.uri())
        .count_commits_since(jan_first())
        .await
        .unwrap();
    assert_eq!(tally.total, 3);
    assert_eq!(tally.repos_scanned, 1);
    assert!(tally.failed_repos.is_empty());
}

#[tokio::test]
async fn count_commits_sends_since_in_utc() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/repos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![repo("octocat", "hello")]))
        .mount(&server)
        .await;
    mount_branches(&server, "octocat/hello", &["main"]).await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/hello/commits"))
        .and(query_param("since", "2026-01-01T08:00:00Z"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(vec![commit("a1", "2026-02-01T10:00:00Z")]),
        )
        .expect(1)
        .mount(&server)
        .await;

    let tally = test_client(&server.uri())
        .count_commits_since(jan_first())
        .await
        .unwrap();
    assert_eq!(tally.total, 1);
}

#[tokio::test]
async fn empty_repository_counts_as_zero() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/repos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![
            repo("octocat", "empty"),
            repo("octocat", "busy"),
        ]))
        .mount(&server)
        .await;
    mount_branches(&server, "octocat/empty", &["main"]).await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/empty/commits"))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(serde_json::json!({ "message": "Git Repository is empty." })),
        )
        .mount(&server)
        .await;
    mount_branches(&server, "octocat/busy", &["main"]).await;
    mount_commits(
        &server,
        "octocat/busy",
        "main",
        vec![commit("c1", "2026-03-01T10:00:00Z")],
    )
    .await;

    let tally = test_client(&server.uri())
        .count_commits_since(jan_first())
        .await
        .unwrap();
    assert_eq!(tally.total, 1);
    assert_eq!(tally.repos_scanned, 2);
    assert!(tally.failed_repos.is_empty());
}

#[tokio::test]
async fn failing_repository_is_skipped_and_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/repos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![
            repo("octocat", "broken"),
            repo("octocat", "fine"),
        ]))
        .mount(&server)
        .await;
    mount_branches(&server, "octocat/broken", &["main", "dev"]).await;
    mount_commits(
        &server,
        "octocat/broken",
        "main",
        vec![commit("x1", "2026-03-01T10:00:00Z")],
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/broken/commits"))
        .and(query_param("sha", "dev"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;
    mount_branches(&server, "octocat/fine", &["main"]).await;
    mount_commits(
        &server,
        "octocat/fine",
        "main",
        vec![commit("f1", "2026-03-01T10:00:00Z")],
    )
    .await;

    let tally = test_client(&server.uri())
        .count_commits_since(jan_first())
        .await
        .unwrap();
    // The broken repo's partial listing (x1) is discarded.
    assert_eq!(tally.total, 1);
    assert_eq!(tally.repos_scanned, 1);
    assert_eq!(tally.failed_repos, vec!["octocat/broken".to_owned()]);
}

#[tokio::test]
async fn repo_listing_failure_fails_the_count() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/repos"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Bad credentials"))
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .count_commits_since(jan_first())
        .await
        .unwrap_err();
    assert!(
        matches!(err, SourceError::UnexpectedStatus { status: 401, .. }),
        "got {err:?}"
    );
}

#[tokio::test]
async fn rate_limit_maps_to_typed_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/repos"))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("x-ratelimit-remaining", "0")
                .insert_header("retry-after", "17"),
        )
        .mount(&server)
        .await;

    let err = test_client(&server.uri()).list_user_repos().await.unwrap_err();
    assert!(matches!(
        err,
        SourceError::RateLimited {
            service: "github",
            retry_after_secs: 17
        }
    ));
}

#[tokio::test]
async fn link_to_another_host_is_refused() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/repos"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(
                    "link",
                    "<https://elsewhere.example/user/repos?page=2>; rel=\"next\"",
                )
                .set_body_json(vec![repo("octocat", "hello")]),
        )
        .mount(&server)
        .await;

    let err = test_client(&server.uri()).list_user_repos().await.unwrap_err();
    assert!(matches!(err, SourceError::InvalidUrl { .. }), "got {err:?}");
}

#[tokio::test]
async fn daily_counts_bucket_by_local_date() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/repos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![repo("octocat", "hello")]))
        .mount(&server)
        .await;
    mount_branches(&server, "octocat/hello", &["main"]).await;
    mount_commits(
        &server,
        "octocat/hello",
        "main",
        vec![
            // 2026-01-02 03:00 UTC is still Jan 1 in Los Angeles.
            commit("a1", "2026-01-02T03:00:00Z"),
            commit("a2", "2026-01-02T20:00:00Z"),
            commit("a3", "2026-01-03T18:00:00Z"),
        ],
    )
    .await;

    let until = Utc.with_ymd_and_hms(2026, 1, 4, 20, 0, 0).unwrap();
    let daily = test_client(&server.uri())
        .daily_commit_counts(jan_first(), until, chrono_tz::America::Los_Angeles)
        .await
        .unwrap();

    let day = |d: u32| NaiveDate::from_ymd_opt(2026, 1, d).unwrap();
    let counts: Vec<(NaiveDate, u64)> = daily.counts.into_iter().collect();
    assert_eq!(
        counts,
        vec![(day(1), 1), (day(2), 1), (day(3), 1), (day(4), 0)]
    );
}
