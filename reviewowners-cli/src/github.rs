//! GitHub REST API implementation of the pull request and team collaborators.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{
    header::{self, HeaderMap, HeaderValue},
    Client, Response, StatusCode,
};
use reviewowners_rs::{HostError, PullRequestHost, PullRequestRef, ReviewRequest, TeamDirectory};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::debug;

const PER_PAGE: usize = 100;
// GitHub stops listing pull request files after 3000 entries.
const MAX_PAGES: usize = 30;
const API_VERSION: &str = "2022-11-28";
const TIMEOUT: Duration = Duration::from_secs(30);

pub struct GitHubClient {
    http: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct PullRequest {
    user: User,
}

#[derive(Deserialize)]
struct User {
    login: String,
}

#[derive(Deserialize)]
struct PullRequestFile {
    filename: String,
}

impl GitHubClient {
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))
            .context("GitHub token contains characters that can't be sent in a header")?;
        auth.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));

        let http = Client::builder()
            .user_agent(concat!("reviewowners/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    fn pull_url(&self, pr: &PullRequestRef) -> String {
        format!(
            "{}/repos/{}/{}/pulls/{}",
            self.base_url, pr.owner, pr.repo, pr.number
        )
    }

    async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, usize)],
    ) -> Result<T, HostError> {
        debug!(url, ?query, "GET");
        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(transport)?;
        check(response).await?.json().await.map_err(transport)
    }

    // Fetch pages until one comes back short.
    async fn get_all<T: DeserializeOwned>(&self, url: &str) -> Result<Vec<T>, HostError> {
        let mut items = Vec::new();
        for page in 1..=MAX_PAGES {
            let batch: Vec<T> = self
                .get(url, &[("per_page", PER_PAGE), ("page", page)])
                .await?;
            let done = batch.len() < PER_PAGE;
            items.extend(batch);
            if done {
                break;
            }
        }
        Ok(items)
    }
}

#[async_trait]
impl PullRequestHost for GitHubClient {
    async fn changed_files(&self, pr: &PullRequestRef) -> Result<Vec<String>, HostError> {
        let url = format!("{}/files", self.pull_url(pr));
        let files: Vec<PullRequestFile> = self.get_all(&url).await?;
        Ok(files.into_iter().map(|f| f.filename).collect())
    }

    async fn author(&self, pr: &PullRequestRef) -> Result<String, HostError> {
        let pull: PullRequest = self.get(&self.pull_url(pr), &[]).await?;
        Ok(pull.user.login)
    }

    async fn request_reviewers(
        &self,
        pr: &PullRequestRef,
        request: &ReviewRequest,
    ) -> Result<(), HostError> {
        let url = format!("{}/requested_reviewers", self.pull_url(pr));
        debug!(url, "POST");
        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(transport)?;
        check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl TeamDirectory for GitHubClient {
    async fn team_members(&self, org: &str, slug: &str) -> Result<Vec<String>, HostError> {
        let url = format!("{}/orgs/{}/teams/{}/members", self.base_url, org, slug);
        let members: Vec<User> = self.get_all(&url).await?;
        Ok(members.into_iter().map(|m| m.login).collect())
    }
}

async fn check(response: Response) -> Result<Response, HostError> {
    match response.status() {
        status if status.is_success() => Ok(response),
        StatusCode::NOT_FOUND => Err(HostError::NotFound),
        StatusCode::FORBIDDEN => Err(HostError::Forbidden),
        status => Err(HostError::Status {
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        }),
    }
}

fn transport(err: reqwest::Error) -> HostError {
    HostError::Transport(Box::new(err))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::{
        matchers::{body_json, header, method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    use super::*;

    fn pr() -> PullRequestRef {
        PullRequestRef::new("acme", "widgets", 7)
    }

    fn client(server: &MockServer) -> GitHubClient {
        GitHubClient::new(&format!("{}/", server.uri()), "t0ken").unwrap()
    }

    #[tokio::test]
    async fn test_changed_files_follows_pages() {
        let server = MockServer::start().await;
        let first_page = (0..PER_PAGE)
            .map(|i| json!({ "filename": format!("src/file{}.rs", i), "status": "modified" }))
            .collect::<Vec<_>>();

        Mock::given(method("GET"))
            .and(path("/repos/acme/widgets/pulls/7/files"))
            .and(query_param("page", "1"))
            .and(query_param("per_page", "100"))
            .and(header("authorization", "Bearer t0ken"))
            .respond_with(ResponseTemplate::new(200).set_body_json(first_page))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/widgets/pulls/7/files"))
            .and(query_param("page", "2"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{ "filename": "README.md" }])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let files = client(&server).changed_files(&pr()).await.unwrap();

        assert_eq!(files.len(), PER_PAGE + 1);
        assert_eq!(files[0], "src/file0.rs");
        assert_eq!(files[PER_PAGE], "README.md");
    }

    #[tokio::test]
    async fn test_author() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/widgets/pulls/7"))
            .and(header("accept", "application/vnd.github+json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "number": 7, "user": { "login": "alice" } })),
            )
            .mount(&server)
            .await;

        assert_eq!(client(&server).author(&pr()).await.unwrap(), "alice");
    }

    #[tokio::test]
    async fn test_team_members() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orgs/org/teams/reviewers/members"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{ "login": "bob" }, { "login": "carol" }])),
            )
            .mount(&server)
            .await;

        assert_eq!(
            client(&server)
                .team_members("org", "reviewers")
                .await
                .unwrap(),
            vec!["bob", "carol"]
        );
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orgs/org/teams/missing/members"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/orgs/org/teams/secret/members"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/widgets/pulls/7"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let client = client(&server);
        assert!(matches!(
            client.team_members("org", "missing").await,
            Err(HostError::NotFound)
        ));
        assert!(matches!(
            client.team_members("org", "secret").await,
            Err(HostError::Forbidden)
        ));
        match client.author(&pr()).await {
            Err(HostError::Status { status, body }) => {
                assert_eq!(status, 502);
                assert_eq!(body, "bad gateway");
            }
            other => panic!("expected a status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_request_reviewers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repos/acme/widgets/pulls/7/requested_reviewers"))
            .and(body_json(json!({
                "reviewers": ["bob"],
                "team_reviewers": ["docs"]
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "number": 7 })))
            .expect(1)
            .mount(&server)
            .await;

        let request = ReviewRequest {
            reviewers: vec!["bob".into()],
            team_reviewers: vec!["docs".into()],
        };
        client(&server)
            .request_reviewers(&pr(), &request)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_host() {
        let client = GitHubClient::new("http://127.0.0.1:1", "t0ken").unwrap();
        assert!(matches!(
            client.author(&pr()).await,
            Err(HostError::Transport(_))
        ));
    }
}
