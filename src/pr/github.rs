use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, LINK};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::types::{CommitRecord, FileChange, PullDetails, PullRequestRef, PullSummary};
use super::{PrError, PullRequestHost};
use crate::config::Secret;

const USER_AGENT: &str = concat!("pr-describer/", env!("CARGO_PKG_VERSION"));
const API_VERSION: &str = "2022-11-28";
const PER_PAGE: usize = 100;
const MAX_ERROR_BODY_CHARS: usize = 200;

/// GitHub REST API client covering the pull request endpoints a run needs.
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    token: Secret,
}

#[derive(Deserialize)]
struct HeadWire {
    #[serde(rename = "ref")]
    git_ref: String,
}

#[derive(Deserialize)]
struct PullWire {
    number: u64,
    state: String,
    #[serde(default)]
    title: String,
    body: Option<String>,
    head: HeadWire,
}

#[derive(Deserialize)]
struct CommitAuthorWire {
    name: Option<String>,
}

#[derive(Deserialize)]
struct CommitDetailWire {
    message: String,
    author: Option<CommitAuthorWire>,
}

#[derive(Deserialize)]
struct CommitWire {
    sha: String,
    commit: CommitDetailWire,
}

impl From<CommitWire> for CommitRecord {
    fn from(wire: CommitWire) -> Self {
        CommitRecord {
            sha: wire.sha,
            message: wire.commit.message,
            author: wire.commit.author.and_then(|a| a.name),
        }
    }
}

impl GitHubClient {
    /// Create a client for the REST API rooted at `api_url`
    /// (e.g. `https://api.github.com`).
    pub fn new(api_url: &str, token: Secret) -> Result<Self, PrError> {
        reqwest::Url::parse(api_url).map_err(|_| PrError::InvalidUrl(api_url.to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn repo_url(&self, owner: &str, repo: &str) -> String {
        format!("{}/repos/{}/{}", self.api_url, owner, repo)
    }

    fn pull_url(&self, pr: &PullRequestRef) -> String {
        format!("{}/pulls/{}", self.repo_url(&pr.owner, &pr.repo), pr.number)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.bearer_auth(self.token.expose())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, PrError> {
        let response = check_status(self.authed(self.http.get(url)).send().await?).await?;
        Ok(response.json::<T>().await?)
    }

    /// Follow `Link: rel="next"` until the listing ends or `wanted` entries
    /// are held. Entries keep the host's order across pages.
    async fn paginate<T: DeserializeOwned>(
        &self,
        first_url: String,
        wanted: usize,
    ) -> Result<Vec<T>, PrError> {
        let mut items = Vec::new();
        let mut next = Some(format!("{first_url}?per_page={PER_PAGE}"));
        let mut pages = 0usize;

        while let Some(url) = next.take() {
            let response = check_status(self.authed(self.http.get(&url)).send().await?).await?;
            next = response
                .headers()
                .get(LINK)
                .and_then(|value| value.to_str().ok())
                .and_then(parse_next_link);
            let page: Vec<T> = response.json().await?;
            pages += 1;
            items.extend(page);

            if items.len() >= wanted {
                break;
            }
        }

        debug!(pages, items = items.len(), "paginated listing");
        Ok(items)
    }
}

#[async_trait]
impl PullRequestHost for GitHubClient {
    #[instrument(skip(self))]
    async fn pulls_for_commit(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
    ) -> Result<Vec<PullSummary>, PrError> {
        let url = format!("{}/commits/{}/pulls", self.repo_url(owner, repo), sha);
        let pulls: Vec<PullWire> = self.get_json(&url).await?;
        debug!(count = pulls.len(), "pull requests associated with commit");

        Ok(pulls
            .into_iter()
            .map(|pull| PullSummary {
                number: pull.number,
                state: pull.state,
                head_ref: pull.head.git_ref,
            })
            .collect())
    }

    #[instrument(skip(self), fields(pr = %pr))]
    async fn pull(&self, pr: &PullRequestRef) -> Result<PullDetails, PrError> {
        let pull: PullWire = self.get_json(&self.pull_url(pr)).await?;
        debug!(title = %pull.title, has_body = pull.body.is_some(), "received PR metadata");

        Ok(PullDetails {
            title: pull.title,
            body: pull.body,
        })
    }

    #[instrument(skip(self), fields(pr = %pr))]
    async fn files(&self, pr: &PullRequestRef, wanted: usize) -> Result<Vec<FileChange>, PrError> {
        self.paginate(format!("{}/files", self.pull_url(pr)), wanted)
            .await
    }

    #[instrument(skip(self), fields(pr = %pr))]
    async fn commits(
        &self,
        pr: &PullRequestRef,
        wanted: usize,
    ) -> Result<Vec<CommitRecord>, PrError> {
        let commits: Vec<CommitWire> = self
            .paginate(format!("{}/commits", self.pull_url(pr)), wanted)
            .await?;
        Ok(commits.into_iter().map(CommitRecord::from).collect())
    }

    #[instrument(skip(self, body), fields(pr = %pr, body_len = body.len()))]
    async fn update_body(&self, pr: &PullRequestRef, body: &str) -> Result<(), PrError> {
        let payload = serde_json::json!({ "body": body });
        let request = self.authed(self.http.patch(self.pull_url(pr))).json(&payload);
        check_status(request.send().await?).await?;
        debug!("pull request description updated");
        Ok(())
    }
}

/// Turn a non-2xx response into [`PrError::ApiStatus`] with a short excerpt
/// of the response body.
async fn check_status(response: Response) -> Result<Response, PrError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "(unreadable response body)".to_string());
    Err(PrError::ApiStatus {
        status: status.as_u16(),
        url,
        body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
    })
}

/// Extract the `rel="next"` target from a `Link` header.
fn parse_next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|entry| {
        let mut parts = entry.split(';');
        let target = parts.next()?.trim();
        let is_next = parts.any(|param| param.trim() == r#"rel="next""#);
        if !is_next {
            return None;
        }
        target
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .map(str::to_string)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> GitHubClient {
        GitHubClient::new(&server.uri(), Secret::from("ghs_test".to_string())).unwrap()
    }

    fn pr_ref() -> PullRequestRef {
        PullRequestRef {
            owner: "octo".to_string(),
            repo: "hello".to_string(),
            number: 7,
        }
    }

    fn file_json(name: &str) -> serde_json::Value {
        json!({
            "sha": "0000",
            "filename": name,
            "status": "modified",
            "additions": 1,
            "deletions": 0,
            "changes": 1,
            "blob_url": "https://example.invalid",
            "patch": "@@ -1 +1,2 @@\n+line"
        })
    }

    #[test]
    fn test_parse_next_link() {
        let header = r#"<https://api.github.com/repositories/1/pulls/7/files?page=2>; rel="next", <https://api.github.com/repositories/1/pulls/7/files?page=4>; rel="last""#;
        assert_eq!(
            parse_next_link(header).as_deref(),
            Some("https://api.github.com/repositories/1/pulls/7/files?page=2")
        );
    }

    #[test]
    fn test_parse_next_link_absent_on_last_page() {
        let header = r#"<https://api.github.com/x?page=1>; rel="prev", <https://api.github.com/x?page=1>; rel="first""#;
        assert_eq!(parse_next_link(header), None);
    }

    #[test]
    fn test_new_rejects_invalid_url() {
        let result = GitHubClient::new("not a url", Secret::from("t".to_string()));
        assert!(matches!(result, Err(PrError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_pulls_for_commit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/hello/commits/abc123/pulls"))
            .and(header("authorization", "Bearer ghs_test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "number": 3, "state": "closed", "title": "Old", "body": null, "head": { "ref": "feature" } },
                { "number": 4, "state": "open", "title": "New", "body": "x", "head": { "ref": "feature" } }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let pulls = client(&server)
            .pulls_for_commit("octo", "hello", "abc123")
            .await
            .unwrap();
        assert_eq!(pulls.len(), 2);
        assert_eq!(pulls[1].number, 4);
        assert_eq!(pulls[1].state, "open");
        assert_eq!(pulls[1].head_ref, "feature");
    }

    #[tokio::test]
    async fn test_pull_with_null_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/hello/pulls/7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "number": 7, "state": "open", "title": "Fix bug", "body": null,
                "head": { "ref": "fix" }
            })))
            .mount(&server)
            .await;

        let details = client(&server).pull(&pr_ref()).await.unwrap();
        assert_eq!(details.title, "Fix bug");
        assert_eq!(details.body, None);
    }

    #[tokio::test]
    async fn test_files_follows_next_link_until_wanted() {
        let server = MockServer::start().await;
        let page_url = |page: u32| format!("{}/repositories/99/pulls/7/files?page={page}", server.uri());

        Mock::given(method("GET"))
            .and(path("/repos/octo/hello/pulls/7/files"))
            .and(query_param("per_page", "100"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([file_json("a.rs"), file_json("b.rs"), file_json("c.rs")]))
                    .insert_header("Link", format!("<{}>; rel=\"next\"", page_url(2)).as_str()),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repositories/99/pulls/7/files"))
            .and(query_param("page", "2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([file_json("d.rs"), file_json("e.rs"), file_json("f.rs")]))
                    .insert_header("Link", format!("<{}>; rel=\"next\"", page_url(3)).as_str()),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repositories/99/pulls/7/files"))
            .and(query_param("page", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([file_json("g.rs")])))
            .expect(0)
            .mount(&server)
            .await;

        let files = client(&server).files(&pr_ref(), 5).await.unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(names, vec!["a.rs", "b.rs", "c.rs", "d.rs", "e.rs", "f.rs"]);
        assert_eq!(files[0].patch.as_deref(), Some("@@ -1 +1,2 @@\n+line"));
    }

    #[tokio::test]
    async fn test_commits_maps_author_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/hello/pulls/7/commits"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "sha": "c1", "commit": { "message": "first", "author": { "name": "Alice", "email": "a@x" } } },
                { "sha": "c2", "commit": { "message": "second", "author": null } }
            ])))
            .mount(&server)
            .await;

        let commits = client(&server).commits(&pr_ref(), 5).await.unwrap();
        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].author.as_deref(), Some("Alice"));
        assert_eq!(commits[1].message, "second");
        assert_eq!(commits[1].author, None);
    }

    #[tokio::test]
    async fn test_update_body_patches_pull() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/repos/octo/hello/pulls/7"))
            .and(body_json(json!({ "body": "Adds a fix." })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "number": 7 })))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .update_body(&pr_ref(), "Adds a fix.")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/hello/pulls/7"))
            .respond_with(ResponseTemplate::new(404).set_body_string("{\"message\":\"Not Found\"}"))
            .mount(&server)
            .await;

        let err = client(&server).pull(&pr_ref()).await.unwrap_err();
        match err {
            PrError::ApiStatus { status, body, .. } => {
                assert_eq!(status, 404);
                assert!(body.contains("Not Found"));
            }
            other => panic!("expected ApiStatus, got {other:?}"),
        }
    }
}
