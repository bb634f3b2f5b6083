//! Live GitHub data: users, their top repositories and a few issues each.

use std::time::Duration;

use colored::Colorize;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use sandbox_seed_store::{ObjectId, Record, Sleeper, VectorStore};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use url::Url;

use crate::batch::BatchReport;
use crate::catalog::{GITHUB_ISSUE, GITHUB_REPO, GITHUB_USER};
use crate::FixtureError;

pub const GITHUB_API_URL: &str = "https://api.github.com/";
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";
pub const DEFAULT_USERS: [&str; 5] = ["torvalds", "gaearon", "sindresorhus", "tj", "addyosmani"];

const BODY_LIMIT: usize = 1000;

// ---------------------------------------------------------------------------
// API response shapes (only the fields we keep)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GithubProfile {
    pub login: String,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub email: Option<String>,
    pub hireable: Option<bool>,
    pub created_at: Option<String>,
    #[serde(default)]
    pub public_repos: u64,
    #[serde(default)]
    pub public_gists: u64,
    #[serde(default)]
    pub followers: u64,
    #[serde(default)]
    pub following: u64,
    pub html_url: Option<String>,
    pub blog: Option<String>,
    pub twitter_username: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GithubLicense {
    pub key: Option<String>,
    pub name: Option<String>,
    pub spdx_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GithubRepository {
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub language: Option<String>,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub fork: bool,
    #[serde(default)]
    pub archived: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub pushed_at: Option<String>,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub watchers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    #[serde(default)]
    pub open_issues_count: u64,
    #[serde(default)]
    pub topics: Vec<String>,
    pub license: Option<GithubLicense>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GithubLabel {
    pub name: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GithubReactions {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default, rename = "+1")]
    pub plus_one: u64,
    #[serde(default, rename = "-1")]
    pub minus_one: u64,
    #[serde(default)]
    pub laugh: u64,
    #[serde(default)]
    pub hooray: u64,
    #[serde(default)]
    pub confused: u64,
    #[serde(default)]
    pub heart: u64,
    #[serde(default)]
    pub rocket: u64,
    #[serde(default)]
    pub eyes: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GithubIssueItem {
    pub number: u64,
    pub title: Option<String>,
    pub body: Option<String>,
    pub state: Option<String>,
    #[serde(default)]
    pub locked: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub closed_at: Option<String>,
    #[serde(default)]
    pub labels: Vec<GithubLabel>,
    pub reactions: Option<GithubReactions>,
    /// Present on pull requests, which the issues endpoint also returns.
    pub pull_request: Option<Value>,
}

impl GithubIssueItem {
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

// ---------------------------------------------------------------------------
// API client
// ---------------------------------------------------------------------------

pub trait GithubApi {
    fn user(&self, login: &str) -> Result<GithubProfile, FixtureError>;
    /// A user's repositories, most starred first.
    fn repos(&self, login: &str, per_page: usize) -> Result<Vec<GithubRepository>, FixtureError>;
    /// Issues (open and closed) of `owner/name`.
    fn issues(&self, full_name: &str, per_page: usize)
        -> Result<Vec<GithubIssueItem>, FixtureError>;
}

impl<T: GithubApi + ?Sized> GithubApi for &T {
    fn user(&self, login: &str) -> Result<GithubProfile, FixtureError> {
        (**self).user(login)
    }

    fn repos(&self, login: &str, per_page: usize) -> Result<Vec<GithubRepository>, FixtureError> {
        (**self).repos(login, per_page)
    }

    fn issues(
        &self,
        full_name: &str,
        per_page: usize,
    ) -> Result<Vec<GithubIssueItem>, FixtureError> {
        (**self).issues(full_name, per_page)
    }
}

pub struct HttpGithubApi {
    client: Client,
    base: Url,
}

impl HttpGithubApi {
    pub fn new(token: Option<&str>, timeout: Duration) -> Result<Self, FixtureError> {
        Self::with_base(GITHUB_API_URL, token, timeout)
    }

    /// Token from `GITHUB_TOKEN` when set; anonymous otherwise.
    pub fn from_env(timeout: Duration) -> Result<Self, FixtureError> {
        let token = std::env::var(GITHUB_TOKEN_ENV)
            .ok()
            .filter(|t| !t.trim().is_empty());
        Self::new(token.as_deref(), timeout)
    }

    pub fn with_base(base: &str, token: Option<&str>, timeout: Duration) -> Result<Self, FixtureError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("sandbox-seed/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| FixtureError::Malformed("GITHUB_TOKEN is not a valid header value".into()))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|source| FixtureError::Http {
                url: base.to_string(),
                source,
            })?;

        let mut base = Url::parse(base)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { client, base })
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T, FixtureError> {
        tracing::debug!(%url, "github request");
        let resp = self
            .client
            .get(url.clone())
            .send()
            .map_err(|source| FixtureError::Http {
                url: url.to_string(),
                source,
            })?;
        if !resp.status().is_success() {
            return Err(FixtureError::Status {
                url: url.to_string(),
                status: resp.status().as_u16(),
            });
        }
        resp.json().map_err(|source| FixtureError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

impl GithubApi for HttpGithubApi {
    fn user(&self, login: &str) -> Result<GithubProfile, FixtureError> {
        let url = self.base.join(&format!("users/{login}"))?;
        self.get_json(url)
    }

    fn repos(&self, login: &str, per_page: usize) -> Result<Vec<GithubRepository>, FixtureError> {
        let mut url = self.base.join(&format!("users/{login}/repos"))?;
        url.query_pairs_mut()
            .append_pair("sort", "stars")
            .append_pair("per_page", &per_page.to_string());
        self.get_json(url)
    }

    fn issues(
        &self,
        full_name: &str,
        per_page: usize,
    ) -> Result<Vec<GithubIssueItem>, FixtureError> {
        let mut url = self.base.join(&format!("repos/{full_name}/issues"))?;
        url.query_pairs_mut()
            .append_pair("state", "all")
            .append_pair("per_page", &per_page.to_string());
        self.get_json(url)
    }
}

// ---------------------------------------------------------------------------
// Mapping into the collection shapes
// ---------------------------------------------------------------------------

fn text(value: &Option<String>) -> Value {
    json!(value.as_deref().unwrap_or(""))
}

/// Dates the API reports as null are left out rather than sent empty.
fn put_date(props: &mut Map<String, Value>, name: &str, value: &Option<String>) {
    if let Some(date) = value.as_deref().filter(|d| !d.is_empty()) {
        props.insert(name.to_string(), json!(date));
    }
}

pub fn user_record(profile: &GithubProfile) -> Record {
    let mut record = Record::new(profile.name.clone().unwrap_or_else(|| profile.login.clone()))
        .property("login", json!(profile.login))
        .property("name", text(&profile.name))
        .property("bio", text(&profile.bio))
        .property("company", text(&profile.company))
        .property("location", text(&profile.location))
        .property("email", text(&profile.email))
        .property("hireable", json!(profile.hireable.unwrap_or(false)))
        .property(
            "stats",
            json!({
                "publicRepos": profile.public_repos,
                "publicGists": profile.public_gists,
                "followers": profile.followers,
                "following": profile.following,
            }),
        )
        .property(
            "urls",
            json!({
                "htmlUrl": text(&profile.html_url),
                "blog": text(&profile.blog),
                "twitterUsername": text(&profile.twitter_username),
            }),
        );
    put_date(&mut record.properties, "createdAt", &profile.created_at);
    record
}

pub fn repo_record(repo: &GithubRepository) -> Record {
    let license = repo.license.clone().unwrap_or_default();
    let mut record = Record::new(repo.name.clone())
        .property("name", json!(repo.name))
        .property("fullName", json!(repo.full_name))
        .property("description", text(&repo.description))
        .property("language", text(&repo.language))
        .property("private", json!(repo.private))
        .property("fork", json!(repo.fork))
        .property("archived", json!(repo.archived))
        .property("size", json!(repo.size))
        .property(
            "metrics",
            json!({
                "stargazersCount": repo.stargazers_count,
                "watchersCount": repo.watchers_count,
                "forksCount": repo.forks_count,
                "openIssuesCount": repo.open_issues_count,
            }),
        )
        .property("topics", json!(repo.topics.join(", ")))
        .property(
            "license",
            json!({
                "key": text(&license.key),
                "name": text(&license.name),
                "spdxId": text(&license.spdx_id),
            }),
        );
    put_date(&mut record.properties, "createdAt", &repo.created_at);
    put_date(&mut record.properties, "updatedAt", &repo.updated_at);
    put_date(&mut record.properties, "pushedAt", &repo.pushed_at);
    record
}

pub fn issue_record(issue: &GithubIssueItem) -> Record {
    let title = issue.title.clone().unwrap_or_default();
    let body: String = issue
        .body
        .as_deref()
        .unwrap_or("")
        .chars()
        .take(BODY_LIMIT)
        .collect();
    let names: Vec<&str> = issue
        .labels
        .iter()
        .map(|l| l.name.as_deref().unwrap_or(""))
        .collect();
    let colors: Vec<&str> = issue
        .labels
        .iter()
        .map(|l| l.color.as_deref().unwrap_or(""))
        .collect();
    let reactions = issue.reactions.clone().unwrap_or_default();

    let mut record = Record::new(format!("#{} {}", issue.number, title))
        .property("title", json!(title))
        .property("body", json!(body))
        .property("number", json!(issue.number))
        .property("state", text(&issue.state))
        .property("locked", json!(issue.locked))
        .property(
            "labels",
            json!({
                "names": names.join(", "),
                "colors": colors.join(", "),
                "count": names.len(),
            }),
        )
        .property(
            "reactions",
            json!({
                "totalCount": reactions.total_count,
                "plusOne": reactions.plus_one,
                "minusOne": reactions.minus_one,
                "laugh": reactions.laugh,
                "hooray": reactions.hooray,
                "confused": reactions.confused,
                "heart": reactions.heart,
                "rocket": reactions.rocket,
                "eyes": reactions.eyes,
            }),
        );
    put_date(&mut record.properties, "createdAt", &issue.created_at);
    put_date(&mut record.properties, "updatedAt", &issue.updated_at);
    put_date(&mut record.properties, "closedAt", &issue.closed_at);
    record
}

// ---------------------------------------------------------------------------
// Loader
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct GithubLimits {
    pub users: Vec<String>,
    pub repos_per_user: usize,
    pub issues_per_repo: usize,
    /// Pause after each repository's issues are fetched.
    pub repo_delay: Duration,
    /// Pause after each user.
    pub user_delay: Duration,
}

impl Default for GithubLimits {
    fn default() -> Self {
        Self {
            users: DEFAULT_USERS.iter().map(|u| u.to_string()).collect(),
            repos_per_user: 3,
            issues_per_repo: 2,
            repo_delay: Duration::from_millis(500),
            user_delay: Duration::from_secs(1),
        }
    }
}

impl GithubLimits {
    /// Keep the default limits but fetch `users` instead; an empty list keeps
    /// the default users.
    pub fn with_users(mut self, users: Vec<String>) -> Self {
        if !users.is_empty() {
            self.users = users;
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubReport {
    pub users: BatchReport,
    pub repos: BatchReport,
    pub issues: BatchReport,
}

impl GithubReport {
    fn new() -> Self {
        Self {
            users: BatchReport::new(GITHUB_USER),
            repos: BatchReport::new(GITHUB_REPO),
            issues: BatchReport::new(GITHUB_ISSUE),
        }
    }

    pub fn batches(&self) -> [&BatchReport; 3] {
        [&self.users, &self.repos, &self.issues]
    }
}

fn print_failure(indent: &str, report: &BatchReport) {
    if let Some(failure) = report.failures.last() {
        println!(
            "{indent}{} Failed to insert {}: {}",
            "✗".red(),
            failure.label,
            failure.reason
        );
    }
}

/// Fetch and insert GitHub users, repositories and issues.
///
/// A user that cannot be fetched is skipped. Repositories link to their
/// owner; issues link to their repository and to the same owner.
pub fn load_github<S, A, Z>(store: &S, api: &A, limits: &GithubLimits, sleeper: &Z) -> GithubReport
where
    S: VectorStore + ?Sized,
    A: GithubApi + ?Sized,
    Z: Sleeper + ?Sized,
{
    println!("\nFetching real GitHub data...");
    let mut report = GithubReport::new();

    for login in &limits.users {
        println!("Fetching user: {login}");
        let profile = match api.user(login) {
            Ok(profile) => profile,
            Err(err) => {
                println!("{} Failed to fetch user {login}: {err}", "✗".red());
                report.users.record_failure(login, err);
                continue;
            }
        };

        let Some(user_id) = report.users.insert(store, &user_record(&profile)) else {
            print_failure("", &report.users);
            continue;
        };
        println!(
            "{} Inserted user: {}",
            "✓".green(),
            profile.name.as_deref().unwrap_or(login)
        );

        match api.repos(login, limits.repos_per_user) {
            Ok(repos) => {
                for repo in repos.iter().take(limits.repos_per_user) {
                    load_repo(store, api, limits, sleeper, &mut report, repo, user_id);
                }
            }
            Err(err) => {
                tracing::warn!(user = %login, error = %err, "could not list repositories");
                println!("  {} Failed to fetch repos for {login}: {err}", "✗".red());
            }
        }

        sleeper.sleep(limits.user_delay);
    }

    println!("{} GitHub collections populated successfully!", "✓".green());
    println!("  - Created {} GitHub users", report.users.succeeded());
    println!("  - Created {} GitHub repositories", report.repos.succeeded());
    println!("  - Created {} GitHub issues", report.issues.succeeded());
    report
}

fn load_repo<S, A, Z>(
    store: &S,
    api: &A,
    limits: &GithubLimits,
    sleeper: &Z,
    report: &mut GithubReport,
    repo: &GithubRepository,
    owner: ObjectId,
) where
    S: VectorStore + ?Sized,
    A: GithubApi + ?Sized,
    Z: Sleeper + ?Sized,
{
    let record = repo_record(repo).reference("ownedBy", owner);
    let Some(repo_id) = report.repos.insert(store, &record) else {
        print_failure("  ", &report.repos);
        return;
    };
    println!("  {} Inserted repo: {}", "✓".green(), repo.name);

    match api.issues(&repo.full_name, limits.issues_per_repo) {
        Ok(issues) => {
            let real = issues
                .iter()
                .filter(|i| !i.is_pull_request())
                .take(limits.issues_per_repo);
            for issue in real {
                let record = issue_record(issue)
                    .reference("belongsToRepo", repo_id)
                    .reference("createdBy", owner);
                if report.issues.insert(store, &record).is_some() {
                    let title: String = issue
                        .title
                        .as_deref()
                        .unwrap_or("")
                        .chars()
                        .take(50)
                        .collect();
                    println!("    {} Inserted issue: {title}...", "✓".green());
                } else {
                    print_failure("    ", &report.issues);
                }
            }
        }
        Err(err) => {
            tracing::warn!(repo = %repo.full_name, error = %err, "could not list issues");
            println!("    {} Failed to fetch issues for {}: {err}", "✗".red(), repo.full_name);
        }
    }

    sleeper.sleep(limits.repo_delay);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;

    #[test]
    fn null_fields_become_empty_text_and_dates_are_dropped() {
        let profile: GithubProfile = serde_json::from_value(json!({
            "login": "octo",
            "name": null,
            "bio": null,
            "hireable": null,
            "created_at": "2011-01-25T18:44:36Z",
            "public_repos": 8,
            "followers": 100
        }))
        .unwrap();
        let record = user_record(&profile);
        assert_eq!(record.label, "octo");
        assert_eq!(record.properties["name"], json!(""));
        assert_eq!(record.properties["hireable"], json!(false));
        assert_eq!(record.properties["stats"]["publicRepos"], json!(8));
        catalog::github_user().validate(&record).unwrap();

        let repo: GithubRepository = serde_json::from_value(json!({
            "name": "hello",
            "full_name": "octo/hello",
            "license": null,
            "pushed_at": null,
            "topics": ["cli", "rust"]
        }))
        .unwrap();
        let record = repo_record(&repo);
        assert_eq!(record.properties["license"]["spdxId"], json!(""));
        assert_eq!(record.properties["topics"], json!("cli, rust"));
        assert!(!record.properties.contains_key("pushedAt"));
        catalog::github_repo().validate(&record).unwrap();
    }

    #[test]
    fn issue_body_is_truncated_and_reactions_mapped() {
        let issue: GithubIssueItem = serde_json::from_value(json!({
            "number": 7,
            "title": "Crash on start",
            "body": "é".repeat(1500),
            "state": "closed",
            "closed_at": null,
            "labels": [{"name": "bug", "color": "d73a4a"}, {"name": "p1", "color": "000000"}],
            "reactions": {"total_count": 3, "+1": 2, "-1": 1}
        }))
        .unwrap();
        assert!(!issue.is_pull_request());

        let record = issue_record(&issue);
        assert_eq!(record.properties["body"].as_str().unwrap().chars().count(), 1000);
        assert_eq!(record.properties["labels"]["names"], json!("bug, p1"));
        assert_eq!(record.properties["labels"]["count"], json!(2));
        assert_eq!(record.properties["reactions"]["plusOne"], json!(2));
        assert_eq!(record.properties["reactions"]["minusOne"], json!(1));
        assert!(!record.properties.contains_key("closedAt"));
        catalog::github_issue().validate(&record).unwrap();
    }

    #[test]
    fn pull_request_marker_is_detected() {
        let pr: GithubIssueItem = serde_json::from_value(json!({
            "number": 8,
            "pull_request": {"url": "https://api.github.com/repos/octo/hello/pulls/8"}
        }))
        .unwrap();
        assert!(pr.is_pull_request());
    }

    #[test]
    fn api_urls_carry_paging_parameters() {
        let api = HttpGithubApi::with_base("http://127.0.0.1:1/api", None, Duration::from_secs(1)).unwrap();
        let url = api.base.join("users/tj/repos").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:1/api/users/tj/repos");
        assert!(matches!(api.user("tj"), Err(FixtureError::Http { .. })));
    }

    #[test]
    fn explicit_users_replace_the_defaults() {
        let limits = GithubLimits::default().with_users(vec!["octo".into()]);
        assert_eq!(limits.users, vec!["octo"]);
        let limits = GithubLimits::default().with_users(Vec::new());
        assert_eq!(limits.users.len(), DEFAULT_USERS.len());
    }
}
