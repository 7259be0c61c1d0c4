//! Writing the rendered page and pushing it to a GitHub repository.

use crate::config::PublishConfig;
use crate::error::CollaboratorError;
use crate::processing::RunSummary;
use crate::render::MapDocument;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;
use time::macros::format_description;
use time::OffsetDateTime;
use tracing::info;

const USER_AGENT: &str = "wijkkaart-publisher";
const INITIAL_MESSAGE: &str = "Initial upload";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Created,
    Updated,
}

impl fmt::Display for PublishOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishOutcome::Created => f.write_str("created"),
            PublishOutcome::Updated => f.write_str("updated"),
        }
    }
}

/// Destination for a finished document.
pub trait Publisher {
    fn publish(&self, document: &MapDocument) -> Result<PublishOutcome, CollaboratorError>;
}

pub fn write_document(path: &Path, document: &MapDocument) -> Result<(), CollaboratorError> {
    let write_err = |source| CollaboratorError::WriteOutput {
        path: path.to_path_buf(),
        source,
    };
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(write_err)?;
    }
    fs::write(path, document.as_bytes()).map_err(write_err)?;
    info!("Saved map to {:?}", path);
    Ok(())
}

pub fn commit_message(summary: &RunSummary, at: OffsetDateTime) -> String {
    let stamp = at
        .format(format_description!("[year]-[month]-[day] [hour]:[minute]"))
        .unwrap_or_else(|_| at.to_string());
    format!("Auto-update: {} [{}]", summary, stamp)
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    sha: String,
}

#[derive(Debug, Serialize)]
struct PutContents<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}

/// Create-or-update of one file through the GitHub contents API.
pub struct GithubPublisher {
    agent: ureq::Agent,
    api_base: String,
    repo: String,
    path_in_repo: String,
    branch: Option<String>,
    token: String,
}

impl GithubPublisher {
    /// Reads the token once from the environment variable named in config.
    pub fn from_config(config: &PublishConfig) -> Result<Self, CollaboratorError> {
        let token = std::env::var(&config.token_env)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| CollaboratorError::MissingToken(config.token_env.clone()))?;
        Ok(Self::new(config, token))
    }

    pub fn new(config: &PublishConfig, token: String) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build();
        Self {
            agent,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            repo: config.repo.clone(),
            path_in_repo: config.path_in_repo.trim_start_matches('/').to_string(),
            branch: config.branch.clone(),
            token,
        }
    }

    fn contents_url(&self) -> String {
        format!("{}/repos/{}/contents/{}", self.api_base, self.repo, self.path_in_repo)
    }

    fn request(&self, method: &str) -> ureq::Request {
        self.agent
            .request(method, &self.contents_url())
            .set("User-Agent", USER_AGENT)
            .set("Accept", "application/vnd.github+json")
            .set("Authorization", &format!("Bearer {}", self.token))
    }

    /// Blob sha of the file currently in the repository, `None` if absent.
    fn current_sha(&self) -> Result<Option<String>, CollaboratorError> {
        let mut request = self.request("GET");
        if let Some(branch) = &self.branch {
            request = request.query("ref", branch);
        }
        match request.call() {
            Ok(response) => {
                let contents: ContentsResponse = response
                    .into_json()
                    .map_err(|err| CollaboratorError::Publish(err.to_string()))?;
                Ok(Some(contents.sha))
            }
            Err(ureq::Error::Status(404, _)) => Ok(None),
            Err(err) => Err(CollaboratorError::Publish(err.to_string())),
        }
    }

    fn put_body<'a>(
        &'a self,
        document: &MapDocument,
        message: &'a str,
        sha: Option<&'a str>,
    ) -> PutContents<'a> {
        PutContents {
            message,
            content: BASE64.encode(document.as_bytes()),
            sha,
            branch: self.branch.as_deref(),
        }
    }
}

impl Publisher for GithubPublisher {
    fn publish(&self, document: &MapDocument) -> Result<PublishOutcome, CollaboratorError> {
        info!("Uploading to {}/{}...", self.repo, self.path_in_repo);
        let sha = self.current_sha()?;
        let (message, outcome) = match sha {
            Some(_) => (
                commit_message(&document.summary, OffsetDateTime::now_utc()),
                PublishOutcome::Updated,
            ),
            None => (INITIAL_MESSAGE.to_string(), PublishOutcome::Created),
        };

        let body = self.put_body(document, &message, sha.as_deref());
        self.request("PUT")
            .send_json(&body)
            .map_err(|err| CollaboratorError::Publish(err.to_string()))?;

        info!("Repository file {}", outcome);
        Ok(outcome)
    }
}
