//! Slack deployment notifications.
//!
//! Posts a Block Kit message to `SLACK_CHANNEL` after every successful
//! project deployment.

use crate::hooks::{HookResult, Plugin, ProjectDeploymentObserver};
use crate::{PluginConfig, PluginContext, PluginDescriptor, PluginError, PluginVariable};
use deckhand_config::ValueParser;
use deckhand_core::{Error, Project};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use thiserror::Error as ThisError;
use tracing::{error, info};
use url::Url;

const DEFAULT_API_URL: &str = "https://slack.com/api/";

pub static DESCRIPTOR: PluginDescriptor = PluginDescriptor {
    name: "slack",
    verbose_name: "Slack deployment notifications",
    version: "0.1.0",
    required: &[
        PluginVariable::new("SLACK_TOKEN", ValueParser::Text),
        PluginVariable::new("SLACK_CHANNEL", ValueParser::Text),
    ],
    optional: &[PluginVariable::new("SLACK_API_URL", ValueParser::Text)],
};

#[derive(Debug, ThisError)]
enum SlackError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid API URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Slack API error: {0}")]
    Api(String),
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Pipeline details shown alongside the deployment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineDetails {
    pub pr_title: String,
    pub pr_url: String,
    pub job_actor: String,
    pub pr_assignees: String,
}

pub struct SlackPlugin {
    token: String,
    channel: String,
    api_url: Url,
    client: Client,
    details: PipelineDetails,
}

pub fn build(
    config: PluginConfig,
    context: &PluginContext<'_>,
) -> Result<Box<dyn Plugin>, PluginError> {
    let api_url = config.text("SLACK_API_URL").unwrap_or(DEFAULT_API_URL);
    let api_url = Url::parse(api_url)
        .map_err(|e| PluginError::Setup(format!("invalid SLACK_API_URL: {e}")))?;
    let client = Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .map_err(|e| PluginError::Setup(e.to_string()))?;

    let settings = context.settings;
    Ok(Box::new(SlackPlugin {
        token: config.text("SLACK_TOKEN").unwrap_or_default().to_string(),
        channel: config.text("SLACK_CHANNEL").unwrap_or_default().to_string(),
        api_url,
        client,
        details: PipelineDetails {
            pr_title: settings.pr_title.clone(),
            pr_url: settings.pr_url.clone(),
            job_actor: settings.job_actor.clone(),
            pr_assignees: settings.pr_assignees.clone(),
        },
    }))
}

/// Blocks announcing a new deployment of `project` on `track`.
pub fn deployment_message(track: &str, project: &Project, details: &PipelineDetails) -> Value {
    let mut fields = Vec::new();

    if !project.url.is_empty() {
        fields.push(json!({
            "type": "mrkdwn",
            "text": format!("*:link: URL:*\n <{}|Link>", project.url),
        }));
    }
    if !details.pr_url.is_empty() && !details.pr_title.is_empty() {
        fields.push(json!({
            "type": "mrkdwn",
            "text": format!(
                "*:pick: Pull/Merge Request:*\n <{}|{}>",
                details.pr_url, details.pr_title
            ),
        }));
    }
    if !details.job_actor.is_empty() {
        fields.push(json!({
            "type": "mrkdwn",
            "text": format!("*:bust_in_silhouette: Pipeline creator*\n{}", details.job_actor),
        }));
    }
    if !details.pr_assignees.is_empty() {
        fields.push(json!({
            "type": "mrkdwn",
            "text": format!("*:busts_in_silhouette: Reviewers:*\n{}", details.pr_assignees),
        }));
    }

    json!([
        {
            "type": "section",
            "text": {
                "type": "mrkdwn",
                "text": format!("*New {track} deployment for {}*", project.verbose_name()),
            },
        },
        {
            "type": "section",
            "fields": fields,
        },
    ])
}

impl SlackPlugin {
    fn post_message(&self, blocks: Value) -> Result<(), SlackError> {
        let response: ApiResponse = self
            .client
            .post(self.api_url.join("chat.postMessage")?)
            .bearer_auth(&self.token)
            .json(&json!({
                "channel": self.channel,
                "blocks": blocks,
                "username": "Deckhand Deployment",
                "icon_emoji": ":rocket:",
            }))
            .send()?
            .error_for_status()?
            .json()?;

        if response.ok {
            Ok(())
        } else {
            Err(SlackError::Api(response.error.unwrap_or_else(|| "unknown".into())))
        }
    }
}

impl ProjectDeploymentObserver for SlackPlugin {
    fn project_deployment_complete(
        &self,
        error: Option<&Error>,
        _namespace: &str,
        project: &Project,
        track: &str,
    ) -> HookResult {
        if error.is_some() {
            return Ok(None);
        }

        let blocks = deployment_message(track, project, &self.details);
        match self.post_message(blocks) {
            Ok(()) => {
                info!(
                    channel = %self.channel,
                    project = %project.name,
                    "Sent Slack deployment message"
                );
                Ok(Some(true))
            }
            Err(e) => {
                error!(channel = %self.channel, error = %e, "Could not send Slack message");
                Ok(Some(false))
            }
        }
    }
}

impl Plugin for SlackPlugin {
    fn descriptor(&self) -> &'static PluginDescriptor {
        &DESCRIPTOR
    }

    fn as_project_deployment_observer(&self) -> Option<&dyn ProjectDeploymentObserver> {
        Some(self)
    }
}
