//! GraphQL client for the Vibbo API.
//!
//! This module provides the `VibboClient` struct for making cookie
//! authenticated GraphQL requests against vibbo.no, and the typed
//! activity-stream operation the polling coordinator runs every cycle.

use std::time::Duration;

use reqwest::{header, Client};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::debug;

use crate::models::StreamEntry;

use super::{error::truncate_body, UpdateError};

// ============================================================================
// Constants
// ============================================================================

/// Base URL for the Vibbo web app and its GraphQL endpoint
pub(crate) const VIBBO_BASE: &str = "https://vibbo.no";

/// HTTP request timeout in seconds.
/// Matches the whole-fetch ceiling the host applies to one poll cycle.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// `x-version` header value the Vibbo web client sends on feed queries
const API_VERSION: &str = "577";

/// User-Agent sent on GraphQL requests
const USER_AGENT: &str = concat!("vibbo-feed/", env!("CARGO_PKG_VERSION"));

/// Default number of feed items requested per poll
pub const DEFAULT_LIMIT: u32 = 10;

/// Activity filter variable for the stream query
const ACTIVITY_FILTER: &str = "ALL";

/// Activity stream query. Selects the `News` and `Post` fragments the
/// feed sensor knows how to render.
const ACTIVITY_STREAM_QUERY: &str = r#"query vibboActivityStream(
  $organizationId: OrganizationID!
  $limit: Int
  $filter: OrganizationActivityFilter
) {
  stream: activityInOrganization(
    organizationId: $organizationId
    limit: $limit
    filter: $filter
  ) {
    items {
      happenedAt
      item {
        __typename
        ... on News {
          slug
          title
          ingress
          pinned
          topics {
            title
          }
          commentsCount
          thumbsUpCount: reactionCount(type: THUMBS_UP)
        }
        ... on Post {
          slug
          title
          body
          category {
            label
          }
          updatedBy {
            firstName
          }
          commentsCount
          thumbsUpCount: reactionCount(type: THUMBS_UP)
        }
      }
    }
  }
}"#;

/// GraphQL client for vibbo.no.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct VibboClient {
    client: Client,
    cookie: String,
}

impl VibboClient {
    /// Create a new client authenticated with the given session cookie string
    /// (the `sesid=...; sesid.sig=...` pair produced by the login flow).
    pub fn new(cookie: impl Into<String>) -> Result<Self, UpdateError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            cookie: cookie.into(),
        })
    }

    /// Execute one GraphQL operation and deserialize its `data` payload.
    pub(crate) async fn graphql<T: DeserializeOwned>(
        &self,
        operation: &str,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, UpdateError> {
        let url = format!("{}/graphql?name={}", VIBBO_BASE, operation);
        let payload = serde_json::json!({
            "operationName": operation,
            "variables": variables,
            "query": query,
        });

        let response = self
            .client
            .post(&url)
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::COOKIE, &self.cookie)
            .header("apollo-require-preflight", "true")
            .header("x-version", API_VERSION)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            debug!(operation, status = %status, "GraphQL request rejected");
            return Err(UpdateError::Status(status));
        }

        let body = response.text().await?;
        parse_graphql_body(operation, &body)
    }

    /// Fetch the latest activity stream for an organization.
    pub async fn activity_stream(
        &self,
        organization_id: &str,
        limit: u32,
    ) -> Result<Vec<StreamEntry>, UpdateError> {
        let variables = serde_json::json!({
            "organizationId": organization_id,
            "limit": limit,
            "filter": ACTIVITY_FILTER,
        });

        let data: ActivityStreamData = self
            .graphql("vibboActivityStream", ACTIVITY_STREAM_QUERY, variables)
            .await?;

        Ok(data.stream.items)
    }
}

/// Validate a 200 GraphQL body: surface `errors[0].message` when present,
/// otherwise require a parseable `data` payload.
pub(crate) fn parse_graphql_body<T: DeserializeOwned>(
    operation: &str,
    body: &str,
) -> Result<T, UpdateError> {
    let envelope: GraphQlEnvelope = serde_json::from_str(body).map_err(|err| {
        debug!(operation, error = %err, body = %truncate_body(body), "Unparseable GraphQL body");
        UpdateError::MalformedPayload
    })?;

    if let Some(message) = envelope.first_error() {
        return Err(UpdateError::GraphQl(message));
    }

    let data = envelope.data.ok_or(UpdateError::MalformedPayload)?;
    serde_json::from_value(data).map_err(|err| {
        debug!(operation, error = %err, "GraphQL data payload has unexpected shape");
        UpdateError::MalformedPayload
    })
}

// Internal GraphQL response types for parsing

#[derive(Debug, Deserialize)]
struct GraphQlEnvelope {
    data: Option<serde_json::Value>,
    #[serde(default)]
    errors: Vec<GraphQlErrorEntry>,
}

impl GraphQlEnvelope {
    fn first_error(&self) -> Option<String> {
        self.errors.first().map(|e| {
            if e.message.is_empty() {
                "unknown GraphQL error".to_string()
            } else {
                e.message.clone()
            }
        })
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorEntry {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ActivityStreamData {
    stream: ActivityStream,
}

#[derive(Debug, Deserialize)]
struct ActivityStream {
    #[serde(default)]
    items: Vec<StreamEntry>,
}
