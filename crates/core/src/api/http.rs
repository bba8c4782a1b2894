//! HTTP implementation of the ticket API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use crate::config::ApiConfig;
use crate::filter::ListQuery;
use crate::ticket::{Priority, QueueKind, Ticket, TicketDetail};

use super::{ApiError, ListResponse, NewComment, StatusUpdate, TicketApi};

/// Ticket API client over HTTP/JSON.
pub struct HttpTicketApi {
    client: Client,
    config: ApiConfig,
}

impl HttpTicketApi {
    /// Create a client with the configured timeout.
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(u64::from(config.timeout_secs)))
            .cookie_store(true)
            .build()
            .map_err(|e| ApiError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn base(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    /// Build the list URL including filter parameters.
    fn build_list_url(&self, kind: QueueKind, query: &ListQuery) -> String {
        let mut url = format!(
            "{}/tickets/{}?page={}&limit={}&sort={}",
            self.base(),
            kind.as_str(),
            query.page,
            query.page_size,
            query.filters.sort.as_str()
        );

        if !query.filters.search.is_empty() {
            url.push_str(&format!(
                "&search={}",
                urlencoding::encode(&query.filters.search)
            ));
        }
        if let Some(status) = query.filters.status {
            url.push_str(&format!("&status={}", status.as_str()));
        }
        if let Some(from) = query.filters.date_range.from {
            url.push_str(&format!("&from={}", from.format("%Y-%m-%d")));
        }
        if let Some(to) = query.filters.date_range.to {
            url.push_str(&format!("&to={}", to.format("%Y-%m-%d")));
        }

        url
    }

    fn ticket_url(&self, ticket_id: &str, suffix: &str) -> String {
        format!(
            "{}/tickets/{}{}",
            self.base(),
            urlencoding::encode(ticket_id),
            suffix
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.session_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, ticket_id: &str) -> Result<Response, ApiError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ApiError::Timeout
                } else {
                    ApiError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::NOT_FOUND => ApiError::NotFound(ticket_id.to_string()),
            StatusCode::CONFLICT => ApiError::Conflict(if message.is_empty() {
                format!("ticket {} is already assigned", ticket_id)
            } else {
                message
            }),
            _ => ApiError::Status {
                status: status.as_u16(),
                message,
            },
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl TicketApi for HttpTicketApi {
    async fn list(&self, kind: QueueKind, query: &ListQuery) -> Result<ListResponse, ApiError> {
        let url = self.build_list_url(kind, query);
        debug!(queue = %kind, page = query.page, "Listing tickets");
        let response = self.send(self.client.get(&url), kind.as_str()).await?;
        Self::decode(response).await
    }

    async fn get_detail(&self, ticket_id: &str) -> Result<TicketDetail, ApiError> {
        let url = self.ticket_url(ticket_id, "");
        let response = self.send(self.client.get(&url), ticket_id).await?;
        Self::decode(response).await
    }

    async fn update_status(&self, ticket_id: &str, update: &StatusUpdate) -> Result<(), ApiError> {
        let url = self.ticket_url(ticket_id, "/status");
        self.send(self.client.patch(&url).json(update), ticket_id)
            .await?;
        Ok(())
    }

    async fn update_priority(&self, ticket_id: &str, priority: Priority) -> Result<(), ApiError> {
        let url = self.ticket_url(ticket_id, "/priority");
        let body = json!({ "priority": priority });
        self.send(self.client.patch(&url).json(&body), ticket_id)
            .await?;
        Ok(())
    }

    async fn add_comment(&self, ticket_id: &str, comment: &NewComment) -> Result<(), ApiError> {
        let url = self.ticket_url(ticket_id, "/comments");
        self.send(self.client.post(&url).json(comment), ticket_id)
            .await?;
        Ok(())
    }

    async fn assign(&self, ticket_id: &str) -> Result<Ticket, ApiError> {
        let url = self.ticket_url(ticket_id, "/assign");
        let response = self
            .send(self.client.post(&url).json(&json!({})), ticket_id)
            .await?;
        Self::decode(response).await
    }

    async fn assign_to_me(&self, ticket_id: &str) -> Result<Ticket, ApiError> {
        let url = self.ticket_url(ticket_id, "/assign-to-me");
        let response = self.send(self.client.post(&url), ticket_id).await?;
        Self::decode(response).await
    }

    async fn mark_read(&self, ticket_id: &str) -> Result<(), ApiError> {
        let url = self.ticket_url(ticket_id, "/read");
        self.send(self.client.post(&url), ticket_id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::DateRange;
    use crate::ticket::TicketStatus;
    use chrono::NaiveDate;

    fn api() -> HttpTicketApi {
        HttpTicketApi::new(ApiConfig {
            base_url: "https://desk.example.com/api/".to_string(),
            session_token: Some("secret".to_string()),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn test_list_url_defaults() {
        let query = ListQuery::first_page(QueueKind::Unassigned, 25);
        assert_eq!(
            api().build_list_url(QueueKind::Unassigned, &query),
            "https://desk.example.com/api/tickets/unassigned?page=1&limit=25&sort=priority"
        );
    }

    #[test]
    fn test_list_url_with_filters() {
        let mut query = ListQuery::first_page(QueueKind::Closed, 50);
        query.page = 3;
        query.filters.search = "no dial tone".to_string();
        query.filters.status = Some(TicketStatus::Resolved);
        query.filters.date_range = DateRange::new(NaiveDate::from_ymd_opt(2024, 1, 5), None);

        let url = api().build_list_url(QueueKind::Closed, &query);
        assert!(url.starts_with("https://desk.example.com/api/tickets/closed?page=3&limit=50"));
        assert!(url.contains("&search=no%20dial%20tone"));
        assert!(url.contains("&status=resolved"));
        assert!(url.contains("&from=2024-01-05"));
        assert!(!url.contains("&to="));
    }

    #[test]
    fn test_ticket_url_encodes_id() {
        assert_eq!(
            api().ticket_url("a/b", "/assign-to-me"),
            "https://desk.example.com/api/tickets/a%2Fb/assign-to-me"
        );
    }
}
