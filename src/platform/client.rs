//! REST client for the Mastodon API
//!
//! Listings are paginated through the `Link` response header; the `max_id`
//! of the `rel="next"` link becomes the [`Cursor`] for the following page.

use async_trait::async_trait;
use reqwest::header::LINK;
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{Cursor, Page, Platform};
use crate::error::{BotError, Result};
use crate::model::{Account, AccountId, Instance, Status, StatusDraft};

/// Page sizes are the server maximums for each listing
const ACCOUNT_PAGE_LIMIT: &str = "80";
const STATUS_PAGE_LIMIT: &str = "40";

#[derive(Clone)]
pub struct MastodonClient {
    http: reqwest::Client,
    base: String,
    access_token: String,
}

impl MastodonClient {
    pub fn new(base: &str, access_token: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("ebooks/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base: base.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
        })
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    /// Instance metadata
    pub async fn instance(&self) -> Result<Instance> {
        let response = self.get("/api/v1/instance", &[]).await?;
        Ok(response.json().await?)
    }

    /// The account the access token belongs to
    pub async fn verify_credentials(&self) -> Result<Account> {
        let response = self
            .get("/api/v1/accounts/verify_credentials", &[])
            .await?;
        Ok(response.json().await?)
    }

    async fn get(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<Response> {
        debug!(endpoint, "GET");
        let response = self
            .http
            .get(format!("{}{}", self.base, endpoint))
            .bearer_auth(&self.access_token)
            .query(query)
            .send()
            .await?;
        check_status(endpoint, response).await
    }

    async fn fetch_page<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        limit: &str,
        cursor: Option<&Cursor>,
    ) -> Result<Page<T>> {
        let mut query = vec![("limit", limit)];
        if let Some(cursor) = cursor {
            query.push(("max_id", cursor.0.as_str()));
        }

        let response = self.get(endpoint, &query).await?;
        let next = response
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(next_cursor);
        let items = response.json().await?;

        Ok(Page { items, next })
    }
}

#[async_trait]
impl Platform for MastodonClient {
    async fn fetch_following(
        &self,
        id: &AccountId,
        cursor: Option<&Cursor>,
    ) -> Result<Page<Account>> {
        let endpoint = format!("/api/v1/accounts/{}/following", id);
        self.fetch_page(&endpoint, ACCOUNT_PAGE_LIMIT, cursor).await
    }

    async fn fetch_followers(
        &self,
        id: &AccountId,
        cursor: Option<&Cursor>,
    ) -> Result<Page<Account>> {
        let endpoint = format!("/api/v1/accounts/{}/followers", id);
        self.fetch_page(&endpoint, ACCOUNT_PAGE_LIMIT, cursor).await
    }

    async fn fetch_statuses(
        &self,
        id: &AccountId,
        cursor: Option<&Cursor>,
    ) -> Result<Page<Status>> {
        let endpoint = format!("/api/v1/accounts/{}/statuses", id);
        self.fetch_page(&endpoint, STATUS_PAGE_LIMIT, cursor).await
    }

    async fn follow(&self, id: &AccountId) -> Result<()> {
        let endpoint = format!("/api/v1/accounts/{}/follow", id);
        debug!(endpoint, "POST");
        let response = self
            .http
            .post(format!("{}{}", self.base, endpoint))
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        check_status(&endpoint, response).await?;
        Ok(())
    }

    async fn post(&self, draft: &StatusDraft) -> Result<Status> {
        let endpoint = "/api/v1/statuses";
        debug!(endpoint, reply = draft.in_reply_to_id.is_some(), "POST");
        let response = self
            .http
            .post(format!("{}{}", self.base, endpoint))
            .bearer_auth(&self.access_token)
            .json(draft)
            .send()
            .await?;
        let response = check_status(endpoint, response).await?;
        Ok(response.json().await?)
    }
}

async fn check_status(endpoint: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(BotError::Api {
        endpoint: endpoint.to_string(),
        status: status.as_u16(),
        body,
    })
}

/// Extract the `max_id` of the `rel="next"` entry of a `Link` header
pub fn next_cursor(link: &str) -> Option<Cursor> {
    link.split(',').find_map(|entry| {
        let mut parts = entry.split(';');
        let target = parts.next()?.trim();
        let is_next = parts.any(|p| {
            let p = p.trim();
            p == "rel=\"next\"" || p == "rel=next"
        });
        if !is_next {
            return None;
        }

        let url = Url::parse(target.strip_prefix('<')?.strip_suffix('>')?).ok()?;
        url.query_pairs()
            .find(|(k, _)| k == "max_id")
            .map(|(_, v)| v.into_owned())
            .filter(|v| !v.is_empty())
            .map(Cursor)
    })
}
