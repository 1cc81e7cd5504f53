//! HTTP JSON document API client for the remote store

use std::marker::PhantomData;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;

use super::RemoteStore;
use crate::config::RemoteConfig;
use crate::error::{Error, Result};
use crate::models::Entity;

/// Remote store driver over a JSON document API.
///
/// Documents live at `{endpoint}/{collection}/{id}`; writes are `PUT`
/// create-or-replace keyed by the caller-supplied id.
pub struct HttpRemoteStore<E> {
    endpoint: String,
    auth_token: Option<String>,
    client: reqwest::Client,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> HttpRemoteStore<E> {
    /// Build a client for this entity's collection from the given config
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        Ok(Self {
            endpoint: config.endpoint.clone(),
            auth_token: config.auth_token.clone(),
            client: reqwest::Client::builder().build()?,
            _entity: PhantomData,
        })
    }

    fn collection_url(&self) -> String {
        format!("{}/{}", self.endpoint, E::COLLECTION)
    }

    fn document_url(&self, id: &str) -> String {
        format!("{}/{}/{}", self.endpoint, E::COLLECTION, id)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn api_error(response: Response) -> Error {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Error::Remote(parse_api_error(status, &body))
    }
}

#[async_trait]
impl<E: Entity> RemoteStore<E> for HttpRemoteStore<E> {
    async fn upsert(&self, entity: &E) -> Result<E> {
        let response = self
            .authorize(self.client.put(self.document_url(&entity.id())))
            .header("Accept", "application/json")
            .json(entity)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }
        Ok(response.json::<E>().await?)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let response = self
            .authorize(self.client.delete(self.document_url(id)))
            .send()
            .await?;
        // An already-absent document counts as a confirmed delete
        if response.status() == StatusCode::NOT_FOUND || response.status().is_success() {
            return Ok(());
        }
        Err(Self::api_error(response).await)
    }

    async fn fetch(&self, id: &str) -> Result<Option<E>> {
        let response = self
            .authorize(self.client.get(self.document_url(id)))
            .header("Accept", "application/json")
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }
        Ok(Some(response.json::<E>().await?))
    }

    async fn list(&self) -> Result<Vec<E>> {
        let response = self
            .authorize(self.client.get(self.collection_url()))
            .header("Accept", "application/json")
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }
        Ok(response.json::<Vec<E>>().await?)
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Note;

    #[test]
    fn parse_api_error_prefers_structured_message() {
        let message = parse_api_error(
            StatusCode::UNAUTHORIZED,
            r#"{"message": "token expired "}"#,
        );
        assert_eq!(message, "token expired (401)");

        let message = parse_api_error(StatusCode::BAD_REQUEST, r#"{"error": "bad id"}"#);
        assert_eq!(message, "bad id (400)");
    }

    #[test]
    fn parse_api_error_falls_back_to_body_or_status() {
        assert_eq!(
            parse_api_error(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
            "boom (500)"
        );
        assert_eq!(
            parse_api_error(StatusCode::INTERNAL_SERVER_ERROR, "  "),
            "HTTP 500"
        );
    }

    #[test]
    fn urls_follow_collection_layout() {
        let config = RemoteConfig::new("https://api.example.com/v1/").unwrap();
        let store = HttpRemoteStore::<Note>::new(&config).unwrap();
        assert_eq!(store.collection_url(), "https://api.example.com/v1/notes");
        assert_eq!(
            store.document_url("abc"),
            "https://api.example.com/v1/notes/abc"
        );
    }
}
