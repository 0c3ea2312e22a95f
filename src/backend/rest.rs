//! Blocking HTTP client for the hosted backend: row-oriented REST endpoints
//! for drafts and share records, an RPC for token lookups, and the
//! token-based auth endpoints. All requests carry the project API key; the
//! data endpoints additionally require a bearer access token.

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{
    BackendError, Draft, DraftPage, DraftPatch, DraftStore, ShareRecord, SharedDraft, LIST_ROW_CAP,
};
use crate::auth::{AuthApi, AuthSession, UserIdentity};

pub struct RestStore {
    http: Client,
    base_url: String,
    api_key: String,
    access_token: Option<String>,
}

impl RestStore {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, BackendError> {
        let http = Client::builder().build().map_err(transport)?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            access_token: None,
        })
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    fn rest_url(&self, path: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, path)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    /// Project key plus the signed-in user's bearer token; data endpoints
    /// reject anonymous calls.
    fn authed(&self, request: RequestBuilder) -> Result<RequestBuilder, BackendError> {
        let token = self.access_token.as_deref().ok_or(BackendError::Unauthorized)?;
        Ok(request.header("apikey", &self.api_key).bearer_auth(token))
    }

    /// Project key alone, with the bearer token attached when available.
    /// The token-lookup RPC works either way.
    fn keyed(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header("apikey", &self.api_key);
        match self.access_token.as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

fn transport(err: reqwest::Error) -> BackendError {
    BackendError::Transport(err.to_string())
}

fn expect_success(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(remote_failure(status, &body))
}

fn remote_failure(status: StatusCode, body: &str) -> BackendError {
    if status == StatusCode::UNAUTHORIZED {
        return BackendError::Unauthorized;
    }
    BackendError::Remote(extract_message(body).unwrap_or_else(|| format!("{status}: {body}")))
}

/// Pull the human-readable message out of a backend error body, which
/// arrives as JSON with one of a few well-known keys.
fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    for key in ["message", "msg", "error_description", "error"] {
        if let Some(message) = value.get(key).and_then(|v| v.as_str()) {
            return Some(message.to_string());
        }
    }
    None
}

/// Parse the total from a `Content-Range` header such as `0-41/42`.
fn parse_total(content_range: &str) -> Option<usize> {
    content_range.rsplit_once('/')?.1.parse().ok()
}

#[derive(Serialize)]
struct DraftInsert<'a> {
    title: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ShareUpsert {
    draft_id: Uuid,
    #[serde(with = "time::serde::rfc3339::option")]
    expires_at: Option<OffsetDateTime>,
}

#[derive(Serialize)]
struct ShareExpiryPatch {
    #[serde(with = "time::serde::rfc3339::option")]
    expires_at: Option<OffsetDateTime>,
}

impl DraftStore for RestStore {
    fn list_drafts(&self) -> Result<DraftPage, BackendError> {
        let cap = LIST_ROW_CAP.to_string();
        let request = self
            .authed(self.http.get(self.rest_url("drafts")))?
            .query(&[
                ("select", "id,title,content,updated_at"),
                ("order", "updated_at.desc"),
                ("limit", cap.as_str()),
            ])
            .header("Prefer", "count=exact");
        let response = expect_success(request.send().map_err(transport)?)?;
        let total = response
            .headers()
            .get("content-range")
            .and_then(|value| value.to_str().ok())
            .and_then(parse_total);
        let drafts: Vec<Draft> = response.json().map_err(transport)?;
        let total = total.unwrap_or(drafts.len());
        Ok(DraftPage { drafts, total })
    }

    fn insert_draft(&self, title: &str, content: &str) -> Result<Draft, BackendError> {
        let request = self
            .authed(self.http.post(self.rest_url("drafts")))?
            .header("Prefer", "return=representation")
            .json(&[DraftInsert { title, content }]);
        let response = expect_success(request.send().map_err(transport)?)?;
        let mut rows: Vec<Draft> = response.json().map_err(transport)?;
        rows.pop()
            .ok_or_else(|| BackendError::Remote("insert returned no rows".into()))
    }

    fn update_draft(&self, id: Uuid, patch: &DraftPatch) -> Result<(), BackendError> {
        if patch.is_empty() {
            return Ok(());
        }
        let mut body = serde_json::Map::new();
        if let Some(title) = &patch.title {
            body.insert("title".into(), json!(title));
        }
        if let Some(content) = &patch.content {
            body.insert("content".into(), json!(content));
        }
        let request = self
            .authed(self.http.patch(self.rest_url("drafts")))?
            .query(&[("id", format!("eq.{id}"))])
            .json(&body);
        expect_success(request.send().map_err(transport)?)?;
        Ok(())
    }

    fn delete_draft(&self, id: Uuid) -> Result<(), BackendError> {
        let request = self
            .authed(self.http.delete(self.rest_url("drafts")))?
            .query(&[("id", format!("eq.{id}"))]);
        expect_success(request.send().map_err(transport)?)?;
        Ok(())
    }

    fn fetch_share(&self, draft_id: Uuid) -> Result<Option<ShareRecord>, BackendError> {
        let request = self
            .authed(self.http.get(self.rest_url("draft_shares")))?
            .query(&[
                ("select", "draft_id,token,expires_at".to_string()),
                ("draft_id", format!("eq.{draft_id}")),
            ]);
        let response = expect_success(request.send().map_err(transport)?)?;
        let mut rows: Vec<ShareRecord> = response.json().map_err(transport)?;
        Ok(rows.pop())
    }

    fn upsert_share(
        &self,
        draft_id: Uuid,
        expires_at: Option<OffsetDateTime>,
    ) -> Result<ShareRecord, BackendError> {
        let request = self
            .authed(self.http.post(self.rest_url("draft_shares")))?
            .query(&[("on_conflict", "draft_id")])
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(&[ShareUpsert {
                draft_id,
                expires_at,
            }]);
        let response = expect_success(request.send().map_err(transport)?)?;
        let mut rows: Vec<ShareRecord> = response.json().map_err(transport)?;
        rows.pop()
            .ok_or_else(|| BackendError::Remote("share upsert returned no rows".into()))
    }

    fn update_share_expiry(
        &self,
        draft_id: Uuid,
        expires_at: Option<OffsetDateTime>,
    ) -> Result<(), BackendError> {
        let request = self
            .authed(self.http.patch(self.rest_url("draft_shares")))?
            .query(&[("draft_id", format!("eq.{draft_id}"))])
            .json(&ShareExpiryPatch { expires_at });
        expect_success(request.send().map_err(transport)?)?;
        Ok(())
    }

    fn revoke_share(&self, draft_id: Uuid) -> Result<(), BackendError> {
        let request = self
            .authed(self.http.delete(self.rest_url("draft_shares")))?
            .query(&[("draft_id", format!("eq.{draft_id}"))]);
        expect_success(request.send().map_err(transport)?)?;
        Ok(())
    }

    fn fetch_shared(&self, token: &str) -> Result<Option<SharedDraft>, BackendError> {
        let request = self
            .keyed(self.http.post(self.rest_url("rpc/get_shared_draft")))
            .json(&json!({ "in_token": token }));
        let response = expect_success(request.send().map_err(transport)?)?;
        let mut rows: Vec<SharedDraft> = response.json().map_err(transport)?;
        Ok(rows.pop())
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    user: UserIdentity,
}

impl AuthApi for RestStore {
    fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, BackendError> {
        let request = self
            .http
            .post(self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.api_key)
            .json(&json!({ "email": email, "password": password }));
        let response = expect_success(request.send().map_err(transport)?)?;
        let token: TokenResponse = response.json().map_err(transport)?;
        Ok(AuthSession {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            user: token.user,
        })
    }

    fn sign_up(&self, email: &str, password: &str) -> Result<(), BackendError> {
        let request = self
            .http
            .post(self.auth_url("signup"))
            .header("apikey", &self.api_key)
            .json(&json!({ "email": email, "password": password }));
        expect_success(request.send().map_err(transport)?)?;
        Ok(())
    }

    fn sign_out(&self) -> Result<(), BackendError> {
        let request = self.authed(self.http.post(self.auth_url("logout")))?;
        expect_success(request.send().map_err(transport)?)?;
        Ok(())
    }

    fn current_user(&self) -> Result<Option<UserIdentity>, BackendError> {
        let Some(token) = self.access_token.as_deref() else {
            return Ok(None);
        };
        let request = self
            .http
            .get(self.auth_url("user"))
            .header("apikey", &self.api_key)
            .bearer_auth(token);
        let response = request.send().map_err(transport)?;
        if response.status() == StatusCode::UNAUTHORIZED {
            return Ok(None);
        }
        let response = expect_success(response)?;
        let user: UserIdentity = response.json().map_err(transport)?;
        Ok(Some(user))
    }

    fn request_password_reset(&self, email: &str, redirect_to: &str) -> Result<(), BackendError> {
        let request = self
            .http
            .post(self.auth_url("recover"))
            .query(&[("redirect_to", redirect_to)])
            .header("apikey", &self.api_key)
            .json(&json!({ "email": email }));
        expect_success(request.send().map_err(transport)?)?;
        Ok(())
    }

    fn update_password(&self, access_token: &str, new_password: &str) -> Result<(), BackendError> {
        let request = self
            .http
            .put(self.auth_url("user"))
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .json(&json!({ "password": new_password }));
        expect_success(request.send().map_err(transport)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_range_totals() {
        assert_eq!(parse_total("0-41/42"), Some(42));
        assert_eq!(parse_total("*/0"), Some(0));
        assert_eq!(parse_total("0-41/*"), None);
        assert_eq!(parse_total("garbage"), None);
    }

    #[test]
    fn remote_messages_are_extracted_from_json_bodies() {
        let err = remote_failure(
            StatusCode::BAD_REQUEST,
            r#"{"message":"duplicate key value"}"#,
        );
        assert_eq!(err.to_string(), "duplicate key value");

        let err = remote_failure(StatusCode::BAD_REQUEST, "plain text body");
        assert!(err.to_string().contains("plain text body"));

        assert!(matches!(
            remote_failure(StatusCode::UNAUTHORIZED, "{}"),
            BackendError::Unauthorized
        ));
    }
}
