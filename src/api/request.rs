//! Request construction
//!
//! Builds a `reqwest::Request` for an endpoint: session header, user id in
//! the place the endpoint expects it, JSON body.

use std::collections::HashMap;

use reqwest::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Url;
use serde::Serialize;
use serde_json::Value;

use crate::config::ApiConfig;

use super::endpoints::{Endpoint, UserIdPlacement};
use super::errors::{ApiError, ApiResult};
use super::session::SessionContext;

/// Header carrying the user id for header-placed endpoints
pub const USER_ID_HEADER: &str = "User-Id";

/// JSON key carrying the user id for body-placed endpoints
pub const USER_ID_FIELD: &str = "user_id";

#[derive(Debug, Clone)]
pub struct RequestBuilder {
    http: reqwest::Client,
    base_url: String,
    session_header: HeaderName,
    placements: HashMap<Endpoint, UserIdPlacement>,
}

impl RequestBuilder {
    pub fn new(http: reqwest::Client, config: &ApiConfig) -> ApiResult<Self> {
        let session_header = HeaderName::from_bytes(config.session_header.as_bytes())
            .map_err(|e| ApiError::InvalidHeader(format!("{:?}: {}", config.session_header, e)))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session_header,
            placements: config.user_id_placement.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Effective user-id placement for `endpoint`
    pub fn placement(&self, endpoint: Endpoint) -> Option<UserIdPlacement> {
        endpoint
            .default_placement()
            .map(|default| self.placements.get(&endpoint).copied().unwrap_or(default))
    }

    pub fn url_for(&self, endpoint: Endpoint, user_id: Option<u64>) -> ApiResult<Url> {
        let mut raw = format!("{}{}", self.base_url, endpoint.path());
        if let (Some(id), Some(UserIdPlacement::Path)) = (user_id, self.placement(endpoint)) {
            raw.push('/');
            raw.push_str(&id.to_string());
        }
        Url::parse(&raw).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", raw, e)))
    }

    /// Build the request for `endpoint`
    ///
    /// Fails with `MissingSession` when the endpoint needs a session and none
    /// is given, and with `Serialization` when `body` cannot be encoded.
    pub fn build<B>(
        &self,
        endpoint: Endpoint,
        user_id: Option<u64>,
        body: Option<&B>,
        session: Option<&SessionContext>,
    ) -> ApiResult<reqwest::Request>
    where
        B: Serialize + ?Sized,
    {
        if endpoint.requires_session() && session.is_none() {
            return Err(ApiError::MissingSession);
        }

        let placement = user_id.and(self.placement(endpoint));
        let url = self.url_for(endpoint, user_id)?;

        let mut payload = body.map(serde_json::to_value).transpose()?;
        if let (Some(id), Some(UserIdPlacement::Body)) = (user_id, placement) {
            match payload.get_or_insert_with(|| Value::Object(Default::default())) {
                Value::Object(map) => {
                    map.insert(USER_ID_FIELD.to_string(), Value::from(id));
                }
                _ => {
                    return Err(ApiError::Serialization(serde::ser::Error::custom(
                        "user id needs a JSON object body",
                    )));
                }
            }
        }

        let mut request = self.http.request(endpoint.method(), url);

        if let Some(session) = session {
            let token = HeaderValue::from_str(session.token()).map_err(|_| {
                ApiError::InvalidHeader("session token is not a valid header value".to_string())
            })?;
            request = request.header(self.session_header.clone(), token);
        }
        if let (Some(id), Some(UserIdPlacement::Header)) = (user_id, placement) {
            request = request.header(USER_ID_HEADER, id.to_string());
        }
        if let Some(payload) = payload {
            request = request
                .header(CONTENT_TYPE, "application/json")
                .body(serde_json::to_vec(&payload)?);
        }

        request
            .build()
            .map_err(|e| ApiError::InvalidUrl(e.to_string()))
    }
}
