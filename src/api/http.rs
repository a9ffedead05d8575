//! HTTP implementation of [`NoteApi`]
//!
//! Request signing is handled outside this crate; this transport only attaches
//! the credential, browser-like headers and the platform JSON bodies, and decodes
//! the `{success, msg, data}` envelope.

use crate::api::parse::{parse_detail_response, parse_search_page, parse_user_page};
use crate::api::traits::{ApiError, NoteApi};
use crate::api::types::{ApiResponse, Cursor, Item, Page, TaskContext};
use crate::config::ApiSettings;
use crate::session::Credential;
use crate::task::SearchFilters;
use crate::url::{NoteRef, UserRef, WEB_ORIGIN};
use async_trait::async_trait;
use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::header::{COOKIE, ORIGIN, REFERER};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;

/// Notes per search page
pub const SEARCH_PAGE_SIZE: u32 = 20;

/// Notes per user timeline page
pub const USER_PAGE_SIZE: u32 = 30;

const SEARCH_PATH: &str = "/api/sns/web/v1/search/notes";
const USER_POSTED_PATH: &str = "/api/sns/web/v1/user_posted";
const FEED_PATH: &str = "/api/sns/web/v1/feed";
const IMAGE_FORMATS: [&str; 3] = ["jpg", "webp", "avif"];

/// Builds the HTTP client used for one task
///
/// The proxy, when given, applies to both http and https and stays fixed for the
/// lifetime of the client.
pub fn build_http_client(settings: &ApiSettings, proxy: Option<&str>) -> Result<Client, ApiError> {
    let mut builder = Client::builder()
        .user_agent(settings.user_agent.as_str())
        .timeout(settings.timeout())
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true);

    if let Some(proxy_url) = proxy.map(str::trim).filter(|p| !p.is_empty()) {
        let proxy = reqwest::Proxy::all(proxy_url).map_err(|e| ApiError::InvalidProxy {
            proxy: proxy_url.to_string(),
            message: e.to_string(),
        })?;
        builder = builder.proxy(proxy);
    }

    Ok(builder.build()?)
}

/// Platform response envelope
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    data: Value,
}

impl Envelope {
    /// Platform message, with the numeric code appended on failure
    fn message(&self) -> String {
        let msg = self.msg.clone().unwrap_or_default();
        match self.code {
            Some(code) if !self.success && !msg.contains("code=") => {
                if msg.is_empty() {
                    format!("code={}", code)
                } else {
                    format!("{} (code={})", msg, code)
                }
            }
            _ => msg,
        }
    }
}

/// `reqwest`-backed platform client
pub struct HttpNoteApi {
    client: Client,
    base_url: Url,
}

impl HttpNoteApi {
    /// Creates a client for one task
    pub fn new(settings: &ApiSettings, proxy: Option<&str>) -> Result<Self, ApiError> {
        let client = build_http_client(settings, proxy)?;
        Self::with_client(client, &settings.base_url)
    }

    /// Wraps an existing client
    pub fn with_client(client: Client, base_url: &str) -> Result<Self, ApiError> {
        let base_url =
            Url::parse(base_url).map_err(|e| ApiError::Endpoint(format!("{}: {}", base_url, e)))?;
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::Endpoint(format!("{}: {}", path, e)))
    }

    async fn send(
        &self,
        request: RequestBuilder,
        credential: &Credential,
        url: &Url,
    ) -> Result<ApiResponse<Value>, ApiError> {
        let response = request
            .header(COOKIE, credential.to_header())
            .header(ORIGIN, WEB_ORIGIN)
            .header(REFERER, format!("{}/", WEB_ORIGIN))
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| classify_error(url, e))?;
        tracing::trace!("{} -> HTTP {} ({} bytes)", url, status, body.len());

        match serde_json::from_str::<Envelope>(&body) {
            Ok(envelope) => {
                let message = envelope.message();
                if envelope.success && status.is_success() {
                    Ok(ApiResponse::ok(message, envelope.data))
                } else if message.is_empty() {
                    Ok(ApiResponse::failed(format!("HTTP {}", status.as_u16())))
                } else {
                    Ok(ApiResponse::failed(message))
                }
            }
            Err(_) if !status.is_success() => {
                Ok(ApiResponse::failed(format!("HTTP {}", status.as_u16())))
            }
            Err(e) => Err(ApiError::Decode {
                url: url.to_string(),
                message: e.to_string(),
            }),
        }
    }

    async fn search(
        &self,
        credential: &Credential,
        query: &str,
        page: u32,
        filters: &SearchFilters,
    ) -> Result<(ApiResponse<Value>, Url), ApiError> {
        let url = self.endpoint(SEARCH_PATH)?;
        let request = self
            .client
            .post(url.clone())
            .json(&search_body(query, page, filters));
        let response = self.send(request, credential, &url).await?;
        Ok((response, url))
    }

    async fn user_posted(
        &self,
        credential: &Credential,
        user: &UserRef,
        cursor: &Cursor,
    ) -> Result<(ApiResponse<Value>, Url), ApiError> {
        let mut url = self.endpoint(USER_POSTED_PATH)?;
        url.query_pairs_mut()
            .append_pair("num", &USER_PAGE_SIZE.to_string())
            .append_pair("cursor", cursor.token().unwrap_or_default())
            .append_pair("user_id", &user.user_id)
            .append_pair("image_formats", &IMAGE_FORMATS.join(","))
            .append_pair("xsec_token", user.xsec_token.as_deref().unwrap_or_default())
            .append_pair(
                "xsec_source",
                user.xsec_source.as_deref().unwrap_or("pc_feed"),
            );

        let request = self.client.get(url.clone());
        let response = self.send(request, credential, &url).await?;
        Ok((response, url))
    }
}

#[async_trait]
impl NoteApi for HttpNoteApi {
    async fn probe(
        &self,
        credential: &Credential,
        query: &str,
        page: u32,
    ) -> Result<ApiResponse<Value>, ApiError> {
        let (response, _) = self
            .search(credential, query, page, &SearchFilters::default())
            .await?;
        Ok(response)
    }

    async fn fetch_page(
        &self,
        credential: &Credential,
        context: &TaskContext,
        cursor: &Cursor,
    ) -> Result<ApiResponse<Page>, ApiError> {
        match context {
            TaskContext::KeywordSearch { query, filters } => {
                let page = cursor
                    .token()
                    .and_then(|token| token.parse::<u32>().ok())
                    .unwrap_or(1);
                let (response, url) = self.search(credential, query, page, filters).await?;
                map_response(response, &url, |data| parse_search_page(data, page))
            }
            TaskContext::UserTimeline(user) => {
                let (response, url) = self.user_posted(credential, user, cursor).await?;
                map_response(response, &url, parse_user_page)
            }
        }
    }

    async fn fetch_single(
        &self,
        credential: &Credential,
        note: &NoteRef,
    ) -> Result<ApiResponse<Item>, ApiError> {
        let url = self.endpoint(FEED_PATH)?;
        let body = json!({
            "source_note_id": note.note_id,
            "image_formats": IMAGE_FORMATS,
            "extra": {"need_body_topic": "1"},
            "xsec_source": note.xsec_source.as_deref().unwrap_or("pc_search"),
            "xsec_token": note.xsec_token.as_deref().unwrap_or_default(),
        });

        let request = self.client.post(url.clone()).json(&body);
        let response = self.send(request, credential, &url).await?;
        if !response.success {
            return Ok(ApiResponse::failed(response.message));
        }

        let data = response.data.unwrap_or(Value::Null);
        match parse_detail_response(&data, note.xsec_token.clone()) {
            Some(item) => Ok(ApiResponse::ok(response.message, item)),
            None => Ok(ApiResponse::failed(format!(
                "note {} unavailable: {}",
                note.note_id, response.message
            ))),
        }
    }
}

/// Builds the JSON body of a search request
pub(crate) fn search_body(query: &str, page: u32, filters: &SearchFilters) -> Value {
    let geo = filters
        .geo
        .as_ref()
        .and_then(|point| serde_json::to_string(point).ok())
        .unwrap_or_default();

    json!({
        "keyword": query,
        "page": page,
        "page_size": SEARCH_PAGE_SIZE,
        "search_id": search_id(),
        "sort": filters.sort.api_tag(),
        "note_type": filters.note_type.code(),
        "ext_flags": [],
        "filters": [
            {"tags": [filters.sort.api_tag()], "type": "sort_type"},
            {"tags": [filters.note_type.label()], "type": "filter_note_type"},
            {"tags": [filters.recency.label()], "type": "filter_note_time"},
            {"tags": [filters.range.label()], "type": "filter_note_range"},
            {"tags": [filters.distance.label()], "type": "filter_pos_distance"},
        ],
        "geo": geo,
        "image_formats": IMAGE_FORMATS,
    })
}

fn search_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(21)
        .map(char::from)
        .collect()
}

fn map_response<T>(
    response: ApiResponse<Value>,
    url: &Url,
    parse: impl FnOnce(&Value) -> Result<T, String>,
) -> Result<ApiResponse<T>, ApiError> {
    if !response.success {
        return Ok(ApiResponse::failed(response.message));
    }

    let data = response.data.unwrap_or(Value::Null);
    let parsed = parse(&data).map_err(|message| ApiError::Decode {
        url: url.to_string(),
        message,
    })?;
    Ok(ApiResponse::ok(response.message, parsed))
}

fn classify_error(url: &Url, error: reqwest::Error) -> ApiError {
    if error.is_timeout() {
        ApiError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        ApiError::Connection {
            url: url.to_string(),
            message: error.to_string(),
        }
    } else {
        ApiError::Transport(error)
    }
}
