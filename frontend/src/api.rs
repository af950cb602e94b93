use gloo_net::http::{Request, Response};
use leptos::prelude::*;
use serde_json::json;

use crate::models::{ErrorResponse, StatusResponse};

const DEFAULT_ICON: &str = "org.thingpedia.builtin.thingengine.builtin";
const DEFAULT_THINGPEDIA_URL: &str = "https://thingpedia.stanford.edu/thingpedia";

/// Settings the server renders into `<body data-…>` attributes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PageConfig {
    pub access_token: String,
    pub thingpedia_url: String,
}

impl PageConfig {
    pub fn from_body() -> Self {
        let dataset = document().body().map(|body| body.dataset());
        let get = |key: &str| dataset.as_ref().and_then(|d| d.get(key));
        Self {
            access_token: get("accessToken").unwrap_or_default(),
            thingpedia_url: get("thingpediaUrl")
                .unwrap_or_else(|| DEFAULT_THINGPEDIA_URL.to_string()),
        }
    }

    /// URL of the icon shown next to an assistant message.
    pub fn icon_url(&self, icon: Option<&str>) -> String {
        format!("{}/api/devices/icon/{}", self.thingpedia_url, icon.unwrap_or(DEFAULT_ICON))
    }

    fn encoded_token(&self) -> String {
        String::from(js_sys::encode_uri_component(&self.access_token))
    }

    /// Returns the WebSocket URL for the conversation endpoint; the scheme
    /// mirrors the page's.
    pub fn ws_url(&self) -> String {
        let location = window().location();
        let scheme = match location.protocol() {
            Ok(p) if p == "https:" => "wss",
            _ => "ws",
        };
        let host = location.host().unwrap_or_default();
        format!("{scheme}://{host}/api/conversation?access_token={}", self.encoded_token())
    }

    /// Download link for the saved transcript (links cannot carry headers).
    pub fn log_url(&self) -> String {
        format!("/api/recording/log?access_token={}", self.encoded_token())
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

async fn check(resp: Response) -> Result<Response, String> {
    if resp.ok() {
        return Ok(resp);
    }
    match resp.json::<ErrorResponse>().await {
        Ok(body) => Err(body.error),
        Err(_) => Err(format!("Server error: {}", resp.status())),
    }
}

/// Fetches whether the conversation is recording. `Ok(None)` when the
/// server has no conversation for us yet.
pub async fn fetch_recording_status(config: &PageConfig) -> Result<Option<bool>, String> {
    let resp = Request::get("/api/recording/status")
        .header("Authorization", &config.bearer())
        .send()
        .await
        .map_err(|e| format!("Network error: {e}"))?;

    if resp.status() == 404 {
        return Ok(None);
    }
    let body = check(resp)
        .await?
        .json::<StatusResponse>()
        .await
        .map_err(|e| format!("Parse error: {e}"))?;
    Ok(Some(body.status == "on"))
}

/// POSTs to a body-less recording route such as `start` or `vote/up`.
pub async fn recording_action(config: &PageConfig, action: &str) -> Result<(), String> {
    let resp = Request::post(&format!("/api/recording/{action}"))
        .header("Authorization", &config.bearer())
        .send()
        .await
        .map_err(|e| format!("Network error: {e}"))?;
    check(resp).await.map(|_| ())
}

/// Attaches a comment to the last recorded turn.
pub async fn send_comment(config: &PageConfig, comment: &str) -> Result<(), String> {
    let resp = Request::post("/api/recording/comment")
        .header("Authorization", &config.bearer())
        .json(&json!({ "comment": comment }))
        .map_err(|e| format!("Serialize error: {e}"))?
        .send()
        .await
        .map_err(|e| format!("Network error: {e}"))?;
    check(resp).await.map(|_| ())
}
