use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::{API_PATH, Config, TIME_ENTRIES_PATH};
use crate::error::{TimecardError, upstream_message};
use crate::settings::Settings;
use crate::types::TimeEntryPayload;

pub const SUCCESS_MESSAGE: &str = "Time entry created";
/// Header names are case-insensitive; `HeaderName` wants lowercase.
const CLIENT_ID_HEADER: &str = "clientid";

/// Build the shared HTTP client with the configured deadlines.
pub fn build_http_client(cfg: &Config) -> Result<reqwest::Client, TimecardError> {
    let mut builder = reqwest::Client::builder()
        .user_agent(cfg.user_agent.clone())
        .connect_timeout(cfg.connect_timeout())
        .timeout(cfg.request_timeout());
    if let Some(proxy_url) = cfg.proxy.as_ref() {
        builder = builder.proxy(reqwest::Proxy::all(proxy_url.as_str())?);
    }
    Ok(builder.build()?)
}

/// `https://{site}/v4_6_release/apis/3.0/`; a site that already carries a
/// scheme is used as given.
pub fn base_url_for_site(site_url: &str) -> Result<Url, TimecardError> {
    let site = site_url.trim().trim_end_matches('/');
    if site.is_empty() {
        return Err(TimecardError::invalid("Site URL is empty"));
    }
    let root = if site.starts_with("http://") || site.starts_with("https://") {
        site.to_string()
    } else {
        format!("https://{site}")
    };
    Ok(Url::parse(&format!("{root}/{API_PATH}/"))?)
}

/// `Basic base64("{company}+{public}:{private}")`.
pub fn basic_auth_value(company_id: &str, public_key: &str, private_key: &str) -> String {
    let raw = format!("{company_id}+{public_key}:{private_key}");
    format!("Basic {}", STANDARD.encode(raw))
}

/// Thin client for the ConnectWise Manage REST API.
#[derive(Clone)]
pub struct ManageApi {
    client: reqwest::Client,
    base_url: Url,
    headers: HeaderMap,
}

impl ManageApi {
    pub fn new(client: reqwest::Client, settings: &Settings) -> Result<Self, TimecardError> {
        let base_url = base_url_for_site(&settings.site_url)?;

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&basic_auth_value(
            &settings.company_id,
            &settings.public_key,
            &settings.private_key,
        ))
        .map_err(|_| TimecardError::invalid("API keys contain characters not allowed in a header"))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            CLIENT_ID_HEADER,
            HeaderValue::from_str(settings.client_id.trim())
                .map_err(|_| TimecardError::invalid("Client ID is not a valid header value"))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        Ok(Self {
            client,
            base_url,
            headers,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn time_entries_url(&self) -> Result<Url, TimecardError> {
        Ok(self.base_url.join(TIME_ENTRIES_PATH)?)
    }

    /// Single POST, no retry. 200/201 succeed; anything else is `Rejected`.
    pub async fn post_time_entry(&self, payload: &TimeEntryPayload) -> Result<String, TimecardError> {
        let url = self.time_entries_url()?;
        debug!(%url, charge_to_id = payload.charge_to_id, "posting time entry");

        let resp = self
            .client
            .post(url)
            .headers(self.headers.clone())
            .json(payload)
            .send()
            .await?;

        let status = resp.status();
        if matches!(status, StatusCode::OK | StatusCode::CREATED) {
            info!(
                charge_to_id = payload.charge_to_id,
                status = status.as_u16(),
                "time entry accepted"
            );
            return Ok(SUCCESS_MESSAGE.to_string());
        }

        let body = resp.text().await.unwrap_or_default();
        let message = upstream_message(status, &body);
        warn!(
            charge_to_id = payload.charge_to_id,
            status = status.as_u16(),
            %message,
            "time entry rejected"
        );
        Err(TimecardError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}
