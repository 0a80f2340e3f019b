//! Sim Companies game API and front-end bundle client

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::header::COOKIE;
use reqwest::{Client as HttpClient, StatusCode};
use tracing::{debug, info};
use url::Url;

use super::models::*;
use crate::config::GameConfig;
use crate::error::{Error, Result};
use crate::model::EconomyState;
use crate::sources::{MarketOrder, OrderBookSource};

static SCRIPT_SRC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"crossorigin src="([^"]+)""#).expect("valid regex"));

pub struct SimCompaniesClient {
    config: GameConfig,
    http: HttpClient,
}

impl SimCompaniesClient {
    pub fn new(config: GameConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self { config, http })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    async fn get_text(&self, url: &str, session_id: Option<&str>) -> Result<String> {
        let mut req = self.http.get(url);
        if let Some(id) = session_id {
            req = req.header(COOKIE, format!("sessionid={}", id));
        }

        let resp = req.send().await.map_err(|e| Error::Http(e.to_string()))?;

        check_status(resp.status(), url)?;

        resp.text().await.map_err(|e| Error::Http(e.to_string()))
    }

    // ========================================================================
    // REST API Methods
    // ========================================================================

    /// Retail average price and saturation for every resource in a realm.
    pub async fn fetch_retail_info(&self, realm: u32) -> Result<Vec<RetailInfo>> {
        let url = self.url(&format!("/api/v4/{}/resources-retail-info", realm));
        let body = self.get_text(&url, None).await?;
        let rows: Vec<RetailInfo> = serde_json::from_str(&body)?;
        info!("Realm {}: fetched retail info for {} resources", realm, rows.len());
        Ok(rows)
    }

    /// Current economy cycle of the company owning `session_id`.
    pub async fn fetch_economy_state(&self, session_id: &str) -> Result<EconomyState> {
        let url = self.url("/api/v2/companies/me/");
        let body = self.get_text(&url, Some(session_id)).await?;
        let me: CompanyMe = serde_json::from_str(&body)?;

        let raw = me
            .temporals
            .and_then(|t| t.economy_state)
            .ok_or_else(|| Error::Other("companies/me response has no temporals.economyState".into()))?;
        let state = EconomyState::try_from(raw)?;
        info!("Economy state: {}", state);
        Ok(state)
    }

    // ========================================================================
    // Front-end bundle
    // ========================================================================

    /// Absolute URL of the main bundled script referenced by the landing page.
    pub async fn fetch_script_url(&self) -> Result<Url> {
        let html = self.get_text(&self.url("/"), None).await?;
        let src = find_script_src(&html)?;
        let url = resolve_script_url(&self.config.base_url, src)?;
        debug!("Script URL: {}", url);
        Ok(url)
    }

    pub async fn fetch_script(&self) -> Result<String> {
        let url = self.fetch_script_url().await?;
        let text = self.get_text(url.as_str(), None).await?;
        info!("Downloaded script {} ({} bytes)", url, text.len());
        Ok(text)
    }
}

#[async_trait]
impl OrderBookSource for SimCompaniesClient {
    async fn fetch_orders(&self, realm: u32, item_id: u32) -> Result<Vec<MarketOrder>> {
        let url = self.url(&format!("/api/v3/market/all/{}/{}/", realm, item_id));
        let body = self.get_text(&url, None).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// 429 becomes [`Error::RateLimited`], any other non-success status [`Error::Status`].
pub fn check_status(status: StatusCode, url: &str) -> Result<()> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(Error::RateLimited(url.to_string()));
    }
    if !status.is_success() {
        return Err(Error::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    Ok(())
}

pub fn find_script_src(html: &str) -> Result<&str> {
    SCRIPT_SRC
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or(Error::ScriptNotFound)
}

pub fn resolve_script_url(base_url: &str, src: &str) -> Result<Url> {
    let base = Url::parse(base_url)?;
    Ok(base.join(src)?)
}
