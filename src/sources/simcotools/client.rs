//! SimcoTools market statistics REST client

use reqwest::Client as HttpClient;
use tracing::info;

use super::models::*;
use crate::config::ToolsConfig;
use crate::error::{Error, Result};

pub struct SimcoToolsClient {
    config: ToolsConfig,
    http: HttpClient,
}

impl SimcoToolsClient {
    pub fn new(config: ToolsConfig) -> Self {
        Self {
            config,
            http: HttpClient::new(),
        }
    }

    fn vwaps_url(&self, realm: u32) -> String {
        format!("{}/v1/realms/{}/market/vwaps", self.config.base_url, realm)
    }

    /// Previous day's volume-weighted average prices for every resource in a realm.
    pub async fn fetch_vwaps(&self, realm: u32) -> Result<Vec<Vwap>> {
        let url = self.vwaps_url(realm);

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(Error::Status {
                status: resp.status().as_u16(),
                url,
            });
        }

        let data: VwapsResponse = resp
            .json()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        info!("Realm {}: fetched {} VWAP records", realm, data.vwaps.len());
        Ok(data.vwaps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vwaps_url_follows_realm() {
        let client = SimcoToolsClient::new(ToolsConfig {
            base_url: "https://api.example".into(),
        });
        assert_eq!(
            client.vwaps_url(1),
            "https://api.example/v1/realms/1/market/vwaps"
        );
    }

    #[test]
    fn parses_vwaps_response() {
        let body = r#"{"vwaps":[{"resourceId":3,"quality":0,"vwap":0.31},{"resourceId":1,"vwap":0.12}]}"#;
        let parsed: VwapsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.vwaps.len(), 2);
        assert_eq!(parsed.vwaps[0].resource_id, 3);
        assert_eq!(parsed.vwaps[1].quality, 0);
    }
}
