use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::*;
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub game: GameConfig,
    pub tools: ToolsConfig,
    pub fetch: FetchConfig,
    pub item_ids: Vec<u32>,
    pub sentinel: Option<SentinelConfig>,
    pub wage_categories: WageCategories,
}

#[derive(Debug, Clone)]
pub struct GameConfig {
    pub base_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ToolsConfig {
    pub base_url: String,
}

/// Batch and retry settings for per-item order-book requests.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub batch_size: usize,
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub max_retry_rounds: u32,
    pub max_backoff: Duration,
}

#[derive(Debug, Clone, Copy)]
pub struct SentinelConfig {
    pub item_id: u32,
    pub min_price: f64,
}

/// Fixed store wage per item, built once from the category table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WageCategories {
    wages: BTreeMap<u32, f64>,
}

impl WageCategories {
    pub fn from_categories(categories: &[(f64, &[u32])]) -> Self {
        let wages = categories
            .iter()
            .flat_map(|(wage, ids)| ids.iter().map(move |id| (*id, *wage)))
            .collect();
        Self { wages }
    }

    pub fn wage(&self, item_id: u32) -> Option<f64> {
        self.wages.get(&item_id).copied()
    }

    pub fn as_map(&self) -> &BTreeMap<u32, f64> {
        &self.wages
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            base_url: SIMCO_GAME_URL.to_string(),
            timeout: Duration::from_secs(HTTP_TIMEOUT_SECS),
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            base_url: SIMCO_TOOLS_URL.to_string(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            batch_size: BATCH_SIZE,
            max_attempts: MAX_ATTEMPTS,
            retry_delay: Duration::from_millis(RETRY_DELAY_MS),
            max_retry_rounds: MAX_RETRY_ROUNDS,
            max_backoff: Duration::from_millis(MAX_BACKOFF_MS),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            game: GameConfig::default(),
            tools: ToolsConfig::default(),
            fetch: FetchConfig::default(),
            item_ids: DEFAULT_ITEM_IDS.to_vec(),
            sentinel: Some(SentinelConfig {
                item_id: SENTINEL_ITEM,
                min_price: SENTINEL_MIN_PRICE,
            }),
            wage_categories: WageCategories::from_categories(DEFAULT_WAGE_CATEGORIES),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(url) = lookup("SIMCO_GAME_URL") {
            config.game.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(url) = lookup("SIMCO_TOOLS_URL") {
            config.tools.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "SIMCO_HTTP_TIMEOUT_SECS")? {
            config.game.timeout = Duration::from_secs(secs);
        }

        if let Some(size) = parse_var::<usize>(&lookup, "SIMCO_BATCH_SIZE")? {
            if size == 0 {
                return Err(Error::Config("SIMCO_BATCH_SIZE must be at least 1".into()));
            }
            config.fetch.batch_size = size;
        }
        if let Some(attempts) = parse_var::<u32>(&lookup, "SIMCO_MAX_ATTEMPTS")? {
            if attempts == 0 {
                return Err(Error::Config("SIMCO_MAX_ATTEMPTS must be at least 1".into()));
            }
            config.fetch.max_attempts = attempts;
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "SIMCO_RETRY_DELAY_MS")? {
            config.fetch.retry_delay = Duration::from_millis(ms);
        }
        if let Some(rounds) = parse_var::<u32>(&lookup, "SIMCO_MAX_RETRY_ROUNDS")? {
            config.fetch.max_retry_rounds = rounds;
        }

        if let Some(ids) = lookup("SIMCO_ITEM_IDS") {
            config.item_ids = ids
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| {
                    s.parse::<u32>()
                        .map_err(|_| Error::Config(format!("SIMCO_ITEM_IDS: bad item id {:?}", s)))
                })
                .collect::<Result<Vec<_>>>()?;
        }

        if let Some(sentinel) = lookup("SIMCO_SENTINEL_ITEM") {
            config.sentinel = match sentinel.trim() {
                "" | "none" => None,
                id => Some(SentinelConfig {
                    item_id: id.parse().map_err(|_| {
                        Error::Config(format!("SIMCO_SENTINEL_ITEM: bad item id {:?}", id))
                    })?,
                    min_price: SENTINEL_MIN_PRICE,
                }),
            };
        }

        Ok(config)
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| Error::Config(format!("{} has invalid value {:?}", key, raw))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.game.base_url, SIMCO_GAME_URL);
        assert_eq!(config.fetch.batch_size, 5);
        assert_eq!(config.fetch.max_attempts, 5);
        assert_eq!(config.fetch.retry_delay, Duration::from_secs(2));
        assert_eq!(config.item_ids.len(), DEFAULT_ITEM_IDS.len());
        assert_eq!(config.sentinel.map(|s| s.item_id), Some(3));
    }

    #[test]
    fn overrides_are_applied() {
        let config = Config::from_lookup(lookup_from(&[
            ("SIMCO_GAME_URL", "http://localhost:8080/"),
            ("SIMCO_BATCH_SIZE", "3"),
            ("SIMCO_ITEM_IDS", "1, 2,3"),
            ("SIMCO_SENTINEL_ITEM", "none"),
        ]))
        .unwrap();
        assert_eq!(config.game.base_url, "http://localhost:8080");
        assert_eq!(config.fetch.batch_size, 3);
        assert_eq!(config.item_ids, vec![1, 2, 3]);
        assert!(config.sentinel.is_none());
    }

    #[test]
    fn bad_values_are_config_errors() {
        let err = Config::from_lookup(lookup_from(&[("SIMCO_BATCH_SIZE", "many")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        let err = Config::from_lookup(lookup_from(&[("SIMCO_BATCH_SIZE", "0")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        let err = Config::from_lookup(lookup_from(&[("SIMCO_MAX_ATTEMPTS", "0")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn wage_categories_broadcast_to_items() {
        let wages = WageCategories::from_categories(DEFAULT_WAGE_CATEGORIES);
        assert_eq!(wages.wage(11), Some(345.0));
        assert_eq!(wages.wage(3), Some(138.0));
        assert_eq!(wages.wage(53), Some(379.5));
        assert_eq!(wages.wage(1), None);
    }
}
