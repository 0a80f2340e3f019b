use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vwap {
    pub resource_id: u32,
    #[serde(default)]
    pub quality: u8,
    pub vwap: f64,
}

#[derive(Debug, Deserialize)]
pub struct VwapsResponse {
    pub vwaps: Vec<Vwap>,
}
