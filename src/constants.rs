pub const SIMCO_GAME_URL: &str = "https://www.simcompanies.com";
pub const SIMCO_TOOLS_URL: &str = "https://api.simcotools.com";

pub const HTTP_TIMEOUT_SECS: u64 = 5;

pub const BATCH_SIZE: usize = 5;
pub const MAX_ATTEMPTS: u32 = 5;
pub const RETRY_DELAY_MS: u64 = 2_000;
pub const MAX_RETRY_ROUNDS: u32 = 5;
pub const MAX_BACKOFF_MS: u64 = 60_000;

/// Items tracked by the market snapshot.
pub const DEFAULT_ITEM_IDS: &[u32] = &[
    3, 4, 5, 7, 8, 9, 11, 12, 24, 25, 26, 27, 28, 53, 54, 55, 56, 57, 60, 61, 62, 63, 64, 65, 67,
    70, 71, 98, 102, 103, 108, 109, 110, 119, 120, 121, 122, 123, 124, 125, 126, 127, 128, 140,
    144, 146, 147, 148, 150,
];

/// Retail-info price below this for the sentinel item means the day's data is not published yet.
pub const SENTINEL_ITEM: u32 = 3;
pub const SENTINEL_MIN_PRICE: f64 = 0.01;

pub const MIN_RETAINED_PRICE: f64 = 0.1;

// Keys the front-end bundle binds its constants to.
pub const PROFIT_PER_BUILDING_LEVEL: &str = "PROFIT_PER_BUILDING_LEVEL";
pub const RETAIL_MODELING_QUALITY_WEIGHT: &str = "RETAIL_MODELING_QUALITY_WEIGHT";
pub const AVERAGE_SALARY: &str = "AVERAGE_SALARY";
pub const SALES_BY_BUILDING: &str = "SALES_BY_BUILDING";
pub const RETAIL_ADJUSTMENT: &str = "RETAIL_ADJUSTMENT";

pub const EXCLUDED_BUILDING_CATEGORY: &str = "restaurant";

/// Fixed store wages per building group, used when wages are not scraped.
pub const DEFAULT_WAGE_CATEGORIES: &[(f64, &[u32])] = &[
    // electronics store and hardware store
    (172.5, &[102, 103, 108, 109, 110, 24, 25, 26, 27, 28, 98]),
    // gas station
    (345.0, &[11, 12]),
    // fashion store
    (310.5, &[60, 61, 62, 63, 64, 65, 70, 71]),
    // grocery store
    (138.0, &[3, 4, 5, 7, 8, 9, 67, 119, 122, 123, 124, 125, 126, 127, 140, 144]),
    // car dealership
    (379.5, &[53, 54, 55, 56, 57]),
];
