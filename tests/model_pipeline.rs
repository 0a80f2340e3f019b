use std::fs;

use serde_json::{json, Value};

use simco_scrape::app::{assemble_datasets, write_datasets};
use simco_scrape::cli::{Layout, WageSource};
use simco_scrape::extract::extract_constants;
use simco_scrape::model::{ensure_market_ready, EconomyState, RetentionFilter};
use simco_scrape::sources::simcompanies::{MarketData, RetailInfo};
use simco_scrape::{Config, Error};

const BUNDLE: &str = concat!(
    "var Qe={PROFIT_PER_BUILDING_LEVEL:ab,RETAIL_MODELING_QUALITY_WEIGHT:cd,AVERAGE_SALARY:ef};",
    "let ab=.07,cd=.3,ef=100;",
    "const SALES_BY_BUILDING={B:[3,4],E:{category:\"restaurant\",resources:[120]}};",
    "Rk={RETAIL_ADJUSTMENT:{B:1.05,E:.9}};",
    "Xa={name:\"Grocery store\",dbLetter:\"B\",salaryModifier:1.5};",
    "Gr={E:{name:\"Restaurant\",dbLetter:\"E\",salaryModifier:1.2}};",
    "Md={0:JSON.parse('{\"3\":{\"buildingLevelsNeededPerHour\":0.2,\"modeledProductionCostPerUnit\":0.1,\"modeledStoreWages\":1.1,\"modeledUnitsSoldAnHour\":40},",
    "\"120\":{\"buildingLevelsNeededPerHour\":0.5,\"modeledStoreWages\":2}}'),",
    "1:JSON.parse('{\"3\":{\"buildingLevelsNeededPerHour\":0.3,\"modeledStoreWages\":1.2},",
    "\"4\":{\"buildingLevelsNeededPerHour\":0.1}}')};"
);

fn retail_market(rows: Value) -> MarketData {
    let rows: Vec<RetailInfo> = serde_json::from_value(rows).unwrap();
    MarketData::from_retail_info(&rows)
}

#[test]
fn scraped_wages_flow_into_the_dataset() {
    let constants = extract_constants(BUNDLE).unwrap();
    let market = retail_market(json!([
        {"dbLetter": 3, "averagePrice": 0.5, "saturation": 2.0},
        {"dbLetter": 4, "averagePrice": 1.5, "saturation": 0.8},
        {"dbLetter": 120, "averagePrice": 9.0, "saturation": 1.0}
    ]));

    let datasets = assemble_datasets(
        &constants,
        &market,
        &Config::default(),
        WageSource::Scraped,
        RetentionFilter::Standard,
    )
    .unwrap();

    let depressed = serde_json::to_value(&datasets[&EconomyState::Depressed]).unwrap();
    assert_eq!(depressed["3"]["building_wages"], json!(150.0));
    assert_eq!(depressed["3"]["retail_adjustment"], json!(1.05));
    assert_eq!(depressed["3"]["modeledUnitsSoldAnHour"], json!(40.0));
    // restaurant items get no scraped wage
    assert_eq!(depressed["120"]["building_wages"], json!(0.0));
    assert_eq!(depressed["120"]["retail_adjustment"], json!(0.9));
    assert_eq!(depressed["PROFIT_PER_BUILDING_LEVEL"], json!("0.07"));
    assert_eq!(depressed["RETAIL_MODELING_QUALITY_WEIGHT"], json!("0.3"));

    let balanced = serde_json::to_value(&datasets[&EconomyState::Balanced]).unwrap();
    assert_eq!(balanced["4"]["averagePrice"], json!(1.5));
    assert_eq!(balanced["4"]["modeledStoreWages"], Value::Null);
}

#[test]
fn low_price_item_is_kept_only_without_price_filter() {
    let constants = extract_constants(BUNDLE).unwrap();
    let market = retail_market(json!([{"dbLetter": 3, "averagePrice": 0.05, "saturation": 10}]));
    let config = Config::default();

    // 0.05 is above the readiness threshold
    ensure_market_ready(&market, config.sentinel.as_ref()).unwrap();

    let filtered =
        assemble_datasets(&constants, &market, &config, WageSource::Fixed, RetentionFilter::Standard)
            .unwrap();
    assert!(!filtered[&EconomyState::Balanced].items.contains_key(&3));

    let unfiltered =
        assemble_datasets(&constants, &market, &config, WageSource::Fixed, RetentionFilter::None)
            .unwrap();
    let balanced = serde_json::to_value(&unfiltered[&EconomyState::Balanced]).unwrap();
    assert_eq!(balanced["3"]["averagePrice"], json!(0.05));
    assert_eq!(balanced["3"]["marketSaturation"], json!(10.0));
    assert_eq!(balanced["3"]["building_wages"], json!(138.0));
}

#[test]
fn scraped_wages_need_the_wage_tables() {
    let bundle = BUNDLE.replace("AVERAGE_SALARY", "SOMETHING_ELSE");
    let constants = extract_constants(&bundle).unwrap();

    let result = assemble_datasets(
        &constants,
        &MarketData::default(),
        &Config::default(),
        WageSource::Scraped,
        RetentionFilter::None,
    );
    assert!(matches!(result, Err(Error::PatternNotFound(_))));
}

#[test]
fn malformed_sales_table_does_not_block_fixed_wages() {
    let bundle = BUNDLE.replace("B:[3,4]", "B:[Ab.apples,4]");
    let constants = extract_constants(&bundle).unwrap();
    let market = retail_market(json!([{"dbLetter": 3, "averagePrice": 0.5, "saturation": 2.0}]));

    let datasets = assemble_datasets(
        &constants,
        &market,
        &Config::default(),
        WageSource::Fixed,
        RetentionFilter::Standard,
    )
    .unwrap();
    let balanced = serde_json::to_value(&datasets[&EconomyState::Balanced]).unwrap();
    assert_eq!(balanced["3"]["building_wages"], json!(138.0));
    assert_eq!(balanced["3"]["retail_adjustment"], Value::Null);

    let scraped = assemble_datasets(
        &constants,
        &market,
        &Config::default(),
        WageSource::Scraped,
        RetentionFilter::Standard,
    );
    assert!(matches!(scraped, Err(Error::PatternNotFound(_))));
}

#[test]
fn layouts_write_expected_files() {
    let constants = extract_constants(BUNDLE).unwrap();
    let market = retail_market(json!([{"dbLetter": 3, "averagePrice": 0.5, "saturation": 2.0}]));
    let datasets = assemble_datasets(
        &constants,
        &market,
        &Config::default(),
        WageSource::Fixed,
        RetentionFilter::Standard,
    )
    .unwrap();

    let dir = std::env::temp_dir().join(format!("simco-scrape-layouts-{}", std::process::id()));
    let base = dir.join("models");
    let base = base.to_str().unwrap();

    let single = write_datasets(&datasets, Layout::Single, Some(EconomyState::Balanced), base).unwrap();
    assert_eq!(single.len(), 1);
    let written: Value = serde_json::from_str(&fs::read_to_string(&single[0]).unwrap()).unwrap();
    assert_eq!(written["3"]["buildingLevelsNeededPerHour"], json!(0.3));

    let per_state = write_datasets(&datasets, Layout::PerState, None, base).unwrap();
    assert_eq!(per_state.len(), 2);
    assert!(per_state[0].ends_with("models_depressed.json"));
    assert!(per_state[1].ends_with("models_balanced.json"));

    let combined = write_datasets(&datasets, Layout::Combined, None, base).unwrap();
    let written: Value = serde_json::from_str(&fs::read_to_string(&combined[0]).unwrap()).unwrap();
    assert_eq!(written["0"]["3"]["buildingLevelsNeededPerHour"], json!(0.2));
    assert_eq!(written["1"]["RETAIL_MODELING_QUALITY_WEIGHT"], json!("0.3"));

    // booming is not in the script
    assert!(write_datasets(&datasets, Layout::Single, Some(EconomyState::Booming), base).is_err());

    fs::remove_dir_all(&dir).unwrap();
}
