use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use quant_universe::{build_services, run_once};
use quant_universe_core::cache::InMemorySideChannelStore;
use quant_universe_core::config::AppConfig;
use quant_universe_core::market::SnapshotMarketData;
use quant_universe_domain::FixedClock;
use quant_universe_orchestration::{IncomeAggregationJob, PeriodicJob, StatusReportJob};

const NOW: i64 = 1_760_000_000_000;
const PIPELINE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/config/pipeline.json");
const SNAPSHOT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/config/snapshot.json");

fn sample_config() -> AppConfig {
    AppConfig {
        pipeline_config_path: PIPELINE.to_string(),
        ..AppConfig::default()
    }
}

#[tokio::test]
async fn test_sample_pipeline_selects_symbols() {
    let market = SnapshotMarketData::from_file(SNAPSHOT).unwrap();
    let services = build_services(
        &sample_config(),
        market,
        Arc::new(InMemorySideChannelStore::new()),
        Arc::new(FixedClock::new(NOW)),
    )
    .unwrap();
    assert_eq!(services.pipeline.len(), 6);

    let outcome = run_once(&services).await.unwrap();
    assert_eq!(outcome.history.len(), 6);

    // 黑名单剔除杠杆代币和稳定币，SOL 最小开仓价值超限，XRP 涨跌幅不足
    assert_eq!(
        outcome.history[2].symbols(),
        vec!["BTCUSDT", "DOGEUSDT", "ETHUSDT", "XRPUSDT"]
    );
    assert_eq!(outcome.final_result.symbols(), vec!["DOGEUSDT", "ETHUSDT"]);
    assert_eq!(
        outcome.final_result.get("DOGEUSDT").unwrap().get("funding_rate"),
        Some(&json!(-0.0002))
    );
}

#[tokio::test]
async fn test_invalid_pipeline_fails_at_startup() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"[{{"filter": "SubListFilter", "config": {{"size": 0}}}}]"#
    )
    .unwrap();
    let config = AppConfig {
        pipeline_config_path: file.path().display().to_string(),
        ..AppConfig::default()
    };

    let result = build_services(
        &config,
        SnapshotMarketData::new(),
        Arc::new(InMemorySideChannelStore::new()),
        Arc::new(FixedClock::new(NOW)),
    );
    assert!(result.is_err());
}

#[tokio::test]
async fn test_income_flows_into_status_report() {
    let market = Arc::new(SnapshotMarketData::from_file(SNAPSHOT).unwrap());
    let store = Arc::new(InMemorySideChannelStore::new());
    let clock = Arc::new(FixedClock::new(NOW + 10 * 3_600_000));
    let retention = Duration::from_secs(7 * 24 * 3600);

    let income_job = IncomeAggregationJob::new(market.clone(), store.clone(), clock.clone(), retention);
    income_job.run_once().await.unwrap();

    let status_job = StatusReportJob::new(market, store, clock, retention);
    let report = status_job.collect().await.unwrap();
    assert_eq!(report.universe_size, 7);
    assert_eq!(report.income_by_symbol.len(), 1);
    let sol = report.income_by_symbol.get("SOLUSDT").copied().unwrap();
    assert!((sol - 12.1).abs() < 1e-9);
}
