//! End-to-end engine runs over a parquet directory source and store.

use chrono::NaiveDate;
use lisbon_core::column::{
    COMPANY_ID, DATE, FISCAL_QUARTER, FISCAL_YEAR, PERIOD_END, PRICE, REPORT_DATE, SECURITY_ID,
    SHARES_OUTSTANDING, VALID_FROM, VALID_TO,
};
use lisbon_core::frame::{date_series, optional_date_series};
use lisbon_core::types::CompanyId;
use lisbon_data::local::{
    ANNUAL_FILE, DAILY_FILE, LINKS_FILE, LocalSource, QUARTERLY_FILE,
};
use lisbon_data::source::EntityScope;
use lisbon_data::store::{FactorStore, ParquetStore};
use lisbon_factors::{EngineConfig, FactorEngine};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn write_parquet(path: &Path, mut df: DataFrame) {
    let mut file = File::create(path).unwrap();
    ParquetWriter::new(&mut file).finish(&mut df).unwrap();
}

fn write_fixtures(dir: &Path) {
    let period_ends = [
        d(2020, 3, 31),
        d(2020, 6, 30),
        d(2020, 9, 30),
        d(2020, 12, 31),
        d(2021, 3, 31),
    ];
    let report_dates = [
        d(2020, 5, 1),
        d(2020, 8, 1),
        d(2020, 11, 1),
        d(2021, 2, 1),
        d(2021, 5, 1),
    ];
    let quarterly = DataFrame::new(vec![
        Series::new(COMPANY_ID.into(), vec!["E1"; 5]).into(),
        date_series(PERIOD_END, &period_ends).unwrap().into(),
        Series::new(FISCAL_YEAR.into(), vec![2020i32, 2020, 2020, 2020, 2021]).into(),
        Series::new(FISCAL_QUARTER.into(), vec![1i32, 2, 3, 4, 1]).into(),
        date_series(REPORT_DATE, &report_dates).unwrap().into(),
        Series::new("sales".into(), vec![100.0, 110.0, 120.0, 130.0, 140.0]).into(),
        Series::new(
            "income_before_extra".into(),
            vec![10.0, 11.0, 12.0, 13.0, 14.0],
        )
        .into(),
        Series::new("total_assets".into(), vec![1000.0; 5]).into(),
    ])
    .unwrap();
    write_parquet(&dir.join(QUARTERLY_FILE), quarterly);

    let annual = DataFrame::new(vec![
        Series::new(COMPANY_ID.into(), vec!["E1"]).into(),
        date_series(PERIOD_END, &[d(2020, 12, 31)]).unwrap().into(),
        Series::new(FISCAL_YEAR.into(), vec![2020i32]).into(),
        Series::new("capital_expenditure".into(), vec![40.0]).into(),
    ])
    .unwrap();
    write_parquet(&dir.join(ANNUAL_FILE), annual);

    // Two share classes of E1 trading on two dates.
    let daily = DataFrame::new(vec![
        Series::new(SECURITY_ID.into(), vec![1i64, 2, 1, 2]).into(),
        date_series(
            DATE,
            &[d(2021, 3, 15), d(2021, 3, 15), d(2021, 6, 15), d(2021, 6, 15)],
        )
        .unwrap()
        .into(),
        Series::new(PRICE.into(), vec![20.0, 3.0, 22.0, 3.0]).into(),
        Series::new(SHARES_OUTSTANDING.into(), vec![100.0, 100.0, 100.0, 100.0]).into(),
        Series::new("total_return".into(), vec![0.01, 0.01, 0.02, 0.02]).into(),
        Series::new("volume".into(), vec![1000i64, 500, 1100, 650]).into(),
        Series::new("price_adj_factor".into(), vec![1.0; 4]).into(),
        Series::new("share_adj_factor".into(), vec![1.0; 4]).into(),
    ])
    .unwrap();
    write_parquet(&dir.join(DAILY_FILE), daily);

    let links = DataFrame::new(vec![
        Series::new(SECURITY_ID.into(), vec![1i64, 2]).into(),
        Series::new(COMPANY_ID.into(), vec!["E1", "E1"]).into(),
        date_series(VALID_FROM, &[d(2000, 1, 1), d(2000, 1, 1)])
            .unwrap()
            .into(),
        optional_date_series(VALID_TO, &[None, None]).unwrap().into(),
    ])
    .unwrap();
    write_parquet(&dir.join(LINKS_FILE), links);
}

#[test]
fn full_scope_run_computes_and_caches() {
    let data_dir = tempfile::tempdir().unwrap();
    let cache_dir = tempfile::tempdir().unwrap();
    write_fixtures(data_dir.path());

    let source = LocalSource::new(data_dir.path());
    let store = ParquetStore::new(cache_dir.path()).unwrap();
    let engine = FactorEngine::new(&source, &source, &store, EngineConfig::default()).unwrap();

    // Market caps sum both share classes: 20*100 + 3*100 = 2300, then 2500.
    let caps: Vec<Option<i64>> = engine
        .market_caps()
        .column(lisbon_core::column::MARKET_CAP)
        .unwrap()
        .i64()
        .unwrap()
        .to_vec();
    assert_eq!(caps, vec![Some(2300), Some(2500)]);

    let sp = engine.compute("f_sp").unwrap();
    assert!(!sp.is_cached());
    let values: Vec<Option<f64>> = sp.table().column("f_sp").unwrap().f64().unwrap().to_vec();
    // 460 / 2300 and 500 / 2500.
    assert_eq!(values, vec![Some(0.2), Some(0.2)]);

    let roa = engine.compute("f_roa").unwrap();
    let values: Vec<Option<f64>> = roa.table().column("f_roa").unwrap().f64().unwrap().to_vec();
    assert_eq!(values, vec![Some(0.046), Some(0.05)]);

    // A second engine over the same store serves both from cache,
    // bit-identical to the fresh results.
    let second = FactorEngine::new(&source, &source, &store, EngineConfig::default()).unwrap();
    let cached = second.compute("f_sp").unwrap();
    assert!(cached.is_cached());
    assert_eq!(cached.table(), sp.table());
}

#[test]
fn annual_fields_flow_through_the_quarterly_spine() {
    let data_dir = tempfile::tempdir().unwrap();
    let cache_dir = tempfile::tempdir().unwrap();
    write_fixtures(data_dir.path());

    let source = LocalSource::new(data_dir.path());
    let store = ParquetStore::new(cache_dir.path()).unwrap();
    let engine = FactorEngine::new(&source, &source, &store, EngineConfig::default()).unwrap();

    // f_aci declares quarterly sales plus annual capital expenditure; with
    // only one annual record no lag exists, so every row is undefined and
    // the persisted table is empty, but the run itself succeeds.
    let outcome = engine.compute("f_aci").unwrap();
    assert_eq!(outcome.table().height(), 0);
}

#[test]
fn scoped_run_leaves_the_store_untouched() {
    let data_dir = tempfile::tempdir().unwrap();
    let cache_dir = tempfile::tempdir().unwrap();
    write_fixtures(data_dir.path());

    let source = LocalSource::new(data_dir.path());
    let store = ParquetStore::new(cache_dir.path()).unwrap();
    let config = EngineConfig {
        scope: EntityScope::Companies(vec![CompanyId::new("E1")]),
        ..EngineConfig::default()
    };
    let engine = FactorEngine::new(&source, &source, &store, config).unwrap();

    let outcome = engine.compute("f_roa").unwrap();
    assert!(!outcome.is_cached());
    assert!(outcome.table().height() > 0);
    assert!(!store.contains("f_roa").unwrap());
    assert!(store.list().unwrap().is_empty());
}
