//! Integration tests for the cleaning and analysis pipeline

use std::fs;
use std::path::Path;

use bizdash::analysis::price_sensitivity::regress;
use bizdash::analysis::sales_forecast::forecast_table;
use bizdash::clean::clean;
use bizdash::datasets;
use bizdash::model::forecast::resample_daily;
use bizdash::{load_table, run_all, write_csv, DashboardConfig, DatasetSource, Table, Value};
use tempfile::TempDir;

fn config(dir: &Path) -> DashboardConfig {
    DashboardConfig {
        raw_dir: dir.join("raw"),
        processed_dir: dir.join("processed"),
        outputs_dir: dir.join("outputs"),
        data_dir: dir.join("data"),
        n_trees: 10,
        ..Default::default()
    }
}

fn weekly_csv(days: u64, skip: Option<u64>) -> String {
    let pattern = [10.0, 12.0, 14.0, 16.0, 14.0, 12.0, 10.0];
    let mut csv = String::from("Date,zn\n");
    for d in (0..days).filter(|d| Some(*d) != skip) {
        csv.push_str(&format!("2024-01-{:02},{}\n", d + 1, pattern[(d % 7) as usize]));
    }
    csv
}

fn read(dir: &TempDir, name: &str, content: &str) -> Table {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    load_table(&DatasetSource::new("fixture", path)).unwrap()
}

#[test]
fn retail_rows_without_customer_are_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Retail.csv");
    fs::write(
        &path,
        b"InvoiceNo,Description,CustomerID,InvoiceDate,Quantity,UnitPrice\n\
          536365,LANTERN,17850,12/1/2010 8:26,6,2.55\n\
          536366,CR\xC8ME HANGER,,12/1/2010 8:28,6,1.85\n\
          536367,HAND WARMER,13047,12/1/2010 8:34,8,2.75\n\
          536368,NESTING BOXES,12345,12/2/2010 10:15,2,7.65\n",
    )
    .unwrap();

    let source = datasets::RETAIL.source(dir.path());
    let raw = load_table(&source).unwrap();
    assert_eq!(raw.len(), 4);
    assert_eq!(raw.get(1, "Description").unwrap().to_string(), "CRÈME HANGER");

    let cleaned = clean(raw, &datasets::RETAIL.plan()).unwrap();
    assert_eq!(cleaned.len(), 3);
    assert!(cleaned
        .column("CustomerID")
        .unwrap()
        .all(|v| !v.is_missing()));
    assert_eq!(
        cleaned.get(2, "InvoiceDate").unwrap().to_string(),
        "2010-12-02 10:15:00"
    );
}

#[test]
fn clicks_fall_as_price_rises() {
    let dir = tempfile::tempdir().unwrap();
    let table = read(&dir, "prices.csv", "price,click\n10,1\n20,1\n30,0\n40,0\n");
    let (fit, out) = regress(table, "price", "click").unwrap();
    assert!(fit.slope < 0.0);
    assert_eq!(out.len(), 4);
}

#[test]
fn weekly_pattern_survives_a_missing_day() {
    let dir = tempfile::tempdir().unwrap();
    // Day 9 (pattern index 1) is absent; its neighbours are 10 and 14.
    let raw = read(&dir, "daily.csv", &weekly_csv(21, Some(8)));
    assert_eq!(raw.len(), 20);

    let dated = raw.clone().map_column("Date", |v| {
        bizdash::clean::CellParser::Date { day_first: false }.parse(v)
    });
    let series = resample_daily(&dated, "Date", &["zn"]).unwrap();
    assert_eq!(series.len(), 21);
    assert!(series.metric("zn").unwrap().iter().all(|v| v.is_finite()));
    assert_eq!(series.metric("zn").unwrap()[8], 12.0);

    let forecast = forecast_table(raw, &["zn"], 14).unwrap();
    assert_eq!(forecast.len(), 14);
    let pattern = [10.0, 12.0, 14.0, 16.0, 14.0, 12.0, 10.0];
    for h in 0..14 {
        let v = forecast.get(h, "zn").and_then(Value::as_f64).unwrap();
        assert!((v - pattern[(21 + h) % 7]).abs() < 1e-6, "day {h}: {v}");
    }
    assert_eq!(forecast.get(0, "Date").unwrap().to_string(), "2024-01-22");
}

#[test]
fn persist_then_reingest_keeps_shape() {
    let dir = tempfile::tempdir().unwrap();
    let table = Table::from_rows(
        vec!["b".into(), "a".into(), "when".into()],
        vec![
            vec![Value::Float(1.5), Value::Str("x, y".into()), Value::Null],
            vec![Value::Int(2), Value::Str("z".into()), Value::Str("2024-01-01".into())],
        ],
    );
    let path = dir.path().join("out.csv");
    write_csv(&table, &path).unwrap();

    let back = load_table(&DatasetSource::new("out", &path)).unwrap();
    assert_eq!(back.columns(), table.columns());
    assert_eq!(back.len(), table.len());
    assert_eq!(back.get(0, "a"), Some(&Value::Str("x, y".into())));
    assert_eq!(back.get(0, "when"), Some(&Value::Null));
}

fn reload(path: &Path) -> Table {
    load_table(&DatasetSource::new("output", path)).unwrap()
}

fn write_raw_fixtures(raw: &Path) {
    fs::create_dir_all(raw).unwrap();

    let mut retail =
        String::from("InvoiceNo,Description,CustomerID,InvoiceDate,Quantity,UnitPrice\n");
    for c in 0..8u32 {
        for v in 0..=c {
            retail.push_str(&format!(
                "{},ITEM {v},{},{}/{}/2011 10:00,{},{}.5\n",
                1000 + c * 10 + v,
                12000 + c,
                1 + (c + v) % 12,
                1 + v * 3 % 28,
                1 + c * v,
                1 + c
            ));
        }
    }
    retail.push_str("9999,RETURN,12000,1/5/2011 10:00,-3,2.5\n");
    fs::write(raw.join("Retail.csv"), retail).unwrap();

    fs::write(
        raw.join("SELL_1.csv"),
        concat!(
            " Date;Pgroup;Pname ;pce_zn;pwa_sb\n",
            "01.02.2019;Napoje;Sok;4,50;1 234,10\n",
            "02.02.2019;Napoje;Woda;;3,00\n",
        ),
    )
    .unwrap();

    let devices = ["Mobile", "Desktop", "Tablet"];
    let mut ads = String::from("id,full_name,age,gender,device_type,time_of_day,click\n");
    for i in 0..30 {
        ads.push_str(&format!(
            "{i},User {i},{},{},{},{},{}\n",
            18 + i,
            if i % 2 == 0 { "Female" } else { "Male" },
            devices[i % 3],
            if i % 7 == 0 { "" } else { "Morning" },
            usize::from(i % 3 == 0 || i < 8)
        ));
    }
    fs::write(raw.join("Ads.csv"), ads).unwrap();

    const WEEKDAY_SWING: [f64; 7] = [0.0, 50.0, 80.0, 20.0, -30.0, -60.0, -10.0];
    let mut day_sell = String::from("Data;Zn;Sb;Tax;Marza\n");
    for d in 0..28u32 {
        let zn = 1000.0 + 10.0 * d as f64 + WEEKDAY_SWING[(d % 7) as usize];
        day_sell.push_str(&format!(
            "{:02}.03.2019;{};{};{};{}\n",
            d + 1,
            format!("{:.2}", zn).replace('.', ","),
            format!("{:.2}", zn * 1.08).replace('.', ","),
            format!("{:.2}", zn * 0.08).replace('.', ","),
            format!("{:.2}", zn * 0.2).replace('.', ","),
        ));
    }
    fs::write(raw.join("Day Sell.csv"), day_sell).unwrap();

    fs::write(raw.join("Rotation.csv"), b" Kod ;Nazwa\nP1;Towar\n;\nP2;G\xF3ra\n").unwrap();

    fs::write(
        raw.join("Mock Kaggle.csv"),
        "date,venda,estoque,preco\n2014-01-03,5,100,1.2\n2014-01-01,7,90,1.1\n2014-01-02,6,80,0\n",
    )
    .unwrap();
}

#[test]
fn full_run_writes_every_output() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    write_raw_fixtures(&config.raw_dir);

    let report = run_all(&config);
    assert!(report.is_success(), "{report}");

    for dataset in datasets::ALL {
        assert!(config.cleaned_path(dataset.name).is_file(), "{}", dataset.name);
    }
    for file in [
        "customer_segments.csv",
        "segment_summary.csv",
        "clv.csv",
        "price_sensitivity.csv",
        "ad_campaign_predictions.csv",
        "feature_importance.csv",
        "sales_forecast.csv",
        "competitor_data.csv",
    ] {
        assert!(config.processed_path(file).is_file(), "{file}");
    }
    assert!(config.data_path("final_output.csv").is_file());

    let segments = reload(&config.processed_path("customer_segments.csv"));
    assert_eq!(
        segments.columns(),
        ["CustomerID", "Recency", "Frequency", "Monetary", "Cluster", "Segment"]
    );
    assert_eq!(segments.len(), 8);

    let forecast = reload(&config.processed_path("sales_forecast.csv"));
    assert_eq!(forecast.columns(), ["Date", "zn", "sb", "tax", "marza"]);
    assert_eq!(forecast.len(), 30);
    assert_eq!(forecast.get(0, "Date").unwrap().to_string(), "2019-03-29");

    let competitor = reload(&config.processed_path("competitor_data.csv"));
    assert_eq!(competitor.columns(), ["Date", "Sales", "Stock", "Price"]);
    // The zero-price day is filtered out during cleaning.
    assert_eq!(competitor.len(), 2);
    assert_eq!(competitor.get(0, "Sales"), Some(&Value::Int(7)));

    let rotation = reload(&config.cleaned_path("rotation"));
    assert_eq!(rotation.columns(), ["Kod", "Nazwa"]);
    assert_eq!(rotation.len(), 2);
    assert_eq!(rotation.get(1, "Nazwa").unwrap().to_string(), "Góra");

    let segment_files = fs::read_dir(&config.outputs_dir).unwrap().count();
    assert!(segment_files >= 1);
}
