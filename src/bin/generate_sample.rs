//! Writes deterministic demo raw files, in the same layouts and encodings as
//! the real exports, so the whole pipeline can run without them.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Days, NaiveDate};
use clap::Parser;
use parquet::arrow::ArrowWriter;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

#[derive(Parser, Debug)]
#[command(about = "Generate demo raw datasets")]
struct Args {
    /// Output directory
    #[arg(short, long, default_value = "data/raw")]
    out_dir: PathBuf,

    #[arg(long, default_value = "42")]
    seed: u64,

    /// Also write the ads table as Parquet
    #[arg(long)]
    parquet: bool,
}

/// Normal deviate via Box-Muller.
fn gauss(rng: &mut StdRng, mean: f64, std_dev: f64) -> f64 {
    let u1: f64 = rng.gen::<f64>().max(1e-15);
    let u2: f64 = rng.gen();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    mean + std_dev * z
}

/// Polish-style number: space thousands separator, decimal comma.
fn decimal_comma(v: f64) -> String {
    let s = format!("{:.2}", v.abs());
    let (int, frac) = s.split_once('.').unwrap_or((s.as_str(), "00"));
    let mut grouped = String::new();
    for (i, c) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(c);
    }
    let sign = if v < 0.0 { "-" } else { "" };
    format!("{sign}{grouped},{frac}")
}

/// ISO-8859-1 bytes; characters outside Latin-1 become `?`.
fn to_latin1(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

fn write_delimited(
    path: &Path,
    delimiter: u8,
    latin1: bool,
    header: &[&str],
    rows: &[Vec<String>],
) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_writer(Vec::new());
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row)?;
    }
    let bytes = writer.into_inner().context("flushing csv buffer")?;
    let bytes = if latin1 {
        to_latin1(&String::from_utf8(bytes)?)
    } else {
        bytes
    };
    fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
    println!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

fn day(start: NaiveDate, offset: u64) -> NaiveDate {
    start.checked_add_days(Days::new(offset)).unwrap_or(start)
}

// ---------------------------------------------------------------------------
// Datasets
// ---------------------------------------------------------------------------

fn retail(rng: &mut StdRng) -> Vec<Vec<String>> {
    let products = [
        ("85123A", "WHITE HANGING HEART T-LIGHT HOLDER", 2.55),
        ("71053", "WHITE METAL LANTERN", 3.39),
        ("84406B", "CRÈME CUPID HEARTS COAT HANGER", 2.75),
        ("22633", "HAND WARMER UNION JACK", 1.85),
        ("22752", "SET 7 BABUSHKA NESTING BOXES", 7.65),
        ("21730", "GLASS STAR FROSTED T-LIGHT HOLDER", 4.25),
    ];
    let start = NaiveDate::from_ymd_opt(2010, 12, 1).unwrap_or_default();
    let mut rows = Vec::new();
    let mut invoice = 536365;
    for customer in 0..60u32 {
        // Spend profile: a few heavy buyers, many light ones.
        let visits = 1 + (customer % 7) as usize + usize::from(customer % 13 == 0) * 10;
        let basket = if customer % 5 == 0 { 24 } else { 6 };
        for _ in 0..visits {
            invoice += 1;
            let date = day(start, rng.gen_range(0..373));
            let hour = rng.gen_range(8..18);
            let minute = rng.gen_range(0..60);
            for _ in 0..rng.gen_range(1..4) {
                let (code, desc, price) = products[rng.gen_range(0..products.len())];
                let returned = rng.gen_bool(0.03);
                let qty = rng.gen_range(1..=basket) as i64;
                let customer_id = if rng.gen_bool(0.05) {
                    String::new()
                } else {
                    (12346 + customer).to_string()
                };
                rows.push(vec![
                    if returned { format!("C{invoice}") } else { invoice.to_string() },
                    code.to_string(),
                    desc.to_string(),
                    (if returned { -qty } else { qty }).to_string(),
                    format!("{} {hour}:{minute:02}", date.format("%-m/%-d/%Y")),
                    format!("{price:.2}"),
                    customer_id,
                    "United Kingdom".to_string(),
                ]);
            }
        }
    }
    rows
}

fn sell_1(rng: &mut StdRng) -> Vec<Vec<String>> {
    let products = [
        ("Napoje", "Woda zródlana 1,5L"),
        ("Napoje", "Sok jablkowy"),
        ("Pieczywo", "Chleb zytni"),
        ("Nabial", "Maslo extra"),
    ];
    let start = NaiveDate::from_ymd_opt(2019, 1, 1).unwrap_or_default();
    (0..200u64)
        .map(|i| {
            let (group, name) = products[(i % 4) as usize];
            let price = gauss(rng, 5.0 + (i % 4) as f64 * 3.0, 0.4).max(0.5);
            let cost = price * 0.75;
            let qty = rng.gen_range(1..40) as f64;
            vec![
                day(start, i / 2).format("%d.%m.%Y").to_string(),
                group.to_string(),
                name.to_string(),
                decimal_comma(price),
                decimal_comma(cost * qty),
                decimal_comma(price * qty),
                decimal_comma(price - cost),
                decimal_comma((price - cost) / price * 100.0),
                decimal_comma((price - cost) * qty),
                decimal_comma(0.25),
            ]
        })
        .collect()
}

fn ads(rng: &mut StdRng) -> Vec<Vec<String>> {
    let first = ["Anna", "Jan", "Maria", "Piotr", "Kasia", "Tomasz"];
    let devices = ["Mobile", "Desktop", "Tablet"];
    let positions = ["Top", "Side", "Bottom"];
    let history = ["Shopping", "News", "Entertainment", "Education", "Social Media"];
    let slots = ["Morning", "Afternoon", "Evening", "Night"];
    (0..400)
        .map(|i| {
            let age = rng.gen_range(18..65);
            let device = *devices.choose(rng).unwrap_or(&"Mobile");
            let position = *positions.choose(rng).unwrap_or(&"Top");
            let slot = *slots.choose(rng).unwrap_or(&"Morning");
            let mut p = 0.25;
            if device == "Mobile" {
                p += 0.2;
            }
            if position == "Top" {
                p += 0.15;
            }
            if age < 30 {
                p += 0.1;
            }
            let click = rng.gen_bool(p);
            vec![
                (1000 + i).to_string(),
                format!("{} {}", first[i % first.len()], i),
                if rng.gen_bool(0.03) { String::new() } else { age.to_string() },
                if i % 2 == 0 { "Female" } else { "Male" }.to_string(),
                device.to_string(),
                position.to_string(),
                history.choose(rng).unwrap_or(&"News").to_string(),
                if rng.gen_bool(0.05) { String::new() } else { slot.to_string() },
                u8::from(click).to_string(),
            ]
        })
        .collect()
}

fn day_sell(rng: &mut StdRng) -> Vec<Vec<String>> {
    let start = NaiveDate::from_ymd_opt(2019, 3, 1).unwrap_or_default();
    let weekly = [1.0, 0.9, 0.95, 1.05, 1.3, 1.6, 0.7];
    (0..120u64)
        .filter(|d| d % 17 != 5)
        .map(|d| {
            let base = (12_000.0 + 25.0 * d as f64) * weekly[(d % 7) as usize];
            let zn = gauss(rng, base, base * 0.03);
            let sb = zn * 1.08;
            let tax = sb - zn;
            let marza = zn * 0.22;
            vec![
                day(start, d).format("%d.%m.%Y").to_string(),
                decimal_comma(zn),
                decimal_comma(sb),
                decimal_comma(tax),
                decimal_comma(marza),
            ]
        })
        .collect()
}

fn rotation(rng: &mut StdRng) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    for i in 0..80 {
        if i % 20 == 19 {
            rows.push(vec![String::new(); 4]);
            continue;
        }
        rows.push(vec![
            format!("P{:04}", i),
            format!("Towar nr {i} · strefa {}", i % 6),
            rng.gen_range(0..500).to_string(),
            decimal_comma(rng.gen_range(0.5..30.0)),
        ]);
    }
    rows
}

fn mock_kaggle(rng: &mut StdRng) -> Vec<Vec<String>> {
    let start = NaiveDate::from_ymd_opt(2014, 1, 1).unwrap_or_default();
    let mut stock: i64 = 1500;
    (0..365u64)
        .map(|d| {
            let price = (1.2 + 0.3 * ((d as f64) / 30.0).sin() + gauss(rng, 0.0, 0.05)).max(0.0);
            let sales = (gauss(rng, 120.0 - 40.0 * price, 10.0)).max(0.0).round() as i64;
            stock = (stock - sales).max(0);
            if stock < 200 {
                stock += 1500;
            }
            vec![
                day(start, d).format("%Y-%m-%d").to_string(),
                sales.to_string(),
                stock.to_string(),
                format!("{price:.2}"),
            ]
        })
        .collect()
}

/// Ads rows as one Arrow batch: numeric columns as Int64, the rest as Utf8.
fn ads_batch(header: &[&str], rows: &[Vec<String>]) -> Result<RecordBatch> {
    let numeric = ["id", "age", "click"];
    let mut fields = Vec::with_capacity(header.len());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(header.len());
    for (c, name) in header.iter().enumerate() {
        let cells = rows.iter().map(|r| r[c].as_str());
        if numeric.contains(name) {
            fields.push(Field::new(*name, DataType::Int64, true));
            let values: Int64Array = cells.map(|s| s.parse::<i64>().ok()).collect();
            columns.push(Arc::new(values));
        } else {
            fields.push(Field::new(*name, DataType::Utf8, true));
            let values: StringArray = cells.map(|s| (!s.is_empty()).then_some(s)).collect();
            columns.push(Arc::new(values));
        }
    }
    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

fn write_parquet(path: &Path, batch: &RecordBatch) -> Result<()> {
    let file = fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(batch)?;
    writer.close()?;
    println!("Wrote {} rows to {}", batch.num_rows(), path.display());
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {}", args.out_dir.display()))?;
    let mut rng = StdRng::seed_from_u64(args.seed);
    let out = |file: &str| args.out_dir.join(file);

    write_delimited(
        &out("Retail.csv"),
        b',',
        true,
        &[
            "InvoiceNo",
            "StockCode",
            "Description",
            "Quantity",
            "InvoiceDate",
            "UnitPrice",
            "CustomerID",
            "Country",
        ],
        &retail(&mut rng),
    )?;
    write_delimited(
        &out("SELL_1.csv"),
        b';',
        true,
        &[
            " Date", "Pgroup", "Pname ", "pce_zn", "pwa_sb", "pudzsb", "pmarza", "pmarzajedn",
            "pkwmarza", "pudzmarza",
        ],
        &sell_1(&mut rng),
    )?;

    let ads_header = [
        "id",
        "full_name",
        "age",
        "gender",
        "device_type",
        "ad_position",
        "browsing_history",
        "time_of_day",
        "click",
    ];
    let ads_rows = ads(&mut rng);
    write_delimited(&out("Ads.csv"), b',', false, &ads_header, &ads_rows)?;
    if args.parquet {
        write_parquet(&out("Ads.parquet"), &ads_batch(&ads_header, &ads_rows)?)?;
    }

    write_delimited(
        &out("Day Sell.csv"),
        b';',
        false,
        &["Data", "Zn", "Sb", "Tax", "Marza"],
        &day_sell(&mut rng),
    )?;
    write_delimited(
        &out("Rotation.csv"),
        b';',
        true,
        &[" Kod", "Nazwa ", " Ilosc ", "Rotacja"],
        &rotation(&mut rng),
    )?;
    write_delimited(
        &out("Mock Kaggle.csv"),
        b',',
        false,
        &["data", "venda", "estoque", "preco"],
        &mock_kaggle(&mut rng),
    )?;
    Ok(())
}
