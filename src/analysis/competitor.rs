use log::info;

use super::{parse_dates, Output};
use crate::config::DashboardConfig;
use crate::data::model::Table;
use crate::error::Result;

const RENAMES: [(&str, &str); 4] = [
    ("data", "Date"),
    ("venda", "Sales"),
    ("estoque", "Stock"),
    ("preco", "Price"),
];

/// English headers, rows in date order.
pub fn competitor_data(table: Table) -> Table {
    let table = table.rename_columns(|c| {
        RENAMES
            .iter()
            .find(|(from, _)| *from == c)
            .map(|(_, to)| to.to_string())
            .unwrap_or_else(|| c.to_string())
    });
    parse_dates(table, "Date").sort_by_column("Date")
}

pub fn run(mock_kaggle: Table, config: &DashboardConfig) -> Result<Vec<Output>> {
    let table = competitor_data(mock_kaggle);
    info!("competitor: {} rows", table.len());
    Ok(vec![Output::new(config.processed_path("competitor_data.csv"), table)])
}
