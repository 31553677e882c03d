//! Catalogue of the raw datasets: where each one lives, how to read it, and
//! the cleaning plan that turns it into `<name>_cleaned.csv`.

use std::path::Path;

use crate::clean::{CellParser, CleaningPlan, CleaningRule};
use crate::data::loader::{DatasetSource, Encoding};
use crate::data::model::Value;

/// Static description of one raw dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawDataset {
    pub name: &'static str,
    pub file: &'static str,
    pub delimiter: u8,
    pub encoding: Encoding,
    /// Semicolon ledgers exported from the shop system carry stray
    /// malformed lines; those are skipped instead of failing the read.
    pub lenient: bool,
}

pub const RETAIL: RawDataset = RawDataset {
    name: "retail",
    file: "Retail.csv",
    delimiter: b',',
    encoding: Encoding::Latin1,
    lenient: false,
};

pub const SELL_1: RawDataset = RawDataset {
    name: "sell_1",
    file: "SELL_1.csv",
    delimiter: b';',
    encoding: Encoding::Latin1,
    lenient: true,
};

pub const ADS: RawDataset = RawDataset {
    name: "ads",
    file: "Ads.csv",
    delimiter: b',',
    encoding: Encoding::Utf8,
    lenient: false,
};

pub const DAY_SELL: RawDataset = RawDataset {
    name: "day_sell",
    file: "Day Sell.csv",
    delimiter: b';',
    encoding: Encoding::Utf8,
    lenient: true,
};

pub const ROTATION: RawDataset = RawDataset {
    name: "rotation",
    file: "Rotation.csv",
    delimiter: b';',
    encoding: Encoding::Latin1,
    lenient: true,
};

pub const MOCK_KAGGLE: RawDataset = RawDataset {
    name: "mock_kaggle",
    file: "Mock Kaggle.csv",
    delimiter: b',',
    encoding: Encoding::Utf8,
    lenient: false,
};

/// Every raw dataset, in cleaning order.
pub const ALL: [RawDataset; 6] = [RETAIL, SELL_1, ADS, DAY_SELL, ROTATION, MOCK_KAGGLE];

const SELL_1_NUMERIC: [&str; 7] = [
    "pce_zn",
    "pwa_sb",
    "pudzsb",
    "pmarza",
    "pmarzajedn",
    "pkwmarza",
    "pudzmarza",
];

const DAY_SELL_METRICS: [&str; 4] = ["zn", "sb", "tax", "marza"];

/// Look a dataset up by name.
pub fn find(name: &str) -> Option<RawDataset> {
    ALL.iter().copied().find(|d| d.name == name)
}

impl RawDataset {
    /// Ingestion descriptor for the file under `raw_dir`.
    pub fn source(&self, raw_dir: &Path) -> DatasetSource {
        let source = DatasetSource::new(self.name, raw_dir.join(self.file))
            .delimiter(self.delimiter)
            .encoding(self.encoding)
            .expect_columns(self.expected_columns());
        if self.lenient {
            source.lenient()
        } else {
            source
        }
    }

    fn expected_columns(&self) -> &'static [&'static str] {
        match self.name {
            "retail" => &[
                "InvoiceNo",
                "Description",
                "CustomerID",
                "InvoiceDate",
                "Quantity",
                "UnitPrice",
            ],
            "sell_1" => &["Pgroup", "Pname", "pce_zn", "Date"],
            "ads" => &["age", "gender", "device_type", "time_of_day", "click"],
            "mock_kaggle" => &["venda", "estoque", "preco"],
            _ => &[],
        }
    }

    /// Cleaning rules for this dataset.
    pub fn plan(&self) -> CleaningPlan {
        let plan = CleaningPlan::new(self.name);
        match self.name {
            "retail" => plan
                .rule(CleaningRule::drop_nulls(&["InvoiceNo", "Description", "CustomerID"]))
                .rule(CleaningRule::coerce(
                    &["InvoiceDate"],
                    CellParser::Date { day_first: false },
                ))
                .rule(CleaningRule::keep_positive("Quantity"))
                .rule(CleaningRule::keep_positive("UnitPrice")),
            "sell_1" => plan
                .rule(CleaningRule::StripHeaders)
                .rule(CleaningRule::drop_nulls(&["Pgroup", "Pname", "pce_zn"]))
                .rule(CleaningRule::coerce(&["Date"], CellParser::Date { day_first: true }))
                .rule(CleaningRule::coerce(&SELL_1_NUMERIC, CellParser::DecimalComma)),
            "ads" => plan
                .rule(CleaningRule::drop_nulls(&["age", "gender", "device_type"]))
                .rule(CleaningRule::FillNull {
                    column: "time_of_day".into(),
                    value: Value::Str("Unknown".into()),
                }),
            "day_sell" => plan
                .rule(CleaningRule::SetHeaders(
                    ["Date", "zn", "sb", "tax", "marza"]
                        .iter()
                        .map(|c| c.to_string())
                        .collect(),
                ))
                .rule(CleaningRule::coerce(&["Date"], CellParser::Date { day_first: true }))
                .rule(CleaningRule::coerce(&DAY_SELL_METRICS, CellParser::DecimalComma)),
            "rotation" => plan
                .rule(CleaningRule::StripHeaders)
                .rule(CleaningRule::DropEmptyRows),
            "mock_kaggle" => plan
                .rule(CleaningRule::rename("date", "data"))
                .rule(CleaningRule::coerce(&["data"], CellParser::Date { day_first: false }))
                .require(&["data", "venda", "estoque", "preco"])
                .rule(CleaningRule::keep_positive("preco")),
            _ => plan,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_dataset_has_a_plan() {
        for dataset in ALL {
            assert_eq!(dataset.plan().dataset, dataset.name);
            assert!(!dataset.plan().rules.is_empty(), "{}", dataset.name);
        }
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(find("day_sell").map(|d| d.file), Some("Day Sell.csv"));
        assert!(find("nope").is_none());
    }

    #[test]
    fn retail_requires_its_identifiers() {
        let required = RETAIL.plan().required_columns();
        assert_eq!(required, ["InvoiceNo", "Description", "CustomerID"]);
    }

    #[test]
    fn source_carries_reader_settings() {
        let source = SELL_1.source(Path::new("raw"));
        assert_eq!(source.path, Path::new("raw/SELL_1.csv"));
        assert_eq!(source.delimiter, b';');
        assert_eq!(source.encoding, Encoding::Latin1);
        assert!(source.lenient);
    }
}
