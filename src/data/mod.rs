/// Data layer: core types, loading, filtering and persisting.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  DatasetSource → Table
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Table    │  ordered columns, rows of Value
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  numeric predicates → row indices
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  writer   │  Table → .csv (atomic replace)
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod preview;
pub mod writer;

pub use loader::{load_table, DatasetSource, Encoding};
pub use model::{Table, Value};
pub use writer::{stage_csv, write_all, write_csv, StagedCsv};
