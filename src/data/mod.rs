/// Data layer: core types, loading, and filtering.
///
/// Architecture:
/// ```text
///  .parquet / .json / .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file + DatasetSchema → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ Dataset   │  Vec<Record>, domains, extents (read-only, shared)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  per-analysis validity, active categories → indices
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod filter;
