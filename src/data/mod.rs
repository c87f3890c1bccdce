/// Data layer: core types, loading, and filtering.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file, validate columns → ComponentTable
///   └──────────┘
///        │
///        ▼
///   ┌────────────────┐
///   │ ComponentTable  │  Vec<Component>, kind, unit
///   └────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  min/max value window → visible indices
///   └──────────┘
///
///   sample: built-in example table and synthetic generator
///   writer: ComponentTable → .csv / .json / .parquet
/// ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod sample;
pub mod writer;
