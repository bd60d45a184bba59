/// Data layer: file parsing, filename metadata, and session assembly.
///
/// Architecture:
/// ```text
///  .txt sweep files
///        │
///        ▼
///   ┌──────────┐
///   │  parser   │  decode + normalize + tabulate → SweepTable
///   └──────────┘      meta: filename → frequency label, sample id
///        │
///        ▼
///   ┌──────────┐
///   │ session   │  validate params, fold per-file profiles → SampleResult
///   └──────────┘
/// ```

pub mod meta;
pub mod model;
pub mod parser;
pub mod session;
