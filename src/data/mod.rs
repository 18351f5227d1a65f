/// Data layer: table model, loading, derivation, filtering and export.
///
/// Architecture:
/// ```text
///  .xls / .xlsx bytes
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  decode first sheet → RecordTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  derive   │  birth dates → IDADE_CONCURSO, mean age, histogram
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  quota flags / age threshold → row indices
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  export   │  row subset → .xlsx / .csv bytes
///   └──────────┘
/// ```
///
/// `analysis` runs derive + filter in one pass and holds the results.

pub mod analysis;
pub mod derive;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
