/// Data layer: the measurement-processing pipeline, UI-independent.
///
/// Architecture:
/// ```text
///   raw .csv / .txt bytes
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  preconditions, DATA sentinel, row parsing → ParseResult
///   └──────────┘
///        │  sorted Vec<DataPoint>
///        ▼
///   ┌──────────┐     ┌──────────┐
///   │  bands    │     │  peaks    │  on-demand local-maxima detection
///   └──────────┘     └──────────┘
///        │  Option<Band>
///        ▼
///   ┌──────────┐
///   │  noise    │  absolute (1–99) and band-relative (1–10) scoring
///   └──────────┘
///        │
///        ▼
///   Dataset::assemble  →  the record the UI overlays
/// ```
///
/// Everything here is plain input → plain output: no shared mutable state,
/// no suspension mid-computation, failures returned as values.
pub mod bands;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
pub mod noise;
pub mod peaks;
