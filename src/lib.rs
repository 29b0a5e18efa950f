//! # tvilling: code clone detection
//!
//! Finds duplicated and near-duplicated code fragments across a set of
//! source files at four increasing levels of abstraction:
//!
//! - **Type 1**: identical token runs
//! - **Type 2**: parameterized (renamed) token runs
//! - **Type 3**: structurally similar blocks with insertions/deletions
//! - **Type 4**: semantically similar blocks that differ in surface form
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                     CLI / Reporters                        │
//! ├────────────────────────────────────────────────────────────┤
//! │  Core Engine   │  Detectors     │  Language  │  I/O        │
//! │                │                │            │             │
//! │ • Pipeline     │ • Exact (1–2)  │ • Lexers   │ • Cache     │
//! │ • Similarity   │ • Tiling (3)   │ • Events   │ • Discovery │
//! │ • Config       │ • Semantic (4) │ • Blocks   │ • Baseline  │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use tvilling::{AnalysisConfig, AnalysisPipeline};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AnalysisConfig::default();
//!     let pipeline = AnalysisPipeline::new(&config);
//!
//!     let result = pipeline
//!         .analyze(&["Sources/App/Main.swift".to_string()])
//!         .await?;
//!
//!     println!("{} clone group(s)", result.clone_groups.len());
//!     Ok(())
//! }
//! ```

#![warn(unsafe_code)]

// Core engine modules
pub mod core {
    //! Core algorithms, configuration, and the analysis pipeline.

    pub mod config;
    pub mod errors;
    pub mod pipeline;
    pub mod results;
    pub mod similarity;
}

// Clone detection engines
pub mod detectors {
    //! The detection engines and their shared building blocks.

    pub mod blocks;
    pub mod exact;
    pub mod normalize;
    pub mod rolling_hash;
    pub mod semantic;
    pub mod structural;
    pub mod tiling;
}

// Language front ends
pub mod lang {
    //! Lexers and the structural front end.

    pub mod c_family;
    pub mod registry;
    pub mod scanner;
    pub mod structure;
    pub mod swift;
    pub mod tokens;
}

// I/O, persistence, and reporting
pub mod io {
    //! Caching, discovery, suppression, baselines, and reports.

    pub mod baseline;
    pub mod cache;
    pub mod discovery;
    pub mod reports;
    pub mod suppression;
}

// Re-export primary types for convenience
pub use crate::core::config::{AnalysisConfig, DetectionThresholds, OutputFormat};
pub use crate::core::errors::{Result, TvillingError};
pub use crate::core::pipeline::AnalysisPipeline;
pub use crate::core::results::{
    AnalysisResults, CloneFragment, CloneGroup, CloneType, PipelineResult,
};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
