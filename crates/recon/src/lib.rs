//! `servant-recon`: Servant name reconciliation engine.
//!
//! Maps wiki servant records onto a target catalog's identifiers through an
//! ordered matching cascade, and projects the matched attributes for display.
//!
//! Pure engine crate: receives pre-loaded documents, returns results.
//! No CLI or IO dependencies.

pub mod config;
pub mod engine;
pub mod error;
pub mod expand;
pub mod ingest;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod overrides;
pub mod persist;
pub mod project;
pub mod residual;
pub mod similarity;

pub use config::ReconConfig;
pub use engine::run;
pub use error::ReconError;
pub use matcher::Reconciler;
pub use model::{ReconInput, ReconResult};
pub use normalize::{normalize, Normalizer};
pub use overrides::Overrides;
