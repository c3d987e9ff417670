//! `spinsep-data` — Fermi-Hubbard problem parameters and experiment records.
//!
//! Experiments are persisted one JSON file per instance and grouped into
//! directories by interaction strength:
//!
//! ```text
//! data/
//! ├── 0.0/
//! │   ├── line-r0c0-0.json
//! │   └── line-r2c1-0.json
//! └── 4.0/
//!     └── line-r0c0-0.json
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use spinsep_data::{group_compatible, load_dataset};
//!
//! let dataset = load_dataset(std::path::Path::new("data")).unwrap();
//! for group in dataset.into_groups() {
//!     let instances = group_compatible(group.experiments);
//!     println!("u = {}: {} problem instances", group.label, instances.len());
//! }
//! ```

pub mod dataset;
pub mod error;
pub mod experiment;
pub mod parameters;

pub use dataset::{Dataset, DatasetGroup, group_compatible, load_dataset, save_group};
pub use error::{DataError, DataResult};
pub use experiment::{Counts, ExperimentResult, TrotterRun};
pub use parameters::{
    ChainInitialState, Couplings, FermiHubbardParameters, Hamiltonian,
    IndependentChainsInitialState, Layout, LayoutKind,
};
