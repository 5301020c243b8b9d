//! Result post-processing: read, reduce, stitch and derive

pub mod collector;
pub mod export;
pub mod mohr_coulomb;
pub mod principal;
pub mod reader;
pub mod reducer;
pub mod series;
pub mod stitcher;
pub mod store;

pub use collector::{CollectError, CombinedResult, ResultCollector};
pub use export::{export_csv, ExportError};
pub use mohr_coulomb::{extract_cohesion_phi, MohrCoulombError};
pub use principal::calculate_principal_stresses;
pub use reader::{GidResultReader, ReadError, ResultFile, ResultRecord};
pub use reducer::{reduce_stage, ReducedStageResult, StressTensor, TensorSeries};
pub use series::{series_for, PlotSeries};
pub use stitcher::{combine_cumulative, concatenate_time_hours};
pub use store::ResultStore;
