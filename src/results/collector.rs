//! Multi-stage result collection
//!
//! Reads one result file per stage, reduces each, stitches the stages and
//! derives principal stresses once over the merged tensor series.

use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::logger::Logger;
use crate::results::mohr_coulomb::{extract_cohesion_phi, MohrCoulombError};
use crate::results::principal::calculate_principal_stresses;
use crate::results::reader::{GidResultReader, ReadError};
use crate::results::reducer::{reduce_stage, ReducedStageResult, TensorSeries};
use crate::results::stitcher::{combine_cumulative, concatenate, concatenate_time_hours};

#[derive(Debug, Error)]
pub enum CollectError {
    #[error(transparent)]
    Read(#[from] ReadError),

    #[error(transparent)]
    MohrCoulomb(#[from] MohrCoulombError),
}

/// Final series of a run, consumed by renderers and export
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CombinedResult {
    /// Cumulative over stages
    pub yy_strain: Vec<f64>,
    pub vol_strain: Vec<f64>,
    /// Most compressive principal stress
    pub sigma1: Vec<f64>,
    /// Least compressive principal stress
    pub sigma3: Vec<f64>,
    pub shear_xy: Vec<f64>,
    pub shear_strain_xy: Vec<f64>,
    pub mean_stress: Vec<f64>,
    pub von_mises: Vec<f64>,
    pub cohesion: Option<f64>,
    pub phi: Option<f64>,
    pub sigma_xx: Vec<f64>,
    pub sigma_yy: Vec<f64>,
    pub time_steps_hours: Vec<f64>,
}

impl CombinedResult {
    /// Stitch reduced stages in stage order; cohesion and phi are left unset
    pub fn from_stages(stages: &[ReducedStageResult]) -> Self {
        let gather = |f: fn(&ReducedStageResult) -> &Vec<f64>| per_stage(stages, f);

        let mut tensors = TensorSeries::new();
        for stage in stages {
            tensors.extend(&stage.tensors);
        }
        let (sigma1, sigma3) = calculate_principal_stresses(&tensors);

        Self {
            yy_strain: combine_cumulative(&gather(|s| &s.yy_strain)),
            vol_strain: concatenate(&gather(|s| &s.vol_strain)),
            sigma1,
            sigma3,
            shear_xy: concatenate(&gather(|s| &s.shear_xy)),
            shear_strain_xy: concatenate(&gather(|s| &s.shear_strain_xy)),
            mean_stress: concatenate(&gather(|s| &s.mean_stress)),
            von_mises: concatenate(&gather(|s| &s.von_mises)),
            cohesion: None,
            phi: None,
            sigma_xx: concatenate(&gather(|s| &s.sigma_xx)),
            sigma_yy: concatenate(&gather(|s| &s.sigma_yy)),
            time_steps_hours: concatenate_time_hours(&gather(|s| &s.time_steps)),
        }
    }

    pub fn with_cohesion_phi(mut self, cohesion: Option<f64>, phi: Option<f64>) -> Self {
        self.cohesion = cohesion;
        self.phi = phi;
        self
    }

    /// `|sigma1 - sigma3|` per step
    pub fn deviatoric_stress(&self) -> Vec<f64> {
        self.sigma1
            .iter()
            .zip(&self.sigma3)
            .map(|(s1, s3)| (s1 - s3).abs())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.yy_strain.is_empty() && self.sigma1.is_empty() && self.von_mises.is_empty()
    }
}

fn per_stage(
    stages: &[ReducedStageResult],
    field: fn(&ReducedStageResult) -> &Vec<f64>,
) -> Vec<Vec<f64>> {
    stages.iter().map(|s| field(s).clone()).collect()
}

/// Collects the results of a set of stage files
pub struct ResultCollector<'a> {
    paths: Vec<PathBuf>,
    logger: &'a dyn Logger,
}

impl<'a> ResultCollector<'a> {
    pub fn new(paths: Vec<PathBuf>, logger: &'a dyn Logger) -> Self {
        Self { paths, logger }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Read and reduce one stage file
    pub fn collect_stage(&self, path: &Path) -> Result<ReducedStageResult, ReadError> {
        let file = GidResultReader::new(self.logger).read(path)?;
        Ok(reduce_stage(&file, self.logger))
    }

    /// Read and reduce every stage file, in order
    pub fn collect_stages(&self) -> Result<Vec<ReducedStageResult>, ReadError> {
        self.paths.iter().map(|p| self.collect_stage(p)).collect()
    }

    /// Full collection including the Mohr-Coulomb lookup
    pub fn collect(
        &self,
        material_parameters: &[f64],
        cohesion_phi_indices: Option<(usize, usize)>,
    ) -> Result<CombinedResult, CollectError> {
        let stages = self.collect_stages()?;
        let (cohesion, phi) = extract_cohesion_phi(material_parameters, cohesion_phi_indices)?;
        Ok(CombinedResult::from_stages(&stages).with_cohesion_phi(cohesion, phi))
    }
}
