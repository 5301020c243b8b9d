//! Reduction of one stage's raw records into engineering series
//!
//! All extraction works on the first reported value of a record: the solver
//! reports one representative element per time step for these fields.

use nalgebra::Matrix3;
use serde::Serialize;

use crate::core::logger::Logger;
use crate::results::reader::{PointValue, ResultFile, ResultRecord};

pub const CAUCHY_STRESS_TENSOR: &str = "CAUCHY_STRESS_TENSOR";
pub const ENGINEERING_STRAIN_TENSOR: &str = "ENGINEERING_STRAIN_TENSOR";
pub const MEAN_EFFECTIVE_STRESS: &str = "MEAN_EFFECTIVE_STRESS";
pub const VON_MISES_STRESS: &str = "VON_MISES_STRESS";
pub const DISPLACEMENT: &str = "DISPLACEMENT";

/// Voigt positions `[xx, yy, zz, xy, yz, zx]`
const XX: usize = 0;
const YY: usize = 1;
const ZZ: usize = 2;
const XY: usize = 3;
const YZ: usize = 4;
const ZX: usize = 5;

/// Scalars are read from this Gauss point row
const SCALAR_GAUSS_POINT: usize = 1;

/// Symmetric 3x3 stress state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StressTensor(Matrix3<f64>);

impl StressTensor {
    /// Build from a Voigt vector `[xx, yy, zz, xy, yz, zx]`
    ///
    /// Plane-strain output may stop after `xy`; missing out-of-plane shear
    /// components are taken as zero. Fewer than four components is rejected.
    pub fn from_voigt(v: &[f64]) -> Option<Self> {
        if v.len() <= XY {
            return None;
        }
        let at = |i: usize| v.get(i).copied().unwrap_or(0.0);
        Some(Self(Matrix3::new(
            at(XX),
            at(XY),
            at(ZX),
            at(XY),
            at(YY),
            at(YZ),
            at(ZX),
            at(YZ),
            at(ZZ),
        )))
    }

    /// Isotropic stress `p` on the diagonal
    pub fn isotropic(p: f64) -> Self {
        Self(Matrix3::from_diagonal_element(p))
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.0
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.0[(row, col)]
    }
}

/// Stress tensors grouped by report time, in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TensorSeries {
    entries: Vec<(f64, Vec<StressTensor>)>,
}

impl TensorSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, time: f64, tensor: StressTensor) {
        match self.entries.iter_mut().find(|(t, _)| *t == time) {
            Some((_, tensors)) => tensors.push(tensor),
            None => self.entries.push((time, vec![tensor])),
        }
    }

    /// Merge another series; tensors at an existing time are appended after the present ones
    pub fn extend(&mut self, other: &TensorSeries) {
        for (time, tensors) in &other.entries {
            for tensor in tensors {
                self.push(*time, *tensor);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of tensors over all times
    pub fn len(&self) -> usize {
        self.entries.iter().map(|(_, t)| t.len()).sum()
    }

    /// Entries in ascending time order
    pub fn sorted(&self) -> Vec<(f64, &[StressTensor])> {
        let mut sorted: Vec<(f64, &[StressTensor])> = self
            .entries
            .iter()
            .map(|(t, tensors)| (*t, tensors.as_slice()))
            .collect();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));
        sorted
    }
}

/// Reduced series of one stage
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReducedStageResult {
    pub yy_strain: Vec<f64>,
    pub vol_strain: Vec<f64>,
    pub shear_strain_xy: Vec<f64>,
    pub von_mises: Vec<f64>,
    pub mean_stress: Vec<f64>,
    pub sigma_xx: Vec<f64>,
    pub sigma_yy: Vec<f64>,
    pub shear_xy: Vec<f64>,
    /// Seconds
    pub time_steps: Vec<f64>,
    #[serde(skip)]
    pub tensors: TensorSeries,
}

/// Records of one stage sorted into the variables the reducer uses
#[derive(Debug, Default)]
pub struct StageBuckets<'a> {
    pub stress: Vec<&'a ResultRecord>,
    pub strain: Vec<&'a ResultRecord>,
    pub mean_stress: Vec<&'a ResultRecord>,
    pub von_mises: Vec<&'a ResultRecord>,
    pub displacement: Vec<&'a ResultRecord>,
}

impl<'a> StageBuckets<'a> {
    /// Sort records by variable
    ///
    /// Mean and von Mises stress are only taken from elements reporting a
    /// scalar at three Gauss points.
    pub fn from_file(file: &'a ResultFile) -> Self {
        let mut buckets = Self::default();
        for (name, records) in file.iter() {
            for record in records {
                match name {
                    CAUCHY_STRESS_TENSOR => buckets.stress.push(record),
                    ENGINEERING_STRAIN_TENSOR => buckets.strain.push(record),
                    DISPLACEMENT => buckets.displacement.push(record),
                    MEAN_EFFECTIVE_STRESS if all_tri3_scalars(record) => {
                        buckets.mean_stress.push(record)
                    }
                    VON_MISES_STRESS if all_tri3_scalars(record) => {
                        buckets.von_mises.push(record)
                    }
                    _ => {}
                }
            }
        }
        buckets
    }
}

fn all_tri3_scalars(record: &ResultRecord) -> bool {
    record.values.iter().all(PointValue::is_tri3_scalar)
}

fn first_components(record: &ResultRecord) -> Option<&[f64]> {
    record.values.first().and_then(PointValue::first_row)
}

/// Stress tensors keyed by time
pub fn extract_stress_tensors(stress: &[&ResultRecord]) -> TensorSeries {
    let mut series = TensorSeries::new();
    for record in stress {
        if let Some(tensor) = first_components(record).and_then(StressTensor::from_voigt) {
            series.push(record.time, tensor);
        }
    }
    series
}

/// Shear stress `xy` per record
pub fn extract_shear_stress_xy(stress: &[&ResultRecord]) -> Vec<f64> {
    stress
        .iter()
        .filter_map(|r| first_components(r).and_then(|c| c.get(XY).copied()))
        .collect()
}

/// `(sigma_xx, sigma_yy)` per record
pub fn extract_sigma_xx_yy(stress: &[&ResultRecord]) -> (Vec<f64>, Vec<f64>) {
    stress
        .iter()
        .filter_map(|r| first_components(r).filter(|c| c.len() > YY))
        .map(|c| (c[XX], c[YY]))
        .unzip()
}

/// Vertical, volumetric and shear strain per record
pub struct StrainSeries {
    pub yy: Vec<f64>,
    pub vol: Vec<f64>,
    pub shear_xy: Vec<f64>,
}

pub fn compute_strains(strain: &[&ResultRecord]) -> StrainSeries {
    let mut series = StrainSeries {
        yy: Vec::new(),
        vol: Vec::new(),
        shear_xy: Vec::new(),
    };
    for record in strain {
        let Some(e) = first_components(record).filter(|c| c.len() > XY) else {
            continue;
        };
        series.vol.push(e[XX] + e[YY] + e[ZZ]);
        series.yy.push(e[YY]);
        series.shear_xy.push(e[XY]);
    }
    series
}

/// Scalar of the second Gauss point of the first element
pub fn compute_scalar_stresses(records: &[&ResultRecord]) -> Vec<f64> {
    records
        .iter()
        .filter_map(|r| {
            r.values
                .first()
                .and_then(|v| v.value.get(SCALAR_GAUSS_POINT))
                .and_then(|row| row.first().copied())
        })
        .collect()
}

/// Reduce one stage's result file
pub fn reduce_stage(file: &ResultFile, logger: &dyn Logger) -> ReducedStageResult {
    if file.is_empty() {
        return ReducedStageResult::default();
    }

    for name in [
        CAUCHY_STRESS_TENSOR,
        ENGINEERING_STRAIN_TENSOR,
        MEAN_EFFECTIVE_STRESS,
        VON_MISES_STRESS,
    ] {
        if file.get(name).is_none() {
            logger.warn(&format!("Result '{}' not present in output", name));
        }
    }

    let buckets = StageBuckets::from_file(file);
    let strains = compute_strains(&buckets.strain);
    let (sigma_xx, sigma_yy) = extract_sigma_xx_yy(&buckets.stress);

    ReducedStageResult {
        yy_strain: strains.yy,
        vol_strain: strains.vol,
        shear_strain_xy: strains.shear_xy,
        von_mises: compute_scalar_stresses(&buckets.von_mises),
        mean_stress: compute_scalar_stresses(&buckets.mean_stress),
        sigma_xx,
        sigma_yy,
        shear_xy: extract_shear_stress_xy(&buckets.stress),
        time_steps: file.time_steps(),
        tensors: extract_stress_tensors(&buckets.stress),
    }
}
