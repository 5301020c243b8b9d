//! Plot series per test type
//!
//! Every test type has a fixed list of x/y plots. Plot and export code
//! consume the same table so a CSV file always matches a chart.

use std::f64::consts::PI;

use crate::core::test_type::TestType;
use crate::results::collector::CombinedResult;

/// Points along the upper half of the final Mohr circle
pub const MOHR_CIRCLE_POINTS: usize = 400;

/// Quantity plotted on one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    /// `|sigma1 - sigma3|`
    DeltaSigma,
    YyStrain,
    VolStrain,
    Sigma1,
    Sigma3,
    VonMises,
    MeanStress,
    /// `|tau_xy|`
    ShearXyAbs,
    /// `|2 * eps_xy|`
    GammaXyAbs,
    SigmaYy,
    SigmaXx,
    TimeHours,
    /// Normal/shear stress pairs of the final state
    MohrCircle,
}

/// One chart: y against x, with axis labels
#[derive(Debug, Clone, Copy)]
pub struct PlotSpec {
    pub y: Quantity,
    /// `None` when the quantity carries its own x values (Mohr circle)
    pub x: Option<Quantity>,
    pub y_label: &'static str,
    pub x_label: &'static str,
}

const fn spec(
    y: Quantity,
    x: Option<Quantity>,
    y_label: &'static str,
    x_label: &'static str,
) -> PlotSpec {
    PlotSpec {
        y,
        x,
        y_label,
        x_label,
    }
}

const TRIAXIAL_PLOTS: [PlotSpec; 5] = [
    spec(
        Quantity::DeltaSigma,
        Some(Quantity::YyStrain),
        "Δσ = |σ1-σ3| (kPa)",
        "Vertical Strain εyy",
    ),
    spec(
        Quantity::VolStrain,
        Some(Quantity::YyStrain),
        "Volumetric Strain εv",
        "Vertical Strain εyy",
    ),
    spec(Quantity::Sigma1, Some(Quantity::Sigma3), "σ1 (kPa)", "σ3 (kPa)"),
    spec(Quantity::VonMises, Some(Quantity::MeanStress), "q (kPa)", "p′ (kPa)"),
    spec(Quantity::MohrCircle, None, "τ (kPa)", "σ′ (kPa)"),
];

const DIRECT_SHEAR_PLOTS: [PlotSpec; 4] = [
    spec(
        Quantity::ShearXyAbs,
        Some(Quantity::GammaXyAbs),
        "Shear Stress τxy (kPa)",
        "Shear Strain γxy",
    ),
    spec(Quantity::Sigma1, Some(Quantity::Sigma3), "σ1 (kPa)", "σ3 (kPa)"),
    spec(Quantity::VonMises, Some(Quantity::MeanStress), "q (kPa)", "p′ (kPa)"),
    spec(Quantity::MohrCircle, None, "τ (kPa)", "σ′ (kPa)"),
];

const CRS_PLOTS: [PlotSpec; 5] = [
    spec(
        Quantity::SigmaYy,
        Some(Quantity::YyStrain),
        "σ′yy (kPa)",
        "Vertical Strain εyy",
    ),
    spec(Quantity::SigmaYy, Some(Quantity::SigmaXx), "σ′yy (kPa)", "σ′xx (kPa)"),
    spec(Quantity::VonMises, Some(Quantity::MeanStress), "q (kPa)", "p′ (kPa)"),
    spec(Quantity::MohrCircle, None, "τ (kPa)", "σ′ (kPa)"),
    spec(
        Quantity::YyStrain,
        Some(Quantity::TimeHours),
        "Vertical Strain εyy",
        "Time (h)",
    ),
];

pub fn plot_specs(test_type: TestType) -> &'static [PlotSpec] {
    match test_type {
        TestType::Triaxial => &TRIAXIAL_PLOTS,
        TestType::DirectShear => &DIRECT_SHEAR_PLOTS,
        TestType::Crs => &CRS_PLOTS,
    }
}

/// A materialised chart
#[derive(Debug, Clone, PartialEq)]
pub struct PlotSeries {
    /// 1-based position in the test type's plot list
    pub index: usize,
    pub x_label: &'static str,
    pub y_label: &'static str,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl PlotSeries {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// `(x, y)` pairs
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }
}

/// Values of a plain (non-derived) quantity
fn values(result: &CombinedResult, quantity: Quantity) -> Vec<f64> {
    match quantity {
        Quantity::DeltaSigma => result.deviatoric_stress(),
        Quantity::YyStrain => result.yy_strain.clone(),
        Quantity::VolStrain => result.vol_strain.clone(),
        Quantity::Sigma1 => result.sigma1.clone(),
        Quantity::Sigma3 => result.sigma3.clone(),
        Quantity::VonMises => result.von_mises.clone(),
        Quantity::MeanStress => result.mean_stress.clone(),
        Quantity::ShearXyAbs => result.shear_xy.iter().map(|t| t.abs()).collect(),
        Quantity::GammaXyAbs => result
            .shear_strain_xy
            .iter()
            .map(|e| (2.0 * e).abs())
            .collect(),
        Quantity::SigmaYy => result.sigma_yy.clone(),
        Quantity::SigmaXx => result.sigma_xx.clone(),
        Quantity::TimeHours => result.time_steps_hours.clone(),
        Quantity::MohrCircle => Vec::new(),
    }
}

/// `(sigma, tau)` along the upper half of the circle through the last `(sigma1, sigma3)`
pub fn mohr_circle(sigma1: f64, sigma3: f64) -> (Vec<f64>, Vec<f64>) {
    let center = 0.5 * (sigma1 + sigma3);
    let radius = 0.5 * (sigma1 - sigma3);
    let last = (MOHR_CIRCLE_POINTS - 1) as f64;
    (0..MOHR_CIRCLE_POINTS)
        .map(|i| {
            let theta = PI * i as f64 / last;
            (center + radius * theta.cos(), -radius * theta.sin())
        })
        .unzip()
}

/// Build one chart; `None` when its data is missing
pub fn build_series(result: &CombinedResult, index: usize, spec: &PlotSpec) -> Option<PlotSeries> {
    let (x, y) = match spec.x {
        None => {
            let s1 = *result.sigma1.last()?;
            let s3 = *result.sigma3.last()?;
            mohr_circle(s1, s3)
        }
        Some(x_quantity) => {
            let mut x = values(result, x_quantity);
            let mut y = values(result, spec.y);
            let n = x.len().min(y.len());
            x.truncate(n);
            y.truncate(n);
            (x, y)
        }
    };
    if x.is_empty() {
        return None;
    }
    Some(PlotSeries {
        index,
        x_label: spec.x_label,
        y_label: spec.y_label,
        x,
        y,
    })
}

/// Every available chart of a test type, in plot order
pub fn series_for(test_type: TestType, result: &CombinedResult) -> Vec<PlotSeries> {
    plot_specs(test_type)
        .iter()
        .enumerate()
        .filter_map(|(i, spec)| build_series(result, i + 1, spec))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CombinedResult {
        CombinedResult {
            yy_strain: vec![0.0, -0.05, -0.1],
            vol_strain: vec![0.0, -0.02, -0.04],
            sigma1: vec![-100.0, -200.0, -300.0],
            sigma3: vec![-100.0, -100.0, -100.0],
            shear_xy: vec![0.0, -10.0, -20.0],
            shear_strain_xy: vec![0.0, 0.01, 0.02],
            mean_stress: vec![-100.0, -133.0],
            von_mises: vec![0.0, 100.0, 200.0],
            time_steps_hours: vec![1.0, 2.0, 3.0],
            sigma_xx: vec![-100.0; 3],
            sigma_yy: vec![-100.0, -200.0, -300.0],
            ..Default::default()
        }
    }

    #[test]
    fn test_plot_counts_per_test_type() {
        assert_eq!(plot_specs(TestType::Triaxial).len(), 5);
        assert_eq!(plot_specs(TestType::DirectShear).len(), 4);
        assert_eq!(plot_specs(TestType::Crs).len(), 5);
    }

    #[test]
    fn test_delta_sigma_against_vertical_strain() {
        let series = series_for(TestType::Triaxial, &sample());
        let first = &series[0];
        assert_eq!(first.index, 1);
        assert_eq!(first.x, vec![0.0, -0.05, -0.1]);
        assert_eq!(first.y, vec![0.0, 100.0, 200.0]);
    }

    #[test]
    fn test_paired_series_are_truncated() {
        let series = series_for(TestType::Triaxial, &sample());
        let q_p = series.iter().find(|s| s.index == 4).unwrap();
        assert_eq!(q_p.len(), 2);
        assert_eq!(q_p.y, vec![0.0, 100.0]);
    }

    #[test]
    fn test_direct_shear_uses_engineering_shear_strain() {
        let series = series_for(TestType::DirectShear, &sample());
        assert_eq!(series[0].x, vec![0.0, 0.02, 0.04]);
        assert_eq!(series[0].y, vec![0.0, 10.0, 20.0]);
    }

    #[test]
    fn test_mohr_circle_spans_final_state() {
        let (sigma, tau) = mohr_circle(-300.0, -100.0);
        assert_eq!(sigma.len(), MOHR_CIRCLE_POINTS);
        assert!((sigma[0] + 300.0).abs() < 1e-9);
        assert!((sigma[MOHR_CIRCLE_POINTS - 1] + 100.0).abs() < 1e-9);
        assert!(tau.iter().all(|t| *t >= -1e-9));
        let peak = tau.iter().cloned().fold(f64::MIN, f64::max);
        assert!((peak - 100.0).abs() < 0.01);
    }

    #[test]
    fn test_crs_time_axis_is_in_hours() {
        let series = series_for(TestType::Crs, &sample());
        let last = series.last().unwrap();
        assert_eq!(last.index, 5);
        assert_eq!(last.x_label, "Time (h)");
        assert_eq!(last.x, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_empty_result_has_no_series() {
        assert!(series_for(TestType::Triaxial, &CombinedResult::default()).is_empty());
    }
}
