//! Output formatting utilities

use std::io::IsTerminal;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::OutputFormat;
use crate::results::collector::CombinedResult;
use crate::run::renderer::Renderer;

/// Determine the effective output format based on context
pub fn effective_format(format: OutputFormat) -> OutputFormat {
    match format {
        OutputFormat::Auto => {
            if std::io::stdout().is_terminal() {
                OutputFormat::Table
            } else {
                OutputFormat::Json
            }
        }
        other => other,
    }
}

pub fn format_number(value: f64) -> String {
    if value == 0.0 || (value.abs() >= 1e-3 && value.abs() < 1e6) {
        format!("{:.4}", value)
    } else {
        format!("{:.4e}", value)
    }
}

fn format_optional(value: Option<f64>) -> String {
    value.map(format_number).unwrap_or_else(|| "-".to_string())
}

/// One table row per series: points, first, last, min and max
pub fn series_table(rows: &[(&str, &[f64])]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Series", "Points", "First", "Last", "Min", "Max"]);
    for (name, values) in rows {
        let min = values.iter().copied().reduce(f64::min);
        let max = values.iter().copied().reduce(f64::max);
        builder.push_record([
            name.to_string(),
            values.len().to_string(),
            format_optional(values.first().copied()),
            format_optional(values.last().copied()),
            format_optional(min),
            format_optional(max),
        ]);
    }
    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

/// Every series of a result, for output without a known test type
pub fn result_rows(r: &CombinedResult) -> Vec<(&'static str, &[f64])> {
    vec![
        ("yy strain", r.yy_strain.as_slice()),
        ("volumetric strain", &r.vol_strain),
        ("sigma1", &r.sigma1),
        ("sigma3", &r.sigma3),
        ("sigma_xx", &r.sigma_xx),
        ("sigma_yy", &r.sigma_yy),
        ("shear xy", &r.shear_xy),
        ("shear strain xy", &r.shear_strain_xy),
        ("mean stress", &r.mean_stress),
        ("von Mises", &r.von_mises),
        ("time (h)", &r.time_steps_hours),
    ]
}

pub fn cohesion_phi_line(cohesion: Option<f64>, phi: Option<f64>) -> Option<String> {
    match (cohesion, phi) {
        (None, None) => None,
        (c, phi) => Some(format!(
            "c = {}  phi = {}",
            format_optional(c),
            format_optional(phi)
        )),
    }
}

/// Renderer that turns the plotted series into a summary table
#[derive(Debug, Default)]
pub struct SummaryRenderer {
    rendered: Option<String>,
}

impl SummaryRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table of the last rendered result
    pub fn output(&self) -> Option<&str> {
        self.rendered.as_deref()
    }

    fn capture(
        &mut self,
        title: &str,
        rows: &[(&str, &[f64])],
        cohesion: Option<f64>,
        phi: Option<f64>,
    ) {
        let mut out = format!("{}\n{}", title, series_table(rows));
        if let Some(line) = cohesion_phi_line(cohesion, phi) {
            out.push('\n');
            out.push_str(&line);
        }
        self.rendered = Some(out);
    }
}

impl Renderer for SummaryRenderer {
    fn triaxial(
        &mut self,
        yy_strain: &[f64],
        vol_strain: &[f64],
        sigma1: &[f64],
        sigma3: &[f64],
        mean_stress: &[f64],
        von_mises: &[f64],
        cohesion: Option<f64>,
        phi: Option<f64>,
    ) {
        self.capture(
            "Triaxial",
            &[
                ("yy strain", yy_strain),
                ("volumetric strain", vol_strain),
                ("sigma1", sigma1),
                ("sigma3", sigma3),
                ("mean stress", mean_stress),
                ("von Mises", von_mises),
            ],
            cohesion,
            phi,
        );
    }

    fn direct_shear(
        &mut self,
        shear_strain_xy: &[f64],
        shear_xy: &[f64],
        sigma1: &[f64],
        sigma3: &[f64],
        mean_stress: &[f64],
        von_mises: &[f64],
        cohesion: Option<f64>,
        phi: Option<f64>,
    ) {
        self.capture(
            "Direct Simple Shear",
            &[
                ("shear strain xy", shear_strain_xy),
                ("shear xy", shear_xy),
                ("sigma1", sigma1),
                ("sigma3", sigma3),
                ("mean stress", mean_stress),
                ("von Mises", von_mises),
            ],
            cohesion,
            phi,
        );
    }

    fn crs(
        &mut self,
        yy_strain: &[f64],
        time_steps_hours: &[f64],
        sigma_yy: &[f64],
        sigma_xx: &[f64],
        mean_stress: &[f64],
        von_mises: &[f64],
        sigma1: &[f64],
        sigma3: &[f64],
        cohesion: Option<f64>,
        phi: Option<f64>,
    ) {
        self.capture(
            "CRS",
            &[
                ("yy strain", yy_strain),
                ("time (h)", time_steps_hours),
                ("sigma_yy", sigma_yy),
                ("sigma_xx", sigma_xx),
                ("mean stress", mean_stress),
                ("von Mises", von_mises),
                ("sigma1", sigma1),
                ("sigma3", sigma3),
            ],
            cohesion,
            phi,
        );
    }
}
