//! Pluggable result renderers
//!
//! Each test type has its own entry point taking the series it plots,
//! positionally. [`NoOpRenderer`] serves headless runs.

use crate::core::test_type::TestType;
use crate::results::collector::CombinedResult;

#[allow(clippy::too_many_arguments)]
pub trait Renderer {
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
    );

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
    );

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
    );
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpRenderer;

impl Renderer for NoOpRenderer {
    fn triaxial(
        &mut self,
        _: &[f64],
        _: &[f64],
        _: &[f64],
        _: &[f64],
        _: &[f64],
        _: &[f64],
        _: Option<f64>,
        _: Option<f64>,
    ) {
    }

    fn direct_shear(
        &mut self,
        _: &[f64],
        _: &[f64],
        _: &[f64],
        _: &[f64],
        _: &[f64],
        _: &[f64],
        _: Option<f64>,
        _: Option<f64>,
    ) {
    }

    fn crs(
        &mut self,
        _: &[f64],
        _: &[f64],
        _: &[f64],
        _: &[f64],
        _: &[f64],
        _: &[f64],
        _: &[f64],
        _: &[f64],
        _: Option<f64>,
        _: Option<f64>,
    ) {
    }
}

/// Hand a result to the renderer entry point of its test type
pub fn render(test_type: TestType, r: &CombinedResult, renderer: &mut dyn Renderer) {
    match test_type {
        TestType::Triaxial => renderer.triaxial(
            &r.yy_strain,
            &r.vol_strain,
            &r.sigma1,
            &r.sigma3,
            &r.mean_stress,
            &r.von_mises,
            r.cohesion,
            r.phi,
        ),
        TestType::DirectShear => renderer.direct_shear(
            &r.shear_strain_xy,
            &r.shear_xy,
            &r.sigma1,
            &r.sigma3,
            &r.mean_stress,
            &r.von_mises,
            r.cohesion,
            r.phi,
        ),
        TestType::Crs => renderer.crs(
            &r.yy_strain,
            &r.time_steps_hours,
            &r.sigma_yy,
            &r.sigma_xx,
            &r.mean_stress,
            &r.von_mises,
            &r.sigma1,
            &r.sigma3,
            r.cohesion,
            r.phi,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records which entry point was called and the first series it got
    #[derive(Default)]
    struct Recorder {
        calls: Vec<(&'static str, Vec<f64>, Option<f64>)>,
    }

    impl Renderer for Recorder {
        fn triaxial(
            &mut self,
            yy_strain: &[f64],
            _: &[f64],
            _: &[f64],
            _: &[f64],
            _: &[f64],
            _: &[f64],
            cohesion: Option<f64>,
            _: Option<f64>,
        ) {
            self.calls.push(("triaxial", yy_strain.to_vec(), cohesion));
        }

        fn direct_shear(
            &mut self,
            shear_strain_xy: &[f64],
            _: &[f64],
            _: &[f64],
            _: &[f64],
            _: &[f64],
            _: &[f64],
            cohesion: Option<f64>,
            _: Option<f64>,
        ) {
            self.calls.push(("direct_shear", shear_strain_xy.to_vec(), cohesion));
        }

        fn crs(
            &mut self,
            _: &[f64],
            time_steps_hours: &[f64],
            _: &[f64],
            _: &[f64],
            _: &[f64],
            _: &[f64],
            _: &[f64],
            _: &[f64],
            cohesion: Option<f64>,
            _: Option<f64>,
        ) {
            self.calls.push(("crs", time_steps_hours.to_vec(), cohesion));
        }
    }

    fn result() -> CombinedResult {
        CombinedResult {
            yy_strain: vec![-0.1],
            shear_strain_xy: vec![0.2],
            time_steps_hours: vec![1.0],
            cohesion: Some(3.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_dispatch_by_test_type() {
        let mut recorder = Recorder::default();
        render(TestType::Triaxial, &result(), &mut recorder);
        render(TestType::DirectShear, &result(), &mut recorder);
        render(TestType::Crs, &result(), &mut recorder);
        assert_eq!(
            recorder.calls,
            vec![
                ("triaxial", vec![-0.1], Some(3.0)),
                ("direct_shear", vec![0.2], Some(3.0)),
                ("crs", vec![1.0], Some(3.0)),
            ]
        );
    }

    #[test]
    fn test_noop_renderer_accepts_everything() {
        let mut renderer = NoOpRenderer;
        for test_type in TestType::all() {
            render(test_type, &result(), &mut renderer);
        }
    }
}
