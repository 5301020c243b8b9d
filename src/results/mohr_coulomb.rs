//! Cohesion and friction angle lookup for the Mohr-Coulomb failure line

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MohrCoulombError {
    #[error("{which} index {index} is out of range for {len} material parameters (indices are 1-based)")]
    IndexOutOfRange {
        which: &'static str,
        index: usize,
        len: usize,
    },
}

/// `(cohesion, phi)` from a flat parameter vector and a 1-based index pair
///
/// No index pair yields `(None, None)`. An index outside the vector is an
/// error: it means the mapping does not belong to these parameters.
pub fn extract_cohesion_phi(
    material_parameters: &[f64],
    indices: Option<(usize, usize)>,
) -> Result<(Option<f64>, Option<f64>), MohrCoulombError> {
    let Some((c_index, phi_index)) = indices else {
        return Ok((None, None));
    };
    let cohesion = lookup(material_parameters, c_index, "Cohesion")?;
    let phi = lookup(material_parameters, phi_index, "Friction angle")?;
    Ok((Some(cohesion), Some(phi)))
}

fn lookup(params: &[f64], index: usize, which: &'static str) -> Result<f64, MohrCoulombError> {
    index
        .checked_sub(1)
        .and_then(|i| params.get(i))
        .copied()
        .ok_or(MohrCoulombError::IndexOutOfRange {
            which,
            index,
            len: params.len(),
        })
}
