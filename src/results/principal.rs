//! Principal stresses of the merged tensor series
//!
//! Stresses are compression negative. `sigma1` is the algebraically
//! smallest eigenvalue (the most compressive) and `sigma3` the largest;
//! plotting and export rely on exactly this mapping.

use crate::results::reducer::{StressTensor, TensorSeries};

/// Eigenvalues of a symmetric tensor in ascending order
pub fn eigenvalues(tensor: &StressTensor) -> [f64; 3] {
    let values = tensor.matrix().symmetric_eigenvalues();
    let mut sorted = [values[0], values[1], values[2]];
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// `(sigma1, sigma3)` for every tensor, times ascending, original order within a time
pub fn calculate_principal_stresses(tensors: &TensorSeries) -> (Vec<f64>, Vec<f64>) {
    let mut sigma1 = Vec::with_capacity(tensors.len());
    let mut sigma3 = Vec::with_capacity(tensors.len());
    for (_, at_time) in tensors.sorted() {
        for tensor in at_time {
            let [min, _, max] = eigenvalues(tensor);
            sigma1.push(min);
            sigma3.push(max);
        }
    }
    (sigma1, sigma3)
}
