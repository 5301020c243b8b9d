//! soiltest: soil element test toolkit
//!
//! Stages solver templates for triaxial, direct simple shear and constant
//! rate of strain (CRS) tests, runs the external geomechanics solver and
//! reduces its GiD result files to the engineering quantities soil
//! laboratories plot: strains, principal stresses, mean and von Mises stress.

pub mod cli;
pub mod core;
pub mod results;
pub mod run;
pub mod template;
pub mod yaml;
