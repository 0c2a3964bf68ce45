//! Decoding of neuron-model fit parameters ("genomes") into normalized
//! passive, mechanism and reversal-potential sets, and their application to a
//! cell decoration.

pub mod decor;
pub mod domain;
pub mod genome;
pub mod pipeline;
