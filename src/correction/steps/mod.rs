//! Individual correction steps

pub mod edges;
pub mod grayscale;
pub mod lines;
pub mod rotate;
