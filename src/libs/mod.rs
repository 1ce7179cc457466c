pub mod axis;
pub mod dendro;
pub mod distance;
pub mod error;
pub mod linkage;
pub mod matrix;
pub mod remap;
pub mod scale;
pub mod worker;
