pub mod area;
pub mod input;
