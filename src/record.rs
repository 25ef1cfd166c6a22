//! Records within a hit stream.

pub mod hit;

pub use hit::HitRecord;
