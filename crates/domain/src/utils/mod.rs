//! Small helpers for caller-supplied parameters

pub mod params;
