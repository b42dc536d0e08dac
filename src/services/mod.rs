//! Business logic services

pub mod cancellation;
pub mod geo;
pub mod matrix;
pub mod routing;
pub mod vrp;
