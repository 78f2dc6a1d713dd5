extern crate serde;

pub mod analysis;
pub mod config;
pub mod dataset;
pub mod error;
pub mod features;
pub mod forms;
pub mod inference;
pub mod model;
pub mod records;
pub mod telemetry;

pub use error::{AppError, Result};
