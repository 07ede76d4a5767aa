//! Random background image server
//!
//! Serves randomly selected images from a rotating source pool, center
//! cropped and scaled to a fixed catalog of sizes, with an adaptive
//! replacement cache in front of the resize pipeline.

pub mod config;
pub mod errors;
pub mod job_scheduling;
pub mod models;
pub mod services;
pub mod sources;
pub mod utils;
pub mod web;
