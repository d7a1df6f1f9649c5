//! File format implementations

pub mod bank;
