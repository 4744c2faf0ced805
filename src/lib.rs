pub mod batch;
pub mod config;
pub mod samples;
pub mod vm;
