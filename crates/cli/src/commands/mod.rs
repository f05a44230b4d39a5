pub mod config;
pub mod packages;
pub mod tags;
