pub mod config;
pub mod cycles;
pub mod timer;
