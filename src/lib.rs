pub mod algorithm;
pub mod common;
pub mod compare;
pub mod config;
pub mod heuristic;
pub mod map;
pub mod report;
pub mod stat;
