pub mod config;
pub mod error;
pub mod fetch;
pub mod locations;
pub mod map;
pub mod model;
pub mod output;
pub mod parser;
pub mod report;
pub mod source;
pub mod stats;
