pub mod catalog;
pub mod cli;
pub mod config;
pub mod convert;
pub mod download;
pub mod engine;
pub mod fetch;
pub mod inputs;
pub mod matcher;
pub mod normalize;
pub mod page;
pub mod pipeline;
pub mod report;
pub mod util;
