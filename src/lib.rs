pub mod args;
pub mod command;
pub mod config;
pub mod harness;
pub mod pack;
pub mod pipeline;
pub mod publish;
pub mod report;
pub mod store;
pub mod tracer;
pub mod usage;
