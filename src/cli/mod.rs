pub mod app;
pub mod commands;
pub mod config;
pub mod context;
pub mod env;
pub mod fill;
pub mod host;
pub mod output;
pub mod parse;
pub mod run;
pub mod runtime;
