//! kwconvert command-line interface
//!
//! Loads exported NeuVector admission rules, converts them with
//! `kwconvert-policy` and writes the resulting Kubewarden policies as a
//! multi-document YAML stream.

pub mod cli;
pub mod commands;
pub mod config;
pub mod loader;
pub mod output;
pub mod table;

pub use cli::{Cli, Commands, ConvertArgs};
