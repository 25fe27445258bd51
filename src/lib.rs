// Core modules
pub mod cli;
pub mod config;
pub mod infrastructure;

// Documentation site and generation service
pub mod codegen;
pub mod content;
pub mod server;

// Editor model
pub mod archive;
pub mod client;
pub mod editor;
