pub mod command;
pub mod config;
pub mod paths;
pub mod tools;
