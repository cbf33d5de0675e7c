pub mod backup;
pub mod commands;
pub mod config;
pub mod error;
pub mod fsutil;
pub mod layout;
pub mod migrate;
pub mod model;
pub mod output;
pub mod settings;
