pub mod app;
pub mod cache;
pub mod catalog;
pub mod client;
pub mod config;
pub mod domain;
pub mod enrich;
pub mod error;
pub mod extract;
pub mod material;
pub mod output;
pub mod report;
pub mod store;
