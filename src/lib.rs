pub mod app;
pub mod cli;
pub mod config;
pub mod db;
pub mod google;
pub mod ingest;
pub mod logging;
pub mod openapi;
pub mod ops;
pub mod routes;
pub mod types;
pub mod utils;
