// src/lib.rs

pub mod config;
pub mod error;
pub mod handlers;
pub mod importer;
pub mod models;
pub mod routes;
pub mod seed;
pub mod state;
pub mod utils;

pub use routes::create_router;
