//! HTTP backend for recipes, ingredients and a grocery list, stored in SQLite.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod payload;
pub mod query;
pub mod routes;
pub mod schema;
pub mod service;
