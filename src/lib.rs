pub mod auth;
pub mod config;
pub mod db;
pub mod editor;
pub mod error;
pub mod middleware;
pub mod models;
pub mod odontogram;
pub mod routes;
pub mod store;
