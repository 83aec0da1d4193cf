pub mod config;
pub mod database;
pub mod http;
pub mod models;
pub mod pagination;
pub mod password;
pub mod render;
pub mod repositories;
