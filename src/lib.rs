pub mod activity;
pub mod config;
pub mod core;
pub mod db;
pub mod models;
pub mod utils;

