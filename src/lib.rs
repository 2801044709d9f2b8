pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod generation;
pub mod handlers;
pub mod llm;
pub mod models;
pub mod storage;
