//! HTTP surface: salvo routes over the scheduling services, plus the
//! depot middleware that injects the database pool and settings.

pub mod app;
pub mod config;
pub mod db_handler;
pub mod error;
