pub mod backup;
pub mod db;
pub mod models;
pub mod service;
pub mod store;
