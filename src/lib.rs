//! Civicare - municipal healthcare portal backend
//!
//! Hospitals, medical specialties, health news and per-user appointment
//! booking behind a JSON API.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
