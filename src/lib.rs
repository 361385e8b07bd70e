//! School transport booking backend
//!
//! Reservas de transporte escolar: planes de viaje publicados por
//! autoridades, schedules de transportistas, viajes pagados por
//! mobile-money y seguidos hasta la llegada a la escuela.

pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

pub use routes::create_app_router;
pub use state::AppState;
