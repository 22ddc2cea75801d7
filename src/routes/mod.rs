//! Rutas HTTP
//!
//! Routers de Axum que exponen la API de asignaciones.

pub mod allocation_routes;
