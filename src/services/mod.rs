//! Services module
//!
//! Este módulo contiene la lógica de negocio de la aplicación.

pub mod allocation_service;

pub use allocation_service::{AllocationManager, Clock, FixedClock, SystemClock};
