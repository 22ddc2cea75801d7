//! Modelos del sistema
//!
//! Este módulo contiene los modelos de dominio de las asignaciones de vehículos.

pub mod allocation;

pub use allocation::*;
