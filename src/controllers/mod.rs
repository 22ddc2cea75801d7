//! Controladores
//!
//! Validan los requests, llaman al gestor de asignaciones y construyen
//! las responses.

pub mod allocation_controller;
