//! DTOs de la API
//!
//! Requests y responses que viajan por HTTP.

pub mod allocation_dto;
