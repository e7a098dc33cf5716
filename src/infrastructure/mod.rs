//! Infrastructure layer: concrete implementations of domain interfaces and
//! wire-format DTOs.

pub mod dto;
pub mod history;
