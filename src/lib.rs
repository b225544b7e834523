//! Library crate for decision-rooms-back, exposing modules for the binary and integration tests.

pub mod config;
pub mod dao;
mod dto;
mod error;
pub mod routes;
pub mod services;
pub mod state;
