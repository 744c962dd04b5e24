//! Jobwatch Core
//!
//! Core types shared by the jobwatch crates.
//!
//! This crate contains:
//! - Domain types: the job lifecycle (`JobState`), handles and requests
//! - DTOs: wire shapes of the report submission and status endpoints

pub mod domain;
pub mod dto;
