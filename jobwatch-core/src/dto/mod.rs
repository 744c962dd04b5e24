//! Data Transfer Objects for the report endpoints
//!
//! Bodies exchanged with the job-processing backend. Field names follow the
//! backend's camelCase JSON.

pub mod job;
