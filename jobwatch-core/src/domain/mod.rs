//! Core domain types
//!
//! These types describe a single asynchronous job as seen from the client:
//! what was asked for, how the remote side identifies it, and where it is
//! in its lifecycle.

pub mod job;
pub mod request;
pub mod status;
