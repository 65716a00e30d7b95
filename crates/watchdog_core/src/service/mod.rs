//! Use-case services over the table engine.
//!
//! # Responsibility
//! - Bundle multi-step engine calls into front-end level operations.
//! - Keep callers independent from filter keys and reference encoding.

pub mod fund_service;
