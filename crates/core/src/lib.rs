//! Domain types shared by the persistence and HTTP layers.
//!
//! - [`types`] -- primary key and timestamp aliases.
//! - [`error`] -- the [`error::CoreError`] domain error.
//! - [`validation`] -- registration input rules.

pub mod error;
pub mod types;
pub mod validation;
