//! Use-case services over persistence backends.
//!
//! # Responsibility
//! - Provide typed CRUD entry points for the app store.
//! - Keep backends ignorant of entity semantics beyond storage shape.

pub mod data_service;
