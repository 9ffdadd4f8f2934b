//! Core data model for the event media service.
//!
//! There is no database: an event is a JSON blob plus the objects stored
//! under its path prefix.

pub mod event;
