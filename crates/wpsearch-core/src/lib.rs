//! # wpsearch core
//!
//! Storage-agnostic logic for wpsearch: the [`models::Article`] value
//! type, the [`collection::Collection`] / [`collection::MutableCollection`]
//! traits with an in-memory implementation, and the [`dump`] module that
//! turns a paired-record encyclopedia dump into articles and redirect edges.
//!
//! This crate contains no tokio, sqlx, or filesystem I/O. The SQLite
//! collections, the gzip reader, and the HTTP surface live in the
//! `wpsearch` package.

pub mod collection;
pub mod dump;
pub mod error;
pub mod models;
