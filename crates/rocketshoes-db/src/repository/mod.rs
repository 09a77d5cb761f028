//! # Repository Module
//!
//! - [`local_storage::LocalStorageRepository`] - string values under namespaced keys

pub mod local_storage;
