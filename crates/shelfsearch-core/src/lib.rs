#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

//! shelfsearch-core
//!
//! Catalog domain types, configuration, errors and snapshot loading shared by
//! the relevance engine (`shelfsearch-text`) and its front ends.

pub mod catalog;
pub mod config;
pub mod error;
pub mod snapshot;
pub mod traits;
pub mod types;
