// Test helpers shared by the contract and integration suites
//
// Usage:
//   #[path = "../helpers/mod.rs"]
//   mod helpers;

#![allow(dead_code)]

pub mod test_database;

pub use in_memory_repository::*;
pub use test_data::*;
pub use test_database::*;
