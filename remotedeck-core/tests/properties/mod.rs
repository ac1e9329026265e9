//! Property test modules

mod arguments_tests;
mod crypto_tests;
mod merge_tests;
mod persistence_tests;
