//! Integration tests. All of them need a running server or database and are
//! ignored by default; run with `cargo test -- --ignored`.

mod api_tests;
mod repository_tests;
