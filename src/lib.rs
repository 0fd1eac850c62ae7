//! Workspace root package.
//!
//! Holds no code; it exists so `rusty-hook` can install the pre-commit hook
//! declared in the root `Cargo.toml`.
