//! Workspace facade over the [`brainstem`] crates.
//!
//! The root package only exists to host the end-to-end and property test
//! suites under `tests/`; library users depend on `brainstem` directly.

pub use brainstem::*;
