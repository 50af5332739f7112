//! Pipeline - Entry points that drive render and commit.
//!
//! ```text
//! mount_root ─┐
//! Root::update ┼─ Instance::render ── reconcile ── CommitQueue::flush
//! setters ────┘
//! ```
//!
//! Every trigger renders and commits synchronously before returning.

pub mod mount;

pub use mount::{mount_root, Root};
