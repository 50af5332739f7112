//! Engine - Component instances, reconciliation and commit.
//!
//! - [`context`] - Thread-local render stack that hooks resolve against
//! - [`instance`] - Component instances and their hook slots
//! - [`slot`] - Late-bound handles to host objects
//! - [`reconciler`] - Node diffing
//! - [`commit`] - Deferred host operations and effect flushing
//!
//! # Two phases
//!
//! ```text
//! setter / mount_root
//!   └─ Instance::render_into ── component fn ── hooks (context frame)
//!        └─ reconcile ── Ops appended to CommitQueue
//!   └─ CommitQueue::flush ── ops → layout effects → passive effects
//! ```
//!
//! Render is free of host side effects. A failed render drops its queue and
//! leaves the scene as it was.

pub(crate) mod commit;
pub(crate) mod context;
pub(crate) mod instance;
pub(crate) mod reconciler;
pub(crate) mod slot;

pub(crate) use commit::Effect;
pub(crate) use context::next_hook;
pub(crate) use instance::Instance;
