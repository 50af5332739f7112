//! Hooks - Per-instance state for component functions.
//!
//! Hooks only work while a component renders and must be called in the same
//! order on every render of that component. Each call claims the next slot
//! of the rendering instance; calling one outside a render returns
//! [`Error::NoRenderContext`](crate::Error::NoRenderContext).
//!
//! - [`use_state`] / [`use_state_with`] - Local state with a setter
//! - [`use_store`] / [`use_store_all`] - External store subscription
//! - [`use_ref`] / [`use_host_ref`] - Mutable boxes
//! - [`use_update`] - Per-frame callback
//! - [`on_mount`], [`use_layout_effect`], [`use_effect`] - Post-commit work
//! - [`use_memo`], [`use_callback`], [`use_event`] - Cached values and callables
//! - [`use_scene`] - The scene this tree renders into
//!
//! # Example
//!
//! ```ignore
//! fn ship(props: &ShipProps) -> Render {
//!     let (speed, set_speed) = use_state(props.base_speed)?;
//!     let host = use_host_ref()?;
//!
//!     use_update(move |_, delta| {
//!         log::trace!("ship moves {}", speed * delta);
//!     })?;
//!
//!     Ok(Some(Node::host(PhysicsSpriteProps {
//!         sprite: SpriteProps {
//!             texture: Some("ship".into()),
//!             common: CommonProps { node_ref: Some(host.into()), ..Default::default() },
//!             ..Default::default()
//!         },
//!         body: BodyProps { velocity_x: Some(speed), ..Default::default() },
//!     })))
//! }
//! ```

mod effect;
mod memo;
mod refs;
mod state;
mod store;
mod update;

pub use effect::{on_mount, use_effect, use_layout_effect};
pub use memo::{use_callback, use_event, use_memo};
pub use refs::{use_host_ref, use_ref, use_scene, Ref};
pub use state::{use_state, use_state_with, SetState};
pub use store::{use_store, use_store_all, Store, StoreListener, StoreMutation, Unsubscribe};
pub use update::use_update;
