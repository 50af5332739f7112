//! # spark-stage
//!
//! Declarative scene-graph reconciliation for game hosts.
//!
//! Components are plain functions from props to a [`Node`] tree. The runtime
//! keeps one instance per mounted component, diffs each new tree against the
//! previous one and applies the difference to a live scene through the
//! [`Scene`] trait: creating, patching, re-parenting and destroying host
//! objects, and drawing pool members out of physics groups instead of
//! creating them.
//!
//! ## Architecture
//!
//! Every update runs in two phases:
//! ```text
//! render:  component fn → hooks → Node tree → reconcile → Op list
//! commit:  host ops → layout effects → passive effects
//! ```
//!
//! Render never touches the host. A render error leaves the scene as it was.
//!
//! ## Modules
//!
//! - [`types`] - Ids, keys, host kinds, metadata values, pointer events
//! - [`primitives`] - Nodes and per-kind props
//! - [`hooks`] - State, stores, refs, effects, per-frame updates
//! - [`host`] - The [`Scene`] interface, the property adapter, a headless scene
//! - [`pipeline`] - [`mount_root`] and the [`Root`] handle
//! - [`config`] - Runtime switches
//!
//! ## Example
//!
//! ```ignore
//! use spark_stage::*;
//!
//! fn button(label: &String) -> Render {
//!     let (presses, set_presses) = use_state(0u32)?;
//!     Ok(Some(create_node(
//!         ContainerProps::default(),
//!         [
//!             Some(Node::host(TextProps {
//!                 text: Some(format!("{label}: {presses}")),
//!                 common: CommonProps {
//!                     interactive: Some(true),
//!                     on_click: Some(PointerHandler::new(move |_| {
//!                         let _ = set_presses.update(|n| n + 1);
//!                     })),
//!                     ..Default::default()
//!                 },
//!                 ..Default::default()
//!             })),
//!         ],
//!     )))
//! }
//!
//! let root = mount_root(scene, button, "start".to_string())?;
//! ```

pub mod config;
pub mod error;
pub mod hooks;
pub mod host;
pub mod pipeline;
pub mod primitives;
pub mod types;

mod engine;

// Re-export commonly used items
pub use types::*;

pub use config::{config, reset_config, set_config, Config};

pub use error::{Error, Result, SceneError};

pub use primitives::{
    create_node, BodyProps, Cleanup, CommonProps, ComponentType, ContainerProps, GroupConfig,
    GroupProps, HostProps, HostRef, Node, NodeRef, NodeType, PhysicsSpriteProps, Props, Render,
    ShapeProps, SpriteProps, TextProps,
};

pub use hooks::{
    on_mount, use_callback, use_effect, use_event, use_host_ref, use_layout_effect, use_memo,
    use_ref, use_scene, use_state, use_state_with, use_store, use_store_all, use_update, Ref,
    SetState, Store, StoreListener, StoreMutation, Unsubscribe,
};

pub use host::{
    CreateSpec, HeadlessScene, HitArea, Mutation, ObjectMetrics, ObjectRecord, Scene, TextStyle,
    TickFn,
};

pub use pipeline::{mount_root, Root};
