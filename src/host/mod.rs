//! Host interface - The seam between the reconciler and the live scene graph.
//!
//! The reconciler never touches host objects itself. Everything it wants done
//! goes through [`Scene`]: objects are created from a [`CreateSpec`], changed
//! with [`Mutation`]s, and addressed by [`ObjectId`].
//!
//! - [`adapter`] - Turns host props into create specs and mutation diffs
//! - [`headless`] - In-memory [`Scene`] that records every call

pub mod adapter;
pub mod headless;

use std::rc::Rc;

use crate::error::SceneError;
use crate::primitives::GroupConfig;
use crate::types::{DataValue, Frame, HostKind, ListenerId, ObjectId, PointerHandler, PointerKind};

pub use headless::{HeadlessScene, ObjectRecord};

/// Per-tick callback: `(time, delta)` in milliseconds.
pub type TickFn = Rc<dyn Fn(f64, f64)>;

// =============================================================================
// Create Spec
// =============================================================================

/// Text style applied at creation, and again whenever it changes.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font_size: f32,
    pub color: String,
    pub font_style: String,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: 16.0,
            color: "#ffffff".to_string(),
            font_style: "normal".to_string(),
        }
    }
}

/// Everything the host needs to construct a new object.
#[derive(Debug, Clone, PartialEq)]
pub enum CreateSpec {
    Container { x: f32, y: f32 },
    Text { x: f32, y: f32, text: String, style: TextStyle },
    Graphics,
    Image { x: f32, y: f32, texture: Option<String>, frame: Option<Frame> },
    Sprite { x: f32, y: f32, texture: Option<String>, frame: Option<Frame> },
    PhysicsSprite { x: f32, y: f32, texture: Option<String>, frame: Option<Frame> },
    PhysicsGroup { config: GroupConfig },
}

impl CreateSpec {
    pub fn kind(&self) -> HostKind {
        match self {
            CreateSpec::Container { .. } => HostKind::Container,
            CreateSpec::Text { .. } => HostKind::Text,
            CreateSpec::Graphics => HostKind::Graphics,
            CreateSpec::Image { .. } => HostKind::Image,
            CreateSpec::Sprite { .. } => HostKind::Sprite,
            CreateSpec::PhysicsSprite { .. } => HostKind::PhysicsSprite,
            CreateSpec::PhysicsGroup { .. } => HostKind::PhysicsGroup,
        }
    }
}

// =============================================================================
// Mutations
// =============================================================================

/// Hit area used when an object becomes interactive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitArea {
    /// Explicit rectangle at the object's local origin (shapes have no bounds of their own).
    Rect { width: f32, height: f32 },
    /// The object's own bounds.
    Bounds { hand_cursor: bool },
}

/// One property change on a live host object.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    // Transform & visibility
    X(f32),
    Y(f32),
    Alpha(f32),
    Visible(bool),
    Scale(f32),
    Origin(f32, f32),
    Rotation(f32),
    Size(f32, f32),

    // Input
    Interactive(HitArea),
    DisableInteractive,
    Listen(PointerKind, PointerHandler),
    Unlisten(PointerKind, PointerHandler),

    // Text
    Text(String),
    TextStyle(TextStyle),

    // Vector drawing
    ClearGraphics,
    FillStyle { color: u32, alpha: f32 },
    FillRect { x: f32, y: f32, width: f32, height: f32 },
    LineStyle { width: f32, color: u32, alpha: f32 },
    StrokeRect { x: f32, y: f32, width: f32, height: f32 },

    // Texture & animation
    Texture { key: String, frame: Option<Frame> },
    Tint(u32),
    ClearTint,
    FlipX(bool),
    FlipY(bool),
    Play { animation: String, ignore_if_playing: bool },
    StopAnimation,
    /// Whether the object takes part in the update loop (pool liveness).
    Active(bool),

    // Simulation body
    VelocityX(f32),
    VelocityY(f32),
    CollideWorldBounds(bool),
    Bounce(f32),
    Drag(f32),
    GravityY(f32),
    Immovable(bool),
    BodySize { width: f32, height: f32, center: bool },
    BodyOffset { x: f32, y: f32 },
    BodyEnable(bool),
    /// Zero the body's velocity.
    BodyStop,

    // Pass-through metadata
    /// Assign a custom field the object declares (see [`Scene::has_field`]).
    Field(String, DataValue),
    /// Write the object's metadata store.
    Data(String, DataValue),
}

/// Geometry the adapter reads back to size physics bodies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectMetrics {
    /// Natural frame size.
    pub width: f32,
    pub height: f32,
    pub scale_x: f32,
    pub origin_x: f32,
    pub origin_y: f32,
    /// Size after scaling.
    pub display_width: f32,
    pub display_height: f32,
}

impl Default for ObjectMetrics {
    fn default() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
            scale_x: 1.0,
            origin_x: 0.5,
            origin_y: 0.5,
            display_width: 0.0,
            display_height: 0.0,
        }
    }
}

// =============================================================================
// Scene
// =============================================================================

/// A live scene graph the reconciler drives.
///
/// All methods take `&self`; implementations keep their own interior
/// mutability. Methods that address an object the host no longer knows are
/// expected to do nothing.
pub trait Scene {
    /// Construct a new object. The only fallible call; unsupported kinds
    /// return [`SceneError::UnknownKind`].
    fn create(&self, spec: CreateSpec) -> Result<ObjectId, SceneError>;

    /// Destroy an object and drop it from whatever holds it.
    fn destroy(&self, object: ObjectId);

    /// Live kind of an object, `None` when it does not exist.
    fn kind_of(&self, object: ObjectId) -> Option<HostKind>;

    fn apply(&self, object: ObjectId, mutation: Mutation);

    fn metrics(&self, object: ObjectId) -> ObjectMetrics;

    /// Whether the object declares a custom field named `name`.
    fn has_field(&self, object: ObjectId, name: &str) -> bool;

    /// Read the object's metadata store.
    fn data(&self, object: ObjectId, key: &str) -> Option<DataValue>;

    /// Attach to the scene's display list.
    fn add_to_root(&self, object: ObjectId);

    /// Append to a container's children.
    fn add_to_container(&self, container: ObjectId, object: ObjectId);

    fn child_index(&self, container: ObjectId, object: ObjectId) -> Option<usize>;

    fn move_child(&self, container: ObjectId, object: ObjectId, index: usize);

    /// Draw the next free member from a pool-backed group, creating one if the
    /// pool is below capacity. `None` when exhausted.
    fn pool_acquire(&self, group: ObjectId) -> Option<ObjectId>;

    /// Return a member to its pool: deactivate and hide it.
    fn pool_release(&self, group: ObjectId, member: ObjectId);

    /// Register a per-tick listener.
    fn on_update(&self, listener: TickFn) -> ListenerId;

    fn off_update(&self, listener: ListenerId);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_spec_kind() {
        assert_eq!(CreateSpec::Graphics.kind(), HostKind::Graphics);
        let spec = CreateSpec::PhysicsGroup { config: GroupConfig::default() };
        assert_eq!(spec.kind(), HostKind::PhysicsGroup);
    }

    #[test]
    fn test_default_text_style() {
        let style = TextStyle::default();
        assert_eq!(style.font_size, 16.0);
        assert_eq!(style.color, "#ffffff");
    }
}
