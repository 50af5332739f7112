//! Core types for spark-stage.
//!
//! These types are shared by the declaration model, the reconciler and the
//! host interface. They describe *which* host object a value refers to and
//! the small closed set of values that can travel through host metadata.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

// =============================================================================
// Object Identity
// =============================================================================

/// Opaque handle to a live object owned by the host scene.
///
/// The host assigns these; the reconciler never fabricates one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle to a per-tick listener registered on the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

// =============================================================================
// Host Kinds
// =============================================================================

/// Kind of host object a host node asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostKind {
    /// Display container with ordered children.
    Container,
    /// Text label.
    Text,
    /// Vector shape (filled / stroked rectangle).
    Graphics,
    /// Static textured image.
    Image,
    /// Animated sprite.
    Sprite,
    /// Sprite with a simulation body.
    PhysicsSprite,
    /// Pool-backed group of physics sprites.
    PhysicsGroup,
}

impl HostKind {
    /// Tag used in logs and error messages.
    pub const fn as_str(self) -> &'static str {
        match self {
            HostKind::Container => "container",
            HostKind::Text => "text",
            HostKind::Graphics => "graphics",
            HostKind::Image => "image",
            HostKind::Sprite => "sprite",
            HostKind::PhysicsSprite => "physics-sprite",
            HostKind::PhysicsGroup => "physics-group",
        }
    }

    /// Whether an object of this live kind can stand in for a node asking for `requested`.
    ///
    /// A physics sprite is still a sprite, so it satisfies `Sprite` nodes.
    pub fn satisfies(self, requested: HostKind) -> bool {
        self == requested || (self == HostKind::PhysicsSprite && requested == HostKind::Sprite)
    }

    /// Kinds whose children are reconciled.
    pub fn has_children(self) -> bool {
        matches!(self, HostKind::Container | HostKind::PhysicsGroup)
    }
}

impl fmt::Display for HostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Keys
// =============================================================================

/// Reconciliation key for a node among its siblings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Int(i64),
    Str(Rc<str>),
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Key::Int(value)
    }
}

impl From<i32> for Key {
    fn from(value: i32) -> Self {
        Key::Int(value as i64)
    }
}

impl From<u32> for Key {
    fn from(value: u32) -> Self {
        Key::Int(value as i64)
    }
}

impl From<usize> for Key {
    fn from(value: usize) -> Self {
        Key::Int(value as i64)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Str(Rc::from(value))
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::Str(Rc::from(value))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(v) => write!(f, "{v}"),
            Key::Str(s) => f.write_str(s),
        }
    }
}

// =============================================================================
// Metadata Values
// =============================================================================

/// A primitive value carried through a host object's metadata store.
///
/// Used for domain data (ids, damage values, ...) that the adapter does not
/// interpret.
#[derive(Debug, Clone, PartialEq)]
pub enum DataValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
}

impl DataValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            DataValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            DataValue::Float(v) => Some(*v),
            DataValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DataValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DataValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for DataValue {
    fn from(value: bool) -> Self {
        DataValue::Bool(value)
    }
}

impl From<i64> for DataValue {
    fn from(value: i64) -> Self {
        DataValue::Int(value)
    }
}

impl From<i32> for DataValue {
    fn from(value: i32) -> Self {
        DataValue::Int(value as i64)
    }
}

impl From<f64> for DataValue {
    fn from(value: f64) -> Self {
        DataValue::Float(value)
    }
}

impl From<f32> for DataValue {
    fn from(value: f32) -> Self {
        DataValue::Float(value as f64)
    }
}

impl From<&str> for DataValue {
    fn from(value: &str) -> Self {
        DataValue::Str(Rc::from(value))
    }
}

impl From<String> for DataValue {
    fn from(value: String) -> Self {
        DataValue::Str(Rc::from(value))
    }
}

/// Generic pass-through metadata, synced key by key onto host objects.
pub type Metadata = BTreeMap<String, DataValue>;

// =============================================================================
// Texture Frames
// =============================================================================

/// Frame inside a texture atlas or spritesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Index(u32),
    Name(String),
}

impl From<u32> for Frame {
    fn from(value: u32) -> Self {
        Frame::Index(value)
    }
}

impl From<&str> for Frame {
    fn from(value: &str) -> Self {
        Frame::Name(value.to_string())
    }
}

// =============================================================================
// Pointer Events
// =============================================================================

/// Pointer position delivered to pointer handlers, in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerEvent {
    pub x: f32,
    pub y: f32,
}

/// Pointer event channels a node can bind handlers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerKind {
    /// `pointerdown`, exposed as `on_click`.
    Down,
    /// `pointerover`.
    Over,
    /// `pointerout`.
    Out,
}

/// Pointer callback with reference identity.
///
/// Two handlers are equal only if they are the same allocation, which is how
/// the adapter decides whether to rebind.
#[derive(Clone)]
pub struct PointerHandler(Rc<dyn Fn(&PointerEvent)>);

impl PointerHandler {
    pub fn new(f: impl Fn(&PointerEvent) + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, event: &PointerEvent) {
        (self.0)(event)
    }
}

impl PartialEq for PointerHandler {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for PointerHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PointerHandler({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}
