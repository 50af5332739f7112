//! Primitive types - Props, refs and cleanup.
//!
//! Every host kind gets its own props struct. They share [`CommonProps`], so
//! the adapter can diff the shared surface once and the kind-specific surface
//! per kind. Anything the adapter does not model goes into
//! [`CommonProps::data`].

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::types::{Frame, HostKind, Key, Metadata, ObjectId, PointerHandler};

// =============================================================================
// Cleanup Function
// =============================================================================

/// Cleanup returned by effects and mount callbacks.
pub type Cleanup = Box<dyn FnOnce()>;

// =============================================================================
// Refs
// =============================================================================

/// Shared box that receives the host object of the node it is attached to.
///
/// Cleared again when the object is destroyed, released to its pool, or the
/// ref moves to another node.
#[derive(Clone, Default)]
pub struct HostRef(Rc<Cell<Option<ObjectId>>>);

impl HostRef {
    pub fn new() -> Self {
        Self::default()
    }

    /// The object currently bound, if any.
    pub fn current(&self) -> Option<ObjectId> {
        self.0.get()
    }

    pub fn set(&self, object: Option<ObjectId>) {
        self.0.set(object);
    }

    pub fn ptr_eq(&self, other: &HostRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for HostRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HostRef").field(&self.current()).finish()
    }
}

/// Ref capture attached to a host node: a box or a callback.
#[derive(Clone)]
pub enum NodeRef {
    Cell(HostRef),
    Callback(Rc<dyn Fn(Option<ObjectId>)>),
}

impl NodeRef {
    pub fn callback(f: impl Fn(Option<ObjectId>) + 'static) -> Self {
        NodeRef::Callback(Rc::new(f))
    }

    pub(crate) fn bind(&self, object: ObjectId) {
        match self {
            NodeRef::Cell(cell) => cell.set(Some(object)),
            NodeRef::Callback(f) => f(Some(object)),
        }
    }

    /// Clear the ref, unless a box has already moved on to another object.
    pub(crate) fn release(&self, object: ObjectId) {
        match self {
            NodeRef::Cell(cell) => {
                if cell.current() == Some(object) {
                    cell.set(None);
                }
            }
            NodeRef::Callback(f) => f(None),
        }
    }

    pub(crate) fn same(&self, other: &NodeRef) -> bool {
        match (self, other) {
            (NodeRef::Cell(a), NodeRef::Cell(b)) => a.ptr_eq(b),
            (NodeRef::Callback(a), NodeRef::Callback(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<HostRef> for NodeRef {
    fn from(value: HostRef) -> Self {
        NodeRef::Cell(value)
    }
}

impl From<&HostRef> for NodeRef {
    fn from(value: &HostRef) -> Self {
        NodeRef::Cell(value.clone())
    }
}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRef::Cell(cell) => fmt::Debug::fmt(cell, f),
            NodeRef::Callback(_) => f.write_str("NodeRef::Callback"),
        }
    }
}

// =============================================================================
// Common Props
// =============================================================================

/// Properties shared by every host kind.
///
/// `None` means "not declared": on mount the adapter applies the kind's
/// default, on update it leaves the object alone.
#[derive(Clone, Default, Debug)]
pub struct CommonProps {
    // =========================================================================
    // Identity
    // =========================================================================

    /// Reconciliation key among siblings.
    pub key: Option<Key>,

    /// Receives the host object after commit.
    pub node_ref: Option<NodeRef>,

    // =========================================================================
    // Transform & Visibility
    // =========================================================================

    pub x: Option<f32>,
    pub y: Option<f32>,
    /// Opacity, 0.0 - 1.0 (default: 1).
    pub alpha: Option<f32>,
    /// Default: true.
    pub visible: Option<bool>,
    /// Uniform scale (default: 1).
    pub scale: Option<f32>,
    /// Origin X; origin Y falls back to it (default: 0.5).
    pub origin_x: Option<f32>,
    pub origin_y: Option<f32>,
    /// Radians (default: 0).
    pub rotation: Option<f32>,
    /// Explicit size. Applied only when both are set.
    pub width: Option<f32>,
    pub height: Option<f32>,

    // =========================================================================
    // Interaction
    // =========================================================================

    pub interactive: Option<bool>,
    /// Defaults to "has a click handler".
    pub use_hand_cursor: Option<bool>,
    pub on_click: Option<PointerHandler>,
    pub on_pointer_over: Option<PointerHandler>,
    pub on_pointer_out: Option<PointerHandler>,

    // =========================================================================
    // Pass-through
    // =========================================================================

    /// Domain data mirrored into the object's metadata store.
    pub data: Metadata,
}

// =============================================================================
// Kind Props
// =============================================================================

/// Display container.
#[derive(Clone, Default, Debug)]
pub struct ContainerProps {
    pub common: CommonProps,
}

/// Text label.
#[derive(Clone, Default, Debug)]
pub struct TextProps {
    pub common: CommonProps,
    pub text: Option<String>,
    /// Pixels (default: 16).
    pub font_size: Option<f32>,
    /// CSS-style color string (default: `#ffffff`).
    pub color: Option<String>,
    /// `normal`, `bold`, `italic` ... (default: `normal`).
    pub font_style: Option<String>,
}

/// Vector shape: an optionally filled and stroked rectangle of `width` x `height`.
#[derive(Clone, Default, Debug)]
pub struct ShapeProps {
    pub common: CommonProps,
    /// 0xRRGGBB fill. No fill when unset.
    pub fill: Option<u32>,
    pub stroke_width: Option<f32>,
    pub line_color: Option<u32>,
}

/// Image or sprite.
#[derive(Clone, Default, Debug)]
pub struct SpriteProps {
    pub common: CommonProps,
    pub texture: Option<String>,
    pub frame: Option<Frame>,
    pub tint: Option<u32>,
    pub flip_x: Option<bool>,
    pub flip_y: Option<bool>,
    /// Animation key to play (sprites only; images ignore it on the host side).
    pub play: Option<String>,
}

/// Simulation body settings for physics sprites.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct BodyProps {
    pub velocity_x: Option<f32>,
    pub velocity_y: Option<f32>,
    pub collide_world_bounds: Option<bool>,
    pub bounce: Option<f32>,
    pub drag: Option<f32>,
    pub gravity_y: Option<f32>,
    pub immovable: Option<bool>,
    /// Explicit body size. Applied only when both are set.
    pub body_width: Option<f32>,
    pub body_height: Option<f32>,
    /// Body size as a fraction of the displayed frame. Applied only when both are set.
    pub body_width_ratio: Option<f32>,
    pub body_height_ratio: Option<f32>,
    pub body_offset_x: Option<f32>,
    pub body_offset_y: Option<f32>,
}

/// Sprite with a simulation body.
#[derive(Clone, Default, Debug)]
pub struct PhysicsSpriteProps {
    pub sprite: SpriteProps,
    pub body: BodyProps,
}

/// Creation config for pool-backed groups.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct GroupConfig {
    /// Pool capacity. Unbounded when unset.
    pub max_size: Option<usize>,
    /// Texture given to members the pool creates.
    pub default_texture: Option<String>,
    pub default_frame: Option<Frame>,
}

/// Pool-backed group. Its children are pool members, not scene children.
#[derive(Clone, Default, Debug)]
pub struct GroupProps {
    pub common: CommonProps,
    pub config: GroupConfig,
}

// =============================================================================
// Host Props
// =============================================================================

/// Props of a host node, tagged by kind.
#[derive(Clone, Debug)]
pub enum HostProps {
    Container(ContainerProps),
    Text(TextProps),
    Graphics(ShapeProps),
    Image(SpriteProps),
    Sprite(SpriteProps),
    PhysicsSprite(PhysicsSpriteProps),
    PhysicsGroup(GroupProps),
}

impl HostProps {
    /// The host kind these props describe.
    pub fn kind(&self) -> HostKind {
        match self {
            HostProps::Container(_) => HostKind::Container,
            HostProps::Text(_) => HostKind::Text,
            HostProps::Graphics(_) => HostKind::Graphics,
            HostProps::Image(_) => HostKind::Image,
            HostProps::Sprite(_) => HostKind::Sprite,
            HostProps::PhysicsSprite(_) => HostKind::PhysicsSprite,
            HostProps::PhysicsGroup(_) => HostKind::PhysicsGroup,
        }
    }

    pub fn common(&self) -> &CommonProps {
        match self {
            HostProps::Container(p) => &p.common,
            HostProps::Text(p) => &p.common,
            HostProps::Graphics(p) => &p.common,
            HostProps::Image(p) | HostProps::Sprite(p) => &p.common,
            HostProps::PhysicsSprite(p) => &p.sprite.common,
            HostProps::PhysicsGroup(p) => &p.common,
        }
    }

    /// Texture surface, for kinds that have one.
    pub(crate) fn sprite(&self) -> Option<&SpriteProps> {
        match self {
            HostProps::Image(p) | HostProps::Sprite(p) => Some(p),
            HostProps::PhysicsSprite(p) => Some(&p.sprite),
            _ => None,
        }
    }
}

impl From<ContainerProps> for HostProps {
    fn from(value: ContainerProps) -> Self {
        HostProps::Container(value)
    }
}

impl From<TextProps> for HostProps {
    fn from(value: TextProps) -> Self {
        HostProps::Text(value)
    }
}

impl From<ShapeProps> for HostProps {
    fn from(value: ShapeProps) -> Self {
        HostProps::Graphics(value)
    }
}

impl From<SpriteProps> for HostProps {
    fn from(value: SpriteProps) -> Self {
        HostProps::Sprite(value)
    }
}

impl From<PhysicsSpriteProps> for HostProps {
    fn from(value: PhysicsSpriteProps) -> Self {
        HostProps::PhysicsSprite(value)
    }
}

impl From<GroupProps> for HostProps {
    fn from(value: GroupProps) -> Self {
        HostProps::PhysicsGroup(value)
    }
}

impl From<CommonProps> for HostProps {
    /// Bare common props describe a container.
    fn from(common: CommonProps) -> Self {
        HostProps::Container(ContainerProps { common })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_follows_variant() {
        let props: HostProps = SpriteProps::default().into();
        assert_eq!(props.kind(), HostKind::Sprite);

        let props = HostProps::Image(SpriteProps::default());
        assert_eq!(props.kind(), HostKind::Image);

        let props: HostProps = PhysicsSpriteProps::default().into();
        assert_eq!(props.kind(), HostKind::PhysicsSprite);
        assert!(props.sprite().is_some());

        let props: HostProps = TextProps::default().into();
        assert!(props.sprite().is_none());
    }

    #[test]
    fn test_ref_release_only_clears_own_object() {
        let cell = HostRef::new();
        let node_ref = NodeRef::from(&cell);

        node_ref.bind(ObjectId(1));
        assert_eq!(cell.current(), Some(ObjectId(1)));

        node_ref.release(ObjectId(2));
        assert_eq!(cell.current(), Some(ObjectId(1)));

        node_ref.release(ObjectId(1));
        assert_eq!(cell.current(), None);
    }

    #[test]
    fn test_ref_identity() {
        let a = HostRef::new();
        let b = HostRef::new();
        assert!(NodeRef::from(&a).same(&NodeRef::from(&a)));
        assert!(!NodeRef::from(&a).same(&NodeRef::from(&b)));
    }
}
