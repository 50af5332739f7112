//! Node - The declaration model.
//!
//! A [`Node`] describes one desired host object or component instantiation.
//! Components build a fresh tree of nodes on every render; the reconciler
//! compares it with the previous tree.
//!
//! # Example
//!
//! ```ignore
//! use spark_stage::{create_node, ContainerProps, SpriteProps, CommonProps, Node};
//!
//! let tree = create_node(
//!     ContainerProps::default(),
//!     [
//!         Some(Node::host(SpriteProps {
//!             common: CommonProps { key: Some("ship".into()), ..Default::default() },
//!             texture: Some("ship".into()),
//!             ..Default::default()
//!         })),
//!         show_shield.then(|| Node::component(shield, ShieldProps { strength })),
//!     ],
//! );
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::rc::Rc;

use crate::error::Error;
use crate::types::{HostKind, Key, ObjectId};
use super::types::{
    CommonProps, ContainerProps, GroupProps, HostProps, PhysicsSpriteProps, ShapeProps,
    SpriteProps, TextProps,
};

/// What a component render function returns.
pub type Render = crate::Result<Option<Node>>;

// =============================================================================
// Component Type
// =============================================================================

/// A component function with its identity.
///
/// Identity is the Rust type of the function: every `fn` item and every
/// closure expression is its own type, so re-rendering the same closure
/// expression keeps the instance while a different function replaces it.
#[derive(Clone)]
pub struct ComponentType {
    id: TypeId,
    name: &'static str,
    render: Rc<dyn Fn(&dyn Any) -> Render>,
}

impl ComponentType {
    pub fn of<P, F>(render: F) -> Self
    where
        P: 'static,
        F: Fn(&P) -> Render + 'static,
    {
        let name = std::any::type_name::<F>();
        Self {
            id: TypeId::of::<F>(),
            name,
            render: Rc::new(move |props: &dyn Any| match props.downcast_ref::<P>() {
                Some(props) => render(props),
                None => Err(Error::PropsMismatch { component: name }),
            }),
        }
    }

    /// Type name of the render function, for logs and errors.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn same(&self, other: &ComponentType) -> bool {
        self.id == other.id
    }

    pub(crate) fn call(&self, props: &dyn Any) -> Render {
        (self.render)(props)
    }
}

impl fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component({})", self.name)
    }
}

// =============================================================================
// Node Type & Props
// =============================================================================

/// What a node asks for.
#[derive(Clone, Debug)]
pub enum NodeType {
    /// Create (or adopt) a host object of this kind.
    Host(HostKind),
    /// Use this already-existing host object.
    Direct(ObjectId),
    /// Instantiate a component.
    Component(ComponentType),
}

impl NodeType {
    /// Exact type equality, the test for "same node, patch in place".
    pub fn same(&self, other: &NodeType) -> bool {
        match (self, other) {
            (NodeType::Host(a), NodeType::Host(b)) => a == b,
            (NodeType::Direct(a), NodeType::Direct(b)) => a == b,
            (NodeType::Component(a), NodeType::Component(b)) => a.same(b),
            _ => false,
        }
    }
}

/// Node properties.
#[derive(Clone)]
pub enum Props {
    Host(Rc<HostProps>),
    /// Component props, type-erased; the component downcasts them back.
    Component(Rc<dyn Any>),
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Props::Host(p) => fmt::Debug::fmt(p, f),
            Props::Component(_) => f.write_str("Props::Component(..)"),
        }
    }
}

// =============================================================================
// Node
// =============================================================================

/// Immutable description of one desired object and its children.
#[derive(Clone, Debug)]
pub struct Node {
    ty: NodeType,
    key: Option<Key>,
    props: Props,
    children: Vec<Node>,
}

impl Node {
    /// Host node; the kind comes from the props variant, the key from `common.key`.
    pub fn host(props: impl Into<HostProps>) -> Self {
        let props = props.into();
        Self {
            ty: NodeType::Host(props.kind()),
            key: props.common().key.clone(),
            props: Props::Host(Rc::new(props)),
            children: Vec::new(),
        }
    }

    /// Static image node (sprite props without animation).
    pub fn image(props: SpriteProps) -> Self {
        Self::host(HostProps::Image(props))
    }

    /// Node for an object that already exists on the host.
    ///
    /// The object is never created by the reconciler; on first appearance
    /// only the declared props are applied (no mount defaults).
    pub fn direct(object: ObjectId, props: impl Into<HostProps>) -> Self {
        let props = props.into();
        Self {
            ty: NodeType::Direct(object),
            key: props.common().key.clone(),
            props: Props::Host(Rc::new(props)),
            children: Vec::new(),
        }
    }

    /// Component node.
    pub fn component<P, F>(render: F, props: P) -> Self
    where
        P: 'static,
        F: Fn(&P) -> Render + 'static,
    {
        Self {
            ty: NodeType::Component(ComponentType::of(render)),
            key: None,
            props: Props::Component(Rc::new(props)),
            children: Vec::new(),
        }
    }

    pub fn with_key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Append one child; `None` is dropped.
    pub fn with_child(mut self, child: impl Into<Option<Node>>) -> Self {
        if let Some(child) = child.into() {
            self.children.push(child);
        }
        self
    }

    /// Append children; `None` entries are dropped.
    pub fn with_children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Option<Node>>,
    {
        self.children
            .extend(children.into_iter().filter_map(|child| child.into()));
        self
    }

    pub fn ty(&self) -> &NodeType {
        &self.ty
    }

    pub fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn host_props(&self) -> Option<&Rc<HostProps>> {
        match &self.props {
            Props::Host(p) => Some(p),
            Props::Component(_) => None,
        }
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }
}

/// Build a node from a head and a list of optional children.
///
/// `None` children are dropped, so conditional children can be written inline.
pub fn create_node<I>(head: impl Into<Node>, children: I) -> Node
where
    I: IntoIterator,
    I::Item: Into<Option<Node>>,
{
    head.into().with_children(children)
}

macro_rules! host_node_from {
    ($($props:ty),* $(,)?) => {
        $(
            impl From<$props> for Node {
                fn from(props: $props) -> Self {
                    Node::host(props)
                }
            }
        )*
    };
}

host_node_from!(
    ContainerProps,
    TextProps,
    ShapeProps,
    SpriteProps,
    PhysicsSpriteProps,
    GroupProps,
    CommonProps,
    HostProps,
);
