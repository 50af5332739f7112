//! Host slots - Late-bound handles to host objects.
//!
//! During render nothing exists on the host yet, so the reconciler hands out
//! [`HostSlot`]s. The commit queue fills them in when it creates, adopts or
//! acquires the object. Every "which object is this?" question goes through
//! [`HostSlot::current`].

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use bitflags::bitflags;

use crate::host::{Mutation, Scene};
use crate::primitives::{Node, NodeRef};
use crate::types::{HostKind, Key, ObjectId};

use super::instance::Instance;

bitflags! {
    /// Lifecycle flags of a host slot.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SlotFlags: u8 {
        /// The object belongs to a pool and is released, never destroyed.
        const POOLED = 1 << 0;
        /// Torn down; later teardowns do nothing.
        const DESTROYED = 1 << 1;
        /// Just drawn from a pool; the next patch applies every prop.
        const FRESH = 1 << 2;
    }
}

/// How the slot's object comes to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Created by the commit queue.
    Create,
    /// Drawn from a pool-backed group.
    Pooled,
    /// Supplied by the caller through a direct node.
    Direct,
}

// =============================================================================
// Children
// =============================================================================

/// What reconciling a node produced.
#[derive(Clone)]
pub enum Child {
    Host(Rc<HostSlot>),
    Instance(Rc<Instance>),
}

/// One-step resolution of a [`Child`].
pub enum Resolved {
    Unresolved,
    Object(ObjectId),
    Instance(Rc<Instance>),
}

impl Child {
    pub fn resolve(&self) -> Resolved {
        match self {
            Child::Host(slot) => slot.current().map_or(Resolved::Unresolved, Resolved::Object),
            Child::Instance(instance) => Resolved::Instance(instance.clone()),
        }
    }

    /// The host object at the top of this subtree, looking through components.
    pub fn object(&self) -> Option<ObjectId> {
        match self.resolve() {
            Resolved::Object(object) => Some(object),
            Resolved::Instance(instance) => instance.produced().and_then(|child| child.object()),
            Resolved::Unresolved => None,
        }
    }

    /// The pool placeholder at the top of this subtree that never received a
    /// member, looking through components.
    pub fn starved_member(&self) -> Option<Rc<HostSlot>> {
        match self {
            Child::Host(slot) => slot.is_starved().then(|| slot.clone()),
            Child::Instance(instance) => instance.produced()?.starved_member(),
        }
    }

    /// Tear down this subtree: unmount components, destroy or release objects.
    pub fn teardown(&self, scene: &dyn Scene) {
        match self {
            Child::Host(slot) => slot.teardown(scene),
            Child::Instance(instance) => instance.unmount(),
        }
    }
}

/// Previous-render record for one child of a container.
#[derive(Clone)]
pub struct CachedChild {
    pub key: Option<Key>,
    /// The descriptor the child was last reconciled against.
    pub node: Node,
    pub child: Child,
}

// =============================================================================
// Host Slot
// =============================================================================

pub struct HostSlot {
    origin: Origin,
    expected: HostKind,
    current: Cell<Option<ObjectId>>,
    flags: Cell<SlotFlags>,
    /// Owning group of a pooled object.
    pool: Cell<Option<ObjectId>>,
    children: RefCell<Vec<CachedChild>>,
    /// Ref bound at the last commit, with the object it received.
    bound: RefCell<Option<(NodeRef, ObjectId)>>,
}

impl HostSlot {
    pub fn new(origin: Origin, expected: HostKind) -> Rc<Self> {
        Rc::new(Self {
            origin,
            expected,
            current: Cell::new(None),
            flags: Cell::new(SlotFlags::empty()),
            pool: Cell::new(None),
            children: RefCell::new(Vec::new()),
            bound: RefCell::new(None),
        })
    }

    /// Placeholder for the next member of a pool-backed group.
    pub fn pooled() -> Rc<Self> {
        Self::new(Origin::Pooled, HostKind::PhysicsSprite)
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn expected(&self) -> HostKind {
        self.expected
    }

    pub fn current(&self) -> Option<ObjectId> {
        self.current.get()
    }

    pub fn flags(&self) -> SlotFlags {
        self.flags.get()
    }

    pub fn resolve_to(&self, object: ObjectId) {
        self.current.set(Some(object));
    }

    /// Bind a pool member drawn from `group`.
    pub fn resolve_pooled(&self, group: ObjectId, member: ObjectId) {
        self.current.set(Some(member));
        self.pool.set(Some(group));
        self.flags.set(self.flags.get() | SlotFlags::POOLED | SlotFlags::FRESH);
    }

    /// Clear the fresh-member flag, returning whether it was set.
    pub fn take_fresh(&self) -> bool {
        let flags = self.flags();
        self.flags.set(flags - SlotFlags::FRESH);
        flags.contains(SlotFlags::FRESH)
    }

    /// A live pool placeholder still waiting for a member.
    pub fn is_starved(&self) -> bool {
        self.origin == Origin::Pooled
            && self.current().is_none()
            && !self.flags().contains(SlotFlags::DESTROYED)
    }

    /// Whether a node asking for `requested` (or for `direct`) can take over this slot.
    pub fn can_adopt(&self, scene: &dyn Scene, requested: HostKind, direct: Option<ObjectId>) -> bool {
        if self.flags().contains(SlotFlags::DESTROYED) {
            return false;
        }
        match (direct, self.current()) {
            (Some(direct), current) => current == Some(direct),
            (None, Some(object)) => scene
                .kind_of(object)
                .is_some_and(|live| live.satisfies(requested)),
            (None, None) => self.expected.satisfies(requested),
        }
    }

    pub fn cached_children(&self) -> Vec<CachedChild> {
        self.children.borrow().clone()
    }

    pub fn set_children(&self, children: Vec<CachedChild>) {
        *self.children.borrow_mut() = children;
    }

    /// Point `node_ref` at the current object, releasing a different previous ref.
    pub fn bind_ref(&self, node_ref: Option<NodeRef>) {
        let next = node_ref.zip(self.current());
        let mut bound = self.bound.borrow_mut();
        let unchanged = match (&*bound, &next) {
            (Some((old, old_obj)), Some((new, new_obj))) => old.same(new) && old_obj == new_obj,
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return;
        }
        let previous = std::mem::replace(&mut *bound, next.clone());
        drop(bound);

        if let Some((old, old_obj)) = previous {
            old.release(old_obj);
        }
        if let Some((new, object)) = next {
            new.bind(object);
        }
    }

    /// Tear down this slot and everything cached under it. Runs at most once.
    pub fn teardown(&self, scene: &dyn Scene) {
        let flags = self.flags();
        if flags.contains(SlotFlags::DESTROYED) {
            return;
        }
        self.flags.set(flags | SlotFlags::DESTROYED);

        let children = std::mem::take(&mut *self.children.borrow_mut());
        for cached in &children {
            cached.child.teardown(scene);
        }

        let bound = self.bound.borrow_mut().take();
        if let Some((node_ref, object)) = bound {
            node_ref.release(object);
        }

        let Some(object) = self.current() else {
            return;
        };
        match (flags.contains(SlotFlags::POOLED), self.pool.get()) {
            (true, Some(group)) => {
                log::debug!("released {object} to pool {group}");
                scene.pool_release(group, object);
                scene.apply(object, Mutation::BodyStop);
                scene.apply(object, Mutation::BodyEnable(false));
            }
            _ => {
                log::debug!("destroyed {object}");
                scene.destroy(object);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{CreateSpec, HeadlessScene};
    use crate::primitives::{GroupConfig, HostRef};

    #[test]
    fn test_teardown_destroys_once() {
        let scene = HeadlessScene::new();
        let object = scene.create(CreateSpec::Graphics).unwrap();
        let slot = HostSlot::new(Origin::Create, HostKind::Graphics);
        slot.resolve_to(object);

        slot.teardown(&scene);
        slot.teardown(&scene);
        assert_eq!(scene.object(object).unwrap().destroy_count, 1);
    }

    #[test]
    fn test_teardown_releases_pooled() {
        let scene = HeadlessScene::new();
        let group = scene
            .create(CreateSpec::PhysicsGroup { config: GroupConfig::default() })
            .unwrap();
        let member = scene.pool_acquire(group).unwrap();

        let slot = HostSlot::pooled();
        slot.resolve_pooled(group, member);
        slot.teardown(&scene);

        let record = scene.object(member).unwrap();
        assert!(record.alive);
        assert!(!record.active);
        assert_eq!(record.destroy_count, 0);
        assert!(record.mutations.contains(&Mutation::BodyEnable(false)));
    }

    #[test]
    fn test_starved_member_through_components() {
        let scene: Rc<dyn Scene> = Rc::new(HeadlessScene::new());
        let slot = HostSlot::pooled();
        let instance = Instance::new(
            scene.clone(),
            crate::primitives::ComponentType::of(|_: &()| Ok(None)),
            Rc::new(()),
            None,
            Some(Child::Host(slot.clone())),
        );
        let child = Child::Instance(instance);
        assert!(child.starved_member().is_some_and(|s| Rc::ptr_eq(&s, &slot)));

        slot.resolve_pooled(ObjectId(1), ObjectId(2));
        assert!(child.starved_member().is_none());
        assert!(slot.take_fresh());
        assert!(!slot.take_fresh());
    }

    #[test]
    fn test_bind_ref_moves_between_refs() {
        let scene = HeadlessScene::new();
        let object = scene.create(CreateSpec::Graphics).unwrap();
        let slot = HostSlot::new(Origin::Create, HostKind::Graphics);
        slot.resolve_to(object);

        let first = HostRef::new();
        let second = HostRef::new();
        slot.bind_ref(Some(NodeRef::from(&first)));
        assert_eq!(first.current(), Some(object));

        slot.bind_ref(Some(NodeRef::from(&second)));
        assert_eq!(first.current(), None);
        assert_eq!(second.current(), Some(object));

        slot.teardown(&scene);
        assert_eq!(second.current(), None);
    }

    #[test]
    fn test_adoption_rules() {
        let scene = HeadlessScene::new();
        let pooled = HostSlot::pooled();
        assert!(pooled.can_adopt(&scene, HostKind::PhysicsSprite, None));
        assert!(pooled.can_adopt(&scene, HostKind::Sprite, None));
        assert!(!pooled.can_adopt(&scene, HostKind::Text, None));

        let object = scene
            .create(CreateSpec::PhysicsSprite { x: 0.0, y: 0.0, texture: None, frame: None })
            .unwrap();
        let slot = HostSlot::new(Origin::Create, HostKind::PhysicsSprite);
        slot.resolve_to(object);
        assert!(slot.can_adopt(&scene, HostKind::Sprite, None));
        assert!(slot.can_adopt(&scene, HostKind::Sprite, Some(object)));
        assert!(!slot.can_adopt(&scene, HostKind::Sprite, Some(ObjectId(999))));
    }
}
