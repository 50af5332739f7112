//! Commit queue - Deferred host work.
//!
//! Render only appends [`Op`]s and effects. [`CommitQueue::flush`] then runs
//! the ops in order, followed by every layout effect and every passive
//! effect, each list in insertion order.

use std::rc::Rc;

use crate::config::warn_once;
use crate::error::{Result, SceneError};
use crate::host::{adapter, Mutation, Scene};
use crate::primitives::{HostProps, Node, NodeRef};
use crate::types::{HostKind, ObjectId};

use super::instance::Instance;
use super::slot::{CachedChild, Child, HostSlot, Origin};

/// A post-commit callback (layout or passive effect).
pub type Effect = Box<dyn FnOnce() -> Result<()>>;

/// One deferred host operation.
pub enum Op {
    /// Create the slot's object.
    Create { slot: Rc<HostSlot>, props: Rc<HostProps> },
    /// Bind a direct node's object and apply its declared props.
    ApplyDirect {
        slot: Rc<HostSlot>,
        object: ObjectId,
        props: Rc<HostProps>,
    },
    /// Put the slot's object on the display list.
    Attach {
        slot: Rc<HostSlot>,
        parent: Option<Rc<HostSlot>>,
    },
    /// Diff props onto the slot's object; no previous props means mount.
    Patch {
        slot: Rc<HostSlot>,
        props: Rc<HostProps>,
        previous: Option<Rc<HostProps>>,
    },
    BindRef {
        slot: Rc<HostSlot>,
        node_ref: Option<NodeRef>,
    },
    Teardown(Child),
    /// Draw the next pool member into `member`.
    AcquirePooled {
        group: Rc<HostSlot>,
        member: Rc<HostSlot>,
    },
    /// Cache a container's reconciled children and sync their display order.
    CommitChildren {
        parent: Rc<HostSlot>,
        children: Vec<CachedChild>,
        reorder: bool,
    },
    FinishRender {
        instance: Rc<Instance>,
        rendered: Option<Node>,
        produced: Option<Child>,
    },
}

impl Op {
    fn run(self, scene: &dyn Scene) -> Result<()> {
        match self {
            Op::Create { slot, props } => {
                let object = adapter::create(scene, &props)?;
                slot.resolve_to(object);
            }

            Op::ApplyDirect { slot, object, props } => {
                if scene.kind_of(object).is_none() {
                    return Err(SceneError::MissingObject(object).into());
                }
                slot.resolve_to(object);
                adapter::patch(scene, object, &props, None, true, true);
            }

            Op::Attach { slot, parent } => {
                let Some(object) = slot.current() else {
                    return Ok(());
                };
                if scene.kind_of(object) == Some(HostKind::PhysicsGroup) {
                    return Ok(());
                }
                match parent.and_then(|p| p.current()) {
                    Some(container) => scene.add_to_container(container, object),
                    None => scene.add_to_root(object),
                }
            }

            Op::Patch { slot, props, previous } => {
                if let Some(object) = slot.current() {
                    let direct = slot.origin() == Origin::Direct;
                    // A late pool member has never seen the previous props.
                    let previous = if slot.take_fresh() { None } else { previous };
                    adapter::patch(scene, object, &props, previous.as_deref(), previous.is_none(), direct);
                }
            }

            Op::BindRef { slot, node_ref } => slot.bind_ref(node_ref),

            Op::Teardown(child) => child.teardown(scene),

            Op::AcquirePooled { group, member } => {
                let Some(group) = group.current() else {
                    return Ok(());
                };
                match scene.pool_acquire(group) {
                    Some(object) => {
                        scene.apply(object, Mutation::Active(true));
                        scene.apply(object, Mutation::Visible(true));
                        scene.apply(object, Mutation::BodyEnable(true));
                        member.resolve_pooled(group, object);
                        log::debug!("acquired {object} from pool {group}");
                    }
                    None => {
                        log::debug!("pool {group} exhausted");
                        warn_once(&format!("pool-exhausted:{group}"), || {
                            format!("pool {group} is exhausted; extra members are not shown")
                        });
                    }
                }
            }

            Op::CommitChildren { parent, children, reorder } => {
                if reorder {
                    if let Some(container) = parent.current() {
                        sync_order(scene, container, &children);
                    }
                }
                parent.set_children(children);
            }

            Op::FinishRender { instance, rendered, produced } => instance.finish(rendered, produced),
        }
        Ok(())
    }
}

/// Move container children so their indices follow declaration order.
fn sync_order(scene: &dyn Scene, container: ObjectId, children: &[CachedChild]) {
    let mut index = 0;
    for cached in children {
        let Some(object) = cached.child.object() else {
            continue;
        };
        let Some(current) = scene.child_index(container, object) else {
            continue;
        };
        if current != index {
            scene.move_child(container, object, index);
        }
        index += 1;
    }
}

// =============================================================================
// Queue
// =============================================================================

/// Work collected by one render pass.
#[derive(Default)]
pub struct CommitQueue {
    pub ops: Vec<Op>,
    pub layout_effects: Vec<Effect>,
    pub effects: Vec<Effect>,
}

impl CommitQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: Op) {
        self.ops.push(op);
    }

    /// Run host ops, then layout effects, then passive effects.
    ///
    /// Stops at the first error; work already applied stays applied.
    pub fn flush(self, scene: &dyn Scene) -> Result<()> {
        log::trace!(
            "commit: {} ops, {} layout effects, {} effects",
            self.ops.len(),
            self.layout_effects.len(),
            self.effects.len()
        );
        for op in self.ops {
            op.run(scene)?;
        }
        for effect in self.layout_effects {
            effect()?;
        }
        for effect in self.effects {
            effect()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{CreateSpec, HeadlessScene};
    use crate::engine::slot::SlotFlags;
    use crate::primitives::{ContainerProps, GroupConfig, SpriteProps};
    use std::cell::RefCell;

    #[test]
    fn test_flush_order() {
        let scene = HeadlessScene::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut queue = CommitQueue::new();

        let l = log.clone();
        queue.effects.push(Box::new(move || {
            l.borrow_mut().push("passive");
            Ok(())
        }));
        let l = log.clone();
        queue.layout_effects.push(Box::new(move || {
            l.borrow_mut().push("layout");
            Ok(())
        }));

        let slot = HostSlot::new(Origin::Create, HostKind::Container);
        queue.push(Op::Create {
            slot: slot.clone(),
            props: Rc::new(ContainerProps::default().into()),
        });
        queue.flush(&scene).unwrap();

        assert!(slot.current().is_some());
        assert_eq!(*log.borrow(), vec!["layout", "passive"]);
    }

    #[test]
    fn test_create_then_attach_to_container() {
        let scene = HeadlessScene::new();
        let container = HostSlot::new(Origin::Create, HostKind::Container);
        let sprite = HostSlot::new(Origin::Create, HostKind::Sprite);

        let mut queue = CommitQueue::new();
        queue.push(Op::Create {
            slot: container.clone(),
            props: Rc::new(ContainerProps::default().into()),
        });
        queue.push(Op::Attach { slot: container.clone(), parent: None });
        queue.push(Op::Create {
            slot: sprite.clone(),
            props: Rc::new(SpriteProps::default().into()),
        });
        queue.push(Op::Attach {
            slot: sprite.clone(),
            parent: Some(container.clone()),
        });
        queue.flush(&scene).unwrap();

        let c = container.current().unwrap();
        assert_eq!(scene.root_children(), vec![c]);
        assert_eq!(scene.children(c), vec![sprite.current().unwrap()]);
    }

    #[test]
    fn test_acquire_marks_member_pooled() {
        let scene = HeadlessScene::new();
        let group = HostSlot::new(Origin::Create, HostKind::PhysicsGroup);
        let id = scene
            .create(CreateSpec::PhysicsGroup {
                config: GroupConfig { max_size: Some(1), ..Default::default() },
            })
            .unwrap();
        group.resolve_to(id);

        let first = HostSlot::pooled();
        let second = HostSlot::pooled();
        let mut queue = CommitQueue::new();
        queue.push(Op::AcquirePooled { group: group.clone(), member: first.clone() });
        queue.push(Op::AcquirePooled { group: group.clone(), member: second.clone() });
        queue.flush(&scene).unwrap();

        let member = first.current().unwrap();
        assert!(first.flags().contains(SlotFlags::POOLED));
        assert!(scene.mutations(member).contains(&Mutation::BodyEnable(true)));
        assert!(second.current().is_none());
    }

    #[test]
    fn test_unknown_kind_fails_at_commit() {
        let scene = HeadlessScene::new();
        scene.reject_kind(HostKind::Sprite);
        let mut queue = CommitQueue::new();
        queue.push(Op::Create {
            slot: HostSlot::new(Origin::Create, HostKind::Sprite),
            props: Rc::new(SpriteProps::default().into()),
        });
        let err = queue.flush(&scene).unwrap_err();
        assert_eq!(err.to_string(), "unknown node type: sprite");
    }
}
