//! Reconciler - Diff two node trees into commit ops.
//!
//! [`reconcile`] compares the previous and next descriptor for one position
//! in the tree and decides whether to keep, patch, replace or adopt what sits
//! there. It never touches the host; every effect is an [`Op`] appended to
//! the queue.
//!
//! # Decision order
//!
//! 1. No new node: tear down what exists.
//! 2. Component node: reuse the instance when the identity matches, else
//!    replace it (a host slot left in place is handed to the new instance).
//! 3. Host or direct node: patch when the type matches, adopt a compatible
//!    unclaimed slot, else recreate.
//! 4. Containers and groups: reconcile children by key, then by position.

use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use crate::config::warn_once;
use crate::error::{Error, Result};
use crate::host::Scene;
use crate::primitives::{Node, NodeType, Props};
use crate::types::{HostKind, Key};

use super::commit::{CommitQueue, Op};
use super::instance::Instance;
use super::slot::{CachedChild, Child, HostSlot, Origin};

/// Reconcile one tree position.
///
/// `parent` is the container new host objects attach to (`None`: scene
/// root). `existing` is what `old` produced. Returns what `new` produces.
pub fn reconcile(
    scene: &Rc<dyn Scene>,
    parent: Option<&Rc<HostSlot>>,
    old: Option<&Node>,
    new: Option<&Node>,
    existing: Option<Child>,
    queue: &mut CommitQueue,
) -> Result<Option<Child>> {
    let Some(new) = new else {
        if let Some(existing) = existing {
            queue.push(Op::Teardown(existing));
        }
        return Ok(None);
    };

    match new.ty() {
        NodeType::Component(_) => reconcile_component(scene, parent, old, new, existing, queue),
        NodeType::Host(_) | NodeType::Direct(_) => {
            reconcile_host(scene, parent, old, new, existing, queue).map(|slot| Some(Child::Host(slot)))
        }
    }
}

// =============================================================================
// Components
// =============================================================================

fn reconcile_component(
    scene: &Rc<dyn Scene>,
    parent: Option<&Rc<HostSlot>>,
    old: Option<&Node>,
    new: &Node,
    existing: Option<Child>,
    queue: &mut CommitQueue,
) -> Result<Option<Child>> {
    let (NodeType::Component(component), Props::Component(props)) = (new.ty(), new.props()) else {
        return Err(Error::PropsMismatch { component: "component" });
    };

    let same_identity = old.is_some_and(|old| old.ty().same(new.ty()));
    if let (true, Some(Child::Instance(instance))) = (same_identity, &existing) {
        instance.update(component.clone(), props.clone(), parent);
        instance.render_into(queue)?;
        return Ok(existing);
    }

    let adopted = match existing {
        Some(Child::Instance(replaced)) => {
            queue.push(Op::Teardown(Child::Instance(replaced)));
            None
        }
        host => host,
    };
    let instance = Instance::new(scene.clone(), component.clone(), props.clone(), parent, adopted);
    instance.render_into(queue)?;
    Ok(Some(Child::Instance(instance)))
}

// =============================================================================
// Host Nodes
// =============================================================================

fn reconcile_host(
    scene: &Rc<dyn Scene>,
    parent: Option<&Rc<HostSlot>>,
    old: Option<&Node>,
    new: &Node,
    existing: Option<Child>,
    queue: &mut CommitQueue,
) -> Result<Rc<HostSlot>> {
    let Some(props) = new.host_props() else {
        return Err(Error::PropsMismatch { component: "host node" });
    };
    let direct = match new.ty() {
        NodeType::Direct(object) => Some(*object),
        _ => None,
    };
    let requested = props.kind();

    let existing_slot = match &existing {
        Some(Child::Host(slot)) => Some(slot.clone()),
        _ => None,
    };
    let mut is_new = match (old, &existing_slot) {
        (Some(old), Some(_)) => !old.ty().same(new.ty()),
        _ => true,
    };
    // Adoption: an unclaimed slot (pool member, component-handed object)
    // whose object already fits the request.
    if old.is_none() {
        if let Some(slot) = &existing_slot {
            if slot.can_adopt(scene.as_ref(), requested, direct) {
                is_new = false;
            }
        }
    }

    let slot = match existing_slot.filter(|_| !is_new) {
        Some(slot) => {
            queue.push(Op::Patch {
                slot: slot.clone(),
                props: props.clone(),
                previous: old.and_then(|old| old.host_props().cloned()),
            });
            slot
        }
        None => {
            if let Some(existing) = existing {
                queue.push(Op::Teardown(existing));
            }
            let slot = match direct {
                Some(object) => {
                    let slot = HostSlot::new(Origin::Direct, requested);
                    queue.push(Op::ApplyDirect {
                        slot: slot.clone(),
                        object,
                        props: props.clone(),
                    });
                    slot
                }
                None => {
                    let slot = HostSlot::new(Origin::Create, requested);
                    queue.push(Op::Create {
                        slot: slot.clone(),
                        props: props.clone(),
                    });
                    slot
                }
            };
            queue.push(Op::Attach {
                slot: slot.clone(),
                parent: parent.cloned(),
            });
            slot
        }
    };

    queue.push(Op::BindRef {
        slot: slot.clone(),
        node_ref: props.common().node_ref.clone(),
    });

    let kind = match direct {
        Some(object) => scene.kind_of(object),
        None => Some(requested),
    };
    if let Some(kind) = kind.filter(|k| k.has_children()) {
        reconcile_children(scene, &slot, kind == HostKind::PhysicsGroup, new.children(), queue)?;
    }

    Ok(slot)
}

// =============================================================================
// Children
// =============================================================================

/// Match `children` against the slot's cached children and reconcile each.
///
/// Keyed children only match keyed predecessors; keyless children match the
/// remaining keyless predecessors in order. Unmatched predecessors are torn
/// down before any new work, so a group can reuse released members in the
/// same commit.
fn reconcile_children(
    scene: &Rc<dyn Scene>,
    slot: &Rc<HostSlot>,
    is_group: bool,
    children: &[Node],
    queue: &mut CommitQueue,
) -> Result<()> {
    let previous = slot.cached_children();

    let mut by_key: HashMap<&Key, usize> = HashMap::new();
    let mut keyless: VecDeque<usize> = VecDeque::new();
    for (index, cached) in previous.iter().enumerate() {
        match &cached.key {
            Some(key) => {
                by_key.entry(key).or_insert(index);
            }
            None => keyless.push_back(index),
        }
    }

    // First pass: pair every declared child with a predecessor.
    let mut seen: HashSet<&Key> = HashSet::new();
    let mut used = vec![false; previous.len()];
    let mut pairs: Vec<(&Node, Option<usize>)> = Vec::with_capacity(children.len());
    for node in children {
        let matched = match node.key() {
            Some(key) => {
                if !seen.insert(key) {
                    warn_once(&format!("duplicate-key:{key}"), || {
                        format!("duplicate key `{key}` among siblings; only the first is kept")
                    });
                    continue;
                }
                by_key.get(key).copied()
            }
            None => keyless.pop_front(),
        };
        if let Some(index) = matched {
            used[index] = true;
        }
        pairs.push((node, matched));
    }

    for (cached, &kept) in previous.iter().zip(&used) {
        if !kept {
            queue.push(Op::Teardown(cached.child.clone()));
        }
    }

    // Second pass: reconcile in declaration order.
    let attach_to = if is_group { None } else { Some(slot) };
    let mut next = Vec::with_capacity(pairs.len());
    for (node, matched) in pairs {
        let (old, existing) = match matched {
            Some(index) => {
                let cached = &previous[index];
                // A member that found the pool exhausted retries on every
                // render, into the same placeholder so components keep state.
                if let Some(member) = cached.child.starved_member().filter(|_| is_group) {
                    queue.push(Op::AcquirePooled {
                        group: slot.clone(),
                        member,
                    });
                }
                (Some(&cached.node), Some(cached.child.clone()))
            }
            None if is_group => {
                let member = HostSlot::pooled();
                queue.push(Op::AcquirePooled {
                    group: slot.clone(),
                    member: member.clone(),
                });
                (None, Some(Child::Host(member)))
            }
            None => (None, None),
        };

        if let Some(child) = reconcile(scene, attach_to, old, Some(node), existing, queue)? {
            next.push(CachedChild {
                key: node.key().cloned(),
                node: node.clone(),
                child,
            });
        }
    }

    queue.push(Op::CommitChildren {
        parent: slot.clone(),
        children: next,
        reorder: !is_group,
    });
    Ok(())
}
