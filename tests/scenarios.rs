//! End-to-end scenarios against the headless scene.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use spark_stage::{
    create_node, mount_root, on_mount, use_effect, use_host_ref, use_layout_effect, use_state,
    use_store, use_update, BodyProps, Cleanup, CommonProps, ContainerProps, CreateSpec, Error,
    GroupConfig,
    GroupProps, HeadlessScene, HostKind, HostRef, Mutation, Node, ObjectId, PhysicsSpriteProps,
    Render, SceneError, SetState, SpriteProps, Store, StoreListener, StoreMutation, TextProps,
    Unsubscribe,
};

fn headless() -> Rc<HeadlessScene> {
    Rc::new(HeadlessScene::new())
}

/// Shared slot a component writes its setter into.
type Setter<T> = Rc<RefCell<Option<SetState<T>>>>;

fn setter<T>(slot: &Setter<T>) -> SetState<T> {
    slot.borrow().clone().expect("component rendered")
}

// =============================================================================
// State
// =============================================================================

#[derive(Clone, Default)]
struct CounterProps {
    renders: Rc<Cell<u32>>,
    setter: Setter<u32>,
}

fn counter(props: &CounterProps) -> Render {
    props.renders.set(props.renders.get() + 1);
    let (count, set) = use_state(0u32)?;
    props.setter.borrow_mut().replace(set);
    Ok(Some(Node::host(TextProps {
        text: Some(count.to_string()),
        ..Default::default()
    })))
}

#[test]
fn test_setting_equal_state_does_not_render() {
    let scene = headless();
    let props = CounterProps::default();
    let _root = mount_root(scene.clone(), counter, props.clone()).unwrap();
    assert_eq!(props.renders.get(), 1);

    setter(&props.setter).set(0).unwrap();
    assert_eq!(props.renders.get(), 1);

    setter(&props.setter).set(1).unwrap();
    setter(&props.setter).set(1).unwrap();
    assert_eq!(props.renders.get(), 2);
}

#[test]
fn test_state_change_patches_text() {
    let scene = headless();
    let props = CounterProps::default();
    let root = mount_root(scene.clone(), counter, props.clone()).unwrap();
    let label = root.object().unwrap();
    scene.clear_mutations();

    setter(&props.setter).update(|n| n + 5).unwrap();
    assert_eq!(scene.mutations(label), vec![Mutation::Text("5".to_string())]);
    assert_eq!(scene.created().len(), 1);
}

#[test]
fn test_setter_after_unmount_is_ignored() {
    let scene = headless();
    let props = CounterProps::default();
    let root = mount_root(scene.clone(), counter, props.clone()).unwrap();
    root.unmount();

    setter(&props.setter).set(9).unwrap();
    assert_eq!(props.renders.get(), 1);
}

fn sets_during_render(props: &CounterProps) -> Render {
    let (_, set) = use_state(0u32)?;
    set.set(1)?;
    props.renders.set(props.renders.get() + 1);
    Ok(None)
}

#[test]
fn test_setter_during_render_fails() {
    let result = mount_root(headless(), sets_during_render, CounterProps::default());
    assert!(matches!(result, Err(Error::RenderInProgress { .. })));
}

#[test]
fn test_hook_outside_render_fails() {
    let result = use_state(1);
    assert!(matches!(result, Err(Error::NoRenderContext { hook: "use_state" })));
}

// =============================================================================
// Effects & Cleanup
// =============================================================================

type Log = Rc<RefCell<Vec<&'static str>>>;

fn lifecycle(log: &Log) -> Render {
    let l = log.clone();
    on_mount(move || {
        l.borrow_mut().push("mount");
        let l = l.clone();
        Some(Box::new(move || l.borrow_mut().push("mount cleanup")) as Cleanup)
    })?;
    let l = log.clone();
    use_effect(move || {
        l.borrow_mut().push("effect");
        let l = l.clone();
        Some(Box::new(move || l.borrow_mut().push("effect cleanup")) as Cleanup)
    }, None::<()>)?;
    let l = log.clone();
    use_layout_effect(move || {
        l.borrow_mut().push("layout");
        None
    }, Some(()))?;
    Ok(None)
}

#[test]
fn test_layout_effects_flush_before_passive() {
    let log: Log = Rc::default();
    let root = mount_root(headless(), lifecycle, log.clone()).unwrap();
    assert_eq!(*log.borrow(), vec!["mount", "layout", "effect"]);

    // Deps-less effect reruns, the others do not.
    root.update(log.clone()).unwrap();
    assert_eq!(
        *log.borrow(),
        vec!["mount", "layout", "effect", "effect cleanup", "effect"]
    );
}

#[test]
fn test_cleanups_run_exactly_once_on_unmount() {
    let log: Log = Rc::default();
    let root = mount_root(headless(), lifecycle, log.clone()).unwrap();
    log.borrow_mut().clear();

    root.unmount();
    root.unmount();
    drop(root);
    assert_eq!(*log.borrow(), vec!["mount cleanup", "effect cleanup"]);
}

// =============================================================================
// Keyed Lists
// =============================================================================

fn list(keys: &Vec<i64>) -> Render {
    Ok(Some(create_node(
        ContainerProps::default(),
        keys.iter().map(|k| {
            Some(Node::host(TextProps {
                common: CommonProps {
                    key: Some((*k).into()),
                    ..Default::default()
                },
                text: Some(format!("row {k}")),
                ..Default::default()
            }))
        }),
    )))
}

#[test]
fn test_keyed_reorder_reuses_objects() {
    let scene = headless();
    let root = mount_root(scene.clone(), list, vec![1, 2, 3, 4]).unwrap();
    let container = root.object().unwrap();
    let rows = scene.children(container);

    root.update(vec![4, 2, 1]).unwrap();
    assert_eq!(scene.children(container), vec![rows[3], rows[1], rows[0]]);
    assert!(!scene.is_alive(rows[2]));

    root.update(vec![4, 2, 1, 5]).unwrap();
    let children = scene.children(container);
    assert_eq!(&children[..3], &[rows[3], rows[1], rows[0]]);
    assert_eq!(scene.created().len(), 6);
}

// =============================================================================
// Pools
// =============================================================================

fn swarm(enemies: &Vec<i64>) -> Render {
    let group = Node::host(GroupProps {
        config: GroupConfig {
            max_size: Some(3),
            default_texture: Some("enemy".to_string()),
            ..Default::default()
        },
        ..Default::default()
    });
    Ok(Some(group.with_children(enemies.iter().map(|id| {
        Some(Node::host(PhysicsSpriteProps {
            sprite: SpriteProps {
                common: CommonProps {
                    key: Some((*id).into()),
                    x: Some(*id as f32 * 10.0),
                    ..Default::default()
                },
                ..Default::default()
            },
            ..Default::default()
        }))
    }))))
}

#[test]
fn test_pool_capacity_and_reuse() {
    let scene = headless();
    let root = mount_root(scene.clone(), swarm, vec![1, 2, 3, 4, 5]).unwrap();
    let group = root.object().unwrap();

    // Capacity bounds the active members; nothing is created outside the pool.
    assert_eq!(scene.active_members(group).len(), 3);
    assert_eq!(scene.pool_members(group).len(), 3);
    assert!(scene.root_children().iter().all(|id| *id == group));

    root.update(vec![1, 2]).unwrap();
    assert_eq!(scene.active_members(group).len(), 2);
    let released: Vec<ObjectId> = scene
        .pool_members(group)
        .into_iter()
        .filter(|id| !scene.object(*id).unwrap().active)
        .collect();
    assert_eq!(released.len(), 1);
    let record = scene.object(released[0]).unwrap();
    assert!(record.alive);
    assert_eq!(record.destroy_count, 0);
    assert!(record.mutations.contains(&Mutation::BodyEnable(false)));

    // Freed members come back for new keys.
    root.update(vec![1, 2, 6, 7]).unwrap();
    assert_eq!(scene.active_members(group).len(), 3);
    assert_eq!(scene.pool_members(group).len(), 3);
    assert!(scene.object(released[0]).unwrap().active);

    root.unmount();
    assert!(scene.active_members(group).is_empty());
    assert!(!scene.is_alive(group));
}

#[derive(Clone)]
struct BulletProps {
    id: i64,
    host: HostRef,
    log: Log,
}

fn bullet(props: &BulletProps) -> Render {
    // Spawn id is captured once; a remount would show up in the log.
    let (spawned_as, _) = use_state(props.id)?;
    let log = props.log.clone();
    on_mount(move || {
        log.borrow_mut().push("bullet mount");
        let log = log.clone();
        Some(Box::new(move || log.borrow_mut().push("bullet cleanup")) as Cleanup)
    })?;
    Ok(Some(Node::host(PhysicsSpriteProps {
        sprite: SpriteProps {
            common: CommonProps {
                node_ref: Some(props.host.clone().into()),
                x: Some(spawned_as as f32 * 10.0),
                ..Default::default()
            },
            ..Default::default()
        },
        body: BodyProps {
            velocity_y: Some(-300.0),
            ..Default::default()
        },
    })))
}

#[derive(Clone)]
struct Volley {
    capacity: usize,
    bullets: Vec<BulletProps>,
}

fn volley(props: &Volley) -> Render {
    let group = Node::host(GroupProps {
        config: GroupConfig {
            max_size: Some(props.capacity),
            ..Default::default()
        },
        ..Default::default()
    });
    Ok(Some(group.with_children(
        props
            .bullets
            .iter()
            .map(|b| Some(Node::component(bullet, b.clone()).with_key(b.id))),
    )))
}

fn bullets(ids: &[i64], log: &Log) -> Vec<BulletProps> {
    ids.iter()
        .map(|id| BulletProps {
            id: *id,
            host: HostRef::new(),
            log: log.clone(),
        })
        .collect()
}

#[test]
fn test_component_members_adopt_and_release_pool_objects() {
    let scene = headless();
    let log: Log = Rc::default();
    let shots = bullets(&[1, 2], &log);
    let root = mount_root(scene.clone(), volley, Volley { capacity: 4, bullets: shots.clone() }).unwrap();
    let group = root.object().unwrap();

    // Both components took over pool members instead of creating objects.
    let first = shots[0].host.current().unwrap();
    let second = shots[1].host.current().unwrap();
    assert_eq!(scene.pool_members(group), vec![first, second]);
    assert_eq!(scene.root_children(), vec![group]);
    let mutations = scene.mutations(first);
    assert!(mutations.contains(&Mutation::X(10.0)));
    assert!(mutations.contains(&Mutation::VelocityY(-300.0)));

    root.update(Volley { capacity: 4, bullets: vec![shots[1].clone()] }).unwrap();
    let record = scene.object(first).unwrap();
    assert!(record.alive);
    assert!(!record.active);
    assert_eq!(record.destroy_count, 0);
    assert!(record.mutations.contains(&Mutation::BodyStop));
    assert!(record.mutations.contains(&Mutation::BodyEnable(false)));
    assert_eq!(shots[0].host.current(), None);
    assert_eq!(scene.active_members(group), vec![second]);
    assert_eq!(*log.borrow(), vec!["bullet mount", "bullet mount", "bullet cleanup"]);
}

#[test]
fn test_starved_component_member_acquires_once_pool_frees() {
    let scene = headless();
    let log: Log = Rc::default();
    let shots = bullets(&[1, 2], &log);
    let root = mount_root(scene.clone(), volley, Volley { capacity: 1, bullets: shots.clone() }).unwrap();
    let group = root.object().unwrap();

    let member = shots[0].host.current().unwrap();
    assert_eq!(shots[1].host.current(), None);
    assert_eq!(scene.active_members(group), vec![member]);
    scene.clear_mutations();

    root.update(Volley { capacity: 1, bullets: vec![shots[1].clone()] }).unwrap();
    assert_eq!(shots[1].host.current(), Some(member));
    assert_eq!(scene.active_members(group), vec![member]);
    assert_eq!(scene.pool_members(group).len(), 1);

    // The late member gets the full prop set, from the same instance.
    let mutations = scene.mutations(member);
    assert!(mutations.contains(&Mutation::X(20.0)));
    assert!(mutations.contains(&Mutation::VelocityY(-300.0)));
    assert_eq!(*log.borrow(), vec!["bullet mount", "bullet mount", "bullet cleanup"]);
}

// =============================================================================
// Component Lifecycle
// =============================================================================

fn squad_member(log: &Log) -> Render {
    let l = log.clone();
    on_mount(move || {
        let l = l.clone();
        Some(Box::new(move || l.borrow_mut().push("member cleanup")) as Cleanup)
    })?;
    Ok(Some(Node::host(TextProps {
        text: Some("member".to_string()),
        ..Default::default()
    })))
}

fn squad_leader(log: &Log) -> Render {
    let l = log.clone();
    on_mount(move || {
        let l = l.clone();
        Some(Box::new(move || l.borrow_mut().push("leader cleanup")) as Cleanup)
    })?;
    Ok(Some(Node::component(squad_member, log.clone())))
}

fn squad(log: &Log) -> Render {
    Ok(Some(create_node(
        ContainerProps::default(),
        [
            Some(Node::component(squad_leader, log.clone())),
            Some(Node::component(squad_member, log.clone())),
        ],
    )))
}

#[test]
fn test_root_unmount_runs_nested_cleanups_once() {
    let scene = headless();
    let log: Log = Rc::default();
    let root = mount_root(scene.clone(), squad, log.clone()).unwrap();
    let container = root.object().unwrap();
    assert_eq!(scene.alive_of_kind(HostKind::Text).len(), 2);
    assert!(log.borrow().is_empty());

    root.unmount();
    assert_eq!(*log.borrow(), vec!["leader cleanup", "member cleanup", "member cleanup"]);
    assert!(scene.alive_of_kind(HostKind::Text).is_empty());
    assert!(!scene.is_alive(container));

    root.unmount();
    drop(root);
    assert_eq!(log.borrow().len(), 3);
}

fn scout(log: &Log) -> Render {
    let l = log.clone();
    on_mount(move || {
        l.borrow_mut().push("scout mount");
        None
    })?;
    Ok(Some(Node::host(SpriteProps::default())))
}

#[derive(Clone)]
struct PostProps {
    scouting: bool,
    log: Log,
}

fn post(props: &PostProps) -> Render {
    Ok(Some(if props.scouting {
        Node::component(scout, props.log.clone())
    } else {
        Node::component(squad_member, props.log.clone())
    }))
}

#[test]
fn test_component_identity_change_replaces_instance() {
    let scene = headless();
    let log: Log = Rc::default();
    let root = mount_root(scene.clone(), post, PostProps { scouting: false, log: log.clone() }).unwrap();
    let label = root.object().unwrap();

    root.update(PostProps { scouting: true, log: log.clone() }).unwrap();
    assert_eq!(*log.borrow(), vec!["member cleanup", "scout mount"]);
    assert_eq!(scene.object(label).unwrap().destroy_count, 1);

    let sprite = root.object().unwrap();
    assert_ne!(sprite, label);
    assert_eq!(scene.object(sprite).unwrap().kind, HostKind::Sprite);
    assert_eq!(scene.root_children(), vec![sprite]);
}

// =============================================================================
// Refs
// =============================================================================

#[derive(Clone)]
struct RefProps {
    show: bool,
    host: HostRef,
}

fn maybe_sprite(props: &RefProps) -> Render {
    Ok(props.show.then(|| {
        Node::host(SpriteProps {
            common: CommonProps {
                node_ref: Some(props.host.clone().into()),
                ..Default::default()
            },
            ..Default::default()
        })
    }))
}

#[test]
fn test_ref_set_then_cleared_with_single_destroy() {
    let scene = headless();
    let host = HostRef::new();
    let root = mount_root(scene.clone(), maybe_sprite, RefProps { show: true, host: host.clone() }).unwrap();
    let object = host.current().unwrap();
    assert_eq!(scene.root_children(), vec![object]);

    root.update(RefProps { show: false, host: host.clone() }).unwrap();
    assert_eq!(host.current(), None);
    assert_eq!(scene.object(object).unwrap().destroy_count, 1);

    // Nothing left to tear down on a second hidden render.
    root.update(RefProps { show: false, host: host.clone() }).unwrap();
    assert_eq!(host.current(), None);
    assert_eq!(scene.object(object).unwrap().destroy_count, 1);

    root.unmount();
    assert_eq!(scene.object(object).unwrap().destroy_count, 1);
}

fn reads_own_ref(seen: &Rc<RefCell<Vec<Option<ObjectId>>>>) -> Render {
    let host = use_host_ref()?;
    let (s, h) = (seen.clone(), host.clone());
    use_layout_effect(move || {
        s.borrow_mut().push(h.current());
        None
    }, Some(()))?;
    Ok(Some(Node::host(SpriteProps {
        common: CommonProps {
            node_ref: Some(host.into()),
            ..Default::default()
        },
        ..Default::default()
    })))
}

#[test]
fn test_ref_is_bound_before_layout_effects() {
    let scene = headless();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let root = mount_root(scene.clone(), reads_own_ref, seen.clone()).unwrap();
    assert_eq!(*seen.borrow(), vec![root.object()]);
}

// =============================================================================
// Stores & Ticks
// =============================================================================

#[derive(Clone, Default)]
struct ScoreStore {
    score: Rc<Cell<u32>>,
    listeners: Rc<RefCell<Vec<StoreListener>>>,
}

impl ScoreStore {
    fn add(&self, points: u32) {
        self.score.set(self.score.get() + points);
        let listeners = self.listeners.borrow().clone();
        let mutation = StoreMutation {
            store: "score".to_string(),
            action: "add".to_string(),
            changes: vec!["score".to_string()],
        };
        for listener in listeners {
            listener(&mutation);
        }
    }
}

impl Store for ScoreStore {
    type State = u32;

    fn state(&self) -> u32 {
        self.score.get()
    }

    fn subscribe(&self, listener: StoreListener) -> Unsubscribe {
        self.listeners.borrow_mut().push(listener.clone());
        let listeners = self.listeners.clone();
        Box::new(move || listeners.borrow_mut().retain(|l| !Rc::ptr_eq(l, &listener)))
    }
}

#[derive(Clone, Default)]
struct HudProps {
    store: ScoreStore,
    ticks: Rc<Cell<u32>>,
}

fn hud(props: &HudProps) -> Render {
    let score = use_store(&props.store, |s: &u32| *s)?;
    let ticks = props.ticks.clone();
    use_update(move |_, _| ticks.set(ticks.get() + 1))?;
    Ok(Some(Node::host(TextProps {
        text: Some(format!("score {score}")),
        ..Default::default()
    })))
}

#[test]
fn test_store_and_ticks_stop_after_unmount() {
    let scene = headless();
    let props = HudProps::default();
    let root = mount_root(scene.clone(), hud, props.clone()).unwrap();
    let label = root.object().unwrap();

    props.store.add(5);
    assert!(scene.mutations(label).contains(&Mutation::Text("score 5".to_string())));
    scene.emit_update(0.0, 16.0);
    assert_eq!(props.ticks.get(), 1);

    root.unmount();
    assert!(props.store.listeners.borrow().is_empty());
    assert_eq!(scene.tick_listener_count(), 0);

    props.store.add(1);
    scene.emit_update(16.0, 16.0);
    assert_eq!(props.ticks.get(), 1);
}

// =============================================================================
// Host Errors & Direct Objects
// =============================================================================

fn labelled_panel(_: &()) -> Render {
    Ok(Some(create_node(
        ContainerProps::default(),
        [Some(Node::host(TextProps::default()))],
    )))
}

#[test]
fn test_failed_commit_keeps_applied_ops() {
    let scene = headless();
    scene.reject_kind(HostKind::Text);
    let result = mount_root(scene.clone(), labelled_panel, ());
    assert!(matches!(result, Err(Error::Scene(SceneError::UnknownKind(HostKind::Text)))));

    // The container was created and attached before the text failed.
    let panels = scene.alive_of_kind(HostKind::Container);
    assert_eq!(panels.len(), 1);
    assert_eq!(scene.root_children(), panels);
}

#[test]
fn test_unknown_kind_surfaces_at_commit() {
    let scene = headless();
    scene.reject_kind(HostKind::Text);
    let result = mount_root(scene.clone(), counter, CounterProps::default());
    assert!(matches!(
        result,
        Err(Error::Scene(SceneError::UnknownKind(HostKind::Text)))
    ));
}

fn adopt(object: &ObjectId) -> Render {
    Ok(Some(Node::direct(*object, SpriteProps {
        tint: Some(0x00ff00),
        ..Default::default()
    })))
}

#[test]
fn test_direct_node_applies_declared_props_only() {
    let scene = headless();
    let existing = scene.spawn(CreateSpec::Sprite {
        x: 5.0,
        y: 5.0,
        texture: Some("hero".to_string()),
        frame: None,
    });
    let root = mount_root(scene.clone(), adopt, existing).unwrap();

    assert_eq!(root.object(), Some(existing));
    assert_eq!(scene.mutations(existing), vec![Mutation::Tint(0x00ff00)]);
    assert_eq!(scene.created(), vec![existing]);
}
