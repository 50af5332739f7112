//! Headless scene - An in-memory [`Scene`] that records every call.
//!
//! Used by the test suite and by tools that want to run component trees
//! without a renderer. It models just enough host behaviour to make the
//! reconciler's effects observable: object liveness, display lists, pool
//! membership, metadata, pointer listeners and tick listeners.
//!
//! ```ignore
//! let scene = Rc::new(HeadlessScene::new());
//! let root = mount_root(scene.clone(), app, ())?;
//! assert_eq!(scene.alive_of_kind(HostKind::Sprite).len(), 3);
//! ```

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::error::SceneError;
use crate::host::{CreateSpec, Mutation, ObjectMetrics, Scene, TickFn};
use crate::types::{
    DataValue, HostKind, ListenerId, Metadata, ObjectId, PointerEvent, PointerHandler, PointerKind,
};

/// Everything the headless scene knows about one object.
#[derive(Debug, Clone)]
pub struct ObjectRecord {
    pub kind: HostKind,
    pub spec: CreateSpec,
    pub alive: bool,
    /// How many times `destroy` was called on this object.
    pub destroy_count: usize,
    pub active: bool,
    pub visible: bool,
    pub scale: f32,
    pub origin: (f32, f32),
    /// Every mutation applied, in order.
    pub mutations: Vec<Mutation>,
    pub data: Metadata,
    /// Declared custom fields and their current values.
    pub fields: BTreeMap<String, Option<DataValue>>,
    pub children: Vec<ObjectId>,
    pub parent: Option<ObjectId>,
    /// Pool members (groups only).
    pub members: Vec<ObjectId>,
    /// Owning pool (members only).
    pub group: Option<ObjectId>,
    pub listeners: Vec<(PointerKind, PointerHandler)>,
}

impl ObjectRecord {
    fn new(spec: CreateSpec) -> Self {
        Self {
            kind: spec.kind(),
            spec,
            alive: true,
            destroy_count: 0,
            active: true,
            visible: true,
            scale: 1.0,
            origin: (0.5, 0.5),
            mutations: Vec::new(),
            data: Metadata::new(),
            fields: BTreeMap::new(),
            children: Vec::new(),
            parent: None,
            members: Vec::new(),
            group: None,
            listeners: Vec::new(),
        }
    }
}

#[derive(Default)]
struct SceneState {
    next_object: u64,
    next_listener: u64,
    objects: BTreeMap<ObjectId, ObjectRecord>,
    /// Creation order.
    created: Vec<ObjectId>,
    root: Vec<ObjectId>,
    ticks: Vec<(ListenerId, TickFn)>,
    rejected: HashSet<HostKind>,
    frame_size: (f32, f32),
}

impl SceneState {
    fn insert(&mut self, spec: CreateSpec) -> ObjectId {
        self.next_object += 1;
        let id = ObjectId(self.next_object);
        self.objects.insert(id, ObjectRecord::new(spec));
        self.created.push(id);
        id
    }

    fn detach(&mut self, id: ObjectId) {
        self.root.retain(|o| *o != id);
        let parent = self.objects.get_mut(&id).and_then(|r| r.parent.take());
        if let Some(parent) = parent.and_then(|p| self.objects.get_mut(&p)) {
            parent.children.retain(|o| *o != id);
        }
    }

    fn live(&mut self, id: ObjectId) -> Option<&mut ObjectRecord> {
        self.objects.get_mut(&id).filter(|r| r.alive)
    }
}

/// In-memory scene graph.
#[derive(Default)]
pub struct HeadlessScene {
    state: RefCell<SceneState>,
}

impl HeadlessScene {
    pub fn new() -> Self {
        let scene = Self::default();
        scene.state.borrow_mut().frame_size = (32.0, 32.0);
        scene
    }

    // =========================================================================
    // Setup
    // =========================================================================

    /// Make `create` fail for this kind, like a host without that factory.
    pub fn reject_kind(&self, kind: HostKind) {
        self.state.borrow_mut().rejected.insert(kind);
    }

    /// Natural frame size reported for textured objects (default 32x32).
    pub fn set_frame_size(&self, width: f32, height: f32) {
        self.state.borrow_mut().frame_size = (width, height);
    }

    /// Create an object outside the reconciler, for direct nodes.
    pub fn spawn(&self, spec: CreateSpec) -> ObjectId {
        self.state.borrow_mut().insert(spec)
    }

    /// Give an object a custom field, so `data` entries with that name are assigned to it.
    pub fn declare_field(&self, object: ObjectId, name: &str) {
        if let Some(record) = self.state.borrow_mut().live(object) {
            record.fields.insert(name.to_string(), None);
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn object(&self, object: ObjectId) -> Option<ObjectRecord> {
        self.state.borrow().objects.get(&object).cloned()
    }

    pub fn is_alive(&self, object: ObjectId) -> bool {
        self.state.borrow().objects.get(&object).is_some_and(|r| r.alive)
    }

    pub fn mutations(&self, object: ObjectId) -> Vec<Mutation> {
        self.state
            .borrow()
            .objects
            .get(&object)
            .map(|r| r.mutations.clone())
            .unwrap_or_default()
    }

    /// Forget recorded mutations, keeping object state.
    pub fn clear_mutations(&self) {
        for record in self.state.borrow_mut().objects.values_mut() {
            record.mutations.clear();
        }
    }

    /// Every object ever created, in creation order.
    pub fn created(&self) -> Vec<ObjectId> {
        self.state.borrow().created.clone()
    }

    pub fn alive_of_kind(&self, kind: HostKind) -> Vec<ObjectId> {
        let state = self.state.borrow();
        state
            .created
            .iter()
            .copied()
            .filter(|id| state.objects.get(id).is_some_and(|r| r.alive && r.kind == kind))
            .collect()
    }

    pub fn root_children(&self) -> Vec<ObjectId> {
        self.state.borrow().root.clone()
    }

    pub fn children(&self, container: ObjectId) -> Vec<ObjectId> {
        self.state
            .borrow()
            .objects
            .get(&container)
            .map(|r| r.children.clone())
            .unwrap_or_default()
    }

    pub fn pool_members(&self, group: ObjectId) -> Vec<ObjectId> {
        self.state
            .borrow()
            .objects
            .get(&group)
            .map(|r| r.members.clone())
            .unwrap_or_default()
    }

    pub fn active_members(&self, group: ObjectId) -> Vec<ObjectId> {
        let state = self.state.borrow();
        let Some(record) = state.objects.get(&group) else {
            return Vec::new();
        };
        record
            .members
            .iter()
            .copied()
            .filter(|id| state.objects.get(id).is_some_and(|m| m.alive && m.active))
            .collect()
    }

    pub fn tick_listener_count(&self) -> usize {
        self.state.borrow().ticks.len()
    }

    // =========================================================================
    // Driving
    // =========================================================================

    /// Run every tick listener once.
    pub fn emit_update(&self, time: f64, delta: f64) {
        let listeners: Vec<TickFn> = self
            .state
            .borrow()
            .ticks
            .iter()
            .map(|(_, f)| f.clone())
            .collect();
        for listener in listeners {
            listener(time, delta);
        }
    }

    /// Dispatch a pointer event to an object's handlers of that kind.
    pub fn pointer(&self, object: ObjectId, kind: PointerKind, event: PointerEvent) {
        let handlers: Vec<PointerHandler> = self
            .object(object)
            .map(|r| {
                r.listeners
                    .into_iter()
                    .filter(|(k, _)| *k == kind)
                    .map(|(_, h)| h)
                    .collect()
            })
            .unwrap_or_default();
        for handler in handlers {
            handler.call(&event);
        }
    }

    pub fn click(&self, object: ObjectId) {
        self.pointer(object, PointerKind::Down, PointerEvent::default());
    }
}

impl Scene for HeadlessScene {
    fn create(&self, spec: CreateSpec) -> Result<ObjectId, SceneError> {
        let mut state = self.state.borrow_mut();
        let kind = spec.kind();
        if state.rejected.contains(&kind) {
            return Err(SceneError::UnknownKind(kind));
        }
        Ok(state.insert(spec))
    }

    fn destroy(&self, object: ObjectId) {
        let mut state = self.state.borrow_mut();
        let group = match state.objects.get_mut(&object) {
            Some(record) => {
                record.destroy_count += 1;
                record.alive = false;
                record.active = false;
                record.group.take()
            }
            None => return,
        };
        state.detach(object);
        if let Some(group) = group.and_then(|g| state.objects.get_mut(&g)) {
            group.members.retain(|m| *m != object);
        }
    }

    fn kind_of(&self, object: ObjectId) -> Option<HostKind> {
        self.state.borrow().objects.get(&object).filter(|r| r.alive).map(|r| r.kind)
    }

    fn apply(&self, object: ObjectId, mutation: Mutation) {
        let mut state = self.state.borrow_mut();
        let Some(record) = state.live(object) else {
            return;
        };
        match &mutation {
            Mutation::Visible(v) => record.visible = *v,
            Mutation::Active(v) => record.active = *v,
            Mutation::Scale(s) => record.scale = *s,
            Mutation::Origin(x, y) => record.origin = (*x, *y),
            Mutation::Data(key, value) => {
                record.data.insert(key.clone(), value.clone());
            }
            Mutation::Field(key, value) => {
                if let Some(slot) = record.fields.get_mut(key) {
                    *slot = Some(value.clone());
                }
            }
            Mutation::Listen(kind, handler) => record.listeners.push((*kind, handler.clone())),
            Mutation::Unlisten(kind, handler) => {
                record.listeners.retain(|(k, h)| !(k == kind && h == handler));
            }
            _ => {}
        }
        record.mutations.push(mutation);
    }

    fn metrics(&self, object: ObjectId) -> ObjectMetrics {
        let state = self.state.borrow();
        let (width, height) = state.frame_size;
        match state.objects.get(&object) {
            Some(record) => ObjectMetrics {
                width,
                height,
                scale_x: record.scale,
                origin_x: record.origin.0,
                origin_y: record.origin.1,
                display_width: width * record.scale,
                display_height: height * record.scale,
            },
            None => ObjectMetrics::default(),
        }
    }

    fn has_field(&self, object: ObjectId, name: &str) -> bool {
        self.state
            .borrow()
            .objects
            .get(&object)
            .is_some_and(|r| r.fields.contains_key(name))
    }

    fn data(&self, object: ObjectId, key: &str) -> Option<DataValue> {
        self.state.borrow().objects.get(&object)?.data.get(key).cloned()
    }

    fn add_to_root(&self, object: ObjectId) {
        let mut state = self.state.borrow_mut();
        if state.live(object).is_none() {
            return;
        }
        state.detach(object);
        state.root.push(object);
    }

    fn add_to_container(&self, container: ObjectId, object: ObjectId) {
        let mut state = self.state.borrow_mut();
        if state.live(object).is_none() || state.live(container).is_none() {
            return;
        }
        state.detach(object);
        if let Some(record) = state.objects.get_mut(&object) {
            record.parent = Some(container);
        }
        if let Some(record) = state.objects.get_mut(&container) {
            record.children.push(object);
        }
    }

    fn child_index(&self, container: ObjectId, object: ObjectId) -> Option<usize> {
        let state = self.state.borrow();
        state.objects.get(&container)?.children.iter().position(|o| *o == object)
    }

    fn move_child(&self, container: ObjectId, object: ObjectId, index: usize) {
        let mut state = self.state.borrow_mut();
        let Some(record) = state.live(container) else {
            return;
        };
        let Some(from) = record.children.iter().position(|o| *o == object) else {
            return;
        };
        let child = record.children.remove(from);
        let index = index.min(record.children.len());
        record.children.insert(index, child);
    }

    fn pool_acquire(&self, group: ObjectId) -> Option<ObjectId> {
        let mut state = self.state.borrow_mut();
        let record = state.live(group)?;
        let CreateSpec::PhysicsGroup { config } = record.spec.clone() else {
            return None;
        };
        let members = record.members.clone();

        let free = members
            .iter()
            .copied()
            .find(|id| state.objects.get(id).is_some_and(|m| m.alive && !m.active));
        if let Some(member) = free {
            if let Some(record) = state.objects.get_mut(&member) {
                record.active = true;
                record.visible = true;
            }
            return Some(member);
        }

        if config.max_size.is_some_and(|max| members.len() >= max) {
            return None;
        }
        let member = state.insert(CreateSpec::PhysicsSprite {
            x: 0.0,
            y: 0.0,
            texture: config.default_texture,
            frame: config.default_frame,
        });
        if let Some(record) = state.objects.get_mut(&member) {
            record.group = Some(group);
        }
        if let Some(record) = state.objects.get_mut(&group) {
            record.members.push(member);
        }
        Some(member)
    }

    fn pool_release(&self, group: ObjectId, member: ObjectId) {
        let mut state = self.state.borrow_mut();
        let owned = state.objects.get(&group).is_some_and(|g| g.members.contains(&member));
        if !owned {
            return;
        }
        if let Some(record) = state.live(member) {
            record.active = false;
            record.visible = false;
        }
    }

    fn on_update(&self, listener: TickFn) -> ListenerId {
        let mut state = self.state.borrow_mut();
        state.next_listener += 1;
        let id = ListenerId(state.next_listener);
        state.ticks.push((id, listener));
        id
    }

    fn off_update(&self, listener: ListenerId) {
        self.state.borrow_mut().ticks.retain(|(id, _)| *id != listener);
    }
}

/// Distinct live kinds, for debug output.
impl std::fmt::Debug for HeadlessScene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        let kinds: BTreeSet<&'static str> = state
            .objects
            .values()
            .filter(|r| r.alive)
            .map(|r| r.kind.as_str())
            .collect();
        f.debug_struct("HeadlessScene")
            .field("objects", &state.objects.len())
            .field("kinds", &kinds)
            .field("root", &state.root)
            .finish()
    }
}
