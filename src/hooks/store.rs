//! Store hooks - Subscribe a component to an external state store.
//!
//! The store itself lives outside the runtime. A component reads a selected
//! slice with [`use_store`]; the subscription goes in as a layout effect, so
//! nothing subscribes for a render that never commits. Notifications re-run
//! the selector and re-render only when the slice changed.
//!
//! ```ignore
//! fn hud(props: &HudProps) -> Render {
//!     let score = use_store(&props.game, |state: &GameState| state.score)?;
//!     Ok(Some(Node::host(TextProps {
//!         text: Some(format!("score {score}")),
//!         ..Default::default()
//!     })))
//! }
//! ```

use std::cell::Cell;
use std::rc::{Rc, Weak};

use spark_signals::{effect, untrack, Signal};

use crate::engine::context::{rendering_component, schedule_layout_effect};
use crate::engine::{next_hook, Instance};
use crate::error::{Error, Result};

// =============================================================================
// Store Interface
// =============================================================================

/// What changed in one store transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreMutation {
    /// Name of the store.
    pub store: String,
    /// Action that produced the change.
    pub action: String,
    /// Top-level keys whose values changed.
    pub changes: Vec<String>,
}

/// Removes a listener again. Calling it after the store is gone is harmless.
pub type Unsubscribe = Box<dyn FnOnce()>;

pub type StoreListener = Rc<dyn Fn(&StoreMutation)>;

/// An observable state container.
pub trait Store {
    type State;

    /// Snapshot of the current state.
    fn state(&self) -> Self::State;

    /// Call `listener` after every committed change.
    fn subscribe(&self, listener: StoreListener) -> Unsubscribe;
}

/// A signal is a single-value store. Every change notifies with action `set`.
///
/// Listeners run untracked: signals they read (including during the renders
/// they trigger) never become dependencies of the subscription.
impl<T: Clone + PartialEq + 'static> Store for Signal<T> {
    type State = T;

    fn state(&self) -> T {
        self.get()
    }

    fn subscribe(&self, listener: StoreListener) -> Unsubscribe {
        let signal = self.clone();
        let first_run = Cell::new(true);
        let stop = effect(move || {
            let _ = signal.get();
            if first_run.replace(false) {
                return;
            }
            untrack(|| {
                listener(&StoreMutation {
                    store: "signal".to_string(),
                    action: "set".to_string(),
                    changes: Vec::new(),
                })
            });
        });
        Box::new(stop)
    }
}

// =============================================================================
// Hooks
// =============================================================================

struct StoreSlot<S: Store, U> {
    store: S,
    selector: Rc<dyn Fn(&S::State) -> U>,
    /// Slice seen by the latest render.
    value: U,
    /// Re-render on every notification, equal or not.
    always: bool,
    subscribed: bool,
}

/// Read `selector(state)` and re-render whenever it changes.
pub fn use_store<S, U, F>(store: &S, selector: F) -> Result<U>
where
    S: Store + Clone + 'static,
    U: Clone + PartialEq + 'static,
    F: Fn(&S::State) -> U + 'static,
{
    store_hook("use_store", store, Rc::new(selector), false)
}

/// Read the whole state; every notification re-renders.
pub fn use_store_all<S>(store: &S) -> Result<S::State>
where
    S: Store + Clone + 'static,
    S::State: Clone + PartialEq + 'static,
{
    store_hook("use_store", store, Rc::new(|state: &S::State| state.clone()), true)
}

fn store_hook<S, U>(
    kind: &'static str,
    store: &S,
    selector: Rc<dyn Fn(&S::State) -> U>,
    always: bool,
) -> Result<U>
where
    S: Store + Clone + 'static,
    U: Clone + PartialEq + 'static,
{
    let hook = next_hook(kind)?;
    // Fresh snapshot on every render, so a render never shows stale state.
    let value = selector(&store.state());

    let init = {
        let (store, selector, value) = (store.clone(), selector.clone(), value.clone());
        move || StoreSlot {
            store,
            selector,
            value,
            always,
            subscribed: false,
        }
    };
    let needs_subscription = hook.slot(init, |slot: &mut StoreSlot<S, U>| {
        slot.store = store.clone();
        slot.selector = selector;
        slot.value = value.clone();
        !slot.subscribed
    })?;

    if needs_subscription {
        let instance = hook.instance.weak();
        let index = hook.index;
        schedule_layout_effect(kind, Box::new(move || subscribe::<S, U>(instance, index)))?;
    }
    Ok(value)
}

/// Layout effect body: subscribe, then catch up on changes since render.
fn subscribe<S, U>(weak: Weak<Instance>, index: usize) -> Result<()>
where
    S: Store + Clone + 'static,
    U: Clone + PartialEq + 'static,
{
    let Some(instance) = weak.upgrade() else {
        return Ok(());
    };
    if instance.is_unmounted() {
        return Ok(());
    }
    let store = instance
        .hook_value(index, |slot: &mut StoreSlot<S, U>| {
            (!slot.subscribed).then(|| {
                slot.subscribed = true;
                slot.store.clone()
            })
        })
        .flatten();
    let Some(store) = store else {
        return Ok(());
    };

    let listener_target = weak.clone();
    let listener: StoreListener = Rc::new(move |mutation: &StoreMutation| {
        if let Err(err) = refresh::<S, U>(&listener_target, index, true) {
            log::error!("store `{}` action `{}`: {err}", mutation.store, mutation.action);
        }
    });
    instance.set_cleanup(index, store.subscribe(listener));

    refresh::<S, U>(&weak, index, false)
}

/// Re-run the selector and re-render when the slice moved.
fn refresh<S, U>(weak: &Weak<Instance>, index: usize, notified: bool) -> Result<()>
where
    S: Store + Clone + 'static,
    U: Clone + PartialEq + 'static,
{
    let Some(instance) = weak.upgrade() else {
        return Ok(());
    };
    if instance.is_unmounted() {
        return Ok(());
    }
    let Some((store, selector, always)) = instance.hook_value(index, |slot: &mut StoreSlot<S, U>| {
        (slot.store.clone(), slot.selector.clone(), slot.always)
    }) else {
        return Ok(());
    };

    let next = selector(&store.state());
    let changed = instance
        .hook_value(index, |slot: &mut StoreSlot<S, U>| {
            let changed = slot.value != next || (notified && always);
            slot.value = next;
            changed
        })
        .unwrap_or(false);
    if !changed {
        return Ok(());
    }

    if let Some(rendering) = rendering_component() {
        return Err(Error::RenderInProgress {
            component: instance.name(),
            rendering,
        });
    }
    instance.render()
}
