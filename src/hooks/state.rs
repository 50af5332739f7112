//! `use_state` - Local component state.

use std::marker::PhantomData;
use std::rc::{Rc, Weak};

use crate::engine::context::rendering_component;
use crate::engine::{next_hook, Instance};
use crate::error::{Error, Result};

/// Setter returned by [`use_state`].
///
/// Changing the value re-renders the owning component and commits before
/// returning. Setting an equal value does nothing, as does any call after the
/// component unmounted.
pub struct SetState<T> {
    instance: Weak<Instance>,
    index: usize,
    _marker: PhantomData<fn(T)>,
}

impl<T> Clone for SetState<T> {
    fn clone(&self) -> Self {
        Self {
            instance: self.instance.clone(),
            index: self.index,
            _marker: PhantomData,
        }
    }
}

impl<T: Clone + PartialEq + 'static> SetState<T> {
    pub fn set(&self, value: T) -> Result<()> {
        self.update(move |_| value)
    }

    /// Compute the next value from the current one.
    pub fn update(&self, f: impl FnOnce(&T) -> T) -> Result<()> {
        let Some(instance) = self.instance.upgrade() else {
            return Ok(());
        };
        if instance.is_unmounted() {
            return Ok(());
        }
        if let Some(rendering) = rendering_component() {
            return Err(Error::RenderInProgress {
                component: instance.name(),
                rendering,
            });
        }

        let Some(current) = instance.hook_value(self.index, |value: &mut T| value.clone()) else {
            return Ok(());
        };
        let next = f(&current);
        if next == current {
            return Ok(());
        }
        instance.hook_value(self.index, |value: &mut T| *value = next);
        instance.render()
    }

    /// Whether both setters drive the same state slot.
    pub fn same(&self, other: &SetState<T>) -> bool {
        self.index == other.index && Weak::ptr_eq(&self.instance, &other.instance)
    }
}

/// Declare a piece of state, initialised to `initial` on the first render.
///
/// ```ignore
/// fn counter(_: &()) -> Render {
///     let (count, set_count) = use_state(0)?;
///     Ok(Some(Node::host(TextProps {
///         text: Some(count.to_string()),
///         common: CommonProps {
///             interactive: Some(true),
///             on_click: Some(PointerHandler::new(move |_| {
///                 let _ = set_count.update(|c| c + 1);
///             })),
///             ..Default::default()
///         },
///         ..Default::default()
///     })))
/// }
/// ```
pub fn use_state<T: Clone + PartialEq + 'static>(initial: T) -> Result<(T, SetState<T>)> {
    state_hook("use_state", move || initial)
}

/// Like [`use_state`], computing the initial value only on the first render.
pub fn use_state_with<T, F>(init: F) -> Result<(T, SetState<T>)>
where
    T: Clone + PartialEq + 'static,
    F: FnOnce() -> T,
{
    state_hook("use_state", init)
}

fn state_hook<T: Clone + 'static>(kind: &'static str, init: impl FnOnce() -> T) -> Result<(T, SetState<T>)> {
    let hook = next_hook(kind)?;
    let value = hook.slot(init, |value: &mut T| value.clone())?;
    Ok((
        value,
        SetState {
            instance: Rc::downgrade(&hook.instance),
            index: hook.index,
            _marker: PhantomData,
        },
    ))
}
