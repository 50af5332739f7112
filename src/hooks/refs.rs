//! Ref hooks - Mutable boxes that survive renders without causing them.

use std::cell::{Ref as CellRef, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use crate::engine::context::current_instance;
use crate::engine::next_hook;
use crate::error::Result;
use crate::host::Scene;
use crate::primitives::HostRef;

/// Mutable box returned by [`use_ref`].
///
/// Writing it never re-renders. Every render of the same instance gets the
/// same box back.
pub struct Ref<T>(Rc<RefCell<T>>);

impl<T> Clone for Ref<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Ref<T> {
    pub fn new(value: T) -> Self {
        Self(Rc::new(RefCell::new(value)))
    }

    pub fn set(&self, value: T) {
        *self.0.borrow_mut() = value;
    }

    pub fn borrow(&self) -> CellRef<'_, T> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.0.borrow_mut()
    }

    pub fn ptr_eq(&self, other: &Ref<T>) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: Clone> Ref<T> {
    pub fn get(&self) -> T {
        self.0.borrow().clone()
    }
}

impl<T: fmt::Debug> fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Ref").field(&*self.0.borrow()).finish()
    }
}

/// A box initialised to `initial` on the first render.
pub fn use_ref<T: 'static>(initial: T) -> Result<Ref<T>> {
    let hook = next_hook("use_ref")?;
    hook.slot(move || Ref::new(initial), |r: &mut Ref<T>| r.clone())
}

/// A stable [`HostRef`] to attach to a host node's `node_ref`.
///
/// ```ignore
/// let ship = use_host_ref()?;
/// use_layout_effect({
///     let ship = ship.clone();
///     move || {
///         if let Some(id) = ship.current() {
///             log::debug!("ship mounted as {id}");
///         }
///         None
///     }
/// }, Some(()))?;
/// Ok(Some(Node::host(SpriteProps {
///     common: CommonProps { node_ref: Some(ship.into()), ..Default::default() },
///     ..Default::default()
/// })))
/// ```
pub fn use_host_ref() -> Result<HostRef> {
    let hook = next_hook("use_host_ref")?;
    hook.slot(HostRef::new, |r: &mut HostRef| r.clone())
}

/// The scene the rendering component is mounted into.
pub fn use_scene() -> Result<Rc<dyn Scene>> {
    Ok(current_instance("use_scene")?.scene())
}
