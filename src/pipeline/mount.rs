//! Mount API - Attach a component tree to a scene.
//!
//! [`mount_root`] runs the first render and commit. The returned [`Root`]
//! re-renders with new props and tears everything down on unmount or drop.
//!
//! # Example
//!
//! ```ignore
//! use spark_stage::{mount_root, HeadlessScene};
//!
//! let scene = Rc::new(HeadlessScene::new());
//! let root = mount_root(scene.clone(), game_screen, GameProps { level: 1 })?;
//!
//! // New props: diff and commit.
//! root.update(GameProps { level: 2 })?;
//!
//! // Cleanups run, host objects are destroyed or released.
//! root.unmount();
//! ```

use std::marker::PhantomData;
use std::rc::Rc;

use crate::engine::context::rendering_component;
use crate::engine::Instance;
use crate::error::{Error, Result};
use crate::host::Scene;
use crate::primitives::{ComponentType, Render};
use crate::types::ObjectId;

// =============================================================================
// Root Handle
// =============================================================================

/// Handle to a mounted component tree.
pub struct Root<P> {
    instance: Rc<Instance>,
    component: ComponentType,
    _props: PhantomData<fn(P)>,
}

impl<P: 'static> Root<P> {
    /// Re-render the root component with new props and commit.
    ///
    /// Does nothing after [`Root::unmount`].
    pub fn update(&self, props: P) -> Result<()> {
        if let Some(rendering) = rendering_component() {
            return Err(Error::RenderInProgress {
                component: self.instance.name(),
                rendering,
            });
        }
        if !self.is_mounted() {
            return Ok(());
        }
        self.instance.update(self.component.clone(), Rc::new(props), None);
        self.instance.render()
    }
}

impl<P> Root<P> {
    /// Run every cleanup and tear down the tree. Idempotent.
    pub fn unmount(&self) {
        if self.is_mounted() {
            log::debug!("unmounting root {}", self.component.name());
        }
        self.instance.unmount();
    }

    pub fn is_mounted(&self) -> bool {
        !self.instance.is_unmounted()
    }

    pub fn scene(&self) -> Rc<dyn Scene> {
        self.instance.scene()
    }

    /// The top-level host object the tree currently produces.
    pub fn object(&self) -> Option<ObjectId> {
        self.instance.produced().and_then(|child| child.object())
    }
}

impl<P> Drop for Root<P> {
    fn drop(&mut self) {
        self.unmount();
    }
}

// =============================================================================
// Mount Function
// =============================================================================

/// Render `component(props)` into `scene` and commit.
///
/// A render error leaves the scene untouched. A host error during commit
/// stops the commit: ops applied before the failure stay committed and the
/// objects they created are left on the scene. The instance is unmounted
/// before the error is returned.
pub fn mount_root<P, F>(scene: Rc<dyn Scene>, component: F, props: P) -> Result<Root<P>>
where
    P: 'static,
    F: Fn(&P) -> Render + 'static,
{
    if let Some(rendering) = rendering_component() {
        return Err(Error::RenderInProgress {
            component: "mount_root",
            rendering,
        });
    }

    let component = ComponentType::of(component);
    log::debug!("mounting root {}", component.name());
    let instance = Instance::new(scene, component.clone(), Rc::new(props), None, None);
    if let Err(err) = instance.render() {
        instance.unmount();
        return Err(err);
    }

    Ok(Root {
        instance,
        component,
        _props: PhantomData,
    })
}
