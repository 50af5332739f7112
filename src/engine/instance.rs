//! Component instances - Hook storage and render bookkeeping.
//!
//! An [`Instance`] lives as long as its component stays at the same position
//! in the tree with the same identity. It owns the hook slots, the last
//! rendered node and whatever that node produced.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::config::config;
use crate::error::{Error, Result};
use crate::host::Scene;
use crate::primitives::{Cleanup, ComponentType, Node};

use super::commit::{CommitQueue, Op};
use super::context::RenderScope;
use super::reconciler::reconcile;
use super::slot::{Child, HostSlot};

/// One hook's persistent storage.
struct HookSlot {
    /// Name of the hook that created the slot.
    kind: &'static str,
    value: Box<dyn Any>,
    cleanup: Option<Cleanup>,
}

pub struct Instance {
    this: Weak<Instance>,
    scene: Rc<dyn Scene>,
    component: RefCell<ComponentType>,
    props: RefCell<Rc<dyn Any>>,
    /// Container new host objects attach to; `None` means the scene root.
    parent: RefCell<Option<Weak<HostSlot>>>,
    hooks: RefCell<Vec<HookSlot>>,
    rendered: RefCell<Option<Node>>,
    produced: RefCell<Option<Child>>,
    unmounted: Cell<bool>,
}

impl Instance {
    /// `adopted` becomes the initial produced child, so the first render can
    /// take over an existing host object.
    pub fn new(
        scene: Rc<dyn Scene>,
        component: ComponentType,
        props: Rc<dyn Any>,
        parent: Option<&Rc<HostSlot>>,
        adopted: Option<Child>,
    ) -> Rc<Self> {
        log::debug!("mounting {}", component.name());
        Rc::new_cyclic(|this| Self {
            this: this.clone(),
            scene,
            component: RefCell::new(component),
            props: RefCell::new(props),
            parent: RefCell::new(parent.map(Rc::downgrade)),
            hooks: RefCell::new(Vec::new()),
            rendered: RefCell::new(None),
            produced: RefCell::new(adopted),
            unmounted: Cell::new(false),
        })
    }

    pub fn name(&self) -> &'static str {
        self.component.borrow().name()
    }

    pub fn scene(&self) -> Rc<dyn Scene> {
        self.scene.clone()
    }

    pub fn weak(&self) -> Weak<Instance> {
        self.this.clone()
    }

    pub fn is_unmounted(&self) -> bool {
        self.unmounted.get()
    }

    pub fn produced(&self) -> Option<Child> {
        self.produced.borrow().clone()
    }

    /// Swap in the render function, props and parent of a re-declared component.
    pub fn update(&self, component: ComponentType, props: Rc<dyn Any>, parent: Option<&Rc<HostSlot>>) {
        *self.component.borrow_mut() = component;
        *self.props.borrow_mut() = props;
        *self.parent.borrow_mut() = parent.map(Rc::downgrade);
    }

    // =========================================================================
    // Render
    // =========================================================================

    /// Render and commit immediately.
    pub fn render(self: &Rc<Self>) -> Result<()> {
        let mut queue = CommitQueue::new();
        self.render_into(&mut queue)?;
        queue.flush(&*self.scene)
    }

    /// Run the component and reconcile its output into `queue`.
    ///
    /// Nothing reaches the host until the queue is flushed; a failed render
    /// leaves the queue without this instance's work.
    pub fn render_into(self: &Rc<Self>, queue: &mut CommitQueue) -> Result<()> {
        if self.is_unmounted() {
            return Ok(());
        }

        let component = self.component.borrow().clone();
        let props = self.props.borrow().clone();

        let scope = RenderScope::enter(self.clone());
        let output = component.call(&*props);
        let (layout_effects, effects) = scope.finish();
        let next = output?;

        queue.layout_effects.extend(layout_effects);
        queue.effects.extend(effects);

        let old = self.rendered.borrow().clone();
        let existing = self.produced();
        let parent = self.parent.borrow().as_ref().and_then(Weak::upgrade);
        let produced = reconcile(
            &self.scene,
            parent.as_ref(),
            old.as_ref(),
            next.as_ref(),
            existing,
            queue,
        )?;

        queue.push(Op::FinishRender {
            instance: self.clone(),
            rendered: next,
            produced,
        });
        Ok(())
    }

    /// Record what the last committed render produced.
    pub fn finish(&self, rendered: Option<Node>, produced: Option<Child>) {
        if self.is_unmounted() {
            return;
        }
        *self.rendered.borrow_mut() = rendered;
        *self.produced.borrow_mut() = produced;
    }

    /// Run every hook cleanup, then tear down the produced subtree. Idempotent.
    pub fn unmount(&self) {
        if self.unmounted.replace(true) {
            return;
        }
        log::debug!("unmounting {}", self.name());

        let cleanups: Vec<Cleanup> = self
            .hooks
            .borrow_mut()
            .iter_mut()
            .filter_map(|slot| slot.cleanup.take())
            .collect();
        for cleanup in cleanups {
            cleanup();
        }

        let produced = self.produced.borrow_mut().take();
        if let Some(child) = produced {
            child.teardown(&*self.scene);
        }
        self.rendered.borrow_mut().take();
        self.hooks.borrow_mut().clear();
    }

    // =========================================================================
    // Hook Slots
    // =========================================================================

    /// Access hook slot `index`, creating it with `init` on first use.
    ///
    /// `init` runs without any borrow held; `access` must not call back into
    /// user code.
    pub fn hook<T: 'static, R>(
        &self,
        index: usize,
        kind: &'static str,
        init: impl FnOnce() -> T,
        access: impl FnOnce(&mut T) -> R,
    ) -> Result<R> {
        let len = self.hooks.borrow().len();
        if index >= len {
            let value = init();
            self.hooks.borrow_mut().push(HookSlot {
                kind,
                value: Box::new(value),
                cleanup: None,
            });
        }

        let mut hooks = self.hooks.borrow_mut();
        let order_changed = |found: &'static str| Error::HookOrderChanged {
            component: self.name(),
            index,
            expected: kind,
            found,
        };
        let Some(slot) = hooks.get_mut(index) else {
            return Err(order_changed("nothing"));
        };
        if slot.kind != kind && config().strict_hooks {
            return Err(order_changed(slot.kind));
        }
        let found = slot.kind;
        match slot.value.downcast_mut::<T>() {
            Some(value) => Ok(access(value)),
            None => Err(order_changed(found)),
        }
    }

    /// Access an existing hook slot after render (setters, listeners).
    ///
    /// `None` when the slot is gone or holds another type.
    pub fn hook_value<T: 'static, R>(&self, index: usize, access: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut hooks = self.hooks.borrow_mut();
        let value = hooks.get_mut(index)?.value.downcast_mut::<T>()?;
        Some(access(value))
    }

    pub fn take_cleanup(&self, index: usize) -> Option<Cleanup> {
        self.hooks.borrow_mut().get_mut(index)?.cleanup.take()
    }

    /// Store a hook's cleanup. After unmount it runs right away instead.
    pub fn set_cleanup(&self, index: usize, cleanup: Cleanup) {
        if self.is_unmounted() {
            cleanup();
            return;
        }
        let mut hooks = self.hooks.borrow_mut();
        match hooks.get_mut(index) {
            Some(slot) => slot.cleanup = Some(cleanup),
            None => {
                drop(hooks);
                cleanup();
            }
        }
    }
}
