//! Render context - Which component is rendering right now.
//!
//! Hooks find their instance through a thread-local stack of render frames,
//! the same way the registry tracks the current parent while components
//! mount. A component rendering inside another component's commit (a setter
//! fired from an effect) pushes its own frame on top.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::{Error, Result};

use super::commit::Effect;
use super::instance::Instance;

struct Frame {
    instance: Rc<Instance>,
    /// Index of the next hook slot.
    cursor: usize,
    layout_effects: Vec<Effect>,
    effects: Vec<Effect>,
}

thread_local! {
    static RENDER_STACK: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
}

// =============================================================================
// Scope
// =============================================================================

/// Guard for one component render. Pops its frame when dropped, so early
/// returns and panics restore the enclosing frame.
pub struct RenderScope {
    depth: usize,
}

impl RenderScope {
    pub fn enter(instance: Rc<Instance>) -> Self {
        let depth = RENDER_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            stack.push(Frame {
                instance,
                cursor: 0,
                layout_effects: Vec::new(),
                effects: Vec::new(),
            });
            stack.len()
        });
        Self { depth }
    }

    /// Leave the frame, returning the effects its hooks scheduled.
    pub fn finish(self) -> (Vec<Effect>, Vec<Effect>) {
        RENDER_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            let len = stack.len();
            match stack.last_mut() {
                Some(frame) if len == self.depth => (
                    std::mem::take(&mut frame.layout_effects),
                    std::mem::take(&mut frame.effects),
                ),
                _ => (Vec::new(), Vec::new()),
            }
        })
    }
}

impl Drop for RenderScope {
    fn drop(&mut self) {
        let _ = RENDER_STACK.try_with(|stack| {
            if let Ok(mut stack) = stack.try_borrow_mut() {
                stack.truncate(self.depth.saturating_sub(1));
            }
        });
    }
}

// =============================================================================
// Hook Access
// =============================================================================

/// The slot a hook call resolved to.
pub struct HookHandle {
    pub instance: Rc<Instance>,
    pub index: usize,
    pub kind: &'static str,
}

impl HookHandle {
    /// See [`Instance::hook`].
    pub fn slot<T: 'static, R>(&self, init: impl FnOnce() -> T, access: impl FnOnce(&mut T) -> R) -> Result<R> {
        self.instance.hook(self.index, self.kind, init, access)
    }
}

/// Claim the next hook slot of the rendering component.
pub fn next_hook(kind: &'static str) -> Result<HookHandle> {
    RENDER_STACK.with(|stack| {
        let mut stack = stack.borrow_mut();
        let frame = stack.last_mut().ok_or(Error::NoRenderContext { hook: kind })?;
        let index = frame.cursor;
        frame.cursor += 1;
        Ok(HookHandle {
            instance: frame.instance.clone(),
            index,
            kind,
        })
    })
}

/// The component currently rendering.
pub fn current_instance(hook: &'static str) -> Result<Rc<Instance>> {
    RENDER_STACK.with(|stack| {
        stack
            .borrow()
            .last()
            .map(|frame| frame.instance.clone())
            .ok_or(Error::NoRenderContext { hook })
    })
}

/// Name of the component currently rendering, if any.
pub fn rendering_component() -> Option<&'static str> {
    RENDER_STACK.with(|stack| stack.borrow().last().map(|frame| frame.instance.name()))
}

/// Queue an effect to run after this render's host operations.
pub fn schedule_layout_effect(hook: &'static str, effect: Effect) -> Result<()> {
    with_frame(hook, |frame| frame.layout_effects.push(effect))
}

/// Queue an effect to run after every layout effect of this commit.
pub fn schedule_effect(hook: &'static str, effect: Effect) -> Result<()> {
    with_frame(hook, |frame| frame.effects.push(effect))
}

fn with_frame(hook: &'static str, f: impl FnOnce(&mut Frame)) -> Result<()> {
    RENDER_STACK.with(|stack| {
        let mut stack = stack.borrow_mut();
        let frame = stack.last_mut().ok_or(Error::NoRenderContext { hook })?;
        f(frame);
        Ok(())
    })
}
