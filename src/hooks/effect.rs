//! Effect hooks - Work that runs after commit.
//!
//! Layout effects run right after the host operations of a commit, passive
//! effects after every layout effect of that commit. Both receive the
//! previous cleanup before they run again, and unmount runs the last one.

use std::rc::Weak;

use crate::engine::context::{schedule_effect, schedule_layout_effect};
use crate::engine::{next_hook, Effect, Instance};
use crate::error::Result;
use crate::primitives::Cleanup;

struct EffectSlot<D> {
    deps: Option<D>,
    ran: bool,
}

/// Run `callback` after the host operations of this commit.
///
/// `deps = None` runs it after every render; `Some(deps)` only when they
/// differ from the last run.
///
/// ```ignore
/// use_layout_effect(move || {
///     let id = host.current()?;
///     log::info!("ship is {id}");
///     None
/// }, Some(level))?;
/// ```
pub fn use_layout_effect<D, F>(callback: F, deps: Option<D>) -> Result<()>
where
    D: PartialEq + 'static,
    F: FnOnce() -> Option<Cleanup> + 'static,
{
    effect_hook("use_layout_effect", true, callback, deps)
}

/// Run `callback` after every layout effect of this commit.
pub fn use_effect<D, F>(callback: F, deps: Option<D>) -> Result<()>
where
    D: PartialEq + 'static,
    F: FnOnce() -> Option<Cleanup> + 'static,
{
    effect_hook("use_effect", false, callback, deps)
}

/// Run `callback` once, after the first commit. Its cleanup runs on unmount.
pub fn on_mount<F>(callback: F) -> Result<()>
where
    F: FnOnce() -> Option<Cleanup> + 'static,
{
    let hook = next_hook("on_mount")?;
    let first = hook.slot(|| false, |mounted: &mut bool| !std::mem::replace(mounted, true))?;
    if first {
        let effect = run_effect(hook.instance.weak(), hook.index, callback);
        schedule_layout_effect("on_mount", effect)?;
    }
    Ok(())
}

fn effect_hook<D, F>(kind: &'static str, layout: bool, callback: F, deps: Option<D>) -> Result<()>
where
    D: PartialEq + 'static,
    F: FnOnce() -> Option<Cleanup> + 'static,
{
    let hook = next_hook(kind)?;
    let changed = hook.slot(
        || EffectSlot::<D> { deps: None, ran: false },
        |slot| {
            let changed = !slot.ran || deps.is_none() || slot.deps != deps;
            if changed {
                slot.deps = deps;
                slot.ran = true;
            }
            changed
        },
    )?;
    if !changed {
        return Ok(());
    }

    let effect = run_effect(hook.instance.weak(), hook.index, callback);
    if layout {
        schedule_layout_effect(kind, effect)
    } else {
        schedule_effect(kind, effect)
    }
}

/// Effect body: previous cleanup, then the callback, then store its cleanup.
fn run_effect<F>(instance: Weak<Instance>, index: usize, callback: F) -> Effect
where
    F: FnOnce() -> Option<Cleanup> + 'static,
{
    Box::new(move || {
        let Some(instance) = instance.upgrade() else {
            return Ok(());
        };
        if instance.is_unmounted() {
            return Ok(());
        }
        if let Some(cleanup) = instance.take_cleanup(index) {
            cleanup();
        }
        if let Some(cleanup) = callback() {
            instance.set_cleanup(index, cleanup);
        }
        Ok(())
    })
}
