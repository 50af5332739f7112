//! `use_update` - Per-frame callback.

use std::cell::RefCell;
use std::rc::Rc;

use crate::engine::context::schedule_layout_effect;
use crate::engine::next_hook;
use crate::error::Result;
use crate::host::TickFn;

struct UpdateSlot {
    current: Rc<RefCell<TickFn>>,
    registered: bool,
}

/// Call `callback(time, delta)` on every scene tick while mounted.
///
/// The tick listener is registered once, after the first commit. Later
/// renders only swap the callback, so it always sees the latest closure
/// state. Unmount unregisters it.
///
/// ```ignore
/// use_update(move |_time, delta| {
///     let _ = set_angle.update(|a| a + delta * 0.1);
/// })?;
/// ```
pub fn use_update(callback: impl Fn(f64, f64) + 'static) -> Result<()> {
    let hook = next_hook("use_update")?;
    let callback: TickFn = Rc::new(callback);
    let swap = callback.clone();
    let register = hook.slot(
        move || UpdateSlot {
            current: Rc::new(RefCell::new(callback)),
            registered: false,
        },
        |slot: &mut UpdateSlot| {
            *slot.current.borrow_mut() = swap;
            (!slot.registered).then(|| slot.current.clone())
        },
    )?;
    let Some(current) = register else {
        return Ok(());
    };

    let weak = hook.instance.weak();
    let index = hook.index;
    schedule_layout_effect("use_update", Box::new(move || {
        let Some(instance) = weak.upgrade() else {
            return Ok(());
        };
        if instance.is_unmounted() {
            return Ok(());
        }
        let already = instance
            .hook_value(index, |slot: &mut UpdateSlot| std::mem::replace(&mut slot.registered, true))
            .unwrap_or(true);
        if already {
            return Ok(());
        }

        let owner = weak.clone();
        let listener: TickFn = Rc::new(move |time: f64, delta: f64| {
            if owner.upgrade().is_none_or(|i| i.is_unmounted()) {
                return;
            }
            let callback = current.borrow().clone();
            callback(time, delta);
        });
        let scene = instance.scene();
        let id = scene.on_update(listener);
        instance.set_cleanup(index, Box::new(move || scene.off_update(id)));
        Ok(())
    }))
}
