//! Memo hooks - Values and callables cached across renders.

use std::cell::RefCell;
use std::rc::Rc;

use crate::engine::next_hook;
use crate::error::Result;

/// Recompute `compute()` only when `deps` changed since the last render.
pub fn use_memo<T, D, F>(compute: F, deps: D) -> Result<T>
where
    T: Clone + 'static,
    D: PartialEq + 'static,
    F: FnOnce() -> T,
{
    let hook = next_hook("use_memo")?;
    let cached = hook.slot(
        || None::<(T, D)>,
        |slot| match slot {
            Some((value, old)) if *old == deps => Some(value.clone()),
            _ => None,
        },
    )?;
    if let Some(value) = cached {
        return Ok(value);
    }

    // User code runs with no slot borrowed.
    let value = compute();
    hook.slot(|| None::<(T, D)>, |slot| *slot = Some((value.clone(), deps)))?;
    Ok(value)
}

/// Keep returning the same callable until `deps` change.
pub fn use_callback<A, R, D, F>(f: F, deps: D) -> Result<Rc<dyn Fn(A) -> R>>
where
    A: 'static,
    R: 'static,
    D: PartialEq + 'static,
    F: Fn(A) -> R + 'static,
{
    use_memo(move || Rc::new(f) as Rc<dyn Fn(A) -> R>, deps)
}

/// A callable whose identity never changes but always runs the handler from
/// the latest render.
///
/// Hand it to host nodes as a pointer handler without re-binding listeners
/// on every render.
pub fn use_event<A, R, F>(handler: F) -> Result<Rc<dyn Fn(A) -> R>>
where
    A: 'static,
    R: 'static,
    F: Fn(A) -> R + 'static,
{
    type Latest<Arg, Ret> = Rc<RefCell<Rc<dyn Fn(Arg) -> Ret>>>;

    let hook = next_hook("use_event")?;
    let handler: Rc<dyn Fn(A) -> R> = Rc::new(handler);
    let swap = handler.clone();
    let stable = hook.slot(
        move || {
            let latest: Latest<A, R> = Rc::new(RefCell::new(handler));
            let target = latest.clone();
            let stable: Rc<dyn Fn(A) -> R> = Rc::new(move |arg: A| {
                let current = target.borrow().clone();
                current(arg)
            });
            (latest, stable)
        },
        |(latest, stable): &mut (Latest<A, R>, Rc<dyn Fn(A) -> R>)| {
            *latest.borrow_mut() = swap;
            stable.clone()
        },
    )?;
    Ok(stable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::{use_state, SetState};
    use crate::host::HeadlessScene;
    use crate::pipeline::mount_root;
    use crate::primitives::Render;
    use std::cell::Cell;

    #[derive(Clone, Default)]
    struct Recorder {
        computed: Rc<Cell<u32>>,
        seen: Rc<RefCell<Vec<u32>>>,
        events: Rc<RefCell<Vec<Rc<dyn Fn(u32) -> u32>>>>,
        callbacks: Rc<RefCell<Vec<Rc<dyn Fn(()) -> u32>>>>,
        setter: Rc<RefCell<Option<SetState<(u32, u32)>>>>,
    }

    /// State is `(dep, noise)`: only `dep` feeds the memo.
    fn memoised(recorder: &Recorder) -> Render {
        let ((dep, noise), set) = use_state((1u32, 0u32))?;
        recorder.setter.borrow_mut().replace(set);

        let computed = recorder.computed.clone();
        let doubled = use_memo(move || {
            computed.set(computed.get() + 1);
            dep * 2
        }, dep)?;
        recorder.seen.borrow_mut().push(doubled);

        recorder.callbacks.borrow_mut().push(use_callback(move |_: ()| dep, dep)?);
        recorder.events.borrow_mut().push(use_event(move |x: u32| x + noise)?);
        Ok(None)
    }

    fn set(recorder: &Recorder, value: (u32, u32)) {
        let setter = recorder.setter.borrow().clone().unwrap();
        setter.set(value).unwrap();
    }

    #[test]
    fn test_memo_recomputes_on_dep_change() {
        let recorder = Recorder::default();
        let _root = mount_root(Rc::new(HeadlessScene::new()), memoised, recorder.clone()).unwrap();
        set(&recorder, (1, 5));
        set(&recorder, (3, 5));

        assert_eq!(*recorder.seen.borrow(), vec![2, 2, 6]);
        assert_eq!(recorder.computed.get(), 2);

        let callbacks = recorder.callbacks.borrow();
        assert!(Rc::ptr_eq(&callbacks[0], &callbacks[1]));
        assert!(!Rc::ptr_eq(&callbacks[1], &callbacks[2]));
        assert_eq!(callbacks[2](()), 3);
    }

    #[test]
    fn test_event_is_stable_and_latest() {
        let recorder = Recorder::default();
        let _root = mount_root(Rc::new(HeadlessScene::new()), memoised, recorder.clone()).unwrap();
        set(&recorder, (1, 10));

        let events = recorder.events.borrow();
        assert!(Rc::ptr_eq(&events[0], &events[1]));
        assert_eq!(events[0](1), 11);
    }
}
