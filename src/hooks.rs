//! Hooks: the API render functions use to attach persistent state, deferred
//! effects, and event handlers to their instance.
//!
//! Hooks are addressed **positionally**: the Nth `use_state` call in a
//! component always maps to state slot N, and likewise for `use_effect`.
//! Per-instance call counters are reset at the top of each render, so the
//! only discipline a component must follow is calling its hooks
//! unconditionally, in the same order, on every render. Skipping a hook call
//! in some renders but not others silently attaches the wrong slot to the
//! wrong call site; this is a documented contract, not something the engine
//! can check at runtime.
//!
//! # Example
//!
//! ```ignore
//! fn counter(ctx: &mut Ctx, _props: &()) -> String {
//!     let (count, set_count) = ctx.use_state(0u32);
//!
//!     ctx.use_focusable();
//!     ctx.use_key_handler(move |key| match key.code {
//!         KeyCode::Char('+') => {
//!             set_count.set(count + 1);
//!             true
//!         }
//!         _ => false,
//!     });
//!
//!     format!("count: {count}")
//! }
//! ```
//!
//! # Panics
//!
//! Every hook panics when called outside an active render. Hooks operate on
//! "the instance currently being rendered"; there is no such instance
//! anywhere else, and failing loudly beats corrupting slot state for the
//! rest of the instance's life.

use crate::context::Ctx;
use crate::event::{Command, KeyEvent, MouseEvent, Msg};
use crate::instance::{Cleanup, ComponentId, EffectSlot, StateCell};
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::marker::PhantomData;
use std::rc::{Rc, Weak};

/// A value usable in an effect dependency list.
///
/// Blanket-implemented for every `PartialEq + 'static` type; comparison is
/// by value, with a type mismatch counting as "changed".
pub trait DepValue {
    /// Value equality against another dependency.
    fn dep_eq(&self, other: &dyn DepValue) -> bool;
    /// Upcast for downcasting in `dep_eq`.
    fn as_any(&self) -> &dyn Any;
}

impl<T: PartialEq + 'static> DepValue for T {
    fn dep_eq(&self, other: &dyn DepValue) -> bool {
        other.as_any().downcast_ref::<T>() == Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// When an effect re-runs.
pub enum Deps {
    /// Run on every render.
    Every,
    /// Run exactly once, on mount.
    Once,
    /// Run when any element differs (by value) from the previous render.
    /// Build with the [`deps!`](crate::deps) macro. An empty list never
    /// changes, which makes it equivalent to `Once`.
    Values(Vec<Box<dyn DepValue>>),
}

impl Deps {
    /// Wrap an explicit dependency list.
    pub fn values(values: Vec<Box<dyn DepValue>>) -> Self {
        Self::Values(values)
    }

    /// True when an effect guarded by `self` must re-run given the deps
    /// stored from its previous run.
    fn changed_from(&self, previous: &Deps) -> bool {
        match (self, previous) {
            (Self::Every, _) => true,
            (Self::Once, _) => false,
            (Self::Values(new), Self::Values(old)) => {
                new.len() != old.len()
                    || new
                        .iter()
                        .zip(old.iter())
                        .any(|(n, o)| !n.dep_eq(o.as_ref()))
            }
            // Kind changed between renders; treat as changed.
            (Self::Values(_), _) => true,
        }
    }
}

/// Build a [`Deps::Values`] list from expressions.
///
/// ```ignore
/// ctx.use_effect(deps![width, rows.len()], || { ... });
/// ```
#[macro_export]
macro_rules! deps {
    ($($value:expr),* $(,)?) => {
        $crate::hooks::Deps::values(vec![
            $(Box::new($value) as Box<dyn $crate::hooks::DepValue>),*
        ])
    };
}

/// Setter half of a [`use_state`](Ctx::use_state) pair.
///
/// Stages a write into the slot it was created for and requests a re-render.
/// The write is applied at the start of the next render pass, never
/// mid-pass, so a running render always observes a consistent snapshot.
/// Setting state on a pruned instance is a benign no-op.
pub struct SetState<T> {
    cell: Weak<RefCell<StateCell>>,
    render_requested: Rc<Cell<bool>>,
    _value: PhantomData<fn(T) -> T>,
}

impl<T: 'static> SetState<T> {
    /// Stage `value` into the slot and schedule a re-render.
    pub fn set(&self, value: T) {
        let Some(cell) = self.cell.upgrade() else {
            // Instance was destroyed; an event racing an unmount is expected.
            return;
        };
        cell.borrow_mut().pending = Some(Box::new(value));
        self.render_requested.set(true);
    }
}

impl<T> Clone for SetState<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
            render_requested: self.render_requested.clone(),
            _value: PhantomData,
        }
    }
}

impl Ctx {
    /// Persistent state for the current instance.
    ///
    /// On call N within a render, reads state slot N (seeding it with
    /// `initial` only when the slot is first created) and returns the
    /// current value plus a setter. Slot identity is purely positional.
    ///
    /// # Panics
    ///
    /// Panics outside an active render, or if the slot's stored type does
    /// not match `T` (hook calls drifted out of order between renders).
    #[track_caller]
    pub fn use_state<T: Clone + 'static>(&mut self, initial: T) -> (T, SetState<T>) {
        let render_requested = self.render_requested.clone();
        let instance = self.current_mut();
        let n = instance.state_cursor;
        instance.state_cursor += 1;

        if n >= instance.state_slots.len() {
            instance.state_slots.push(Rc::new(RefCell::new(StateCell {
                value: Box::new(initial),
                pending: None,
            })));
        }
        let slot = &instance.state_slots[n];
        let value = {
            let cell = slot.borrow();
            cell.value
                .downcast_ref::<T>()
                .unwrap_or_else(|| {
                    panic!(
                        "state slot {n} holds a different type than requested; \
                         hooks must be called unconditionally in a stable order"
                    )
                })
                .clone()
        };
        let setter = SetState {
            cell: Rc::downgrade(slot),
            render_requested,
            _value: PhantomData,
        };
        (value, setter)
    }

    /// A deferred effect on the current instance.
    ///
    /// On call N, compares `deps` against effect slot N's previously stored
    /// list. If they differ (or this is the slot's first run), the previous
    /// cleanup, if any, runs first, then `body` runs and its returned
    /// cleanup and the new deps are stored. With unchanged deps nothing
    /// happens. [`Deps::Every`] runs every render; [`Deps::Once`] only on
    /// mount.
    ///
    /// Anything asynchronous an effect starts should be held as a cancelable
    /// handle in the closure the body returns: the cleanup callback is the
    /// one place teardown is guaranteed to run before the id can be reused.
    #[track_caller]
    pub fn use_effect<F>(&mut self, deps: Deps, body: F)
    where
        F: FnOnce() -> Option<Cleanup>,
    {
        let (n, should_run, previous_cleanup) = {
            let instance = self.current_mut();
            let n = instance.effect_cursor;
            instance.effect_cursor += 1;

            if n >= instance.effect_slots.len() {
                instance.effect_slots.push(EffectSlot {
                    deps: Deps::Once,
                    cleanup: None,
                });
                (n, true, None)
            } else {
                let slot = &mut instance.effect_slots[n];
                let run = deps.changed_from(&slot.deps);
                let previous = if run { slot.cleanup.take() } else { None };
                (n, run, previous)
            }
        };

        if !should_run {
            return;
        }
        if let Some(cleanup) = previous_cleanup {
            cleanup();
        }
        let cleanup = body();

        let instance = self.current_mut();
        let slot = &mut instance.effect_slots[n];
        slot.deps = deps;
        slot.cleanup = cleanup;
    }

    /// Register a key handler on the current instance, consulted while the
    /// instance is focused. Handler lists are rebuilt every render; only
    /// handlers from the most recent render are live.
    #[track_caller]
    pub fn use_key_handler<F>(&mut self, handler: F)
    where
        F: Fn(&KeyEvent) -> bool + 'static,
    {
        self.current_mut().key_handlers.push(Rc::new(handler));
    }

    /// Register a key handler consulted regardless of focus, for tree-wide
    /// shortcuts. Global handlers run in tree pre-order after the focused
    /// instance declines an event (see [`DispatchConfig`](crate::DispatchConfig)).
    #[track_caller]
    pub fn use_global_key_handler<F>(&mut self, handler: F)
    where
        F: Fn(&KeyEvent) -> bool + 'static,
    {
        self.current_mut().global_key_handlers.push(Rc::new(handler));
    }

    /// Register a mouse handler on the current instance. Receives the raw
    /// event and the local child-zone id from hit-testing.
    #[track_caller]
    pub fn use_mouse_handler<F>(&mut self, handler: F)
    where
        F: Fn(&MouseEvent, &str) -> bool + 'static,
    {
        self.current_mut().mouse_handlers.push(Rc::new(handler));
    }

    /// Register a handler for generic messages, broadcast tree-wide. The
    /// handler may return a follow-up [`Command`] to run after dispatch.
    #[track_caller]
    pub fn use_message_handler<F>(&mut self, handler: F)
    where
        F: Fn(&Msg) -> Option<Command> + 'static,
    {
        self.current_mut().message_handlers.push(Rc::new(handler));
    }

    /// Mark the current instance as selectable by the focus manager.
    /// Like handlers, this is declared anew on every render.
    #[track_caller]
    pub fn use_focusable(&mut self) {
        self.current_mut().focusable = true;
    }

    /// Register a callback invoked when focus enters or leaves this
    /// instance. The flag is true when focus moved in reverse order.
    #[track_caller]
    pub fn use_on_focused<F>(&mut self, callback: F)
    where
        F: Fn(bool) + 'static,
    {
        self.current_mut().on_focused = Some(Rc::new(callback));
    }

    /// The current instance's id. Pure read; consumes no slot.
    #[track_caller]
    pub fn use_id(&self) -> ComponentId {
        self.current_id().clone()
    }

    /// Whether the current instance holds focus.
    #[track_caller]
    pub fn use_is_focused(&self) -> bool {
        self.focused.as_ref() == Some(self.current_id())
    }

    /// The current instance's computed size, or (0, 0) before the layout
    /// collaborator has written geometry.
    #[track_caller]
    pub fn use_size(&self) -> (u16, u16) {
        self.current_area()
            .map_or((0, 0), |a| (a.width, a.height))
    }

    /// The current instance's absolute position, or (0, 0) before layout.
    #[track_caller]
    pub fn use_global_position(&self) -> (u16, u16) {
        self.current_area().map_or((0, 0), |a| (a.x, a.y))
    }

    /// Whether the mouse is over one of this instance's zones, and which
    /// child zone. The child id is empty when the whole component is hovered
    /// (or nothing is).
    #[track_caller]
    pub fn use_is_hovered(&self) -> (bool, smartstring::alias::String) {
        match &self.hover {
            Some(target) if &target.owner == self.current_id() => {
                (true, target.child.clone())
            }
            _ => (false, smartstring::alias::String::new()),
        }
    }

    fn current_area(&self) -> Option<crate::instance::Rect> {
        self.registry.get(self.current_id()).and_then(|i| i.area)
    }
}
