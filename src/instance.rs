//! Persisted component instances and the id-keyed registry that owns them.
//!
//! An [`Instance`] is the record that makes a plain render function behave as
//! a long-lived, stateful unit: it carries the state and effect slots that
//! hooks address positionally, the event handlers registered during the most
//! recent render, and the geometry the layout collaborator writes back.
//!
//! The [`Registry`] is the single owner of every live instance. Parent links
//! are plain id back-references, never owning pointers; ownership always
//! flows from the registry, which keeps the tree free of lifetime cycles.

use crate::hooks::Deps;
use crate::event::{Command, KeyEvent, MouseEvent, Msg};
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use smallvec::SmallVec;
use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

/// Stable component identifier, derived from tree position plus any
/// caller-supplied key. Short ids stay inline.
pub type ComponentId = smartstring::alias::String;

/// Component-internal key handler. Returns true if the key was consumed.
pub type KeyHandlerFn = Rc<dyn Fn(&KeyEvent) -> bool>;

/// Component-internal mouse handler. Receives the raw event and the local
/// child-zone id (empty when the whole component was hit). Returns true if
/// the event was consumed.
pub type MouseHandlerFn = Rc<dyn Fn(&MouseEvent, &str) -> bool>;

/// Handler for generic messages. May return a follow-up command to execute
/// after dispatch completes.
pub type MsgHandlerFn = Rc<dyn Fn(&Msg) -> Option<Command>>;

/// Callback invoked on focus transitions. The flag is true when focus moved
/// in the reverse direction (Shift+Tab).
pub type FocusCallback = Rc<dyn Fn(bool)>;

/// Cleanup returned by an effect body; runs before the effect re-runs and
/// when the instance is destroyed.
pub type Cleanup = Box<dyn FnOnce()>;

/// A rectangle in terminal cell coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    /// Column of the top-left cell.
    pub x: u16,
    /// Row of the top-left cell.
    pub y: u16,
    /// Width in columns.
    pub width: u16,
    /// Height in rows.
    pub height: u16,
}

impl Rect {
    /// Create a rectangle.
    pub fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// True if the cell at (x, y) falls inside this rectangle.
    pub fn contains(&self, x: u16, y: u16) -> bool {
        x >= self.x && x < self.x.saturating_add(self.width) && y >= self.y && y < self.y.saturating_add(self.height)
    }

    /// Cell count, for innermost-zone tie-breaking.
    pub(crate) fn cells(&self) -> u32 {
        u32::from(self.width) * u32::from(self.height)
    }
}

/// One persisted state slot.
///
/// The cell is shared with every setter handed out for the slot. Setters
/// stage writes into `pending`; the reconciler applies staged writes at the
/// start of the next pass so a render observes a consistent snapshot.
pub(crate) struct StateCell {
    pub(crate) value: Box<dyn Any>,
    pub(crate) pending: Option<Box<dyn Any>>,
}

pub(crate) type StateSlot = Rc<RefCell<StateCell>>;

/// One persisted effect slot: the dependency values captured at the last run
/// and the cleanup the body returned, if any.
pub(crate) struct EffectSlot {
    pub(crate) deps: Deps,
    pub(crate) cleanup: Option<Cleanup>,
}

/// A persisted component record.
///
/// Created lazily the first time its id is rendered, mutated only by hooks
/// during the component's own render (or by dispatched handlers through
/// their captured setters), and destroyed by the reconciler's post-pass
/// pruning.
pub struct Instance {
    pub(crate) id: ComponentId,
    pub(crate) parent: Option<ComponentId>,
    /// Child ids in render order; rebuilt every render. Order is significant
    /// for focus traversal.
    pub(crate) children: Vec<ComponentId>,

    pub(crate) state_slots: Vec<StateSlot>,
    pub(crate) effect_slots: Vec<EffectSlot>,

    // Handler lists are cleared and rebuilt at the start of each render, so
    // only handlers registered during the most recent render are live.
    pub(crate) key_handlers: SmallVec<[KeyHandlerFn; 2]>,
    pub(crate) global_key_handlers: SmallVec<[KeyHandlerFn; 2]>,
    pub(crate) mouse_handlers: SmallVec<[MouseHandlerFn; 2]>,
    pub(crate) message_handlers: SmallVec<[MsgHandlerFn; 2]>,
    pub(crate) on_focused: Option<FocusCallback>,
    pub(crate) focusable: bool,

    /// Geometry written by the layout collaborator (or the zone scanner),
    /// read by mouse hit-testing and the size/position accessors.
    pub(crate) area: Option<Rect>,

    // Per-render cursors into the slot vectors; reset at render start.
    pub(crate) state_cursor: usize,
    pub(crate) effect_cursor: usize,
}

impl Instance {
    fn new(id: ComponentId, parent: Option<ComponentId>) -> Self {
        Self {
            id,
            parent,
            children: Vec::new(),
            state_slots: Vec::new(),
            effect_slots: Vec::new(),
            key_handlers: SmallVec::new(),
            global_key_handlers: SmallVec::new(),
            mouse_handlers: SmallVec::new(),
            message_handlers: SmallVec::new(),
            on_focused: None,
            focusable: false,
            area: None,
            state_cursor: 0,
            effect_cursor: 0,
        }
    }

    /// The instance id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The owning instance's id, if any.
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Child ids in render order.
    pub fn children(&self) -> &[ComponentId] {
        &self.children
    }

    /// Whether the focus manager may select this instance.
    pub fn focusable(&self) -> bool {
        self.focusable
    }

    /// Computed geometry, if the layout collaborator has written it.
    pub fn area(&self) -> Option<Rect> {
        self.area
    }

    /// Reset transient per-render bookkeeping. Hook call sites re-register
    /// everything during the render that follows.
    pub(crate) fn begin_render(&mut self) {
        self.state_cursor = 0;
        self.effect_cursor = 0;
        self.children.clear();
        self.key_handlers.clear();
        self.global_key_handlers.clear();
        self.mouse_handlers.clear();
        self.message_handlers.clear();
        self.on_focused = None;
        self.focusable = false;
    }

    /// Run every non-null effect cleanup in slot order, exactly once.
    pub(crate) fn run_cleanups(&mut self) {
        for slot in &mut self.effect_slots {
            if let Some(cleanup) = slot.cleanup.take() {
                cleanup();
            }
        }
    }

    /// Apply writes staged by setters since the last pass.
    pub(crate) fn apply_pending_state(&mut self) {
        for slot in &self.state_slots {
            let mut cell = slot.borrow_mut();
            if let Some(value) = cell.pending.take() {
                cell.value = value;
            }
        }
    }
}

/// The id → [`Instance`] map.
///
/// Iteration order is insertion order (instance creation order), which keeps
/// every whole-registry walk (pruning, message broadcast) deterministic.
#[derive(Default)]
pub struct Registry {
    map: IndexMap<ComponentId, Instance, FxBuildHasher>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Return the existing instance for `id` or allocate a zero-valued one.
    /// The parent link is refreshed on reuse; a reparented id keeps its
    /// state, matching positional identity being purely path-derived.
    pub(crate) fn get_or_create(
        &mut self,
        id: &ComponentId,
        parent: Option<ComponentId>,
    ) -> &mut Instance {
        if !self.map.contains_key(id) {
            tracing::trace!(id = %id, "instance created");
            self.map
                .insert(id.clone(), Instance::new(id.clone(), parent.clone()));
        }
        // contains_key/insert above make this infallible
        let instance = self
            .map
            .get_mut(id)
            .unwrap_or_else(|| unreachable!("instance just inserted"));
        instance.parent = parent;
        instance
    }

    /// Look up an instance. A miss is benign: events racing against an
    /// unmount are expected.
    pub fn get(&self, id: &str) -> Option<&Instance> {
        self.map.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Instance> {
        self.map.get_mut(id)
    }

    /// Destroy instances, running each one's pending effect cleanups in slot
    /// order before the entry is deleted. Cleanups are nulled as they run, so
    /// none can run twice.
    pub(crate) fn remove<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = ComponentId>,
    {
        for id in ids {
            if let Some(mut instance) = self.map.shift_remove(&id) {
                tracing::trace!(id = %id, "instance destroyed");
                instance.run_cleanups();
            }
        }
    }

    /// Number of live instances.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// True when no instances are live.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// True if `id` is live.
    pub fn contains(&self, id: &str) -> bool {
        self.map.contains_key(id)
    }

    /// Live ids in creation order.
    pub fn ids(&self) -> impl Iterator<Item = &ComponentId> {
        self.map.keys()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&ComponentId, &Instance)> {
        self.map.iter()
    }

    pub(crate) fn values_mut(&mut self) -> impl Iterator<Item = &mut Instance> {
        self.map.values_mut()
    }

    /// Instances with no parent, in creation order. Traversal roots.
    pub(crate) fn roots(&self) -> impl Iterator<Item = &Instance> {
        self.map.values().filter(|i| i.parent.is_none())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn id(s: &str) -> ComponentId {
        ComponentId::from(s)
    }

    #[test]
    fn test_get_or_create_reuses() {
        let mut registry = Registry::new();
        registry.get_or_create(&id("a"), None).state_slots.push(Rc::new(
            RefCell::new(StateCell {
                value: Box::new(5u32),
                pending: None,
            }),
        ));
        let again = registry.get_or_create(&id("a"), None);
        assert_eq!(again.state_slots.len(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_runs_cleanups_once() {
        let mut registry = Registry::new();
        let runs = Rc::new(Cell::new(0u32));
        {
            let instance = registry.get_or_create(&id("a"), None);
            for _ in 0..3 {
                let runs = runs.clone();
                instance.effect_slots.push(EffectSlot {
                    deps: Deps::Once,
                    cleanup: Some(Box::new(move || runs.set(runs.get() + 1))),
                });
            }
        }
        registry.remove([id("a")]);
        assert_eq!(runs.get(), 3);
        assert!(!registry.contains("a"));

        // Removing an absent id is a no-op.
        registry.remove([id("a")]);
        assert_eq!(runs.get(), 3);
    }

    #[test]
    fn test_begin_render_clears_handlers_keeps_slots() {
        let mut registry = Registry::new();
        let instance = registry.get_or_create(&id("a"), None);
        instance.key_handlers.push(Rc::new(|_| true));
        instance.focusable = true;
        instance.state_slots.push(Rc::new(RefCell::new(StateCell {
            value: Box::new(1u8),
            pending: None,
        })));
        instance.state_cursor = 1;

        instance.begin_render();
        assert!(instance.key_handlers.is_empty());
        assert!(!instance.focusable);
        assert_eq!(instance.state_cursor, 0);
        assert_eq!(instance.state_slots.len(), 1);
    }

    #[test]
    fn test_rect_contains() {
        let r = Rect::new(2, 3, 4, 2);
        assert!(r.contains(2, 3));
        assert!(r.contains(5, 4));
        assert!(!r.contains(6, 3));
        assert!(!r.contains(2, 5));
    }
}
