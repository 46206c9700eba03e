//! The render context.
//!
//! [`Ctx`] bundles everything one running UI needs: the instance registry,
//! the focus and hover state, the mouse-zone table, and the per-pass render
//! bookkeeping. It is created explicitly, threaded through every render
//! function, and dropped when the UI goes away. There is no process-global
//! registry, so several independent contexts can coexist in one process
//! (and in tests).
//!
//! The model is single-threaded and cooperative: exactly one render pass,
//! one dispatch step, and one handler invocation execute at a time. The
//! "current instance" is a stack cursor valid only while that instance's
//! render function runs; hooks address it implicitly.

use crate::dispatch::DispatchConfig;
use crate::instance::{ComponentId, Instance, Registry};
use crate::zone::ZoneMap;
use rustc_hash::FxHashSet;
use std::cell::Cell;
use std::rc::Rc;

/// A frame of the render stack: which instance is rendering and how many
/// children it has produced so far (for ordinal id derivation).
pub(crate) struct Frame {
    pub(crate) id: ComponentId,
    pub(crate) child_count: usize,
}

/// What the mouse is currently over, per the latest motion event.
#[derive(Clone, PartialEq, Eq)]
pub(crate) struct HoverTarget {
    pub(crate) owner: ComponentId,
    pub(crate) child: smartstring::alias::String,
}

/// The component runtime context.
///
/// Owns the registry and all cross-component state. Application code holds
/// one `Ctx`, drives [`render_pass`](Ctx::render_pass) and the `dispatch_*`
/// operations from its event loop, and passes `&mut Ctx` into render
/// functions, which talk to it exclusively through hooks.
pub struct Ctx {
    pub(crate) registry: Registry,
    pub(crate) stack: Vec<Frame>,
    pub(crate) visited: FxHashSet<ComponentId>,
    pub(crate) in_pass: bool,

    pub(crate) focused: Option<ComponentId>,
    pub(crate) zones: ZoneMap,
    pub(crate) hover: Option<HoverTarget>,

    /// Shared with every state setter; consumed at the start of the next
    /// pass by whoever drives the loop.
    pub(crate) render_requested: Rc<Cell<bool>>,

    /// Dispatcher configuration.
    pub config: DispatchConfig,
}

impl Ctx {
    /// Create an empty context.
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            stack: Vec::new(),
            visited: FxHashSet::default(),
            in_pass: false,
            focused: None,
            zones: ZoneMap::new(),
            hover: None,
            render_requested: Rc::new(Cell::new(false)),
            config: DispatchConfig::default(),
        }
    }

    /// The instance registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Mark that state changed and a fresh render pass is needed.
    pub fn request_render(&self) {
        self.render_requested.set(true);
    }

    /// Consume the re-render flag. Returns true if a render was requested
    /// since the last call.
    pub fn take_render_request(&self) -> bool {
        self.render_requested.replace(false)
    }

    /// Write an instance's geometry. Called by the layout collaborator after
    /// it has computed cell positions; a pruned id is a benign no-op.
    pub fn set_bounds(&mut self, id: &str, area: crate::instance::Rect) {
        if let Some(instance) = self.registry.get_mut(id) {
            instance.area = Some(area);
        }
    }

    /// Id of the instance currently being rendered.
    ///
    /// # Panics
    ///
    /// Panics outside an active render: hooks are only meaningful while a
    /// component is being rendered, and calling one elsewhere is a
    /// programming error that would corrupt slot addressing.
    #[track_caller]
    pub(crate) fn current_id(&self) -> &ComponentId {
        match self.stack.last() {
            Some(frame) => &frame.id,
            None => panic!("hook called outside of an active render"),
        }
    }

    /// The instance currently being rendered.
    ///
    /// # Panics
    ///
    /// Panics outside an active render; see [`Ctx::current_id`].
    #[track_caller]
    pub(crate) fn current_mut(&mut self) -> &mut Instance {
        let id = match self.stack.last() {
            Some(frame) => frame.id.clone(),
            None => panic!("hook called outside of an active render"),
        };
        self.registry
            .get_mut(&id)
            .unwrap_or_else(|| panic!("no instance for rendering id {id}"))
    }
}

impl Default for Ctx {
    fn default() -> Self {
        Self::new()
    }
}
