//! The reconciler: one full top-down render pass per update cycle.
//!
//! Components are plain functions `(ctx, props) -> String`. A pass renders
//! the root, which renders its children inline through [`Ctx::render`] /
//! [`Ctx::render_keyed`]; every node visited gets-or-creates its instance and
//! marks its id. Afterwards the registry is diffed against the visited set
//! and every unvisited instance is destroyed, cleanups included.
//!
//! Reachability is recomputed every pass instead of relying on explicit
//! unmount notifications: children lists are data-driven and can change
//! shape on any render, and mark-and-sweep cannot forget a removal.
//!
//! # Identity
//!
//! An id is the component's path in the tree: parent id, a slash, the
//! component function's name, and either the ordinal position among the
//! parent's children (`parent/row.3`) or a caller key (`parent/row:alice`).
//! Siblings rendered from a loop over changing data must use
//! [`Ctx::render_keyed`], otherwise insertions shift ordinals and state
//! migrates between rows.

use crate::context::{Ctx, Frame};
use crate::instance::ComponentId;

/// Last path segment of a type name; component ids use the bare function
/// name, not the full module path.
fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

impl Ctx {
    /// Drive one full render pass from `root`.
    ///
    /// Applies state writes staged since the last pass, renders the tree,
    /// then prunes every instance the pass did not visit (running effect
    /// cleanups exactly once per destroyed instance). Focus or hover held by
    /// a pruned instance is cleared.
    ///
    /// The root instance's id derives from the root function's type name.
    /// Closures all share the name `{{closure}}`, so alternating distinct
    /// closure roots on one context silently reuses a single instance; use
    /// a named fn as the root.
    ///
    /// # Panics
    ///
    /// Panics if called while a pass is already in progress; nested or
    /// overlapping passes are a contract violation.
    pub fn render_pass<P, F>(&mut self, root: F, props: &P) -> String
    where
        F: Fn(&mut Ctx, &P) -> String,
    {
        assert!(
            !self.in_pass,
            "render pass started while another pass is in progress"
        );
        self.in_pass = true;
        tracing::debug!("render pass begin");

        // The snapshot this pass observes: all staged writes land up front,
        // none mid-pass.
        for instance in self.registry.values_mut() {
            instance.apply_pending_state();
        }
        self.render_requested.set(false);
        self.visited.clear();
        self.zones.clear();

        let id = ComponentId::from(short_type_name::<F>());
        let output = self.render_instance(id, &root, props);

        let orphaned: Vec<ComponentId> = self
            .registry
            .ids()
            .filter(|id| !self.visited.contains(*id))
            .cloned()
            .collect();
        if !orphaned.is_empty() {
            tracing::debug!(count = orphaned.len(), "pruning unreachable instances");
        }
        self.registry.remove(orphaned);

        if let Some(focused) = self.focused.clone() {
            if !self.registry.contains(&focused) {
                tracing::trace!(id = %focused, "focused instance pruned; clearing focus");
                self.focused = None;
            }
        }
        if let Some(hover) = &self.hover {
            if !self.registry.contains(&hover.owner) {
                self.hover = None;
            }
        }

        self.in_pass = false;
        tracing::debug!(instances = self.registry.len(), "render pass end");
        output
    }

    /// Render a child component at the next ordinal position under the
    /// current instance.
    ///
    /// # Panics
    ///
    /// Panics outside an active render pass.
    #[track_caller]
    pub fn render<P, F>(&mut self, component: F, props: &P) -> String
    where
        F: Fn(&mut Ctx, &P) -> String,
    {
        let frame = self
            .stack
            .last_mut()
            .unwrap_or_else(|| panic!("render() called outside of an active render pass"));
        let ordinal = frame.child_count;
        frame.child_count += 1;
        let id = ComponentId::from(format!(
            "{}/{}.{}",
            frame.id,
            short_type_name::<F>(),
            ordinal
        ));
        self.render_instance(id, &component, props)
    }

    /// Render a child component with a caller-supplied key instead of the
    /// ordinal. Required for siblings rendered from dynamic collections so
    /// their identity survives reordering.
    ///
    /// # Panics
    ///
    /// Panics outside an active render pass.
    #[track_caller]
    pub fn render_keyed<P, F>(&mut self, key: &str, component: F, props: &P) -> String
    where
        F: Fn(&mut Ctx, &P) -> String,
    {
        let frame = self
            .stack
            .last_mut()
            .unwrap_or_else(|| panic!("render_keyed() called outside of an active render pass"));
        frame.child_count += 1;
        let id = ComponentId::from(format!(
            "{}/{}:{}",
            frame.id,
            short_type_name::<F>(),
            key
        ));
        self.render_instance(id, &component, props)
    }

    fn render_instance<P, F>(&mut self, id: ComponentId, component: &F, props: &P) -> String
    where
        F: Fn(&mut Ctx, &P) -> String,
    {
        if !self.visited.insert(id.clone()) {
            tracing::warn!(
                id = %id,
                "duplicate component id within one pass; sibling keys must be distinct"
            );
        }
        let parent = self.stack.last().map(|f| f.id.clone());
        if let Some(parent_id) = &parent {
            if let Some(parent_instance) = self.registry.get_mut(parent_id) {
                parent_instance.children.push(id.clone());
            }
        }

        let instance = self.registry.get_or_create(&id, parent);
        instance.begin_render();

        self.stack.push(Frame {
            id,
            child_count: 0,
        });
        let output = component(self, props);
        self.stack.pop();
        output
    }
}
