//! Focus management: a single globally-focused instance and tab-cycling.
//!
//! Focus order is the pre-order walk of the instance tree as of the latest
//! render pass, filtered to instances that declared
//! [`use_focusable`](crate::Ctx::use_focusable). At most one instance is
//! focused at any time; `use_is_focused` is equality against that id.

use crate::context::Ctx;
use crate::instance::{ComponentId, FocusCallback};

impl Ctx {
    /// The currently focused instance id, if any.
    pub fn focused_id(&self) -> Option<&str> {
        self.focused.as_deref()
    }

    /// Move focus to the next focusable instance in tree order, wrapping at
    /// the end. With nothing focused, selects the first. Does nothing when
    /// no instance is focusable.
    pub fn focus_next(&mut self) {
        self.cycle_focus(false);
    }

    /// Move focus to the previous focusable instance, wrapping at the start.
    /// With nothing focused, selects the last.
    pub fn focus_previous(&mut self) {
        self.cycle_focus(true);
    }

    /// Focus `id` directly. A no-op if `id` is not live and focusable.
    pub fn focus(&mut self, id: &str) {
        let focusable = self.registry.get(id).is_some_and(|i| i.focusable);
        if focusable {
            self.transition_focus(Some(ComponentId::from(id)), false);
        }
    }

    /// Clear focus entirely.
    pub fn blur(&mut self) {
        self.transition_focus(None, false);
    }

    fn cycle_focus(&mut self, reverse: bool) {
        let order = self.focus_order();
        if order.is_empty() {
            return;
        }
        let position = self
            .focused
            .as_ref()
            .and_then(|focused| order.iter().position(|id| id == focused));
        let len = order.len();
        let next = match position {
            // "None" sits just before the start: next wraps to the first
            // entry, previous to the last.
            None => {
                if reverse {
                    len - 1
                } else {
                    0
                }
            }
            Some(i) => {
                if reverse {
                    (i + len - 1) % len
                } else {
                    (i + 1) % len
                }
            }
        };
        self.transition_focus(Some(order[next].clone()), reverse);
    }

    fn transition_focus(&mut self, to: Option<ComponentId>, reverse: bool) {
        if self.focused == to {
            return;
        }
        let leaving: Option<FocusCallback> = self
            .focused
            .as_ref()
            .and_then(|id| self.registry.get(id))
            .and_then(|i| i.on_focused.clone());
        let entering: Option<FocusCallback> = to
            .as_ref()
            .and_then(|id| self.registry.get(id))
            .and_then(|i| i.on_focused.clone());

        tracing::trace!(
            from = ?self.focused.as_deref(),
            to = ?to.as_deref(),
            reverse,
            "focus transition"
        );
        self.focused = to;
        self.request_render();

        // Old side first, then new; a transition from/to none only has one
        // side to notify.
        if let Some(callback) = leaving {
            callback(reverse);
        }
        if let Some(callback) = entering {
            callback(reverse);
        }
    }

    /// Pre-order sequence of focusable instance ids over the current tree.
    fn focus_order(&self) -> Vec<ComponentId> {
        let mut order = Vec::new();
        for id in self.preorder_ids() {
            if self.registry.get(&id).is_some_and(|i| i.focusable) {
                order.push(id);
            }
        }
        order
    }

    /// Pre-order walk over every live instance, roots in creation order.
    /// This is the documented deterministic order for whole-tree handler
    /// collection.
    pub(crate) fn preorder_ids(&self) -> Vec<ComponentId> {
        let mut out = Vec::with_capacity(self.registry.len());
        let roots: Vec<ComponentId> = self.registry.roots().map(|i| i.id.clone()).collect();
        let mut stack: Vec<ComponentId> = roots.into_iter().rev().collect();
        while let Some(id) = stack.pop() {
            if let Some(instance) = self.registry.get(&id) {
                for child in instance.children().iter().rev() {
                    stack.push(child.clone());
                }
            }
            out.push(id);
        }
        out
    }
}
