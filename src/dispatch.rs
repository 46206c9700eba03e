//! Event dispatch: routing keys, mouse events, and generic messages to
//! component handlers.
//!
//! Routing rules, in order:
//!
//! - **Keys** go to the focused instance's handlers first,
//!   most-recently-registered first, stopping at the first one that consumes
//!   the event. If unconsumed, global key handlers run, collected in tree
//!   pre-order (a defined, documented order; within one instance,
//!   registration order). Keys still unhandled after that are checked
//!   against the focus-cycle bindings (Tab / Shift+Tab by default).
//! - **Mouse** events are hit-tested against the zone table; the owning
//!   component's handlers run in registration order with the local child
//!   zone id until one consumes the event. Motion events also maintain the
//!   hover state behind `use_is_hovered`.
//! - **Messages** are broadcast to every instance's message handlers in
//!   registry order; returned commands are collected for the caller to
//!   execute off-thread.
//!
//! A handler that panics is caught at the dispatch boundary, logged, and
//! treated as "not handled"; propagation continues and the frame survives.

use crate::context::{Ctx, HoverTarget};
use crate::event::{Command, Event, KeyBinding, KeyCode, KeyEvent, MouseEvent, Msg};
use crate::instance::{ComponentId, KeyHandlerFn, MouseHandlerFn, MsgHandlerFn};
use crate::zone::ZoneChild;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Dispatcher configuration.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Binding that advances focus when a key event goes unhandled.
    pub focus_next: KeyBinding,
    /// Binding that moves focus backwards.
    pub focus_previous: KeyBinding,
    /// Consult global key handlers even when a focused handler already
    /// consumed the event. Off by default.
    pub globals_always: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            focus_next: KeyBinding::key(KeyCode::Tab),
            focus_previous: KeyBinding::shift(KeyCode::BackTab),
            globals_always: false,
        }
    }
}

/// Run one handler, converting a panic into "not handled".
fn guarded<T>(kind: &str, run: impl FnOnce() -> T) -> Option<T> {
    match catch_unwind(AssertUnwindSafe(run)) {
        Ok(result) => Some(result),
        Err(_) => {
            tracing::warn!(kind, "handler panicked; treating event as unhandled");
            None
        }
    }
}

impl Ctx {
    /// Route a unified event, returning any follow-up commands.
    pub fn dispatch(&mut self, event: Event) -> Vec<Command> {
        match event {
            Event::Key(key) => {
                self.dispatch_key(&key);
                Vec::new()
            }
            Event::Mouse(mouse) => {
                self.dispatch_mouse(&mouse);
                Vec::new()
            }
            Event::Message(msg) => self.dispatch_message(&msg),
        }
    }

    /// Route a key event. Returns true if anything consumed it (including a
    /// focus-cycle fallback).
    pub fn dispatch_key(&mut self, event: &KeyEvent) -> bool {
        let mut handled = false;

        if let Some(focused) = self.focused.clone() {
            let handlers: Vec<KeyHandlerFn> = self
                .registry
                .get(&focused)
                .map(|i| i.key_handlers.iter().rev().cloned().collect())
                .unwrap_or_default();
            for handler in handlers {
                if guarded("key", || handler(event)).unwrap_or(false) {
                    handled = true;
                    break;
                }
            }
        }

        if !handled || self.config.globals_always {
            for handler in self.global_key_handlers() {
                if guarded("global-key", || handler(event)).unwrap_or(false) {
                    handled = true;
                    break;
                }
            }
        }

        if !handled {
            if self.config.focus_next.matches(event) {
                self.focus_next();
                return true;
            }
            if self.config.focus_previous.matches(event) {
                self.focus_previous();
                return true;
            }
        }
        handled
    }

    /// Route a mouse event through zone hit-testing. Returns true if an
    /// owning component's handler consumed it.
    pub fn dispatch_mouse(&mut self, event: &MouseEvent) -> bool {
        if event.is_motion() {
            self.update_hover(event);
        }

        let Some((owner, child)) = self.hit_test(event.x, event.y) else {
            return false;
        };
        let owner = ComponentId::from(owner);
        let child = ZoneChild::from(child);

        let handlers: Vec<MouseHandlerFn> = self
            .registry
            .get(&owner)
            .map(|i| i.mouse_handlers.iter().cloned().collect())
            .unwrap_or_default();
        for handler in handlers {
            if guarded("mouse", || handler(event, &child)).unwrap_or(false) {
                return true;
            }
        }
        false
    }

    /// Broadcast a generic message to every instance's message handlers, in
    /// registry order, and collect the follow-up commands they return.
    pub fn dispatch_message(&mut self, msg: &Msg) -> Vec<Command> {
        let handlers: Vec<MsgHandlerFn> = self
            .registry
            .iter()
            .flat_map(|(_, instance)| instance.message_handlers.iter().cloned())
            .collect();

        let mut commands = Vec::new();
        for handler in handlers {
            if let Some(Some(command)) = guarded("message", || handler(msg)) {
                commands.push(command);
            }
        }
        commands
    }

    /// Global key handlers in tree pre-order, registration order within an
    /// instance.
    fn global_key_handlers(&self) -> Vec<KeyHandlerFn> {
        let mut handlers = Vec::new();
        for id in self.preorder_ids() {
            if let Some(instance) = self.registry.get(&id) {
                handlers.extend(instance.global_key_handlers.iter().cloned());
            }
        }
        handlers
    }

    fn update_hover(&mut self, event: &MouseEvent) {
        let target = self
            .hit_test(event.x, event.y)
            .map(|(owner, child)| HoverTarget {
                owner: ComponentId::from(owner),
                child: ZoneChild::from(child),
            });
        if self.hover != target {
            self.hover = target;
            self.request_render();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::event::{KeyModifiers, MouseButton, MouseEventKind};
    use crate::Ctx;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<&'static str>>>;

    fn key(c: char) -> KeyEvent {
        KeyEvent::char(c)
    }

    fn tab() -> KeyEvent {
        KeyEvent::new(KeyCode::Tab)
    }

    #[test]
    fn test_focused_handlers_most_recent_first() {
        fn widget(ctx: &mut Ctx, log: &Log) -> String {
            ctx.use_focusable();
            let early = log.clone();
            ctx.use_key_handler(move |_| {
                early.borrow_mut().push("early");
                true
            });
            let late = log.clone();
            ctx.use_key_handler(move |_| {
                late.borrow_mut().push("late");
                true
            });
            String::new()
        }

        let log: Log = Rc::default();
        let mut ctx = Ctx::new();
        ctx.render_pass(widget, &log);
        ctx.focus_next();

        assert!(ctx.dispatch_key(&key('x')));
        assert_eq!(log.borrow().as_slice(), ["late"]);
    }

    #[test]
    fn test_global_handler_runs_when_focused_declines() {
        fn focused(ctx: &mut Ctx, log: &Log) -> String {
            ctx.use_focusable();
            let log = log.clone();
            ctx.use_key_handler(move |_| {
                log.borrow_mut().push("focused");
                false
            });
            String::new()
        }
        fn watcher(ctx: &mut Ctx, log: &Log) -> String {
            let log = log.clone();
            ctx.use_global_key_handler(move |_| {
                log.borrow_mut().push("global");
                true
            });
            String::new()
        }
        fn tree(ctx: &mut Ctx, log: &Log) -> String {
            ctx.render(focused, log);
            ctx.render(watcher, log);
            String::new()
        }

        let log: Log = Rc::default();
        let mut ctx = Ctx::new();
        ctx.render_pass(tree, &log);
        ctx.focus_next();

        assert!(ctx.dispatch_key(&key('x')));
        assert_eq!(log.borrow().as_slice(), ["focused", "global"]);
    }

    #[test]
    fn test_global_consumption_suppresses_focus_cycle() {
        fn widget(ctx: &mut Ctx, _props: &()) -> String {
            ctx.use_focusable();
            ctx.use_global_key_handler(|_| true);
            String::new()
        }
        let mut ctx = Ctx::new();
        ctx.render_pass(widget, &());
        assert_eq!(ctx.focused_id(), None);

        // Tab is eaten by the global handler, so no focus change.
        assert!(ctx.dispatch_key(&tab()));
        assert_eq!(ctx.focused_id(), None);
    }

    #[test]
    fn test_unhandled_tab_cycles_focus() {
        fn widget(ctx: &mut Ctx, _props: &()) -> String {
            ctx.use_focusable();
            String::new()
        }
        let mut ctx = Ctx::new();
        ctx.render_pass(widget, &());
        assert!(ctx.dispatch_key(&tab()));
        assert_eq!(ctx.focused_id(), Some("widget"));
    }

    #[test]
    fn test_panicking_handler_is_unhandled() {
        fn widget(ctx: &mut Ctx, log: &Log) -> String {
            ctx.use_focusable();
            let log = log.clone();
            ctx.use_key_handler(move |_| {
                log.borrow_mut().push("fallback");
                true
            });
            ctx.use_key_handler(|_| panic!("handler bug"));
            String::new()
        }

        let log: Log = Rc::default();
        let mut ctx = Ctx::new();
        ctx.render_pass(widget, &log);
        ctx.focus_next();

        // The panicking handler (registered last, so tried first) fails;
        // propagation continues to the next one.
        assert!(ctx.dispatch_key(&key('x')));
        assert_eq!(log.borrow().as_slice(), ["fallback"]);
    }

    #[test]
    fn test_mouse_routing_with_child_id() {
        fn rows(ctx: &mut Ctx, log: &Rc<RefCell<Vec<String>>>) -> String {
            let log = log.clone();
            ctx.use_mouse_handler(move |event, child| {
                if matches!(event.kind, MouseEventKind::Down(MouseButton::Left)) {
                    log.borrow_mut().push(child.to_string());
                    return true;
                }
                false
            });
            let a = ctx.mouse_zone_child("row:0", "aaaa");
            let b = ctx.mouse_zone_child("row:1", "bbbb");
            format!("{a}\n{b}")
        }

        let log: Rc<RefCell<Vec<String>>> = Rc::default();
        let mut ctx = Ctx::new();
        let frame = ctx.render_pass(rows, &log);
        ctx.scan_zones(&frame);

        let click = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            x: 2,
            y: 1,
            modifiers: KeyModifiers::NONE,
        };
        assert!(ctx.dispatch_mouse(&click));
        assert_eq!(log.borrow().as_slice(), ["row:1"]);
    }

    #[test]
    fn test_mouse_motion_updates_hover() {
        fn rows(ctx: &mut Ctx, _props: &()) -> String {
            let a = ctx.mouse_zone_child("row:0", "aaaa");
            let b = ctx.mouse_zone_child("row:1", "bbbb");
            format!("{a}\n{b}")
        }

        let mut ctx = Ctx::new();
        let frame = ctx.render_pass(rows, &());
        ctx.scan_zones(&frame);

        let moved = MouseEvent {
            kind: MouseEventKind::Moved,
            x: 0,
            y: 0,
            modifiers: KeyModifiers::NONE,
        };
        ctx.dispatch_mouse(&moved);
        assert!(ctx.take_render_request());
        assert_eq!(ctx.hover.as_ref().unwrap().child.as_str(), "row:0");

        // Same target again: no render churn.
        ctx.dispatch_mouse(&moved);
        assert!(!ctx.take_render_request());
    }

    #[test]
    fn test_message_broadcast_collects_commands() {
        struct Ping;
        fn a(ctx: &mut Ctx, _props: &()) -> String {
            ctx.use_message_handler(|msg| {
                msg.is::<Ping>()
                    .then(|| Box::new(|| Ok(None)) as Command)
            });
            String::new()
        }
        fn b(ctx: &mut Ctx, _props: &()) -> String {
            ctx.use_message_handler(|_| None);
            String::new()
        }
        fn tree(ctx: &mut Ctx, _props: &()) -> String {
            ctx.render(a, &());
            ctx.render(b, &());
            String::new()
        }

        let mut ctx = Ctx::new();
        ctx.render_pass(tree, &());
        let commands = ctx.dispatch_message(&Msg::new(Ping));
        assert_eq!(commands.len(), 1);
    }

    #[test]
    fn test_key_with_no_focus_and_no_globals() {
        fn widget(_ctx: &mut Ctx, _props: &()) -> String {
            String::new()
        }
        let mut ctx = Ctx::new();
        ctx.render_pass(widget, &());
        assert!(!ctx.dispatch_key(&key('x')));
    }
}
