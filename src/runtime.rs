//! The runtime: glue between an event loop and a [`Ctx`].
//!
//! [`Runtime`] owns the context, the root component, and a thread-safe
//! message queue. The event loop feeds it terminal events through
//! [`handle_event`](Runtime::handle_event) and calls [`step`](Runtime::step)
//! once per iteration; `step` drains queued messages, executes any commands
//! handlers returned, and re-renders only when something requested it.
//!
//! Commands run on detached worker threads and never touch the context;
//! their results come back as messages on the queue, keeping all component
//! state single-threaded.

use crate::context::Ctx;
use crate::event::{Command, Event, Msg};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Errors surfaced by the runtime driver.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// A command worker thread could not be spawned.
    #[error("failed to spawn command worker")]
    Spawn(#[from] std::io::Error),
}

/// Cloneable, thread-safe handle for injecting messages into the runtime.
///
/// This is the only way into the UI from other threads: senders can be moved
/// into worker threads or signal handlers, and every message they push is
/// picked up by the next [`Runtime::step`] on the UI thread.
#[derive(Clone)]
pub struct MsgSender {
    queue: Arc<Mutex<VecDeque<Msg>>>,
}

impl MsgSender {
    /// Queue a message for the next step.
    pub fn send(&self, msg: Msg) {
        self.queue.lock().push_back(msg);
    }
}

/// Drives one UI: a root component, its props, and the owning [`Ctx`].
pub struct Runtime<P, F> {
    ctx: Ctx,
    root: F,
    props: P,
    queue: Arc<Mutex<VecDeque<Msg>>>,
    rendered_once: bool,
}

impl<P, F> Runtime<P, F>
where
    F: Fn(&mut Ctx, &P) -> String,
{
    /// Create a runtime around a root component and its initial props.
    pub fn new(root: F, props: P) -> Self {
        Self {
            ctx: Ctx::new(),
            root,
            props,
            queue: Arc::new(Mutex::new(VecDeque::new())),
            rendered_once: false,
        }
    }

    /// A sender feeding this runtime's message queue.
    pub fn sender(&self) -> MsgSender {
        MsgSender {
            queue: Arc::clone(&self.queue),
        }
    }

    /// The underlying context.
    pub fn ctx(&self) -> &Ctx {
        &self.ctx
    }

    /// The underlying context, mutably (focus control, dispatcher config).
    pub fn ctx_mut(&mut self) -> &mut Ctx {
        &mut self.ctx
    }

    /// Current root props.
    pub fn props(&self) -> &P {
        &self.props
    }

    /// Replace the root props and schedule a re-render.
    pub fn set_props(&mut self, props: P) {
        self.props = props;
        self.ctx.request_render();
    }

    /// Route one input event, executing any commands handlers return.
    pub fn handle_event(&mut self, event: Event) -> Result<(), RuntimeError> {
        let commands = self.ctx.dispatch(event);
        self.run_commands(commands)
    }

    /// One loop iteration: drain queued messages through the dispatcher,
    /// then re-render if anything asked for it (the first call always
    /// renders). Returns the new frame, markers stripped, or `None` when
    /// nothing changed.
    pub fn step(&mut self) -> Result<Option<String>, RuntimeError> {
        let pending: Vec<Msg> = self.queue.lock().drain(..).collect();
        for msg in pending {
            let commands = self.ctx.dispatch_message(&msg);
            self.run_commands(commands)?;
        }

        if self.rendered_once && !self.ctx.take_render_request() {
            return Ok(None);
        }
        self.rendered_once = true;

        let frame = self.ctx.render_pass(&self.root, &self.props);
        Ok(Some(self.ctx.scan_zones(&frame)))
    }

    /// Execute commands on detached worker threads. A command's message, if
    /// any, lands on the queue; a failed command is logged and dropped.
    fn run_commands(&self, commands: Vec<Command>) -> Result<(), RuntimeError> {
        for command in commands {
            let queue = Arc::clone(&self.queue);
            std::thread::Builder::new()
                .name("nib-command".into())
                .spawn(move || match command() {
                    Ok(Some(msg)) => queue.lock().push_back(msg),
                    Ok(None) => {}
                    Err(error) => tracing::warn!(error = %error, "command failed"),
                })?;
        }
        Ok(())
    }
}
