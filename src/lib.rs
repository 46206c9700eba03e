//! # nib
//!
//! A hook-based component runtime for terminal UIs.
//!
//! Components are plain functions `(ctx, props) -> String`. nib gives them
//! durable identity: each call site in the render tree maps to a persistent
//! [`Instance`] that carries state, effects, event handlers, and focus
//! markings across renders, addressed by a path-derived id. On top of that
//! identity sit the hooks ([`use_state`](Ctx::use_state),
//! [`use_effect`](Ctx::use_effect), handler and focus registrations), a
//! mark-and-sweep reconciler that destroys whatever a render pass no longer
//! reaches, a tab-cycling focus manager, and an event dispatcher that routes
//! keys by focus, mouse events by zone hit-testing, and everything else by
//! broadcast.
//!
//! Rendering and dispatch are single-threaded; asynchronous work runs as
//! [`Command`]s on worker threads and reports back through the message
//! queue. All of it hangs off one explicit [`Ctx`]; no globals, so several
//! runtimes can coexist in a process.
//!
//! ## Example
//!
//! ```
//! use nib::{Ctx, KeyCode, Runtime};
//!
//! fn counter(ctx: &mut Ctx, _props: &()) -> String {
//!     let (count, set_count) = ctx.use_state(0u32);
//!     ctx.use_focusable();
//!     ctx.use_key_handler(move |key| match key.code {
//!         KeyCode::Char('+') => {
//!             set_count.set(count + 1);
//!             true
//!         }
//!         _ => false,
//!     });
//!     format!("count: {count}")
//! }
//!
//! let mut runtime = Runtime::new(counter, ());
//! let frame = runtime.step().unwrap();
//! assert_eq!(frame.as_deref(), Some("count: 0"));
//! ```
//!
//! ## Modules
//!
//! | Module | Provides |
//! |--------|----------|
//! | [`event`] | Key/mouse events, [`Msg`], [`Command`], crossterm conversions |
//! | [`hooks`] | The `use_*` API, [`Deps`], the [`deps!`](crate::deps) macro |
//! | `context` | [`Ctx`] itself |
//! | `instance` | [`Instance`], [`Registry`], [`Rect`] |
//! | `reconcile` | [`Ctx::render_pass`], [`Ctx::render`], [`Ctx::render_keyed`] |
//! | `focus` | [`Ctx::focus_next`] and friends |
//! | `dispatch` | [`Ctx::dispatch_key`] / [`Ctx::dispatch_mouse`] / [`Ctx::dispatch_message`] |
//! | `zone` | Mouse zones and frame scanning |
//! | `runtime` | [`Runtime`], the event-loop driver |

pub mod event;
pub mod hooks;

mod context;
mod dispatch;
mod focus;
mod instance;
mod reconcile;
mod runtime;
mod zone;

pub use context::Ctx;
pub use dispatch::DispatchConfig;
pub use event::{
    tick, Command, Event, KeyBinding, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind, Msg,
};
pub use hooks::{DepValue, Deps, SetState};
pub use instance::{Cleanup, ComponentId, Instance, Rect, Registry};
pub use runtime::{MsgSender, Runtime, RuntimeError};
pub use zone::ZoneChild;
