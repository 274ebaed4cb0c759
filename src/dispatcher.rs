//! Context Registry and Dispatcher
//!
//! Process-wide state behind the exported entry points: the three context
//! tables, the callout table, the active context id and the plugin's
//! factories. The host runs one entry point at a time on a guest instance,
//! so the registry lives in a thread-local and needs no locking.
//!
//! Host-contract violations (unknown context, duplicate context, child
//! without a root, child without a factory, unknown callout) abort the
//! guest: continuing would desynchronize guest and host state.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use once_cell::unsync::OnceCell;

use crate::context::{DefaultRootContext, HttpContext, RootContext, StreamContext};
use crate::hostcall;
use crate::logger;
use crate::types::{Action, ContextType, PeerType};

pub type NewRootContext = Box<dyn Fn(u32) -> Box<dyn RootContext>>;
/// Called with `(context_id, root_context_id)`
pub type NewHttpContext = Box<dyn Fn(u32, u32) -> Box<dyn HttpContext>>;
/// Called with `(context_id, root_context_id)`
pub type NewStreamContext = Box<dyn Fn(u32, u32) -> Box<dyn StreamContext>>;

/// Table a context id lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    Root,
    Http,
    Stream,
}

thread_local! {
    static DISPATCHER: Dispatcher = Dispatcher::new();
}

struct Dispatcher {
    new_root: OnceCell<NewRootContext>,
    new_http: OnceCell<NewHttpContext>,
    new_stream: OnceCell<NewStreamContext>,
    roots: RefCell<HashMap<u32, Box<dyn RootContext>>>,
    http: RefCell<HashMap<u32, Box<dyn HttpContext>>>,
    streams: RefCell<HashMap<u32, Box<dyn StreamContext>>>,
    /// context id -> table holding it, readable while a table is borrowed
    kinds: RefCell<HashMap<u32, ContextKind>>,
    /// callout id -> originating context id
    callouts: RefCell<HashMap<u32, u32>>,
    active_id: Cell<u32>,
}

impl Dispatcher {
    fn new() -> Self {
        Self {
            new_root: OnceCell::new(),
            new_http: OnceCell::new(),
            new_stream: OnceCell::new(),
            roots: RefCell::new(HashMap::new()),
            http: RefCell::new(HashMap::new()),
            streams: RefCell::new(HashMap::new()),
            kinds: RefCell::new(HashMap::new()),
            callouts: RefCell::new(HashMap::new()),
            active_id: Cell::new(0),
        }
    }

    fn kind_of(&self, context_id: u32) -> Option<ContextKind> {
        self.kinds.borrow().get(&context_id).copied()
    }

    fn ensure_new(&self, context_id: u32) {
        if let Some(kind) = self.kind_of(context_id) {
            panic!(
                "context id {} already registered as {:?} context",
                context_id, kind
            );
        }
    }

    fn create_context(&self, context_id: u32, root_context_id: u32) {
        self.active_id.set(context_id);
        if root_context_id == 0 {
            self.create_root_context(context_id);
        } else {
            self.create_child_context(context_id, root_context_id);
        }
    }

    fn create_root_context(&self, context_id: u32) {
        self.ensure_new(context_id);
        logger::install_panic_hook();
        let root: Box<dyn RootContext> = match self.new_root.get() {
            Some(factory) => factory(context_id),
            None => Box::new(DefaultRootContext),
        };
        self.roots.borrow_mut().insert(context_id, root);
        self.kinds.borrow_mut().insert(context_id, ContextKind::Root);
        log::debug!("[sdk] root context {} created", context_id);
    }

    fn create_child_context(&self, context_id: u32, root_context_id: u32) {
        self.ensure_new(context_id);
        if !self.roots.borrow().contains_key(&root_context_id) {
            panic!(
                "context {} refers to unknown root context {}",
                context_id, root_context_id
            );
        }

        if let Some(factory) = self.new_http.get() {
            let ctx = factory(context_id, root_context_id);
            self.http.borrow_mut().insert(context_id, ctx);
            self.kinds.borrow_mut().insert(context_id, ContextKind::Http);
            return;
        }
        if let Some(factory) = self.new_stream.get() {
            let ctx = factory(context_id, root_context_id);
            self.streams.borrow_mut().insert(context_id, ctx);
            self.kinds.borrow_mut().insert(context_id, ContextKind::Stream);
            return;
        }

        // no registered factory: the root context creates its children
        let roots = self.roots.borrow();
        let root = &roots[&root_context_id];
        match root.get_type() {
            Some(ContextType::HttpContext) => match root.create_http_context(context_id) {
                Some(ctx) => {
                    self.http.borrow_mut().insert(context_id, ctx);
                    self.kinds.borrow_mut().insert(context_id, ContextKind::Http);
                }
                None => panic!(
                    "root context {} did not create http context {}",
                    root_context_id, context_id
                ),
            },
            Some(ContextType::StreamContext) => match root.create_stream_context(context_id) {
                Some(ctx) => {
                    self.streams.borrow_mut().insert(context_id, ctx);
                    self.kinds.borrow_mut().insert(context_id, ContextKind::Stream);
                }
                None => panic!(
                    "root context {} did not create stream context {}",
                    root_context_id, context_id
                ),
            },
            None => panic!(
                "no child context factory registered for context {}",
                context_id
            ),
        }
    }

    fn with_root<R>(&self, context_id: u32, f: impl FnOnce(&mut dyn RootContext) -> R) -> R {
        let mut roots = self.roots.borrow_mut();
        let Some(ctx) = roots.get_mut(&context_id) else {
            panic!("invalid root context id: {}", context_id);
        };
        self.active_id.set(context_id);
        f(ctx.as_mut())
    }

    fn with_http<R>(&self, context_id: u32, f: impl FnOnce(&mut dyn HttpContext) -> R) -> R {
        let mut http = self.http.borrow_mut();
        let Some(ctx) = http.get_mut(&context_id) else {
            panic!("invalid http context id: {}", context_id);
        };
        self.active_id.set(context_id);
        f(ctx.as_mut())
    }

    fn with_stream<R>(&self, context_id: u32, f: impl FnOnce(&mut dyn StreamContext) -> R) -> R {
        let mut streams = self.streams.borrow_mut();
        let Some(ctx) = streams.get_mut(&context_id) else {
            panic!("invalid stream context id: {}", context_id);
        };
        self.active_id.set(context_id);
        f(ctx.as_mut())
    }

    fn kind_or_abort(&self, context_id: u32) -> ContextKind {
        match self.kind_of(context_id) {
            Some(kind) => kind,
            None => panic!("invalid context id: {}", context_id),
        }
    }

    fn register_callout(&self, callout_id: u32) {
        let context_id = self.active_id.get();
        if let Some(previous) = self.callouts.borrow_mut().insert(callout_id, context_id) {
            log::warn!(
                "[sdk] callout {} reissued while pending for context {}",
                callout_id,
                previous
            );
        }
    }

    fn on_http_call_response(
        &self,
        callout_id: u32,
        num_headers: usize,
        body_size: usize,
        num_trailers: usize,
    ) {
        let removed = self.callouts.borrow_mut().remove(&callout_id);
        let Some(context_id) = removed else {
            panic!("invalid callout id: {}", callout_id);
        };

        let kind = self.kind_or_abort(context_id);
        self.active_id.set(context_id);
        // the host's idea of the current context follows the callout, not
        // the context that was running when the response arrived
        if let Err(status) = hostcall::set_effective_context(context_id) {
            log::warn!(
                "[sdk] set_effective_context({}) failed: {}",
                context_id,
                status
            );
        }

        match kind {
            ContextKind::Root => self.with_root(context_id, |ctx| {
                ctx.on_http_call_response(callout_id, num_headers, body_size, num_trailers)
            }),
            ContextKind::Http => self.with_http(context_id, |ctx| {
                ctx.on_http_call_response(callout_id, num_headers, body_size, num_trailers)
            }),
            ContextKind::Stream => self.with_stream(context_id, |ctx| {
                ctx.on_http_call_response(callout_id, num_headers, body_size, num_trailers)
            }),
        }
    }

    fn on_done(&self, context_id: u32) -> bool {
        match self.kind_or_abort(context_id) {
            ContextKind::Root => self.with_root(context_id, |ctx| ctx.on_done()),
            ContextKind::Http => self.with_http(context_id, |ctx| ctx.on_done()),
            ContextKind::Stream => self.with_stream(context_id, |ctx| ctx.on_done()),
        }
    }

    fn on_log(&self, context_id: u32) {
        match self.kind_or_abort(context_id) {
            ContextKind::Root => self.with_root(context_id, |ctx| ctx.on_log()),
            ContextKind::Http => self.with_http(context_id, |ctx| ctx.on_log()),
            ContextKind::Stream => self.with_stream(context_id, |ctx| ctx.on_log()),
        }
    }

    fn delete_context(&self, context_id: u32) {
        self.active_id.set(context_id);
        let removed = match self.kind_or_abort(context_id) {
            ContextKind::Root => self.roots.borrow_mut().remove(&context_id).is_some(),
            ContextKind::Http => self.http.borrow_mut().remove(&context_id).is_some(),
            ContextKind::Stream => self.streams.borrow_mut().remove(&context_id).is_some(),
        };
        debug_assert!(removed);
        self.kinds.borrow_mut().remove(&context_id);

        // the host drops pending callouts together with their context
        self.callouts.borrow_mut().retain(|callout_id, owner| {
            if *owner == context_id {
                log::debug!(
                    "[sdk] callout {} dropped with context {}",
                    callout_id,
                    context_id
                );
                false
            } else {
                true
            }
        });
        log::debug!("[sdk] context {} deleted", context_id);
    }
}

// ============================================================
// Plugin registration
// ============================================================

/// Register the root context factory.
///
/// Call once from plugin initialization; a second call aborts. Without a
/// factory every root context is a no-op default.
pub fn set_root_context<F>(factory: F)
where
    F: Fn(u32) -> Box<dyn RootContext> + 'static,
{
    DISPATCHER.with(|d| {
        if d.new_root.set(Box::new(factory)).is_err() {
            panic!("root context factory is already set");
        }
    })
}

/// Declare that this plugin produces HTTP contexts.
///
/// Mutually exclusive with [`set_stream_context`].
pub fn set_http_context<F>(factory: F)
where
    F: Fn(u32, u32) -> Box<dyn HttpContext> + 'static,
{
    DISPATCHER.with(|d| {
        if d.new_stream.get().is_some() {
            panic!("plugin already produces stream contexts");
        }
        if d.new_http.set(Box::new(factory)).is_err() {
            panic!("http context factory is already set");
        }
    })
}

/// Declare that this plugin produces L4 stream contexts.
///
/// Mutually exclusive with [`set_http_context`].
pub fn set_stream_context<F>(factory: F)
where
    F: Fn(u32, u32) -> Box<dyn StreamContext> + 'static,
{
    DISPATCHER.with(|d| {
        if d.new_http.get().is_some() {
            panic!("plugin already produces http contexts");
        }
        if d.new_stream.set(Box::new(factory)).is_err() {
            panic!("stream context factory is already set");
        }
    })
}

// ============================================================
// Introspection
// ============================================================

/// Context the current entry point is running for (0 before any dispatch)
pub fn active_context_id() -> u32 {
    DISPATCHER.with(|d| d.active_id.get())
}

pub fn context_kind(context_id: u32) -> Option<ContextKind> {
    DISPATCHER.with(|d| d.kind_of(context_id))
}

/// Callout ids still waiting for a response, ascending
pub fn pending_callouts() -> Vec<u32> {
    DISPATCHER.with(|d| {
        let mut ids: Vec<u32> = d.callouts.borrow().keys().copied().collect();
        ids.sort_unstable();
        ids
    })
}

/// Originating context of a pending callout
pub fn callout_owner(callout_id: u32) -> Option<u32> {
    DISPATCHER.with(|d| d.callouts.borrow().get(&callout_id).copied())
}

/// Bind a freshly dispatched callout to the active context
pub(crate) fn register_callout(callout_id: u32) {
    DISPATCHER.with(|d| d.register_callout(callout_id))
}

// ============================================================
// Entry-point targets
// ============================================================

pub(crate) fn on_context_create(context_id: u32, root_context_id: u32) {
    DISPATCHER.with(|d| d.create_context(context_id, root_context_id))
}

pub(crate) fn on_vm_start(context_id: u32, vm_configuration_size: usize) -> bool {
    DISPATCHER.with(|d| d.with_root(context_id, |ctx| ctx.on_vm_start(vm_configuration_size)))
}

pub(crate) fn on_configure(context_id: u32, plugin_configuration_size: usize) -> bool {
    DISPATCHER.with(|d| {
        d.with_root(context_id, |ctx| ctx.on_configure(plugin_configuration_size))
    })
}

pub(crate) fn on_tick(context_id: u32) {
    DISPATCHER.with(|d| d.with_root(context_id, |ctx| ctx.on_tick()))
}

pub(crate) fn on_queue_ready(context_id: u32, queue_id: u32) {
    DISPATCHER.with(|d| d.with_root(context_id, |ctx| ctx.on_queue_ready(queue_id)))
}

pub(crate) fn on_new_connection(context_id: u32) -> Action {
    DISPATCHER.with(|d| d.with_stream(context_id, |ctx| ctx.on_new_connection()))
}

pub(crate) fn on_downstream_data(context_id: u32, data_size: usize, end_of_stream: bool) -> Action {
    DISPATCHER.with(|d| {
        d.with_stream(context_id, |ctx| ctx.on_downstream_data(data_size, end_of_stream))
    })
}

pub(crate) fn on_downstream_close(context_id: u32, peer_type: PeerType) {
    DISPATCHER.with(|d| d.with_stream(context_id, |ctx| ctx.on_downstream_close(peer_type)))
}

pub(crate) fn on_upstream_data(context_id: u32, data_size: usize, end_of_stream: bool) -> Action {
    DISPATCHER.with(|d| {
        d.with_stream(context_id, |ctx| ctx.on_upstream_data(data_size, end_of_stream))
    })
}

pub(crate) fn on_upstream_close(context_id: u32, peer_type: PeerType) {
    DISPATCHER.with(|d| d.with_stream(context_id, |ctx| ctx.on_upstream_close(peer_type)))
}

pub(crate) fn on_http_request_headers(context_id: u32, num_headers: usize) -> Action {
    DISPATCHER.with(|d| d.with_http(context_id, |ctx| ctx.on_http_request_headers(num_headers)))
}

pub(crate) fn on_http_request_body(context_id: u32, body_size: usize, end_of_stream: bool) -> Action {
    DISPATCHER.with(|d| {
        d.with_http(context_id, |ctx| ctx.on_http_request_body(body_size, end_of_stream))
    })
}

pub(crate) fn on_http_request_trailers(context_id: u32, num_trailers: usize) -> Action {
    DISPATCHER.with(|d| d.with_http(context_id, |ctx| ctx.on_http_request_trailers(num_trailers)))
}

pub(crate) fn on_http_response_headers(context_id: u32, num_headers: usize) -> Action {
    DISPATCHER.with(|d| d.with_http(context_id, |ctx| ctx.on_http_response_headers(num_headers)))
}

pub(crate) fn on_http_response_body(context_id: u32, body_size: usize, end_of_stream: bool) -> Action {
    DISPATCHER.with(|d| {
        d.with_http(context_id, |ctx| ctx.on_http_response_body(body_size, end_of_stream))
    })
}

pub(crate) fn on_http_response_trailers(context_id: u32, num_trailers: usize) -> Action {
    DISPATCHER.with(|d| {
        d.with_http(context_id, |ctx| ctx.on_http_response_trailers(num_trailers))
    })
}

pub(crate) fn on_http_call_response(
    callout_id: u32,
    num_headers: usize,
    body_size: usize,
    num_trailers: usize,
) {
    DISPATCHER.with(|d| d.on_http_call_response(callout_id, num_headers, body_size, num_trailers))
}

pub(crate) fn on_done(context_id: u32) -> bool {
    DISPATCHER.with(|d| d.on_done(context_id))
}

pub(crate) fn on_log(context_id: u32) {
    DISPATCHER.with(|d| d.on_log(context_id))
}

pub(crate) fn on_delete(context_id: u32) {
    DISPATCHER.with(|d| d.delete_context(context_id))
}
