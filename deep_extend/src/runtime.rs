//! Call-scoped merge context.
//!
//! A [`Run`] is created per top-level merge call and threaded by reference
//! through every recursive invocation, carrying what the layered
//! configuration cannot: the recursion level, a `global` bag shared across
//! the whole call, a `local` bag cloned at each recursion boundary, and the
//! dispatch frames that make "call the next layer up" work. It is discarded
//! when the top-level call returns.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::config::{ExtendConfig, Method, Pair};
use crate::config::Layer;
use crate::error::{ExtendError, ExtendResult};
use crate::value::Value;

/// Mutable key/value scratch space exposed to handlers.
pub type Bag = BTreeMap<String, Value>;

/// Which engine services recursive merges started from handlers.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EngineKind {
    /// Synchronous engine: recursion completes before returning.
    Sync,
    /// Deferred engine: recursion is returned as a [`Value::Deferred`].
    Deferred,
}

struct SharedState {
    global: Mutex<Bag>,
}

#[derive(Clone)]
struct Frame {
    method: Method,
    head: Arc<Layer>,
    owner: Arc<Layer>,
}

pub(crate) struct Saved {
    config: ExtendConfig,
    local: Bag,
}

/// The explicit per-call context handed to every handler and accessor.
pub struct Run {
    engine: EngineKind,
    level: i64,
    shared: Arc<SharedState>,
    local: Bag,
    config: ExtendConfig,
    frames: Vec<Frame>,
}

impl Run {
    pub(crate) fn new(engine: EngineKind, config: ExtendConfig) -> Self {
        Self {
            engine,
            level: -1,
            shared: Arc::new(SharedState {
                global: Mutex::new(Bag::new()),
            }),
            local: Bag::new(),
            config,
            frames: Vec::new(),
        }
    }

    /// Which engine this run belongs to.
    #[must_use]
    pub fn engine(&self) -> EngineKind {
        self.engine
    }

    /// Current recursion level, adjusted by the active configuration's
    /// level offset. The top-level merge runs at level `0`.
    #[must_use]
    pub fn level(&self) -> i64 {
        self.level + self.active_config().level_offset()
    }

    /// Shared scratch space for the whole top-level call.
    ///
    /// Handlers may read and write it to keep counters or caches scoped to
    /// a single invocation.
    #[must_use]
    pub fn global(&self) -> MutexGuard<'_, Bag> {
        self.shared.global.lock()
    }

    /// Scratch space cloned at each recursion boundary: children see the
    /// parent's entries, child mutations do not leak back up.
    pub fn local(&mut self) -> &mut Bag {
        &mut self.local
    }

    /// Whether the active configuration merges nested containers deeply.
    #[must_use]
    pub fn deep(&self) -> bool {
        self.active_config().deep()
    }

    /// The configuration governing the current dispatch.
    #[must_use]
    pub fn active_config(&self) -> ExtendConfig {
        self.frames.last().map_or_else(
            || self.config.clone(),
            |frame| ExtendConfig {
                head: frame.head.clone(),
            },
        )
    }

    /// Dispatches the first resolvable method from `methods` against the
    /// active configuration.
    ///
    /// This is the building block handler overrides use to re-enter the
    /// standard dispatch (for example to fall through to the `Default`
    /// policy).
    ///
    /// # Errors
    ///
    /// Fails with [`ExtendError::MissingMethod`] when no listed method is
    /// defined anywhere in the lineage, and propagates handler failures.
    pub fn dispatch(
        &mut self,
        methods: &[Method],
        pair: Pair<'_>,
    ) -> ExtendResult<Option<Value>> {
        let head = self
            .frames
            .last()
            .map_or_else(|| self.config.head.clone(), |frame| frame.head.clone());
        for method in methods {
            if let Some((owner, handler)) = Layer::find_handler(&head, *method) {
                return self.run_frame(*method, head, owner, &handler, pair);
            }
        }
        Err(ExtendError::missing_method(join_methods(methods)))
    }

    /// Invokes the implementation that the currently executing handler
    /// overrides (the next one up the lineage) with `pair` as arguments.
    ///
    /// # Errors
    ///
    /// Fails with [`ExtendError::MissingMethod`] when called outside a
    /// dispatch or when no ancestor defines the method (or a `Default`
    /// fallback), and propagates handler failures.
    pub fn call_next(&mut self, pair: Pair<'_>) -> ExtendResult<Option<Value>> {
        let Some(frame) = self.frames.last().cloned() else {
            return Err(ExtendError::missing_method("call_next outside dispatch"));
        };
        let Some(start) = frame.owner.parent.clone() else {
            return Err(ExtendError::missing_method(frame.method.to_string()));
        };
        for method in [frame.method, Method::Default] {
            if let Some((owner, handler)) = Layer::find_handler(&start, method) {
                return self.run_frame(method, frame.head.clone(), owner, &handler, pair);
            }
        }
        Err(ExtendError::missing_method(frame.method.to_string()))
    }

    fn run_frame(
        &mut self,
        method: Method,
        head: Arc<Layer>,
        owner: Arc<Layer>,
        handler: &crate::config::HandlerFn,
        pair: Pair<'_>,
    ) -> ExtendResult<Option<Value>> {
        self.frames.push(Frame {
            method,
            head,
            owner,
        });
        let result = handler(self, pair);
        self.frames.pop();
        result
    }

    /// Merges `sources` into `target` through the active configuration,
    /// recursing one level deeper.
    ///
    /// In the synchronous engine the recursion completes before returning.
    /// In the deferred engine this returns a [`Value::Deferred`] wrapping
    /// the nested asynchronous merge, so deferred leaves nested arbitrarily
    /// deep are still awaited correctly.
    ///
    /// # Errors
    ///
    /// Propagates nested merge failures, including the recursion ceiling.
    pub fn extend_values(
        &mut self,
        target: Value,
        sources: Vec<Value>,
    ) -> ExtendResult<Value> {
        let config = self.active_config();
        match self.engine {
            EngineKind::Sync => crate::engine::extend_in_run(self, &config, target, sources),
            EngineKind::Deferred => {
                let mut child = self.spawn(config.clone());
                Ok(Value::deferred(async move {
                    crate::engine::deferred::extend_in_run(&mut child, &config, target, sources)
                        .await
                }))
            }
        }
    }

    /// Detached child context for a deferred recursion: shares the global
    /// bag, clones the local bag, and keeps the current level.
    fn spawn(&self, config: ExtendConfig) -> Self {
        Self {
            engine: self.engine,
            level: self.level,
            shared: self.shared.clone(),
            local: self.local.clone(),
            config,
            frames: Vec::new(),
        }
    }

    /// Brackets a merge invocation: bumps the level (checking the
    /// configured ceiling), swaps in the invocation's configuration, and
    /// gives the child a clone of the local bag.
    pub(crate) fn enter(&mut self, config: &ExtendConfig) -> ExtendResult<Saved> {
        let limit = config.max_recursions();
        if self.level + 1 >= i64::try_from(limit).unwrap_or(i64::MAX) {
            return Err(Arc::new(ExtendError::RecursionLimit { limit }));
        }
        self.level += 1;
        let child_local = self.local.clone();
        Ok(Saved {
            config: std::mem::replace(&mut self.config, config.clone()),
            local: std::mem::replace(&mut self.local, child_local),
        })
    }

    /// Symmetric exit for [`Run::enter`].
    pub(crate) fn exit(&mut self, saved: Saved) {
        self.level -= 1;
        self.config = saved.config;
        self.local = saved.local;
    }

    /// Runs `f` with `config` as the active configuration when no dispatch
    /// frame is on the stack (accessors and enumeration are invoked outside
    /// handler dispatch but still need flag resolution against the
    /// property-specialised configuration).
    pub(crate) fn with_active_config<T>(
        &mut self,
        config: &ExtendConfig,
        f: impl FnOnce(&mut Self) -> T,
    ) -> T {
        let prev = std::mem::replace(&mut self.config, config.clone());
        let result = f(self);
        self.config = prev;
        result
    }
}

fn join_methods(methods: &[Method]) -> String {
    methods
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("' or '")
}
