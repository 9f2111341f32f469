use crate::named::{CallKey, QueryRegistry};
use crate::options::GenerateOptions;
use crate::scope::{allocate_list, BNodeScope};
use dashmap::{DashMap, DashSet};
use futures::future::AbortHandle;
use sparql_generate_common::{
    DocumentResolverRef, GraphPatternEngineRef, IteratorFunctionRegistryRef, OutputSinkRef,
    ScalarFunctionRegistryRef,
};
use sparql_generate_logical::QueryParserRef;
use sparql_generate_model::{Iri, Term};
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{AcquireError, Semaphore, SemaphorePermit};
use tracing::trace;

/// The external collaborators of a generation run.
#[derive(Clone, Debug)]
pub struct ExecutionServices {
    pub resolver: DocumentResolverRef,
    pub iterators: IteratorFunctionRegistryRef,
    pub scalars: ScalarFunctionRegistryRef,
    /// Evaluates the select part of queries. Only required by queries that have one.
    pub engine: Option<GraphPatternEngineRef>,
    /// Parses named queries that are loaded through the resolver.
    pub parser: Option<QueryParserRef>,
}

type CloseTask = Box<dyn FnOnce() + Send>;

/// State shared by all forks of a context.
struct SharedState {
    services: ExecutionServices,
    options: GenerateOptions,
    registry: QueryRegistry,
    calls: DashSet<CallKey>,
    permits: Semaphore,
    close_tasks: Mutex<Vec<CloseTask>>,
    /// Live fetches and iterations. Entries are removed by their [AbortGuard].
    abort_handles: DashMap<u64, AbortHandle>,
    next_abort_id: AtomicU64,
    closed: AtomicBool,
}

/// The state of one generation run.
///
/// A context is created when a top-level run starts. It is forked for sub-computations: a fork
/// has its own blank node scope and fork size but shares the named query registry, the call
/// memoization set, and the concurrency limit with its origin. Closing any fork closes the whole
/// run.
#[derive(Clone)]
pub struct ExecutionContext {
    shared: Arc<SharedState>,
    sink: OutputSinkRef,
    scope: Arc<BNodeScope>,
    base_iri: Option<Arc<Iri<String>>>,
    fork_size: usize,
    lists: Arc<DashMap<usize, Arc<[Term]>>>,
}

impl ExecutionContext {
    /// Creates the context of a new top-level run that writes into `sink`.
    pub fn new(
        services: ExecutionServices,
        options: GenerateOptions,
        registry: QueryRegistry,
        sink: OutputSinkRef,
    ) -> Self {
        let permits = Semaphore::new(options.max_concurrency.max(1));
        Self {
            shared: Arc::new(SharedState {
                services,
                options,
                registry,
                calls: DashSet::new(),
                permits,
                close_tasks: Mutex::new(Vec::new()),
                abort_handles: DashMap::new(),
                next_abort_id: AtomicU64::new(0),
                closed: AtomicBool::new(false),
            }),
            sink,
            scope: Arc::new(BNodeScope::new()),
            base_iri: None,
            fork_size: 1,
            lists: Arc::new(DashMap::new()),
        }
    }

    pub fn services(&self) -> &ExecutionServices {
        &self.shared.services
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.shared.options
    }

    pub fn registry(&self) -> &QueryRegistry {
        &self.shared.registry
    }

    pub fn sink(&self) -> &OutputSinkRef {
        &self.sink
    }

    pub fn scope(&self) -> &Arc<BNodeScope> {
        &self.scope
    }

    /// The base IRI of the query that is currently executed.
    pub fn base_iri(&self) -> Option<&Iri<String>> {
        self.base_iri.as_deref()
    }

    /// The number of solutions of the enclosing fork.
    pub fn fork_size(&self) -> usize {
        self.fork_size
    }

    /// Forks the context for `size` solutions. The fork gets a child scope and its own list
    /// nodes.
    #[must_use]
    pub fn fork(&self, size: usize) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            sink: Arc::clone(&self.sink),
            scope: self.scope.child(),
            base_iri: self.base_iri.clone(),
            fork_size: size,
            lists: Arc::new(DashMap::new()),
        }
    }

    /// Returns a context that mints blank nodes in `scope`.
    #[must_use]
    pub fn with_scope(&self, scope: Arc<BNodeScope>) -> Self {
        Self {
            scope,
            ..self.clone()
        }
    }

    /// Returns a context with a new root scope.
    #[must_use]
    pub fn with_fresh_scope(&self) -> Self {
        self.with_scope(Arc::new(BNodeScope::new()))
    }

    /// Returns a context that writes into `sink`.
    #[must_use]
    pub fn with_sink(&self, sink: OutputSinkRef) -> Self {
        Self {
            sink,
            ..self.clone()
        }
    }

    /// Returns a context that resolves relative IRIs against `base_iri`.
    #[must_use]
    pub fn with_base_iri(&self, base_iri: Iri<String>) -> Self {
        Self {
            base_iri: Some(Arc::new(base_iri)),
            ..self.clone()
        }
    }

    /// Returns the nodes of the list construct `list_id` within this fork.
    pub fn list_nodes(&self, list_id: usize) -> Arc<[Term]> {
        let nodes = self
            .lists
            .entry(list_id)
            .or_insert_with(|| allocate_list(self.fork_size));
        Arc::clone(nodes.value())
    }

    /// Records a call of a named query. Returns `false` if an equal call has already been
    /// recorded during this run.
    pub fn record_call(&self, key: CallKey) -> bool {
        self.shared.calls.insert(key)
    }

    /// Waits for one of the concurrency permits. Fails once the context is closed.
    pub async fn acquire_permit(&self) -> Result<SemaphorePermit<'_>, AcquireError> {
        self.shared.permits.acquire().await
    }

    /// Aborts the task behind `handle` when the context is closed, or immediately if it is
    /// already closed.
    ///
    /// The handle stays registered until the returned guard is dropped, which should happen once
    /// the task has finished.
    #[must_use]
    pub fn register_abort_handle(&self, handle: AbortHandle) -> AbortGuard {
        let id = self.shared.next_abort_id.fetch_add(1, Ordering::Relaxed);
        self.shared.abort_handles.insert(id, handle.clone());
        if self.is_closed() {
            handle.abort();
        }
        AbortGuard {
            shared: Arc::clone(&self.shared),
            id,
        }
    }

    #[cfg(test)]
    pub(crate) fn abort_handle_count(&self) -> usize {
        self.shared.abort_handles.len()
    }

    /// Runs `task` when the context is closed, or immediately if it is already closed.
    pub fn on_close(&self, task: impl FnOnce() + Send + 'static) {
        let mut tasks = self
            .shared
            .close_tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if self.is_closed() {
            drop(tasks);
            task();
        } else {
            tasks.push(Box::new(task));
        }
    }

    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    /// Closes the run. Live iterators and sources are stopped and waiting tasks are rejected.
    ///
    /// Closing an already closed context has no effect.
    pub fn close(&self) {
        self.shared.close();
    }

    /// Returns a handle that can close this context from another task.
    pub fn closer(&self) -> ContextCloser {
        ContextCloser {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl SharedState {
    fn close(&self) {
        let tasks = {
            let mut tasks = self.close_tasks.lock().unwrap_or_else(PoisonError::into_inner);
            if self.closed.swap(true, Ordering::SeqCst) {
                return;
            }
            std::mem::take(&mut *tasks)
        };
        trace!("Closing execution context with {} close tasks", tasks.len());
        self.permits.close();
        for task in tasks {
            task();
        }
        for handle in &self.abort_handles {
            handle.value().abort();
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Debug for ExecutionContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("services", &self.shared.services)
            .field("options", &self.shared.options)
            .field("fork_size", &self.fork_size)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

/// Closes an [ExecutionContext] from outside the run.
#[derive(Clone)]
pub struct ContextCloser {
    shared: Arc<SharedState>,
}

impl ContextCloser {
    pub fn close(&self) {
        self.shared.close();
    }

    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }
}

/// Keeps an abort handle registered with an [ExecutionContext] while its task runs.
pub struct AbortGuard {
    shared: Arc<SharedState>,
    id: u64,
}

impl Drop for AbortGuard {
    fn drop(&mut self) {
        self.shared.abort_handles.remove(&self.id);
    }
}

impl Debug for AbortGuard {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AbortGuard").field("id", &self.id).finish()
    }
}

impl Debug for ContextCloser {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextCloser")
            .field("closed", &self.is_closed())
            .finish()
    }
}
