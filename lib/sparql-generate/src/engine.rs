use crate::error::SparqlGenerateError;
use sparql_generate_common::{
    DocumentResolverRef, GraphPatternEngineRef, InMemoryResolver, IteratorFunctionRegistryRef,
    OutputSinkRef, ScalarFunctionRegistryRef,
};
use sparql_generate_execution::{
    execute_plan, ContextCloser, ExecutionContext, ExecutionServices, GenerateOptions,
    GenerationError, QueryRegistry,
};
use sparql_generate_functions::DefaultFunctionRegistry;
use sparql_generate_logical::plan::RootPlan;
use sparql_generate_logical::{GenerateQuery, PlanBuilder, QueryParserRef};
use sparql_generate_model::{NamedNode, SolutionSequence, Variable};
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// The entry point for executing SPARQL-Generate queries.
///
/// The engine holds the external collaborators of all runs and the named queries registered on
/// it. Cloning the engine is cheap and clones share the registered queries.
///
/// By default, documents are resolved from an empty [`InMemoryResolver`], the built-in functions
/// of [`DefaultFunctionRegistry`] are available, and neither a graph-pattern engine nor a query
/// parser is configured.
#[derive(Clone, Debug)]
pub struct SparqlGenerate {
    services: ExecutionServices,
    options: GenerateOptions,
    queries: QueryRegistry,
}

impl Default for SparqlGenerate {
    fn default() -> Self {
        Self::new()
    }
}

impl SparqlGenerate {
    pub fn new() -> Self {
        let functions = Arc::new(DefaultFunctionRegistry::default());
        Self {
            services: ExecutionServices {
                resolver: Arc::new(InMemoryResolver::new()),
                iterators: Arc::<DefaultFunctionRegistry>::clone(&functions),
                scalars: functions,
                engine: None,
                parser: None,
            },
            options: GenerateOptions::default(),
            queries: QueryRegistry::new(),
        }
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: DocumentResolverRef) -> Self {
        self.services.resolver = resolver;
        self
    }

    #[must_use]
    pub fn with_iterator_functions(mut self, iterators: IteratorFunctionRegistryRef) -> Self {
        self.services.iterators = iterators;
        self
    }

    #[must_use]
    pub fn with_scalar_functions(mut self, scalars: ScalarFunctionRegistryRef) -> Self {
        self.services.scalars = scalars;
        self
    }

    /// Uses `functions` for both iterator and scalar functions.
    #[must_use]
    pub fn with_functions(self, functions: DefaultFunctionRegistry) -> Self {
        let functions = Arc::new(functions);
        let iterators: IteratorFunctionRegistryRef =
            Arc::<DefaultFunctionRegistry>::clone(&functions);
        self.with_iterator_functions(iterators)
            .with_scalar_functions(functions)
    }

    /// Sets the engine that evaluates the select part of queries.
    #[must_use]
    pub fn with_engine(mut self, engine: GraphPatternEngineRef) -> Self {
        self.services.engine = Some(engine);
        self
    }

    /// Sets the parser used for [`Self::parse`] and for loading named queries.
    #[must_use]
    pub fn with_parser(mut self, parser: QueryParserRef) -> Self {
        self.services.parser = Some(parser);
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    /// Returns the names of the queries registered on this engine.
    pub fn registered_queries(&self) -> Vec<NamedNode> {
        self.queries.names()
    }

    /// Compiles `query`.
    pub fn prepare(&self, query: GenerateQuery) -> Result<PreparedQuery, SparqlGenerateError> {
        let plan = PlanBuilder::new().build(query)?;
        Ok(PreparedQuery { plan })
    }

    /// Parses and compiles `text` with the configured parser.
    pub fn parse(
        &self,
        text: &str,
        base_iri: Option<&str>,
    ) -> Result<PreparedQuery, SparqlGenerateError> {
        let parser = self
            .services
            .parser
            .as_ref()
            .ok_or(SparqlGenerateError::NoQueryParser)?;
        self.prepare(parser.parse(text, base_iri)?)
    }

    /// Compiles `query` and registers it under its name, so that other queries can call it
    /// without loading it. A name that is already registered keeps its query.
    pub fn register_query(
        &self,
        query: GenerateQuery,
    ) -> Result<PreparedQuery, SparqlGenerateError> {
        let name = query
            .name
            .clone()
            .ok_or(SparqlGenerateError::UnnamedQuery)?;
        let prepared = self.prepare(query)?;
        let plan = self.queries.register(name, prepared.plan);
        Ok(PreparedQuery { plan })
    }

    /// Executes `query` with a single empty solution and writes the output into `sink`.
    pub async fn execute(
        &self,
        query: &PreparedQuery,
        sink: OutputSinkRef,
    ) -> Result<(), SparqlGenerateError> {
        self.execute_with(query, SolutionSequence::unit(), sink)
            .await
    }

    /// Executes `query` with the `initial` solutions and writes the output into `sink`.
    ///
    /// If the query declares a signature, the initial solutions may only bind its variables.
    pub async fn execute_with(
        &self,
        query: &PreparedQuery,
        initial: SolutionSequence,
        sink: OutputSinkRef,
    ) -> Result<(), SparqlGenerateError> {
        validate_initial_values(&query.plan, &initial)?;
        let ctx = self.context(sink);
        execute_plan(Arc::clone(&query.plan), ctx, initial).await?;
        Ok(())
    }

    /// Starts the execution of `query` on the current tokio runtime.
    ///
    /// The returned handle allows cancelling the run. A cancelled run keeps the output produced
    /// so far and completes without an error.
    pub fn spawn(
        &self,
        query: &PreparedQuery,
        initial: SolutionSequence,
        sink: OutputSinkRef,
    ) -> Result<RunningGeneration, SparqlGenerateError> {
        validate_initial_values(&query.plan, &initial)?;
        let ctx = self.context(sink);
        let closer = ctx.closer();
        let handle = tokio::spawn(execute_plan(Arc::clone(&query.plan), ctx, initial));
        Ok(RunningGeneration { closer, handle })
    }

    fn context(&self, sink: OutputSinkRef) -> ExecutionContext {
        ExecutionContext::new(
            self.services.clone(),
            self.options.clone(),
            self.queries.clone(),
            sink,
        )
    }
}

fn validate_initial_values(
    plan: &RootPlan,
    initial: &SolutionSequence,
) -> Result<(), SparqlGenerateError> {
    let Some(signature) = &plan.signature else {
        return Ok(());
    };
    let unknown = initial
        .variables()
        .iter()
        .filter(|variable| !signature.contains(variable))
        .map(Variable::to_string)
        .collect::<Vec<_>>();
    if unknown.is_empty() {
        Ok(())
    } else {
        Err(SparqlGenerateError::InvalidInitialValues(format!(
            "{} not part of the signature",
            unknown.join(", ")
        )))
    }
}

/// A compiled query.
#[derive(Clone, Debug)]
pub struct PreparedQuery {
    plan: Arc<RootPlan>,
}

impl PreparedQuery {
    pub fn name(&self) -> Option<&NamedNode> {
        self.plan.name.as_ref()
    }

    pub fn signature(&self) -> Option<&[Variable]> {
        self.plan.signature.as_deref()
    }

    pub fn plan(&self) -> &Arc<RootPlan> {
        &self.plan
    }
}

impl Display for PreparedQuery {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.plan.fmt(f)
    }
}

/// A run started with [`SparqlGenerate::spawn`].
#[derive(Debug)]
pub struct RunningGeneration {
    closer: ContextCloser,
    handle: JoinHandle<Result<(), GenerationError>>,
}

impl RunningGeneration {
    /// Stops the run. Live iterators and sources are aborted and the sink is finished.
    pub fn cancel(&self) {
        self.closer.close();
    }

    pub fn is_cancelled(&self) -> bool {
        self.closer.is_closed()
    }

    /// Waits until the run completes.
    pub async fn wait(self) -> Result<(), SparqlGenerateError> {
        self.handle
            .await
            .map_err(|error| SparqlGenerateError::Task(error.to_string()))??;
        Ok(())
    }
}
