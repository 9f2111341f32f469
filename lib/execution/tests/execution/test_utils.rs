use async_trait::async_trait;
use futures::{stream, StreamExt};
use sparql_generate_common::error::{EngineError, FunctionError};
use sparql_generate_common::{
    CollectedOutput, CollectingSink, CompiledSelect, Document, DocumentResolver,
    GraphPatternEngine, GraphPatternEngineRef, InMemoryResolver, IteratorFunction, OutputSinkRef,
    TupleBatch, TupleStream,
};
use sparql_generate_execution::{
    execute_plan, ExecutionContext, ExecutionServices, GenerateOptions, GenerationError,
    QueryRegistry,
};
use sparql_generate_functions::DefaultFunctionRegistry;
use sparql_generate_logical::{
    GenerateQuery, GenerateTriple, PlanBuilder, QueryParseError, QueryParser, QueryParserRef,
};
use sparql_generate_model::{Literal, NamedNode, SolutionSequence, Term, Variable};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

pub fn var(name: &str) -> Variable {
    Variable::new_unchecked(name)
}

pub fn iri(value: &str) -> NamedNode {
    NamedNode::new_unchecked(value)
}

pub fn string(value: &str) -> Term {
    Literal::new_simple_literal(value).into()
}

pub fn int(value: i64) -> Term {
    Literal::from(value).into()
}

/// `subject predicate ?object`
pub fn triple(subject: &str, predicate: &str, object: &str) -> GenerateTriple {
    GenerateTriple::new(iri(subject), iri(predicate), var(object))
}

/// Emits fixed batches of single-variable rows. Optionally stays pending afterward.
#[derive(Debug)]
pub struct RowsIterator {
    name: String,
    batches: Vec<TupleBatch>,
    stays_pending: bool,
}

impl RowsIterator {
    pub fn new(name: &str, batches: Vec<Vec<Term>>) -> Self {
        Self {
            name: name.to_owned(),
            batches: batches
                .into_iter()
                .map(|batch| batch.into_iter().map(|value| vec![Some(value)]).collect())
                .collect(),
            stays_pending: false,
        }
    }

    pub fn pending(mut self) -> Self {
        self.stays_pending = true;
        self
    }
}

impl IteratorFunction for RowsIterator {
    fn name(&self) -> &str {
        &self.name
    }

    fn invoke(&self, _arguments: Vec<Term>) -> Result<TupleStream, FunctionError> {
        let batches = stream::iter(self.batches.clone().into_iter().map(Ok));
        if self.stays_pending {
            Ok(batches.chain(stream::pending()).boxed())
        } else {
            Ok(batches.boxed())
        }
    }
}

/// Emits `row` for the argument `fast` and then stays pending. Stays pending without results for
/// every other argument.
#[derive(Debug)]
pub struct FeedIterator {
    name: String,
}

impl FeedIterator {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
        }
    }
}

impl IteratorFunction for FeedIterator {
    fn name(&self) -> &str {
        &self.name
    }

    fn invoke(&self, arguments: Vec<Term>) -> Result<TupleStream, FunctionError> {
        let fast = matches!(
            arguments.first(),
            Some(Term::Literal(literal)) if literal.value() == "fast"
        );
        if fast {
            let rows = vec![vec![Some(string("row"))]];
            Ok(stream::iter([Ok(rows)]).chain(stream::pending()).boxed())
        } else {
            Ok(stream::pending().boxed())
        }
    }
}

/// An engine that joins nothing: it returns the inline solutions and counts its calls.
#[derive(Debug, Default)]
pub struct CountingEngine {
    calls: AtomicUsize,
    inline_sizes: Mutex<Vec<usize>>,
}

impl CountingEngine {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn inline_sizes(&self) -> Vec<usize> {
        self.inline_sizes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl GraphPatternEngine for CountingEngine {
    fn execute(
        &self,
        select: &CompiledSelect,
        inline: &SolutionSequence,
    ) -> Result<SolutionSequence, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inline_sizes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(inline.len());
        let variables = select.projected_variables(inline.variables());
        let solutions = inline
            .iter()
            .map(|solution| solution.project(&variables))
            .collect();
        Ok(SolutionSequence::new(variables, solutions))
    }
}

/// A parser that returns prepared queries by the text of the document.
#[derive(Debug, Default)]
pub struct StaticParser {
    queries: HashMap<String, GenerateQuery>,
}

impl StaticParser {
    pub fn with_query(mut self, text: &str, query: GenerateQuery) -> Self {
        self.queries.insert(text.to_owned(), query);
        self
    }
}

impl QueryParser for StaticParser {
    fn parse(&self, text: &str, _base_iri: Option<&str>) -> Result<GenerateQuery, QueryParseError> {
        self.queries
            .get(text)
            .cloned()
            .ok_or_else(|| QueryParseError::new(format!("Unknown query text {text}")))
    }
}

/// Counts the documents that are opened.
#[derive(Debug)]
pub struct CountingResolver {
    inner: InMemoryResolver,
    opened: AtomicUsize,
}

impl CountingResolver {
    pub fn new(inner: InMemoryResolver) -> Self {
        Self {
            inner,
            opened: AtomicUsize::new(0),
        }
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentResolver for CountingResolver {
    async fn open(&self, uri: &str, accept: Option<&str>) -> Option<Document> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        self.inner.open(uri, accept).await
    }
}

/// Builder for the services and options of a test run.
#[derive(Debug)]
pub struct TestRun {
    pub services: ExecutionServices,
    pub options: GenerateOptions,
    functions: DefaultFunctionRegistry,
}

impl TestRun {
    pub fn new() -> Self {
        let functions = DefaultFunctionRegistry::default();
        Self {
            services: ExecutionServices {
                resolver: Arc::new(InMemoryResolver::new()),
                iterators: Arc::new(functions.clone()),
                scalars: Arc::new(functions.clone()),
                engine: None,
                parser: None,
            },
            options: GenerateOptions::default(),
            functions,
        }
    }

    pub fn with_iterator(mut self, iterator: impl IteratorFunction + 'static) -> Self {
        self.functions.register_iterator(Arc::new(iterator));
        self.services.iterators = Arc::new(self.functions.clone());
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn DocumentResolver>) -> Self {
        self.services.resolver = resolver;
        self
    }

    pub fn with_engine(mut self, engine: Arc<CountingEngine>) -> Self {
        let engine: GraphPatternEngineRef = engine;
        self.services.engine = Some(engine);
        self
    }

    pub fn with_parser(mut self, parser: StaticParser) -> Self {
        let parser: QueryParserRef = Arc::new(parser);
        self.services.parser = Some(parser);
        self
    }

    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }

    /// Runs `query` with a single empty solution.
    pub async fn run(self, query: GenerateQuery) -> Result<CollectedOutput, GenerationError> {
        self.run_with(query, SolutionSequence::unit()).await
    }

    /// Runs `query` with `input` and returns everything written to the sink.
    pub async fn run_with(
        self,
        query: GenerateQuery,
        input: SolutionSequence,
    ) -> Result<CollectedOutput, GenerationError> {
        let plan = PlanBuilder::new().build(query)?;
        let sink = Arc::new(CollectingSink::new());
        let output: OutputSinkRef = Arc::<CollectingSink>::clone(&sink);
        let ctx = ExecutionContext::new(self.services, self.options, QueryRegistry::new(), output);
        execute_plan(plan, ctx, input).await?;
        Ok(sink.output())
    }
}
