use sparql_generate_model::{Graph, Solution, Triple, Variable};
use std::fmt::Debug;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Receives the output of a generate query.
///
/// A top-level run calls [OutputSink::start] first, then announces prefixes and the base IRI, then
/// emits the body (triples, text, or solutions), and finally calls [OutputSink::finish]. Nested
/// runs write to the same sink without calling `start` and `finish` again.
///
/// Sinks are shared by concurrent branches of a run and therefore take `&self`.
pub trait OutputSink: Debug + Send + Sync {
    fn start(&self);

    fn prefix(&self, name: &str, iri: &str);

    fn base(&self, iri: &str);

    fn triple(&self, triple: Triple);

    /// Emits a fragment of text generated by a template query.
    fn text(&self, text: &str);

    /// Emits one solution of a select query.
    fn solution(&self, variables: &[Variable], solution: &Solution);

    fn finish(&self);
}

pub type OutputSinkRef = Arc<dyn OutputSink>;

/// Everything written to a [CollectingSink].
#[derive(Clone, Debug, Default)]
pub struct CollectedOutput {
    pub started: usize,
    pub finished: usize,
    pub prefixes: Vec<(String, String)>,
    pub base: Option<String>,
    pub triples: Vec<Triple>,
    pub text: String,
    pub solutions: Vec<Solution>,
}

impl CollectedOutput {
    /// Returns the generated triples as a graph.
    pub fn graph(&self) -> Graph {
        self.triples.iter().collect()
    }
}

/// An [OutputSink] that keeps everything in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    output: Mutex<CollectedOutput>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of everything written so far.
    pub fn output(&self) -> CollectedOutput {
        self.lock().clone()
    }

    /// Returns the triples written so far.
    pub fn triples(&self) -> Vec<Triple> {
        self.lock().triples.clone()
    }

    /// Returns the text written so far.
    pub fn text(&self) -> String {
        self.lock().text.clone()
    }

    fn lock(&self) -> MutexGuard<'_, CollectedOutput> {
        self.output.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl OutputSink for CollectingSink {
    fn start(&self) {
        self.lock().started += 1;
    }

    fn prefix(&self, name: &str, iri: &str) {
        self.lock().prefixes.push((name.to_owned(), iri.to_owned()));
    }

    fn base(&self, iri: &str) {
        self.lock().base = Some(iri.to_owned());
    }

    fn triple(&self, triple: Triple) {
        self.lock().triples.push(triple);
    }

    fn text(&self, text: &str) {
        self.lock().text.push_str(text);
    }

    fn solution(&self, _variables: &[Variable], solution: &Solution) {
        self.lock().solutions.push(solution.clone());
    }

    fn finish(&self) {
        self.lock().finished += 1;
    }
}

/// An [OutputSink] that streams triples as N-Triples, text as is, and solutions as tab-separated
/// values into a writer.
///
/// Prefixes and the base IRI are not needed by N-Triples and are ignored. The first I/O error
/// stops the output and is returned by [WriterSink::into_inner].
#[derive(Debug)]
pub struct WriterSink<W: Write + Debug + Send> {
    state: Mutex<WriterState<W>>,
}

#[derive(Debug)]
struct WriterState<W> {
    writer: W,
    error: Option<io::Error>,
}

impl<W: Write + Debug + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            state: Mutex::new(WriterState {
                writer,
                error: None,
            }),
        }
    }

    /// Returns the writer or the first error that occurred while writing.
    pub fn into_inner(self) -> io::Result<W> {
        let state = self.state.into_inner().unwrap_or_else(PoisonError::into_inner);
        match state.error {
            Some(error) => Err(error),
            None => Ok(state.writer),
        }
    }

    fn write_with(&self, action: impl FnOnce(&mut W) -> io::Result<()>) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.error.is_some() {
            return;
        }
        if let Err(error) = action(&mut state.writer) {
            state.error = Some(error);
        }
    }
}

impl<W: Write + Debug + Send> OutputSink for WriterSink<W> {
    fn start(&self) {}

    fn prefix(&self, _name: &str, _iri: &str) {}

    fn base(&self, _iri: &str) {}

    fn triple(&self, triple: Triple) {
        self.write_with(|writer| writeln!(writer, "{triple} ."));
    }

    fn text(&self, text: &str) {
        self.write_with(|writer| writer.write_all(text.as_bytes()));
    }

    fn solution(&self, variables: &[Variable], solution: &Solution) {
        self.write_with(|writer| {
            for (i, variable) in variables.iter().enumerate() {
                if i > 0 {
                    writer.write_all(b"\t")?;
                }
                if let Some(term) = solution.get(variable) {
                    write!(writer, "{term}")?;
                }
            }
            writer.write_all(b"\n")
        });
    }

    fn finish(&self) {
        self.write_with(Write::flush);
    }
}
