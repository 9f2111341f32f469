use rustc_hash::FxHashSet;
use std::collections::VecDeque;
use tracing::trace;

/// Groups the incremental results of concurrently running inputs into batches.
///
/// Every input starts out as pending. Results of an input are added to the earliest open batch
/// the input has not contributed to yet, or to a new batch that expects a contribution from every
/// input that is pending at that moment. A batch closes once all inputs it expects have either
/// contributed or finished. An input that finishes without contributing to a batch counts as a
/// contribution without results.
///
/// Closed batches are kept until they are taken with [Batches::take_closed], in the order in
/// which they closed.
#[derive(Debug)]
pub struct Batches<T> {
    pending: FxHashSet<usize>,
    open: VecDeque<OpenBatch<T>>,
    closed: Vec<ClosedBatch<T>>,
    next_id: usize,
}

#[derive(Debug)]
struct OpenBatch<T> {
    id: usize,
    expected: FxHashSet<usize>,
    contributors: Vec<usize>,
    items: Vec<T>,
}

/// A batch whose expected inputs have all contributed or finished.
#[derive(Debug, PartialEq, Eq)]
pub struct ClosedBatch<T> {
    /// Batches are numbered in the order they were opened.
    pub id: usize,
    /// The inputs that added results, in the order of their first contribution.
    pub contributors: Vec<usize>,
    pub items: Vec<T>,
}

impl<T> Batches<T> {
    /// Creates batches for the given pending inputs.
    pub fn new(inputs: impl IntoIterator<Item = usize>) -> Self {
        Self {
            pending: inputs.into_iter().collect(),
            open: VecDeque::new(),
            closed: Vec::new(),
            next_id: 0,
        }
    }

    /// Adds results of `input`. Results of inputs that are not pending are dropped.
    pub fn add(&mut self, input: usize, items: impl IntoIterator<Item = T>) {
        if !self.pending.contains(&input) {
            trace!("Dropping results of finished input {input}");
            return;
        }

        let position = match self
            .open
            .iter()
            .position(|batch| batch.expected.contains(&input))
        {
            Some(position) => position,
            None => {
                self.open.push_back(OpenBatch {
                    id: self.next_id,
                    expected: self.pending.clone(),
                    contributors: Vec::new(),
                    items: Vec::new(),
                });
                self.next_id += 1;
                self.open.len() - 1
            }
        };

        if let Some(batch) = self.open.get_mut(position) {
            batch.expected.remove(&input);
            batch.contributors.push(input);
            batch.items.extend(items);
        }
        self.close_ready_batches();
    }

    /// Marks `input` as finished.
    pub fn complete(&mut self, input: usize) {
        if !self.pending.remove(&input) {
            return;
        }
        for batch in &mut self.open {
            batch.expected.remove(&input);
        }
        self.close_ready_batches();
    }

    /// Closes all open batches, regardless of missing contributions.
    pub fn force_close(&mut self) {
        self.pending.clear();
        while let Some(batch) = self.open.pop_front() {
            self.close(batch);
        }
    }

    /// Takes the batches that closed since the last call.
    pub fn take_closed(&mut self) -> Vec<ClosedBatch<T>> {
        std::mem::take(&mut self.closed)
    }

    /// Returns whether every input has finished and no batch is open.
    pub fn is_finished(&self) -> bool {
        self.pending.is_empty() && self.open.is_empty()
    }

    fn close_ready_batches(&mut self) {
        let (ready, open): (VecDeque<_>, VecDeque<_>) = std::mem::take(&mut self.open)
            .into_iter()
            .partition(|batch| batch.expected.is_empty());
        self.open = open;
        for batch in ready {
            self.close(batch);
        }
    }

    fn close(&mut self, batch: OpenBatch<T>) {
        trace!(
            "Closing batch {} with {} contributors",
            batch.id,
            batch.contributors.len()
        );
        self.closed.push(ClosedBatch {
            id: batch.id,
            contributors: batch.contributors,
            items: batch.items,
        });
    }
}
