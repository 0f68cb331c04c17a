use crate::error::ScanError;
use crossbeam::channel::{Receiver, Sender, bounded, unbounded};
use std::collections::BTreeMap;

/// Bounded worker pool that hands items out over a rendezvous channel and
/// delivers results back to the calling thread in input order
pub struct ParallelExecutor {
    max_workers: usize,
}

/// Context for worker threads to avoid too many function parameters
struct WorkerContext<'a, T, R, F> {
    worker_id: usize,
    work_rx: Receiver<(usize, T)>,
    result_tx: Sender<(usize, R)>,
    processor: &'a F,
}

impl ParallelExecutor {
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
        }
    }

    /// Process `work_items` on the pool.
    ///
    /// `should_dispatch` is sampled before each item is handed out; once it
    /// returns false no further items are dispatched and in-flight items
    /// drain. `consume` runs on the calling thread, strictly in item order.
    /// Returns the number of items dispatched, which is always a prefix of
    /// `work_items`.
    pub fn execute<T, R, F, D, C>(
        &self,
        work_items: Vec<T>,
        processor: F,
        should_dispatch: D,
        mut consume: C,
    ) -> Result<usize, ScanError>
    where
        T: Send,
        R: Send,
        F: Fn(&T, usize) -> R + Sync,
        D: Fn() -> bool + Sync,
        C: FnMut(usize, R),
    {
        if work_items.is_empty() {
            return Ok(0);
        }

        let actual_workers = std::cmp::min(self.max_workers, work_items.len());
        let (work_tx, work_rx) = bounded::<(usize, T)>(0);
        let (result_tx, result_rx) = unbounded::<(usize, R)>();

        let processor = &processor;
        let should_dispatch = &should_dispatch;

        crossbeam::thread::scope(|s| {
            for worker_id in 0..actual_workers {
                let ctx = WorkerContext {
                    worker_id,
                    work_rx: work_rx.clone(),
                    result_tx: result_tx.clone(),
                    processor,
                };
                s.spawn(move |_| Self::worker_thread(ctx));
            }

            // Producer: hands items out one at a time
            s.spawn(move |_| {
                for item in work_items.into_iter().enumerate() {
                    if !should_dispatch() || work_tx.send(item).is_err() {
                        break;
                    }
                }
            });

            // Receivers only see disconnection once every clone is gone
            drop(work_rx);
            drop(result_tx);

            Self::collect_in_order(result_rx, &mut consume)
        })
        .map_err(|_| ScanError::WorkerPanic)
    }

    fn worker_thread<T, R, F>(ctx: WorkerContext<'_, T, R, F>)
    where
        F: Fn(&T, usize) -> R,
    {
        while let Ok((index, item)) = ctx.work_rx.recv() {
            let result = (ctx.processor)(&item, ctx.worker_id);
            if ctx.result_tx.send((index, result)).is_err() {
                break;
            }
        }
    }

    fn collect_in_order<R, C>(result_rx: Receiver<(usize, R)>, consume: &mut C) -> usize
    where
        C: FnMut(usize, R),
    {
        let mut pending: BTreeMap<usize, R> = BTreeMap::new();
        let mut next = 0;

        while let Ok((index, result)) = result_rx.recv() {
            pending.insert(index, result);
            while let Some(result) = pending.remove(&next) {
                consume(next, result);
                next += 1;
            }
        }

        next
    }
}

/// Runs items inline on the calling thread
pub struct SequentialExecutor;

impl SequentialExecutor {
    pub fn execute<T, R, F, D, C>(
        work_items: Vec<T>,
        processor: F,
        should_dispatch: D,
        mut consume: C,
    ) -> usize
    where
        F: Fn(&T, usize) -> R,
        D: Fn() -> bool,
        C: FnMut(usize, R),
    {
        let mut dispatched = 0;
        for (index, item) in work_items.iter().enumerate() {
            if !should_dispatch() {
                break;
            }
            dispatched += 1;
            consume(index, processor(item, 0));
        }
        dispatched
    }
}

/// Execution strategy enum for choosing between parallel and sequential
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStrategy {
    Sequential,
    Parallel { workers: usize },
}

impl ExecutionStrategy {
    pub fn execute<T, R, F, D, C>(
        &self,
        work_items: Vec<T>,
        processor: F,
        should_dispatch: D,
        consume: C,
    ) -> Result<usize, ScanError>
    where
        T: Send,
        R: Send,
        F: Fn(&T, usize) -> R + Sync,
        D: Fn() -> bool + Sync,
        C: FnMut(usize, R),
    {
        match self {
            ExecutionStrategy::Sequential => Ok(SequentialExecutor::execute(
                work_items,
                processor,
                should_dispatch,
                consume,
            )),
            ExecutionStrategy::Parallel { workers } => {
                ParallelExecutor::new(*workers).execute(work_items, processor, should_dispatch, consume)
            }
        }
    }

    /// Strategy for a configured worker count.
    ///
    /// `1` runs sequentially, `0` derives the pool size from the CPU count
    /// and `thread_percentage`, anything else is used as is.
    pub fn from_workers(workers: usize, thread_percentage: u8) -> Self {
        let workers = match workers {
            0 => Self::calculate_optimal_workers(0, thread_percentage),
            n => n,
        };

        if workers <= 1 {
            ExecutionStrategy::Sequential
        } else {
            ExecutionStrategy::Parallel { workers }
        }
    }

    pub fn workers(&self) -> usize {
        match self {
            ExecutionStrategy::Sequential => 1,
            ExecutionStrategy::Parallel { workers } => *workers,
        }
    }

    /// `thread_percentage` of the CPU cores, at least 1, capped by
    /// `max_threads_config` when that is non-zero
    pub fn calculate_optimal_workers(max_threads_config: usize, thread_percentage: u8) -> usize {
        let available_cores = num_cpus::get();

        let workers_by_percentage =
            std::cmp::max(1, (available_cores * thread_percentage as usize) / 100);

        // 0 means use percentage calculation only
        if max_threads_config > 0 {
            std::cmp::min(max_threads_config, workers_by_percentage)
        } else {
            workers_by_percentage
        }
    }
}
