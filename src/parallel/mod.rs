//! Generic execution framework for per-file work
//!
//! The parallel module only knows about system resources and scheduling:
//! how many workers to run, how items reach them, and how results get back
//! to the caller. It has no knowledge of logs or rules.
//!
//! ```text
//! producer ──(rendezvous)──▶ worker 0..N ──(results)──▶ caller (in order)
//!     ▲
//!     └── should_dispatch() sampled before every item
//! ```
//!
//! # Example Usage
//!
//! ```rust
//! use logtriage::parallel::ExecutionStrategy;
//!
//! let strategy = ExecutionStrategy::Parallel { workers: 2 };
//! let mut doubled = Vec::new();
//! let dispatched = strategy
//!     .execute(vec![1, 2, 3], |x, _worker_id| x * 2, || true, |_, r| doubled.push(r))
//!     .unwrap();
//! assert_eq!(dispatched, 3);
//! assert_eq!(doubled, vec![2, 4, 6]);
//! ```

pub mod core;

pub use core::{ExecutionStrategy, ParallelExecutor, SequentialExecutor};
