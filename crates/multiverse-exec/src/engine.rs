//! Execution engines for scheduling universes
//!
//! An engine decides how a batch of independent universe runs is spread
//! over threads. Results always come back in index order, whatever order
//! the work actually finished in.

use multiverse_core::Result;
#[cfg(feature = "parallel")]
use multiverse_core::Error;

/// Execution strategy for batch operations
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ExecutionStrategy {
    /// Process universes one after another on the calling thread
    Sequential,
    /// Process universes on a thread pool
    Parallel,
}

/// Controls how a batch of universes is executed
pub trait ExecutionEngine: Clone + Send + Sync {
    /// Run `f(0..count)` and collect results in index order
    fn execute_batch<F, R>(&self, count: usize, f: F) -> Vec<R>
    where
        F: Fn(usize) -> R + Sync + Send,
        R: Send;

    /// Get the execution strategy
    fn strategy(&self) -> ExecutionStrategy;

    /// Check if parallel execution is used
    fn is_parallel(&self) -> bool {
        self.strategy() == ExecutionStrategy::Parallel
    }

    /// Get the number of threads available
    fn num_threads(&self) -> usize;
}

/// Sequential execution engine
#[derive(Clone, Debug, Default)]
pub struct SequentialEngine;

impl SequentialEngine {
    pub fn new() -> Self {
        Self
    }
}

impl ExecutionEngine for SequentialEngine {
    fn execute_batch<F, R>(&self, count: usize, f: F) -> Vec<R>
    where
        F: Fn(usize) -> R + Sync + Send,
        R: Send,
    {
        (0..count).map(f).collect()
    }

    fn strategy(&self) -> ExecutionStrategy {
        ExecutionStrategy::Sequential
    }

    fn num_threads(&self) -> usize {
        1
    }
}

/// Parallel execution engine using Rayon
///
/// Universes are distributed over a dedicated pool, so the number running
/// at once never exceeds the pool size.
#[cfg(feature = "parallel")]
#[derive(Clone, Debug)]
pub struct ParallelEngine {
    thread_pool: Option<std::sync::Arc<rayon::ThreadPool>>,
}

#[cfg(feature = "parallel")]
impl ParallelEngine {
    /// Parallel engine on Rayon's global pool
    pub fn new() -> Self {
        Self { thread_pool: None }
    }

    /// Parallel engine on a caller-provided pool
    pub fn with_thread_pool(pool: std::sync::Arc<rayon::ThreadPool>) -> Self {
        Self {
            thread_pool: Some(pool),
        }
    }

    /// Create with a specific number of threads
    pub fn with_num_threads(num_threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|i| format!("multiverse-worker-{i}"))
            .build()
            .map_err(|e| Error::Execution(format!("Failed to create thread pool: {e}")))?;

        Ok(Self {
            thread_pool: Some(std::sync::Arc::new(pool)),
        })
    }
}

#[cfg(feature = "parallel")]
impl Default for ParallelEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "parallel")]
impl ExecutionEngine for ParallelEngine {
    fn execute_batch<F, R>(&self, count: usize, f: F) -> Vec<R>
    where
        F: Fn(usize) -> R + Sync + Send,
        R: Send,
    {
        use rayon::prelude::*;

        if let Some(pool) = &self.thread_pool {
            pool.install(|| (0..count).into_par_iter().map(f).collect())
        } else {
            (0..count).into_par_iter().map(f).collect()
        }
    }

    fn strategy(&self) -> ExecutionStrategy {
        ExecutionStrategy::Parallel
    }

    fn num_threads(&self) -> usize {
        if let Some(pool) = &self.thread_pool {
            pool.current_num_threads()
        } else {
            rayon::current_num_threads()
        }
    }
}

/// Create an engine bounded by `max_concurrency`, parallel when the
/// `parallel` feature is enabled and more than one thread is allowed.
#[cfg(feature = "parallel")]
pub fn auto_engine(max_concurrency: usize) -> Result<AutoEngine> {
    if max_concurrency <= 1 {
        Ok(AutoEngine::Sequential(SequentialEngine))
    } else {
        Ok(AutoEngine::Parallel(ParallelEngine::with_num_threads(
            max_concurrency,
        )?))
    }
}

/// Create an engine bounded by `max_concurrency`
#[cfg(not(feature = "parallel"))]
pub fn auto_engine(max_concurrency: usize) -> Result<AutoEngine> {
    let _ = max_concurrency;
    Ok(AutoEngine::Sequential(SequentialEngine))
}

/// Engine chosen at runtime by [`auto_engine`]
#[derive(Clone, Debug)]
pub enum AutoEngine {
    Sequential(SequentialEngine),
    #[cfg(feature = "parallel")]
    Parallel(ParallelEngine),
}

impl ExecutionEngine for AutoEngine {
    fn execute_batch<F, R>(&self, count: usize, f: F) -> Vec<R>
    where
        F: Fn(usize) -> R + Sync + Send,
        R: Send,
    {
        match self {
            AutoEngine::Sequential(engine) => engine.execute_batch(count, f),
            #[cfg(feature = "parallel")]
            AutoEngine::Parallel(engine) => engine.execute_batch(count, f),
        }
    }

    fn strategy(&self) -> ExecutionStrategy {
        match self {
            AutoEngine::Sequential(engine) => engine.strategy(),
            #[cfg(feature = "parallel")]
            AutoEngine::Parallel(engine) => engine.strategy(),
        }
    }

    fn num_threads(&self) -> usize {
        match self {
            AutoEngine::Sequential(engine) => engine.num_threads(),
            #[cfg(feature = "parallel")]
            AutoEngine::Parallel(engine) => engine.num_threads(),
        }
    }
}
