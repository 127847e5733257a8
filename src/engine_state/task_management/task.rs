//! # Task System Core Trait
//!
//! A `Task` is a self-contained unit of work that a worker thread can run
//! without touching any state owned by the caller.
//!
//! ## Task Lifecycle
//! 1. A `Task` is created and handed to `TaskManager::publish_task()`
//! 2. The task's `process()` method is called on a worker thread
//! 3. The returned value travels back over the worker's result channel
//! 4. The caller collects it with `TaskManager::wait_for_results()`
//!
//! ## Thread Safety
//! - `Task` must be `Send` to be transferred to a worker
//! - The result type must be `Send` to be transferred back

/// A unit of work executed on a worker thread, producing a value of type `R`.
///
/// # Implementation Guidelines
/// - Own everything needed (use `Arc` for large shared inputs)
/// - Keep it coarse-grained to amortize channel overhead
/// - Never block on other tasks; the pool does not schedule dependencies
pub trait Task<R>: Send {
    /// Runs the task and returns its result.
    fn process(&self) -> R;
}
