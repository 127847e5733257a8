//! # Task Management System
//!
//! A small pool of long-lived worker threads that execute [`Task`]s and hand
//! their results back to the thread that published them.
//!
//! ## Architecture Overview
//!
//! - `TaskManager`: owns the workers, distributes tasks round-robin and
//!   queues the overflow
//! - `Task`: a unit of work that can run on any worker
//! - `TaskChannel`: the task/result channel pair of one worker
//!
//! ## Task Lifecycle
//! 1. Tasks are published via `TaskManager::publish_task()`
//! 2. The manager sends each task to a worker with spare capacity, or queues it
//! 3. Workers process tasks and send the results back on their own channel
//! 4. `TaskManager::wait_for_results()` blocks until every published task has
//!    reported back, feeding queued tasks to workers as they free up
//!
//! ## Failure Model
//! A worker that panics drops its channels. Any task sent to it, or any
//! result expected from it, then surfaces as
//! [`EvaluatorError::WorkerDisconnected`] instead of hanging the caller.

pub mod task;

use std::collections::VecDeque;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::{self, JoinHandle};

use log::{debug, info};
use task::Task;

use crate::engine_state::error::EvaluatorError;

/// Maximum number of tasks that can be in flight per worker channel.
///
/// With more than one, a worker can pick up its next task without waiting for
/// the caller to drain its result channel.
pub const MAX_TASKS_IN_FLIGHT: usize = 2;

/// The channel pair and thread handle of a single worker.
#[derive(Debug)]
pub struct TaskChannel<R> {
    task_sender: Sender<Box<dyn Task<R>>>,
    result_receiver: Receiver<R>,
    num_tasks_in_flight: usize,
    worker: Option<JoinHandle<()>>,
}

/// Manages a pool of worker threads and coordinates task execution.
///
/// The `TaskManager` is responsible for:
/// - Creating and joining worker threads
/// - Distributing tasks across workers, queueing when all are busy
/// - Collecting results on the calling thread
///
/// It is owned by a single caller; the blocking `wait_for_results` is what
/// makes a parallel phase look synchronous from the outside.
pub struct TaskManager<R: Send + 'static> {
    channels: Vec<TaskChannel<R>>,
    queued_tasks: VecDeque<Box<dyn Task<R>>>,
    current_channel: usize,
}

impl<R: Send + 'static> TaskManager<R> {
    /// Creates a new `TaskManager` with the specified number of worker threads.
    ///
    /// # Arguments
    /// * `num_workers` - Number of worker threads to create; 0 uses the
    ///   available parallelism reported by the OS
    /// * `name` - Prefix for the worker thread names
    ///
    /// # Errors
    /// [`EvaluatorError::WorkerSpawn`] if the OS refuses to create a thread.
    /// Workers spawned before the failure are shut down again.
    pub fn new(num_workers: usize, name: &str) -> Result<Self, EvaluatorError> {
        let num_workers = if num_workers == 0 {
            thread::available_parallelism().map_or(1, |n| n.get())
        } else {
            num_workers
        };

        let mut manager = TaskManager {
            channels: Vec::with_capacity(num_workers),
            queued_tasks: VecDeque::new(),
            current_channel: 0,
        };

        for index in 0..num_workers {
            let (task_tx, task_rx) = channel::<Box<dyn Task<R>>>();
            let (result_tx, result_rx) = channel::<R>();

            let task_closure = move || {
                while let Ok(task) = task_rx.recv() {
                    let result = task.process();
                    if result_tx.send(result).is_err() {
                        break;
                    }
                }
            };

            let worker = thread::Builder::new()
                .name(format!("{name}-{index}"))
                .spawn(task_closure)
                .map_err(EvaluatorError::WorkerSpawn)?;

            manager.channels.push(TaskChannel {
                task_sender: task_tx,
                result_receiver: result_rx,
                num_tasks_in_flight: 0,
                worker: Some(worker),
            });
        }

        info!("Started {} {} worker(s)", num_workers, name);

        Ok(manager)
    }

    /// Number of worker threads in the pool.
    pub fn num_workers(&self) -> usize {
        self.channels.len()
    }

    /// Number of tasks waiting for a free worker.
    pub fn num_queued_tasks(&self) -> usize {
        self.queued_tasks.len()
    }

    /// Attempts to send a task to a specific worker channel.
    ///
    /// # Returns
    /// - `Ok(())` if the worker accepted the task
    /// - `Err(task)` if the worker has hung up, handing the task back
    fn try_send_task(
        &mut self,
        task: Box<dyn Task<R>>,
        channel_idx: usize,
    ) -> Result<(), Box<dyn Task<R>>> {
        match self.channels[channel_idx].task_sender.send(task) {
            Ok(()) => {
                self.channels[channel_idx].num_tasks_in_flight += 1;
                Ok(())
            }
            Err(returned) => Err(returned.0),
        }
    }

    /// Finds a worker channel below `MAX_TASKS_IN_FLIGHT`, round-robin from the
    /// last used channel.
    fn find_available_channel(&self) -> Option<usize> {
        if self.channels.is_empty() {
            return None;
        }

        let start_channel = self.current_channel;
        let mut current = start_channel;

        loop {
            if self.channels[current].num_tasks_in_flight < MAX_TASKS_IN_FLIGHT {
                return Some(current);
            }
            current = (current + 1) % self.channels.len();
            if current == start_channel {
                return None;
            }
        }
    }

    /// Publishes a new task for execution.
    ///
    /// The task goes straight to a worker if one has spare capacity, otherwise
    /// it waits in the queue until `wait_for_results` frees a slot.
    ///
    /// # Returns
    /// - `Ok(true)` if the task was sent to a worker
    /// - `Ok(false)` if it was queued
    ///
    /// # Errors
    /// [`EvaluatorError::WorkerDisconnected`] if the chosen worker has died.
    pub fn publish_task(&mut self, task: Box<dyn Task<R>>) -> Result<bool, EvaluatorError> {
        match self.find_available_channel() {
            Some(channel_idx) => {
                self.try_send_task(task, channel_idx)
                    .map_err(|_| EvaluatorError::WorkerDisconnected)?;
                self.current_channel = (channel_idx + 1) % self.channels.len();
                Ok(true)
            }
            None => {
                self.queued_tasks.push_back(task);
                Ok(false)
            }
        }
    }

    /// Moves queued tasks onto workers while any has spare capacity.
    fn process_queued_tasks(&mut self) -> Result<(), EvaluatorError> {
        while !self.queued_tasks.is_empty() {
            let Some(channel_idx) = self.find_available_channel() else {
                break;
            };
            if let Some(task) = self.queued_tasks.pop_front() {
                self.try_send_task(task, channel_idx)
                    .map_err(|_| EvaluatorError::WorkerDisconnected)?;
                self.current_channel = (channel_idx + 1) % self.channels.len();
            }
        }
        Ok(())
    }

    /// Blocks until every published task has returned its result.
    ///
    /// Queued tasks are fed to workers as slots free up. Results come back in
    /// completion order, not publication order; tasks that care about
    /// placement must carry it in their result.
    ///
    /// # Errors
    /// [`EvaluatorError::WorkerDisconnected`] if a worker dies with work still
    /// assigned to it.
    pub fn wait_for_results(&mut self) -> Result<Vec<R>, EvaluatorError> {
        let mut results = Vec::new();

        loop {
            self.process_queued_tasks()?;

            let mut received_any = false;
            for channel in &mut self.channels {
                if channel.num_tasks_in_flight == 0 {
                    continue;
                }
                let result = channel
                    .result_receiver
                    .recv()
                    .map_err(|_| EvaluatorError::WorkerDisconnected)?;
                channel.num_tasks_in_flight -= 1;
                results.push(result);
                received_any = true;
            }

            if !received_any && self.queued_tasks.is_empty() {
                break;
            }
        }

        debug!("Collected {} task result(s)", results.len());
        Ok(results)
    }
}

impl<R: Send + 'static> Drop for TaskManager<R> {
    fn drop(&mut self) {
        let workers: Vec<JoinHandle<()>> = self
            .channels
            .drain(..)
            .filter_map(|mut channel| channel.worker.take())
            .collect();
        // Channels are gone, so every worker's recv() fails and its loop ends.
        for worker in workers {
            let _ = worker.join();
        }
    }
}
