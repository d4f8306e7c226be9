// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A fixed set of worker threads fed from a single job queue.  The
//! threads are started once and live until the pool is dropped, so a
//! render pays for queueing its rows and nothing else.

use crossbeam::channel::{unbounded, Sender};
use log::{trace, warn};
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

use crate::error::RenderError;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A pool of long-lived worker threads.  Jobs are taken off the queue
/// by whichever worker is free first; there is no ordering between
/// jobs.  A job that panics is logged and dropped, and its worker goes
/// back to the queue.
pub struct WorkerPool {
    jobs: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Starts `threads` workers.  At least one worker is always
    /// started.
    pub fn new(threads: usize) -> Result<WorkerPool, RenderError> {
        let threads = threads.max(1);
        let (sender, receiver) = unbounded::<Job>();
        let mut workers = Vec::with_capacity(threads);
        for id in 0..threads {
            let receiver = receiver.clone();
            let worker = thread::Builder::new()
                .name(format!("mandelbrot-worker-{}", id))
                .spawn(move || {
                    trace!("worker {} started", id);
                    while let Ok(job) = receiver.recv() {
                        if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                            warn!("worker {} recovered from a panicking job", id);
                        }
                    }
                    trace!("worker {} stopped", id);
                })
                .map_err(|e| RenderError::PoolSpawn(e.to_string()))?;
            workers.push(worker);
        }
        Ok(WorkerPool {
            jobs: Some(sender),
            workers,
        })
    }

    /// Number of worker threads.
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Queues a job.  Fails only once every worker has gone away.
    pub fn execute<F>(&self, job: F) -> Result<(), RenderError>
    where
        F: FnOnce() + Send + 'static,
    {
        match self.jobs {
            Some(ref jobs) => jobs.send(Box::new(job)).map_err(|_| RenderError::PoolClosed),
            None => Err(RenderError::PoolClosed),
        }
    }
}

impl Drop for WorkerPool {
    /// Closes the queue and waits for the workers to finish whatever
    /// they already picked up.
    fn drop(&mut self) {
        self.jobs.take();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                trace!("a worker thread panicked before shutdown");
            }
        }
    }
}
