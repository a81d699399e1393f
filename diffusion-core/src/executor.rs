//! Parallel-work substrates for the stencil engine.
//!
//! An [`Executor`] receives one [`Job`] per worker, each a disjoint
//! mutable window of the "next" buffer, and runs a kernel over all of
//! them. `dispatch` returns only once every job has finished, which is
//! the barrier between two time steps.
//!
//! | Backend | Type | Notes |
//! |---------|------|-------|
//! | `rayon` | [`RayonExecutor`] | dedicated pool sized to the worker count |
//! | `threads` | [`ScopedThreadExecutor`] | one scoped OS thread per non-empty job |
//! | `inline` | [`InlineExecutor`] | caller thread, reference and wasm backend |

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::DispatchError;

/// A worker's share of one pass: `out[j]` is grid index `start + j`.
#[derive(Debug)]
pub struct Job<'a> {
    pub start: usize,
    pub out: &'a mut [f64],
}

/// Runs per-worker jobs in parallel and waits for all of them.
pub trait Executor: Send + Sync {
    /// Backend name (e.g. "rayon", "threads").
    fn name(&self) -> &str;

    /// Execute `kernel(job.start, job.out)` for every job and block until
    /// all have completed. A failing job fails the whole dispatch.
    fn dispatch(
        &self,
        jobs: Vec<Job<'_>>,
        kernel: &(dyn Fn(usize, &mut [f64]) + Sync),
    ) -> Result<(), DispatchError>;
}

/// Which executor to build for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Rayon,
    Threads,
    Inline,
}

impl BackendKind {
    /// Backends compiled into this build.
    pub fn available() -> &'static [BackendKind] {
        #[cfg(feature = "rayon")]
        {
            &[BackendKind::Rayon, BackendKind::Threads, BackendKind::Inline]
        }
        #[cfg(not(feature = "rayon"))]
        {
            &[BackendKind::Threads, BackendKind::Inline]
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Rayon => "rayon",
            BackendKind::Threads => "threads",
            BackendKind::Inline => "inline",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rayon" => Ok(BackendKind::Rayon),
            "threads" => Ok(BackendKind::Threads),
            "inline" => Ok(BackendKind::Inline),
            other => Err(format!(
                "unknown backend '{other}' (expected rayon, threads or inline)"
            )),
        }
    }
}

/// Build the executor for `kind` with `workers` threads.
pub fn create_executor(
    kind: BackendKind,
    workers: usize,
) -> Result<Arc<dyn Executor>, DispatchError> {
    debug!(backend = %kind, workers, "creating executor");
    match kind {
        #[cfg(feature = "rayon")]
        BackendKind::Rayon => Ok(Arc::new(RayonExecutor::new(workers)?)),
        #[cfg(not(feature = "rayon"))]
        BackendKind::Rayon => Err(DispatchError::Unavailable(
            "rayon backend not compiled in".into(),
        )),
        BackendKind::Threads => Ok(Arc::new(ScopedThreadExecutor)),
        BackendKind::Inline => Ok(Arc::new(InlineExecutor)),
    }
}

#[cfg(feature = "rayon")]
pub use self::rayon_backend::RayonExecutor;

#[cfg(feature = "rayon")]
mod rayon_backend {
    use rayon::prelude::*;

    use super::{Executor, Job, run_job};
    use crate::error::DispatchError;

    /// Executor backed by a dedicated rayon pool.
    pub struct RayonExecutor {
        pool: rayon::ThreadPool,
    }

    impl RayonExecutor {
        pub fn new(workers: usize) -> Result<Self, DispatchError> {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(workers.max(1))
                .thread_name(|i| format!("diffusion-worker-{i}"))
                .build()?;
            Ok(Self { pool })
        }
    }

    impl Executor for RayonExecutor {
        fn name(&self) -> &str {
            "rayon"
        }

        fn dispatch(
            &self,
            jobs: Vec<Job<'_>>,
            kernel: &(dyn Fn(usize, &mut [f64]) + Sync),
        ) -> Result<(), DispatchError> {
            self.pool.install(|| {
                jobs.into_par_iter()
                    .enumerate()
                    .try_for_each(|(worker, job)| run_job(worker, job, kernel))
            })
        }
    }
}

/// Executor that spawns one scoped thread per non-empty job.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScopedThreadExecutor;

impl Executor for ScopedThreadExecutor {
    fn name(&self) -> &str {
        "threads"
    }

    fn dispatch(
        &self,
        jobs: Vec<Job<'_>>,
        kernel: &(dyn Fn(usize, &mut [f64]) + Sync),
    ) -> Result<(), DispatchError> {
        std::thread::scope(|scope| {
            let handles: Vec<_> = jobs
                .into_iter()
                .enumerate()
                .filter(|(_, job)| !job.out.is_empty())
                .map(|(worker, job)| {
                    let handle = std::thread::Builder::new()
                        .name(format!("diffusion-worker-{worker}"))
                        .spawn_scoped(scope, move || kernel(job.start, job.out));
                    (worker, handle)
                })
                .collect();

            // Join everything before reporting, so no worker outlives the pass.
            let mut failure = None;
            for (worker, handle) in handles {
                let outcome = match handle {
                    Ok(h) => h.join().map_err(|payload| DispatchError::WorkerPanicked {
                        worker,
                        message: panic_message(payload.as_ref()),
                    }),
                    Err(source) => Err(DispatchError::Spawn { worker, source }),
                };
                if let Err(e) = outcome {
                    failure.get_or_insert(e);
                }
            }
            failure.map_or(Ok(()), Err)
        })
    }
}

/// Executor that runs every job in order on the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineExecutor;

impl Executor for InlineExecutor {
    fn name(&self) -> &str {
        "inline"
    }

    fn dispatch(
        &self,
        jobs: Vec<Job<'_>>,
        kernel: &(dyn Fn(usize, &mut [f64]) + Sync),
    ) -> Result<(), DispatchError> {
        jobs.into_iter()
            .enumerate()
            .try_for_each(|(worker, job)| run_job(worker, job, kernel))
    }
}

fn run_job(
    worker: usize,
    job: Job<'_>,
    kernel: &(dyn Fn(usize, &mut [f64]) + Sync),
) -> Result<(), DispatchError> {
    if job.out.is_empty() {
        return Ok(());
    }
    panic::catch_unwind(AssertUnwindSafe(|| kernel(job.start, job.out))).map_err(|payload| {
        DispatchError::WorkerPanicked {
            worker,
            message: panic_message(payload.as_ref()),
        }
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jobs_over(buf: &mut [f64], chunk: usize) -> Vec<Job<'_>> {
        buf.chunks_mut(chunk)
            .enumerate()
            .map(|(i, out)| Job {
                start: i * chunk,
                out,
            })
            .collect()
    }

    fn all_backends() -> Vec<Arc<dyn Executor>> {
        BackendKind::available()
            .iter()
            .map(|&k| create_executor(k, 3).unwrap())
            .collect()
    }

    #[test]
    fn every_backend_writes_every_index() {
        for exec in all_backends() {
            let mut buf = vec![0.0; 10];
            exec.dispatch(jobs_over(&mut buf, 4), &|start: usize, out: &mut [f64]| {
                for (j, v) in out.iter_mut().enumerate() {
                    *v = (start + j) as f64;
                }
            })
            .unwrap();
            let expect: Vec<f64> = (0..10).map(|i| i as f64).collect();
            assert_eq!(buf, expect, "backend {}", exec.name());
        }
    }

    #[test]
    fn panicking_worker_becomes_dispatch_error() {
        for exec in all_backends() {
            let mut buf = vec![0.0; 9];
            let err = exec
                .dispatch(jobs_over(&mut buf, 3), &|start: usize, _out: &mut [f64]| {
                    if start == 3 {
                        panic!("bad chunk");
                    }
                })
                .unwrap_err();
            match err {
                DispatchError::WorkerPanicked { worker, message } => {
                    assert_eq!(worker, 1, "backend {}", exec.name());
                    assert!(message.contains("bad chunk"));
                }
                other => panic!("unexpected error from {}: {other}", exec.name()),
            }
        }
    }

    #[test]
    fn empty_jobs_are_skipped() {
        for exec in all_backends() {
            let mut buf = vec![0.0; 2];
            let (a, b) = buf.split_at_mut(0);
            let jobs = vec![Job { start: 0, out: a }, Job { start: 0, out: b }];
            exec.dispatch(jobs, &|_: usize, out: &mut [f64]| out.fill(1.0))
                .unwrap();
            assert_eq!(buf, vec![1.0, 1.0]);
        }
    }

    #[test]
    fn backend_kind_parses_and_displays() {
        assert_eq!("rayon".parse::<BackendKind>().unwrap(), BackendKind::Rayon);
        assert_eq!(" Threads ".parse::<BackendKind>().unwrap(), BackendKind::Threads);
        assert_eq!("inline".parse::<BackendKind>().unwrap(), BackendKind::Inline);
        assert!("opencl".parse::<BackendKind>().is_err());
        assert_eq!(BackendKind::Threads.to_string(), "threads");
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn rayon_is_available_when_compiled_in() {
        assert!(BackendKind::available().contains(&BackendKind::Rayon));
        assert_eq!(create_executor(BackendKind::Rayon, 2).unwrap().name(), "rayon");
    }

    #[cfg(not(feature = "rayon"))]
    #[test]
    fn rayon_is_unavailable_without_the_feature() {
        assert!(!BackendKind::available().contains(&BackendKind::Rayon));
        let err = create_executor(BackendKind::Rayon, 2).err().unwrap();
        assert!(matches!(err, DispatchError::Unavailable(_)), "got {err}");
    }
}
