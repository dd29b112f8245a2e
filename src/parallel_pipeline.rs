// THEORY:
// Frames are independent: rendering one never depends on another. The
// `ParallelPipeline` exploits that by spreading frames over a pool of tokio
// workers, each with its own `FramePipeline`. A single dispatcher hands tasks
// to workers round-robin, and every task carries a oneshot channel for its
// result, so callers simply await the frame they submitted.
//
// Frame ids are assigned at submission. `process_batch` awaits all submitted
// frames together and returns them in submission order, whatever order the
// workers finish in.

use crate::config::OverlayConfig;
use crate::core_modules::detection::Detection;
use crate::error::OverlayError;
use crate::pipeline::{FramePipeline, RenderedFrame};
use futures::future::try_join_all;
use image::RgbaImage;
use log::debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};

/// A frame waiting to be rendered.
pub struct FrameTask {
    pub frame_id: u64,
    pub frame: RgbaImage,
    pub detections: Vec<Detection>,
    pub submitted_at: Instant,
    pub result_sender: oneshot::Sender<RenderedFrame>,
}

pub struct WorkerPool {
    task_sender: mpsc::UnboundedSender<FrameTask>,
    workers: Vec<tokio::task::JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `worker_count` workers. Must be called inside a tokio runtime.
    pub fn new(config: OverlayConfig, worker_count: usize) -> Result<Self, OverlayError> {
        let worker_count = worker_count.max(1);
        let (task_sender, mut task_receiver) = mpsc::unbounded_channel::<FrameTask>();
        let mut workers = Vec::with_capacity(worker_count + 1);

        let (worker_senders, worker_receivers): (Vec<_>, Vec<_>) = (0..worker_count)
            .map(|_| mpsc::unbounded_channel::<FrameTask>())
            .unzip();

        // Spawn dispatcher
        workers.push(tokio::spawn(async move {
            let mut worker_idx = 0;
            while let Some(task) = task_receiver.recv().await {
                let _ = worker_senders[worker_idx].send(task);
                worker_idx = (worker_idx + 1) % worker_count;
            }
        }));

        // Spawn workers
        for mut worker_receiver in worker_receivers {
            let pipeline = FramePipeline::new(config.clone())?;

            workers.push(tokio::spawn(async move {
                while let Some(task) = worker_receiver.recv().await {
                    let queued = task.submitted_at.elapsed();
                    let rendered = pipeline.render_frame(task.frame_id, &task.frame, &task.detections);
                    debug!(
                        "Frame {} rendered after {:?} in queue, {:?} total",
                        task.frame_id,
                        queued,
                        task.submitted_at.elapsed()
                    );
                    let _ = task.result_sender.send(rendered);
                }
            }));
        }

        Ok(Self {
            task_sender,
            workers,
        })
    }

    pub async fn process_frame(&self, task: FrameTask) -> Result<(), OverlayError> {
        self.task_sender
            .send(task)
            .map_err(|_| OverlayError::WorkerUnavailable)
    }
}

pub struct ParallelPipeline {
    worker_pool: WorkerPool,
    worker_count: usize,
    frame_counter: AtomicU64,
}

impl ParallelPipeline {
    /// Builds a pool with one worker per CPU.
    pub fn new(config: OverlayConfig) -> Result<Self, OverlayError> {
        Self::with_workers(config, num_cpus::get())
    }

    pub fn with_workers(config: OverlayConfig, worker_count: usize) -> Result<Self, OverlayError> {
        config.validate()?;
        let worker_count = worker_count.max(1);
        Ok(Self {
            worker_pool: WorkerPool::new(config, worker_count)?,
            worker_count,
            frame_counter: AtomicU64::new(0),
        })
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Renders a single frame on the pool.
    pub async fn process_frame(
        &self,
        frame: RgbaImage,
        detections: Vec<Detection>,
    ) -> Result<RenderedFrame, OverlayError> {
        let frame_id = self.frame_counter.fetch_add(1, Ordering::Relaxed);
        let (result_sender, result_receiver) = oneshot::channel();

        self.worker_pool
            .process_frame(FrameTask {
                frame_id,
                frame,
                detections,
                submitted_at: Instant::now(),
                result_sender,
            })
            .await?;

        result_receiver
            .await
            .map_err(|_| OverlayError::WorkerUnavailable)
    }

    /// Renders a batch of frames concurrently, returned in input order.
    pub async fn process_batch(
        &self,
        frames: Vec<(RgbaImage, Vec<Detection>)>,
    ) -> Result<Vec<RenderedFrame>, OverlayError> {
        let started = Instant::now();
        let count = frames.len();
        let rendered = try_join_all(
            frames
                .into_iter()
                .map(|(frame, detections)| self.process_frame(frame, detections)),
        )
        .await?;
        debug!("Rendered batch of {count} frames in {:?}", started.elapsed());
        Ok(rendered)
    }

    /// Stops accepting frames and waits for in-flight work to finish.
    pub async fn shutdown(self) {
        let WorkerPool {
            task_sender,
            workers,
        } = self.worker_pool;
        drop(task_sender);
        for worker in workers {
            let _ = tokio::time::timeout(Duration::from_secs(5), worker).await;
        }
    }
}
