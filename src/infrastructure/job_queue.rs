//! 任务队列 - 基础设施层
//!
//! 持有唯一的后台 worker，所有模型调用都经过这里串行执行

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error};

type Job = BoxFuture<'static, ()>;

/// 单 worker 的 FIFO 任务队列
///
/// 职责：
/// - 同一时刻只执行一个任务
/// - 按提交顺序执行
/// - 任务 panic 不会拖垮 worker
pub struct JobQueue {
    sender: mpsc::UnboundedSender<Job>,
    worker: JoinHandle<()>,
    pending: Arc<AtomicUsize>,
}

/// 已提交任务的句柄
pub struct JobHandle<T> {
    receiver: oneshot::Receiver<Result<T>>,
}

impl JobQueue {
    /// 创建任务队列并启动 worker（必须在 tokio 运行时内调用）
    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Job>();

        let worker = tokio::spawn(async move {
            while let Some(job) = receiver.recv().await {
                job.await;
            }
            debug!("任务队列已关闭，worker 退出");
        });

        Self {
            sender,
            worker,
            pending: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// 提交任务
    ///
    /// 任务在 worker 轮到它之前不会开始执行。
    pub fn submit<F, T>(&self, task: F) -> JobHandle<T>
    where
        F: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let pending = Arc::clone(&self.pending);
        pending.fetch_add(1, Ordering::SeqCst);

        let job = async move {
            let result = match AssertUnwindSafe(task).catch_unwind().await {
                Ok(result) => result,
                Err(_) => {
                    error!("任务执行时发生 panic");
                    Err(anyhow!("任务执行时发生 panic"))
                }
            };
            pending.fetch_sub(1, Ordering::SeqCst);
            // 调用方可能已经不再等待结果
            let _ = tx.send(result);
        }
        .boxed();

        if self.sender.send(job).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            error!("任务队列已关闭，任务被丢弃");
        }

        JobHandle { receiver: rx }
    }

    /// 已提交但尚未完成的任务数量
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// 等待目前已提交的所有任务完成
    pub async fn wait_for_completion(&self) -> Result<()> {
        self.submit(async { Ok(()) }).wait().await
    }

    /// 关闭队列并等待 worker 执行完剩余任务
    pub async fn shutdown(self) -> Result<()> {
        drop(self.sender);
        self.worker
            .await
            .map_err(|e| anyhow!("任务队列 worker 异常退出: {}", e))
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> JobHandle<T> {
    /// 等待任务结果；任务失败时返回任务自身的错误
    pub async fn wait(self) -> Result<T> {
        self.receiver
            .await
            .map_err(|_| anyhow!("任务在完成前被丢弃"))?
    }
}
