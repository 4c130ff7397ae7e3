//! 后台周期任务
//!
//! 生命周期：NEW -> STARTING -> RUNNING -> STOPPING -> STOPPED
//!
//! 每轮执行后在「间隔到期」和「停止信号」之间 select，停止请求会立刻唤醒等待；
//! 单轮执行中途不可取消

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    New,
    Starting,
    Running,
    Stopping,
    Stopped,
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskState::New => "NEW",
            TaskState::Starting => "STARTING",
            TaskState::Running => "RUNNING",
            TaskState::Stopping => "STOPPING",
            TaskState::Stopped => "STOPPED",
        };
        f.write_str(s)
    }
}

/// 周期执行的任务
#[async_trait]
pub trait PeriodicJob: Send + Sync + 'static {
    fn name(&self) -> &str;

    /// 执行一轮；返回错误只记录日志，不会终止循环
    async fn run_once(&self) -> Result<()>;
}

pub struct BackgroundTask {
    job: Arc<dyn PeriodicJob>,
    interval: Duration,
    state_tx: Arc<watch::Sender<TaskState>>,
    state_rx: watch::Receiver<TaskState>,
    stop_tx: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl BackgroundTask {
    pub fn new(job: Arc<dyn PeriodicJob>, interval: Duration) -> Self {
        let (state_tx, state_rx) = watch::channel(TaskState::New);
        let (stop_tx, _) = watch::channel(false);
        Self {
            job,
            interval,
            state_tx: Arc::new(state_tx),
            state_rx,
            stop_tx,
            handle: None,
        }
    }

    pub fn name(&self) -> &str {
        self.job.name()
    }

    pub fn state(&self) -> TaskState {
        *self.state_rx.borrow()
    }

    /// 等待任务进入指定状态
    pub async fn wait_for_state(&self, target: TaskState) -> Result<()> {
        let mut rx = self.state_rx.clone();
        rx.wait_for(|state| *state == target)
            .await
            .map_err(|_| anyhow!("任务 {} 状态通道已关闭", self.name()))?;
        Ok(())
    }

    /// 启动后台循环，只能从 NEW 状态启动一次
    pub fn start(&mut self) -> Result<()> {
        let current = self.state();
        if current != TaskState::New {
            return Err(anyhow!(
                "任务 {} 当前状态为 {}，无法启动",
                self.name(),
                current
            ));
        }
        self.state_tx.send_replace(TaskState::Starting);

        let job = self.job.clone();
        let interval = self.interval;
        let state_tx = self.state_tx.clone();
        let mut stop_rx = self.stop_tx.subscribe();

        self.handle = Some(tokio::spawn(async move {
            // stop 可能在 spawn 之前就已到达
            state_tx.send_if_modified(|state| {
                if *state == TaskState::Starting {
                    *state = TaskState::Running;
                    true
                } else {
                    false
                }
            });
            info!("后台任务 {} 已启动, 间隔 {:?}", job.name(), interval);

            loop {
                if *stop_rx.borrow_and_update() {
                    break;
                }
                if let Err(e) = job.run_once().await {
                    error!("后台任务 {} 执行失败: {:#}", job.name(), e);
                }

                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    changed = stop_rx.changed() => {
                        if changed.is_err() {
                            warn!("后台任务 {} 停止信号通道已关闭", job.name());
                            break;
                        }
                    }
                }
            }

            state_tx.send_replace(TaskState::Stopped);
            info!("后台任务 {} 已停止", job.name());
        }));
        Ok(())
    }

    /// 请求停止并等待当前一轮结束
    pub async fn stop(&mut self) {
        match self.state() {
            TaskState::New => {
                self.state_tx.send_replace(TaskState::Stopped);
                return;
            }
            TaskState::Stopped => return,
            _ => {}
        }

        self.state_tx.send_replace(TaskState::Stopping);
        self.stop_tx.send_replace(true);

        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                error!("后台任务 {} 退出异常: {}", self.name(), e);
            }
        }
        self.state_tx.send_replace(TaskState::Stopped);
    }
}
