//! 错误类型
//!
//! - `WriteError`：原子写入各阶段失败，保留底层 io::Error 与目标路径
//! - `RetryError`：重试执行器的取消与传输错误

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// 原子写入的阶段，用于区分「什么都没发生」与「数据已落盘但未生效」
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePhase {
    CreateDir,
    CreateTemp,
    Write,
    Sync,
    SetPermissions,
    Rename,
    /// 异步入口中的阻塞任务 panic 或被取消
    Join,
}

impl fmt::Display for WritePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WritePhase::CreateDir => "create directory",
            WritePhase::CreateTemp => "create temp file",
            WritePhase::Write => "write temp file",
            WritePhase::Sync => "sync temp file",
            WritePhase::SetPermissions => "set permissions",
            WritePhase::Rename => "rename temp file",
            WritePhase::Join => "join blocking task",
        };
        f.write_str(s)
    }
}

/// 原子写入错误：每个阶段单独一个变体，均包装底层原因
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("failed to create directory for {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create temp file for {}: {source}", .path.display())]
    CreateTemp {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write temp file for {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to sync temp file for {}: {source}", .path.display())]
    Sync {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to set permissions for {}: {source}", .path.display())]
    SetPermissions {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to rename temp file to {}: {source}", .path.display())]
    Rename {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("atomic write task for {} did not complete: {source}", .path.display())]
    Join {
        path: PathBuf,
        #[source]
        source: tokio::task::JoinError,
    },
}

impl WriteError {
    /// 失败所处的阶段
    pub fn phase(&self) -> WritePhase {
        match self {
            WriteError::CreateDir { .. } => WritePhase::CreateDir,
            WriteError::CreateTemp { .. } => WritePhase::CreateTemp,
            WriteError::Write { .. } => WritePhase::Write,
            WriteError::Sync { .. } => WritePhase::Sync,
            WriteError::SetPermissions { .. } => WritePhase::SetPermissions,
            WriteError::Rename { .. } => WritePhase::Rename,
            WriteError::Join { .. } => WritePhase::Join,
        }
    }

    /// 写入的目标路径
    pub fn path(&self) -> &std::path::Path {
        match self {
            WriteError::CreateDir { path, .. }
            | WriteError::CreateTemp { path, .. }
            | WriteError::Write { path, .. }
            | WriteError::Sync { path, .. }
            | WriteError::SetPermissions { path, .. }
            | WriteError::Rename { path, .. }
            | WriteError::Join { path, .. } => path,
        }
    }
}

/// 传输层错误的统一装箱类型
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// 重试执行器错误：取消与传输失败；5xx 耗尽重试不是错误，响应原样返回
#[derive(Error, Debug)]
pub enum RetryError {
    /// 收到取消信号（发送前、请求进行中或等待重试时），已收到的响应体均已关闭
    #[error("request cancelled (after {attempts} attempts)")]
    Cancelled { attempts: u32 },

    /// 最后一次尝试的传输层错误
    #[error("request failed after {attempts} attempts: {source}")]
    Transport {
        attempts: u32,
        #[source]
        source: BoxError,
    },
}

impl RetryError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RetryError::Cancelled { .. })
    }

    /// 实际发出的请求次数
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Cancelled { attempts } | RetryError::Transport { attempts, .. } => {
                *attempts
            }
        }
    }
}
