//! 核心层：错误类型
//!
//! 原子写入与重试执行器共用的错误分类，两者互不依赖。

pub mod error;

pub use error::{RetryError, WriteError, WritePhase};
