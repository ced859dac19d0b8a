//! 文件持久化：原子写入

pub mod atomic;

pub use atomic::{write_file_atomic, write_file_atomic_async, DIR_MODE};
