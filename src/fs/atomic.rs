//! 原子文件写入（断电安全）
//!
//! 在目标同目录创建临时文件，写入并 fsync 后设置权限，再 rename 覆盖目标。
//! 观察者只会看到旧内容或完整的新内容；SD 卡 / eMMC 上 fsync 不可省略。
//! 任一步失败时临时文件被删除（删除失败不上报）。

use std::fs::{DirBuilder, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::Builder;

use crate::core::WriteError;

/// 自动创建父目录时使用的权限
pub const DIR_MODE: u32 = 0o755;

const TEMP_PREFIX: &str = ".tmp-";
const TEMP_SUFFIX: &str = ".tmp";

/// 原子替换 `path` 的内容为 `data`，文件权限为 `mode`（如 0o600 / 0o644）
///
/// 同一路径的并发写入不做协调（后 rename 者生效），需要时由调用方串行化。
pub fn write_file_atomic(path: impl AsRef<Path>, data: &[u8], mode: u32) -> Result<(), WriteError> {
    let path = path.as_ref();
    let dir = parent_dir(path);

    create_parent_dir(dir).map_err(|source| WriteError::CreateDir {
        path: path.to_path_buf(),
        source,
    })?;

    // 必须与目标同目录，rename 才是同一文件系统上的原子操作
    let mut tmp = Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(dir)
        .map_err(|source| WriteError::CreateTemp {
            path: path.to_path_buf(),
            source,
        })?;

    // 以下任一 `?` 提前返回时 tmp 被 drop，临时文件随之删除
    tmp.write_all(data).map_err(|source| WriteError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    tmp.as_file().sync_all().map_err(|source| WriteError::Sync {
        path: path.to_path_buf(),
        source,
    })?;

    apply_mode(tmp.as_file(), mode).map_err(|source| WriteError::SetPermissions {
        path: path.to_path_buf(),
        source,
    })?;

    // 关闭句柄，只保留路径；File 的 close 不可失败，延迟写错误已由 sync_all 暴露
    let tmp_path = tmp.into_temp_path();

    tmp_path.persist(path).map_err(|e| WriteError::Rename {
        path: path.to_path_buf(),
        source: e.error,
    })?;

    tracing::debug!(path = %path.display(), bytes = data.len(), "atomic write complete");
    Ok(())
}

/// 异步版本：在 spawn_blocking 中执行同步写入，避免阻塞 async 运行时
pub async fn write_file_atomic_async(
    path: impl Into<PathBuf>,
    data: Vec<u8>,
    mode: u32,
) -> Result<(), WriteError> {
    let path = path.into();
    let target = path.clone();
    tokio::task::spawn_blocking(move || write_file_atomic(&target, &data, mode))
        .await
        .map_err(|source| WriteError::Join { path, source })?
}

/// 纯文件名（无父目录）时落在当前目录
fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

/// 递归创建目录；目录已存在不算错误
fn create_parent_dir(dir: &Path) -> io::Result<()> {
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(DIR_MODE);
    }
    builder.create(dir)
}

#[cfg(unix)]
fn apply_mode(file: &File, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(std::fs::Permissions::from_mode(mode))
}

/// 非 Unix 平台只能表达只读位：owner 无写权限即只读
#[cfg(not(unix))]
fn apply_mode(file: &File, mode: u32) -> io::Result<()> {
    let mut perms = file.metadata()?.permissions();
    perms.set_readonly(mode & 0o200 == 0);
    file.set_permissions(perms)
}
