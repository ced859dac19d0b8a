//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 本库唯一的配置项是重试时间单位。加载顺序：先读 TOML 文件，再用环境变量 `AGENT__*` 覆盖
//! （双下划线表示嵌套，如 `AGENT__RETRY__DELAY_UNIT_MS=5`）。

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub retry: RetrySection,
}

/// [retry] 段：重试等待的时间单位（毫秒），测试中可调小以加速
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySection {
    #[serde(default = "default_delay_unit_ms")]
    pub delay_unit_ms: u64,
}

fn default_delay_unit_ms() -> u64 {
    1000
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            delay_unit_ms: default_delay_unit_ms(),
        }
    }
}

impl RetrySection {
    pub fn delay_unit(&self) -> Duration {
        Duration::from_millis(self.delay_unit_ms)
    }
}

/// 从 config 目录加载配置，环境变量 AGENT__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 AGENT__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, ::config::ConfigError> {
    let mut builder = ::config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(::config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(::config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        ::config::Environment::with_prefix("AGENT")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
