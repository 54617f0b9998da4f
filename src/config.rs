use anyhow::Result;
use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::net::SocketAddr;

static CONFIG: OnceCell<Config> = OnceCell::new();

#[derive(Debug, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub game: GameConfig,
    pub word_list: WordListConfig,
    pub log: LogConfig,
    #[serde(default)]
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// 存储后端类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Redis,
    /// 仅用于开发和测试，进程重启后数据丢失
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub redis_url: String,
    pub key_prefix: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GameConfig {
    /// 为 true 时成功状态输出为 "succes"，兼容旧客户端
    pub legacy_status_labels: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WordListConfig {
    pub file_path: String,
}

#[derive(Debug, Deserialize)]
pub struct LogConfig {
    pub level: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct CorsConfig {
    pub allow_all_origins: Option<bool>,
    pub allowed_origins: Option<Vec<String>>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from("config")
    }

    /// 从指定文件加载配置（不含扩展名时按 config 库规则查找）
    pub fn load_from(path: &str) -> Result<Self> {
        Self::load_with(path, Self::environment())
    }

    /// 环境变量覆盖，如 `HANGMAN_SERVER__PORT=9000`，
    /// 列表用逗号分隔，如 `HANGMAN_CORS__ALLOWED_ORIGINS=https://a.com,https://b.com`
    fn environment() -> config::Environment {
        config::Environment::with_prefix("HANGMAN")
            .prefix_separator("_")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("cors.allowed_origins")
            .try_parsing(true)
    }

    fn load_with(path: &str, environment: config::Environment) -> Result<Self> {
        let config = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("storage.backend", "redis")?
            .set_default("storage.redis_url", "redis://127.0.0.1:6379")?
            .set_default("storage.key_prefix", "hangman")?
            .set_default("game.legacy_status_labels", true)?
            .set_default("word_list.file_path", "data/wordlist.txt")?
            .set_default("log.level", "info")?
            .add_source(config::File::with_name(path).required(false))
            .add_source(environment)
            .build()?;

        Ok(config.try_deserialize::<Config>()?)
    }

    /// 初始化全局配置
    pub fn init() -> Result<()> {
        let config = Self::load()?;
        CONFIG
            .set(config)
            .map_err(|_| anyhow::anyhow!("配置已经初始化"))?;
        Ok(())
    }

    /// 获取全局配置实例，未初始化时返回 None
    pub fn get() -> Option<&'static Config> {
        CONFIG.get()
    }

    pub fn http_addr(&self) -> crate::Result<SocketAddr> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| crate::Error::Config(format!("无效的HTTP服务器地址: {}", e)))
    }

    pub fn log_filter(&self) -> String {
        format!(
            "hangman_server={},tower_http={}",
            self.log.level, self.log.level
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_apply_when_file_is_missing() {
        let config = Config::load_from("does-not-exist/config").expect("load failed");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.storage.backend, StorageBackend::Redis);
        assert_eq!(config.storage.key_prefix, "hangman");
        assert!(config.game.legacy_status_labels);
        assert_eq!(config.word_list.file_path, "data/wordlist.txt");
        assert!(config.cors.allowed_origins.is_none());
    }

    #[test]
    fn file_values_override_defaults() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("tempfile");
        writeln!(
            file,
            "[server]\nport = 9000\n[storage]\nbackend = \"memory\"\n[game]\nlegacy_status_labels = false"
        )
        .expect("write");

        let path = file.path().to_str().expect("path").to_string();
        let config = Config::load_from(&path).expect("load failed");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert!(!config.game.legacy_status_labels);
        assert_eq!(
            config.http_addr().expect("addr").to_string(),
            "0.0.0.0:9000"
        );
    }

    #[test]
    fn environment_overrides_scalars_and_lists() {
        let vars: config::Map<String, String> = [
            ("HANGMAN_SERVER__PORT", "9100"),
            ("HANGMAN_CORS__ALLOW_ALL_ORIGINS", "false"),
            (
                "HANGMAN_CORS__ALLOWED_ORIGINS",
                "https://a.example.com,https://b.example.com",
            ),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let config = Config::load_with(
            "does-not-exist/config",
            Config::environment().source(Some(vars)),
        )
        .expect("load failed");
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.cors.allow_all_origins, Some(false));
        assert_eq!(
            config.cors.allowed_origins,
            Some(vec![
                "https://a.example.com".to_string(),
                "https://b.example.com".to_string()
            ])
        );
    }
}
