//! 框架最小配置：token、API URL、日志路径与持久化数据目录。
//! 从环境变量 BOT_TOKEN、TELEGRAM_API_URL（或 TELOXIDE_API_URL）、LOG_FILE、PERSISTENCE_DIR 加载。

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// 未设置 PERSISTENCE_DIR 时使用的目录。
pub const DEFAULT_PERSISTENCE_DIR: &str = "./data";

/// Telegram 接入、日志与持久化位置。
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub telegram_api_url: Option<String>,
    pub log_file: Option<String>,
    pub persistence_dir: PathBuf,
}

impl TelegramConfig {
    /// 从环境变量加载：BOT_TOKEN 必填，其余可选。
    pub fn from_env() -> Result<Self> {
        let bot_token = env::var("BOT_TOKEN").map_err(|_| anyhow::anyhow!("BOT_TOKEN not set"))?;
        let telegram_api_url = env::var("TELEGRAM_API_URL")
            .or_else(|_| env::var("TELOXIDE_API_URL"))
            .ok();
        let log_file = env::var("LOG_FILE").ok();
        let persistence_dir = env::var("PERSISTENCE_DIR")
            .unwrap_or_else(|_| DEFAULT_PERSISTENCE_DIR.to_string())
            .into();
        Ok(Self {
            bot_token,
            telegram_api_url,
            log_file,
            persistence_dir,
        })
    }

    /// 使用给定 token 构造，其余为默认值。
    pub fn with_token(bot_token: String) -> Self {
        Self {
            bot_token,
            telegram_api_url: None,
            log_file: None,
            persistence_dir: PathBuf::from(DEFAULT_PERSISTENCE_DIR),
        }
    }

    /// 构造 teloxide Bot；设置了自定义 API URL 时指向该地址。
    pub fn build_bot(&self) -> Result<teloxide::Bot> {
        let bot = teloxide::Bot::new(&self.bot_token);
        match &self.telegram_api_url {
            Some(url) => {
                let url = reqwest::Url::parse(url)
                    .with_context(|| format!("Invalid TELEGRAM_API_URL: {}", url))?;
                Ok(bot.set_api_url(url))
            }
            None => Ok(bot),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_with_token() {
        let config = TelegramConfig::with_token("test_token".to_string());
        assert_eq!(config.bot_token, "test_token");
        assert!(config.telegram_api_url.is_none());
        assert!(config.log_file.is_none());
        assert_eq!(config.persistence_dir, PathBuf::from("./data"));
    }

    #[test]
    #[serial]
    fn test_from_env_reads_variables() {
        env::set_var("BOT_TOKEN", "env_token");
        env::remove_var("TELEGRAM_API_URL");
        env::set_var("TELOXIDE_API_URL", "http://localhost:8081");
        env::set_var("PERSISTENCE_DIR", "/tmp/dbot");

        let config = TelegramConfig::from_env().unwrap();
        assert_eq!(config.bot_token, "env_token");
        assert_eq!(config.telegram_api_url.as_deref(), Some("http://localhost:8081"));
        assert_eq!(config.persistence_dir, PathBuf::from("/tmp/dbot"));
        assert!(config.build_bot().is_ok());

        env::remove_var("TELOXIDE_API_URL");
        env::remove_var("PERSISTENCE_DIR");
        env::remove_var("BOT_TOKEN");
    }

    #[test]
    #[serial]
    fn test_from_env_requires_token() {
        env::remove_var("BOT_TOKEN");
        assert!(TelegramConfig::from_env().is_err());
    }

    #[test]
    fn test_build_bot_rejects_bad_url() {
        let mut config = TelegramConfig::with_token("t".to_string());
        config.telegram_api_url = Some("not a url".to_string());
        assert!(config.build_bot().is_err());
    }
}
