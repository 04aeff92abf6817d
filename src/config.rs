use crate::error::{Result, SpiceAiError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// 予測サービスのベースURL
    pub api_url: String,
    pub timeout_seconds: u64,
    /// 履歴などの保存先（省略時は ~/.config/spice-ai）
    pub data_dir: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    pub fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| SpiceAiError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("spice-ai"))
    }

    /// 予測サービスURL（環境変数を優先）
    pub fn api_url(&self) -> String {
        if let Ok(url) = std::env::var("SPICE_AI_API_URL") {
            return url;
        }
        self.api_url.clone()
    }

    /// 履歴の保存先ディレクトリ
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Self::config_dir(),
        }
    }

    pub fn set_api_url(&mut self, url: String) -> Result<()> {
        self.api_url = url;
        self.save()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:5000".into(),
            timeout_seconds: 60,
            data_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api_url, "http://localhost:5000");
        assert_eq!(config.timeout_seconds, 60);
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn test_api_url_env_override() {
        let config = Config {
            api_url: "http://config-host:5000".into(),
            ..Default::default()
        };

        // 環境変数なし → 設定ファイルの値
        std::env::remove_var("SPICE_AI_API_URL");
        assert_eq!(config.api_url(), "http://config-host:5000");

        // 環境変数あり → 環境変数が優先
        std::env::set_var("SPICE_AI_API_URL", "http://override-host:8080");
        assert_eq!(config.api_url(), "http://override-host:8080");

        // 解除すると設定ファイルの値に戻る
        std::env::remove_var("SPICE_AI_API_URL");
        assert_eq!(config.api_url(), "http://config-host:5000");
    }

    #[test]
    fn test_data_dir_override() {
        let config = Config {
            data_dir: Some(PathBuf::from("/tmp/spice-ai-data")),
            ..Default::default()
        };
        assert_eq!(
            config.data_dir().unwrap(),
            PathBuf::from("/tmp/spice-ai-data")
        );
    }
}
