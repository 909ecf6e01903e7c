use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::usecases::u508_fill_order_template::TemplateLayout;

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub template: TemplateLayout,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub allow_cors_all: bool,
    /// Used only when `allow_cors_all = false`
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            allow_cors_all: true,
            cors_origins: [
                "http://localhost:5173",
                "http://127.0.0.1:5173",
                "http://localhost:8000",
                "http://127.0.0.1:8000",
                "http://localhost:3000",
                "http://127.0.0.1:3000",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub upload_dir: PathBuf,
    pub output_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            output_dir: PathBuf::from("outputs"),
            log_dir: PathBuf::from("logs"),
        }
    }
}

impl StorageConfig {
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        for dir in [&self.upload_dir, &self.output_dir, &self.log_dir] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LimitsConfig {
    /// Upload size limit in bytes
    pub max_file_size: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size: 50 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
    pub api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.deepseek.com".to_string(),
            model: "deepseek-chat".to_string(),
            temperature: 0.1,
            api_key: None,
        }
    }
}

impl LlmConfig {
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CatalogConfig {
    /// Ordered list of canonical product names
    pub products: Vec<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            products: [
                "四海170g鱼蛋鲜装",
                "四海150g鱼之豆腐鲜装",
                "四海250g手打香菇贡丸鲜装",
                "四海170g八爪鱼味鱼球鲜装",
                "四海250g手打牛筋丸鲜装",
                "四海250g手打牛肉丸鲜装",
                "四海200g鲜装鱼籽虾饼",
                "四海170g鲜装台湾花枝味鱼丸",
                "四海170g鲜装墨鱼味鱼丸",
                "四海250g墨鱼鱼饼",
                "四海150g鲜装牛肉丸",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            limits: LimitsConfig::default(),
            llm: LlmConfig::default(),
            catalog: CatalogConfig::default(),
            template: TemplateLayout::default(),
        }
    }
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[server]
host = "127.0.0.1"
port = 8000
allow_cors_all = true
cors_origins = [
    "http://localhost:5173",
    "http://127.0.0.1:5173",
    "http://localhost:8000",
    "http://127.0.0.1:8000",
    "http://localhost:3000",
    "http://127.0.0.1:3000",
]

[storage]
upload_dir = "uploads"
output_dir = "outputs"
log_dir = "logs"

[limits]
max_file_size = 52428800

[llm]
base_url = "https://api.deepseek.com"
model = "deepseek-chat"
temperature = 0.1

[catalog]
products = [
    "四海170g鱼蛋鲜装",
    "四海150g鱼之豆腐鲜装",
    "四海250g手打香菇贡丸鲜装",
    "四海170g八爪鱼味鱼球鲜装",
    "四海250g手打牛筋丸鲜装",
    "四海250g手打牛肉丸鲜装",
    "四海200g鲜装鱼籽虾饼",
    "四海170g鲜装台湾花枝味鱼丸",
    "四海170g鲜装墨鱼味鱼丸",
    "四海250g墨鱼鱼饼",
    "四海150g鲜装牛肉丸",
]

[template]
header_row = 2
first_product_row = 3
product_name_column = 3
structural_columns = ["序号", "商品编码", "商品名称", "规格", "入库价", "售价", "前台毛利", "供应商编码", "供应商名称"]
store_aliases = ["五江", "金海", "洋湖", "砂之船", "邵阳", "岳阳"]
"#;

/// Where the configuration was loaded from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Embedded,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "{}", path.display()),
            ConfigSource::Embedded => write!(f, "embedded defaults"),
        }
    }
}

fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config: Config = toml::from_str(contents)?;
    apply_overrides(&mut config, |name| std::env::var(name).ok());
    Ok(config)
}

/// Environment overrides: `DEEPSEEK_API_KEY`, `DEEPSEEK_BASE_URL`,
/// `ALLOW_CORS_ALL`, `CORS_ORIGINS` (comma separated, appended)
fn apply_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(key) = lookup("DEEPSEEK_API_KEY").filter(|k| !k.trim().is_empty()) {
        config.llm.api_key = Some(key);
    }
    if let Some(url) = lookup("DEEPSEEK_BASE_URL").filter(|u| !u.trim().is_empty()) {
        config.llm.base_url = url;
    }
    if let Some(flag) = lookup("ALLOW_CORS_ALL") {
        config.server.allow_cors_all = flag.trim().eq_ignore_ascii_case("true");
    }
    if let Some(origins) = lookup("CORS_ORIGINS") {
        config.server.cors_origins.extend(
            origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string),
        );
    }
}

/// Load configuration from config.toml file
///
/// Search order:
/// 1. Next to the executable (for production)
/// 2. Falls back to embedded default config
pub fn load_config() -> anyhow::Result<(Config, ConfigSource)> {
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let config_path = exe_dir.join("config.toml");
            if config_path.exists() {
                let config = load_config_from(&config_path)?;
                return Ok((config, ConfigSource::File(config_path)));
            }
        }
    }

    Ok((parse_config(DEFAULT_CONFIG)?, ConfigSource::Embedded))
}

/// Load configuration from an explicit path; a missing file is an error
pub fn load_config_from(path: &Path) -> anyhow::Result<Config> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Cannot read config {}: {}", path.display(), e))?;
    parse_config(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config_loads() {
        let config: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.catalog.products.len(), 11);
        assert_eq!(config.template.header_row, 2);
        assert_eq!(config.limits.max_file_size, 50 * 1024 * 1024);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str("[server]\nport = 9000\n").unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.template, TemplateLayout::default());
        assert_eq!(config.llm.model, "deepseek-chat");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("DEEPSEEK_API_KEY", "sk-test"),
            ("ALLOW_CORS_ALL", "false"),
            ("CORS_ORIGINS", "http://a.example, ,http://b.example"),
        ]);
        let mut config = Config::default();
        apply_overrides(&mut config, |name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.llm.api_key(), Some("sk-test"));
        assert_eq!(config.llm.base_url, "https://api.deepseek.com");
        assert!(!config.server.allow_cors_all);
        assert_eq!(config.server.cors_origins.len(), 8);
    }

    #[test]
    fn test_blank_api_key_is_absent() {
        let mut config = Config::default();
        config.llm.api_key = Some("  ".to_string());
        assert_eq!(config.llm.api_key(), None);
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config_from(&dir.path().join("absent.toml")).is_err());
    }

    #[test]
    fn test_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[catalog]\nproducts = [\"A\", \"B\"]\n").unwrap();
        let config = load_config_from(&path).unwrap();
        assert_eq!(config.catalog.products, vec!["A".to_string(), "B".to_string()]);
    }
}
