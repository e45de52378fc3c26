use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable overriding `[data].dir`.
pub const DATA_DIR_ENV: &str = "RESTAURANT_DATA_DIR";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub db: DbConfig,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub embedding: EmbeddingConfig,
    pub web_search: WebSearchConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DataConfig {
    /// Directory holding the source text files.
    pub dir: PathBuf,
    /// Accepted file extensions, with leading dots.
    pub extensions: Vec<String>,
    /// Extra glob patterns (relative to the data dir) to skip.
    pub exclude_globs: Vec<String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
            extensions: [".txt", ".md", ".rst", ".text"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            exclude_globs: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct DbConfig {
    /// SQLite file for the vector index. Defaults to
    /// `<data dir>/index/tavola.sqlite`; the scanner skips that
    /// subdirectory so the index never indexes its own files.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Documents at or below this size become a single chunk; larger
    /// documents are split on paragraph boundaries.
    pub max_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { max_chars: 1200 }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    pub default_top_k: i64,
    pub max_top_k: i64,
    /// Local results scoring below this are dropped.
    pub min_score: f64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_top_k: 3,
            max_top_k: 10,
            min_score: 0.1,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// `"local"`, `"openai"`, or `"ollama"`.
    pub provider: String,
    pub model: Option<String>,
    pub dims: Option<usize>,
    pub batch_size: usize,
    pub max_retries: u32,
    pub timeout_secs: u64,
    /// Base URL for the Ollama provider.
    pub url: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "local".to_string(),
            model: None,
            dims: None,
            batch_size: 64,
            max_retries: 5,
            timeout_secs: 30,
            url: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct WebSearchConfig {
    /// Brave web search endpoint.
    pub endpoint: String,
    pub country: String,
    pub search_lang: String,
    pub safesearch: Option<String>,
    pub default_count: i64,
    pub max_count: i64,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.search.brave.com/res/v1/web/search".to_string(),
            country: "it".to_string(),
            search_lang: "it".to_string(),
            safesearch: None,
            default_count: 2,
            max_count: 5,
            timeout_secs: 15,
            max_retries: 3,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8001".to_string(),
        }
    }
}

impl Config {
    /// The effective data directory: `RESTAURANT_DATA_DIR` wins over the
    /// configured path.
    pub fn data_dir(&self) -> PathBuf {
        match std::env::var(DATA_DIR_ENV) {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => self.data.dir.clone(),
        }
    }

    /// The effective index database path.
    pub fn db_path(&self) -> PathBuf {
        match &self.db.path {
            Some(path) => path.clone(),
            None => self.data_dir().join("index").join("tavola.sqlite"),
        }
    }
}

/// Load configuration from a TOML file. A missing file is not an error:
/// the engine runs on defaults plus environment overrides.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate chunking
    if config.chunking.max_chars == 0 {
        anyhow::bail!("chunking.max_chars must be > 0");
    }

    // Validate retrieval
    if config.retrieval.default_top_k < 1 {
        anyhow::bail!("retrieval.default_top_k must be >= 1");
    }
    if config.retrieval.default_top_k > config.retrieval.max_top_k {
        anyhow::bail!("retrieval.default_top_k must not exceed retrieval.max_top_k");
    }
    if !(0.0..=1.0).contains(&config.retrieval.min_score) {
        anyhow::bail!("retrieval.min_score must be in [0.0, 1.0]");
    }

    // Validate web search
    if config.web_search.default_count < 1 || config.web_search.max_count < 1 {
        anyhow::bail!("web_search counts must be >= 1");
    }

    // Validate embedding
    match config.embedding.provider.as_str() {
        "local" => {}
        "openai" | "ollama" => {
            if config.embedding.model.is_none() {
                anyhow::bail!(
                    "embedding.model must be specified when provider is '{}'",
                    config.embedding.provider
                );
            }
            if config.embedding.dims.is_none() || config.embedding.dims == Some(0) {
                anyhow::bail!(
                    "embedding.dims must be > 0 when provider is '{}'",
                    config.embedding.provider
                );
            }
        }
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be local, openai, or ollama.",
            other
        ),
    }

    Ok(config)
}
