use serde::Deserialize;
use std::env;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

/// Token budgets enforced by the splitter. `embedding_hard_limit` is an
/// absolute ceiling applied regardless of `max_tokens`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChunkingConfig {
    pub min_tokens: usize,
    pub max_tokens: usize,
    pub overlap_tokens: usize,
    pub embedding_hard_limit: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            min_tokens: parse_env_or("CHUNK_MIN_TOKENS", 128),
            max_tokens: parse_env_or("CHUNK_MAX_TOKENS", 1024),
            overlap_tokens: parse_env_or("CHUNK_OVERLAP_TOKENS", 80),
            embedding_hard_limit: parse_env_or("CHUNK_EMBEDDING_HARD_LIMIT", 8000),
        }
    }
}

/// Thresholds for the noise filter. Defaults err on the side of keeping
/// content.
#[derive(Debug, Clone, Deserialize)]
pub struct NoiseConfig {
    /// A normalized block text repeated at least this many times is treated
    /// as a running header/footer.
    pub repeat_threshold: usize,
    /// If TOC detection would flag more than this fraction of all blocks,
    /// the whole TOC flag set is discarded.
    pub toc_max_ratio: f64,
    /// Blocks shorter than this many characters are dropped.
    pub min_content_len: usize,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            repeat_threshold: parse_env_or("NOISE_REPEAT_THRESHOLD", 3),
            toc_max_ratio: parse_env_or("NOISE_TOC_MAX_RATIO", 0.3),
            min_content_len: parse_env_or("NOISE_MIN_CONTENT_LEN", 3),
        }
    }
}

/// Thresholds for the heuristic-vs-LLM chunking gate.
#[derive(Debug, Clone, Deserialize)]
pub struct GateConfig {
    /// Paragraphs shorter than this many characters count as "short".
    pub short_para_chars: usize,
    /// Paragraph-length standard deviation above which LLM chunking is
    /// recommended for heading+paragraph documents.
    pub length_std_dev_threshold: f64,
    /// Short-paragraph ratio above which LLM chunking is recommended.
    pub short_ratio_threshold: f64,
    /// Consecutive short paragraphs at or above this count trigger LLM
    /// chunking.
    pub short_run_threshold: usize,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            short_para_chars: parse_env_or("GATE_SHORT_PARA_CHARS", 50),
            length_std_dev_threshold: parse_env_or("GATE_LENGTH_STD_DEV", 100.0),
            short_ratio_threshold: parse_env_or("GATE_SHORT_RATIO", 0.4),
            short_run_threshold: parse_env_or("GATE_SHORT_RUN", 5),
        }
    }
}

/// Localized section labels used by the API structure detector.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeywords {
    pub parameters: Vec<String>,
    pub response: Vec<String>,
    pub example: Vec<String>,
    /// Blocks scanned after a heading when looking for endpoints.
    pub endpoint_lookahead: usize,
}

impl Default for ApiKeywords {
    fn default() -> Self {
        Self {
            parameters: [
                "parameter",
                "parameters",
                "param",
                "params",
                "request param",
                "请求参数",
                "参数",
                "入参",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            response: [
                "response",
                "responses",
                "return",
                "returns",
                "返回",
                "响应",
                "出参",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            example: ["example", "examples", "sample", "示例", "样例", "例子"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            endpoint_lookahead: parse_env_or("API_ENDPOINT_LOOKAHEAD", 5),
        }
    }
}

/// Top-level configuration for one pipeline instance.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    pub chunking: ChunkingConfig,
    pub noise: NoiseConfig,
    pub gate: GateConfig,
    pub api_keywords: ApiKeywords,
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}
