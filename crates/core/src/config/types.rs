use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// How long a finished search session stays pollable, in seconds.
    #[serde(default = "default_session_retention_secs")]
    pub session_retention_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            session_retention_secs: default_session_retention_secs(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

fn default_session_retention_secs() -> u64 {
    600
}

/// Upstream listing API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// API root (e.g., "https://phimapi.com")
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Paginated listing path, `?page=N` is appended
    #[serde(default = "default_listing_path")]
    pub listing_path: String,
    /// Detail path, `/{slug}` is appended
    #[serde(default = "default_detail_path")]
    pub detail_path: String,
    /// CDN root for relative poster/thumbnail paths
    #[serde(default = "default_image_base_url")]
    pub image_base_url: Option<String>,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            listing_path: default_listing_path(),
            detail_path: default_detail_path(),
            image_base_url: default_image_base_url(),
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_base_url() -> String {
    "https://phimapi.com".to_string()
}

fn default_listing_path() -> String {
    "/danh-sach/phim-moi-cap-nhat-v3".to_string()
}

fn default_detail_path() -> String {
    "/phim".to_string()
}

fn default_image_base_url() -> Option<String> {
    Some("https://phimimg.com".to_string())
}

fn default_timeout() -> u32 {
    30
}

fn default_user_agent() -> String {
    format!("phimbro/{}", env!("CARGO_PKG_VERSION"))
}

/// Progressive search tuning
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SearchConfig {
    /// Matches needed before the quick phase returns (default: 64)
    #[serde(default = "default_quick_threshold")]
    pub quick_threshold: usize,
    /// Quick-phase page ceiling when a keyword is involved (default: 50)
    #[serde(default = "default_keyword_scan_pages")]
    pub keyword_scan_pages: u32,
    /// Quick-phase page ceiling for category/country/year/type filters (default: 20)
    #[serde(default = "default_filter_scan_pages")]
    pub filter_scan_pages: u32,
    /// Upper bound on pages fetched by a full catalog scan (default: 500)
    #[serde(default = "default_full_scan_max_pages")]
    pub full_scan_max_pages: u32,
    /// Concurrent page requests per full-scan batch (default: 5)
    #[serde(default = "default_batch_concurrency")]
    pub batch_concurrency: usize,
    /// Delay before the background phase starts, in milliseconds (default: 50)
    #[serde(default = "default_background_delay_ms")]
    pub background_delay_ms: u64,
    /// Result page size used when the caller does not pass one (default: 24)
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
}

impl SearchConfig {
    pub fn background_delay(&self) -> Duration {
        Duration::from_millis(self.background_delay_ms)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            quick_threshold: default_quick_threshold(),
            keyword_scan_pages: default_keyword_scan_pages(),
            filter_scan_pages: default_filter_scan_pages(),
            full_scan_max_pages: default_full_scan_max_pages(),
            batch_concurrency: default_batch_concurrency(),
            background_delay_ms: default_background_delay_ms(),
            default_page_size: default_page_size(),
        }
    }
}

fn default_quick_threshold() -> usize {
    64
}

fn default_keyword_scan_pages() -> u32 {
    50
}

fn default_filter_scan_pages() -> u32 {
    20
}

fn default_full_scan_max_pages() -> u32 {
    500
}

fn default_batch_concurrency() -> usize {
    5
}

fn default_background_delay_ms() -> u64 {
    50
}

fn default_page_size() -> usize {
    24
}

/// Full-catalog snapshot cache
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CacheConfig {
    /// Snapshot lifetime in seconds (default: 300)
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
        }
    }
}

fn default_ttl_secs() -> u64 {
    300
}
