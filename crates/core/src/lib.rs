pub mod cache;
pub mod config;
pub mod filter;
pub mod metrics;
pub mod search;
pub mod testing;
pub mod upstream;

pub use cache::{CacheStats, CatalogCache, Clock, ManualClock, SystemClock};
pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use filter::{MovieFilter, MovieType, ScanKind};
pub use search::{
    BackgroundSearch, BackgroundState, FullResult, MovieService, ProgressiveSearch, QuickResult,
    ResultPage, SearchEngine, SearchError, SearchOptions, SortOrder,
};
pub use upstream::{
    CatalogPage, CatalogSource, FetchError, MovieDetail, MovieSummary, PhimApiClient,
};
