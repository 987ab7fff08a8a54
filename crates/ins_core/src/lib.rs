pub mod error;
pub mod models;
pub mod paging;
pub mod storage;
pub mod types;

pub use error::Error;
pub use models::InferenceModel;
pub use paging::{
    InsightFilter, Page, PageRequest, Sort, SortDirection, SortField, DEFAULT_PAGE_SIZE,
    MAX_PAGE_SIZE,
};
pub use storage::{ArticleStorage, InsightStorage, Storage};
pub use types::{
    AnalysisResult, Article, ArticleRef, Category, ConfidenceTier, Insight, InsightView,
    NewArticle, NewInsight, ProcessingStatus,
};

pub type Result<T> = std::result::Result<T, Error>;

/// Confidence at or above this score counts as "high confidence".
pub const HIGH_CONFIDENCE: f64 = 0.8;

/// Confidence at or above this score (and below [`HIGH_CONFIDENCE`]) is "medium".
pub const MEDIUM_CONFIDENCE: f64 = 0.5;
