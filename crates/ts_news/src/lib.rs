pub mod extract;
pub mod trends;

pub use extract::HttpArticleExtractor;
pub use trends::NewsApiClient;

pub mod prelude {
    pub use super::extract::{extract_text, validate_url, HttpArticleExtractor};
    pub use super::trends::NewsApiClient;
    pub use ts_core::{ArticleExtractor, NewsSource, Result, Error};
}
