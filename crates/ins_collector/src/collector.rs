use ins_core::{Error, Result, Storage};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::sources::newsdata::NewsDataSource;
use crate::sources::{NewsSource, SourceArticle};
use crate::Config;

/// Pulls search hits for every configured keyword and stores the new ones as `PENDING`.
pub struct Collector {
    store: Arc<dyn Storage>,
    source: Arc<dyn NewsSource>,
    keywords: Vec<String>,
    keyword_delay: Duration,
}

impl Collector {
    pub fn new(
        store: Arc<dyn Storage>,
        source: Arc<dyn NewsSource>,
        keywords: Vec<String>,
        keyword_delay: Duration,
    ) -> Self {
        Self {
            store,
            source,
            keywords,
            keyword_delay,
        }
    }

    /// Collector backed by NewsData.io with the keywords and pacing from `config`.
    pub fn from_config(store: Arc<dyn Storage>, config: Config) -> Result<Self> {
        let keywords = config.keywords.clone();
        let keyword_delay = config.keyword_delay;
        let source = NewsDataSource::new(config)?;
        Ok(Self::new(store, Arc::new(source), keywords, keyword_delay))
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Run every keyword in order. A failing keyword counts as zero.
    pub async fn collect_all(&self) -> Result<usize> {
        info!("📡 Collecting news for {} keywords", self.keywords.len());

        let mut total = 0;
        for (i, keyword) in self.keywords.iter().enumerate() {
            if i > 0 && !self.keyword_delay.is_zero() {
                tokio::time::sleep(self.keyword_delay).await;
            }
            let collected = self.collect_keyword(keyword).await;
            info!("🔑 {} new articles for '{}'", collected, keyword);
            total += collected;
        }

        info!("✅ Collection finished, {} new articles", total);
        Ok(total)
    }

    /// Search one topic without storing anything.
    pub async fn search_only(&self, topic: &str) -> Result<Vec<SourceArticle>> {
        if !self.source.is_configured() {
            return Err(Error::Config(format!(
                "{} is not configured (missing API key)",
                self.source.name()
            )));
        }
        self.source.search(topic).await
    }

    /// Search one keyword and store the valid, unseen hits. Never fails.
    pub async fn collect_keyword(&self, keyword: &str) -> usize {
        if !self.source.is_configured() {
            warn!(
                "⚠️ {} is not configured (missing API key), skipping '{}'",
                self.source.name(),
                keyword
            );
            return 0;
        }

        let hits = match self.source.search(keyword).await {
            Ok(hits) => hits,
            Err(e) => {
                error!("❌ Search for '{}' failed: {}", keyword, e);
                return 0;
            }
        };

        let mut stored = 0;
        for hit in hits {
            match self.store_hit(hit, keyword).await {
                Ok(true) => stored += 1,
                Ok(false) => {}
                Err(e) => error!("❌ Failed to store article for '{}': {}", keyword, e),
            }
        }
        stored
    }

    async fn store_hit(&self, hit: SourceArticle, keyword: &str) -> Result<bool> {
        let title = hit.short_title(50);
        let Some(article) = hit.into_new_article(keyword, self.source.name()) else {
            debug!("Skipping incomplete article: {}", title);
            return Ok(false);
        };
        if self.store.exists_by_url(&article.url).await? {
            debug!("Skipping duplicate article: {}", title);
            return Ok(false);
        }
        let saved = self.store.insert_article(&article).await?;
        debug!("💾 Stored article {} - {}", saved.id, title);
        Ok(true)
    }
}
