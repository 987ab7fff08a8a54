use ins_core::{Category, InsightFilter, ProcessingStatus, Result, Storage};
use std::fmt::Write;

/// Plain-text report of collection, analysis and per-model counts.
pub async fn system_stats(store: &dyn Storage) -> Result<String> {
    let mut out = String::new();

    let total = store.count_articles().await?;
    let _ = writeln!(out, "=== Collection ===");
    let _ = writeln!(out, "Total articles: {}", total);
    for status in ProcessingStatus::ALL {
        let count = store.count_by_status(status).await?;
        let _ = writeln!(out, "{}: {}", status.label(), count);
    }

    let analysed = store.count_insights(&InsightFilter::default()).await?;
    let relevant = store.count_insights(&InsightFilter::relevant_only()).await?;
    let percentage = if analysed > 0 {
        relevant as f64 * 100.0 / analysed as f64
    } else {
        0.0
    };
    let _ = writeln!(out);
    let _ = writeln!(out, "=== Analysis ===");
    let _ = writeln!(out, "Total analysed: {}", analysed);
    let _ = writeln!(out, "Relevant: {} ({:.1}%)", relevant, percentage);
    for category in Category::ALL {
        let count = store
            .count_insights(&InsightFilter::by_category(category))
            .await?;
        let _ = writeln!(out, "{}: {}", category.label(), count);
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "=== Models ===");
    let models = store.count_by_model().await?;
    if models.is_empty() {
        let _ = writeln!(out, "No insights yet");
    }
    for (model, count) in models {
        let _ = writeln!(out, "{}: {}", model, count);
    }

    Ok(out)
}
