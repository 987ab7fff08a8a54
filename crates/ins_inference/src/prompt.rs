use ins_core::Article;

/// The analysis prompt for one article. Same article, same prompt.
pub fn build_prompt(article: &Article) -> String {
    format!(
        r#"You are a market analyst specialised in Artificial Intelligence and Computer Vision.
Analyse the news item below and reply with ONLY a JSON object with these fields:

{{
  "relevant": true/false,
  "reason": "why the item is or is not relevant",
  "category": "PRODUCT/PARTNERSHIP/STRATEGY",
  "suggested_action": "recommended action for our team",
  "confidence": 0.0-1.0,
  "summary": "executive summary in 2-3 lines",
  "keywords": "extracted keywords, comma separated"
}}

RELEVANCE CRITERIA:
- Related to AI, Computer Vision, Machine Learning or Deep Learning
- New products, technologies or innovations
- Partnership or collaboration opportunities
- Strategic market moves
- Competitors or companies in the sector

CATEGORIES:
- PRODUCT: new products, technologies, innovations
- PARTNERSHIP: partnership opportunities, collaborations
- STRATEGY: strategic moves, trends, market shifts

TITLE: {}
DESCRIPTION: {}
SOURCE: {}
URL: {}
"#,
        article.title, article.description, article.source, article.url
    )
}

/// A one-sentence headline request, used to check the model answers at all.
pub fn build_headline_prompt(title: &str) -> String {
    format!(
        "Act as a creative news editor. Write a single punchy one-sentence headline for a \
         news item titled '{}'. Reply with ONLY the headline text, no quotes or preamble.",
        title
    )
}
