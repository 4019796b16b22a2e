//! The seven prebuilt crawl templates (spec §6), carrying the field values
//! from `original_source/include/search_engine/crawler/templates/
//! PrebuiltTemplates.h`'s `seedPrebuiltTemplates`.

use super::{CrawlConfigOverrides, SelectorPatterns, TemplateDefinition};

fn template(
    name: &str,
    description: &str,
    max_pages: usize,
    max_depth: u32,
    spa_rendering_enabled: bool,
    politeness_delay_ms: u64,
    article_selectors: &[&str],
    title_selectors: &[&str],
    content_selectors: &[&str],
) -> TemplateDefinition {
    TemplateDefinition {
        name: name.to_string(),
        description: description.to_string(),
        config: CrawlConfigOverrides {
            max_pages: Some(max_pages),
            max_depth: Some(max_depth),
            spa_rendering_enabled: Some(spa_rendering_enabled),
            extract_text_content: Some(true),
            politeness_delay_ms: Some(politeness_delay_ms),
        },
        patterns: SelectorPatterns {
            article_selectors: article_selectors.iter().map(|s| s.to_string()).collect(),
            title_selectors: title_selectors.iter().map(|s| s.to_string()).collect(),
            content_selectors: content_selectors.iter().map(|s| s.to_string()).collect(),
        },
    }
}

pub fn seed_templates() -> Vec<TemplateDefinition> {
    vec![
        template(
            "news-site",
            "Template for news websites",
            500,
            3,
            true,
            1000,
            &["article", ".post", ".story"],
            &["h1", ".headline", ".title"],
            &[".content", ".body", ".article-body"],
        ),
        template(
            "ecommerce-site",
            "Template for ecommerce product listings",
            800,
            4,
            false,
            800,
            &[".product", ".product-item", ".product-card"],
            &["h1", ".product-title", ".title"],
            &[".description", ".product-description", ".details"],
        ),
        template(
            "blog-site",
            "Template for personal blogs and content management systems",
            300,
            2,
            false,
            1200,
            &["article", ".post", ".blog-post", ".entry"],
            &["h1", ".post-title", ".entry-title", ".blog-title"],
            &[".content", ".post-content", ".entry-content", ".blog-content"],
        ),
        template(
            "corporate-site",
            "Template for business websites and corporate pages",
            150,
            2,
            false,
            1000,
            &[".page-content", ".main-content", ".content", ".page"],
            &["h1", ".page-title", ".title", ".heading"],
            &[".content", ".main-content", ".page-content", ".body"],
        ),
        template(
            "documentation-site",
            "Template for technical documentation and API references",
            1000,
            5,
            true,
            600,
            &[".documentation", ".doc-content", ".content", ".page"],
            &["h1", ".page-title", ".doc-title", ".title"],
            &[".content", ".doc-content", ".main-content", ".body"],
        ),
        template(
            "forum-site",
            "Template for discussion forums and community sites",
            400,
            3,
            false,
            1500,
            &[".post", ".topic", ".thread", ".message"],
            &["h1", ".post-title", ".topic-title", ".thread-title"],
            &[".content", ".post-content", ".message-content", ".body"],
        ),
        template(
            "social-media",
            "Template for social platforms and user-generated content",
            200,
            2,
            true,
            2000,
            &[".post", ".tweet", ".status", ".update"],
            &["h1", ".post-title", ".status-title", ".title"],
            &[".content", ".post-content", ".status-content", ".body"],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_all_seven_template_names() {
        let names: Vec<_> = seed_templates().into_iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            vec![
                "news-site",
                "ecommerce-site",
                "blog-site",
                "corporate-site",
                "documentation-site",
                "forum-site",
                "social-media",
            ]
        );
    }
}
