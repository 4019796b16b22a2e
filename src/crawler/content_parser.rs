//! Content Parser (C7): extract title, meta description, links, text from
//! HTML (spec §4.6). Grounded in the teacher's `extract_links` (`scraper`),
//! generalized to the full external-contract tuple.

use scraper::{Html, Selector};

use crate::models::SelectorLists;

#[derive(Debug, Clone, Default)]
pub struct ParsedContent {
    pub title: Option<String>,
    pub description: Option<String>,
    pub text_content: String,
    pub outbound_links: Vec<String>,
}

pub trait ContentParser: Send + Sync {
    fn parse(&self, html: &str, base_url: &str, selectors: &SelectorLists) -> ParsedContent;
}

pub struct ScraperContentParser;

impl ContentParser for ScraperContentParser {
    fn parse(&self, html: &str, base_url: &str, selectors: &SelectorLists) -> ParsedContent {
        let document = Html::parse_document(html);

        let title = first_selector_match(&document, &["title"])
            .or_else(|| first_selector_match(&document, &selector_strs(&selectors.title_selectors)));

        let description = Selector::parse(r#"meta[name="description"]"#)
            .ok()
            .and_then(|sel| document.select(&sel).next())
            .and_then(|el| el.value().attr("content"))
            .map(|s| s.to_string());

        let content_selectors = if selectors.content_selectors.is_empty() {
            vec!["body".to_string()]
        } else {
            selectors.content_selectors.clone()
        };
        let text_content = content_selectors
            .iter()
            .filter_map(|sel| Selector::parse(sel).ok())
            .flat_map(|sel| document.select(&sel).map(|el| el.text().collect::<Vec<_>>().join(" ")))
            .collect::<Vec<_>>()
            .join(" ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        let outbound_links = extract_links(&document, base_url);

        ParsedContent { title, description, text_content, outbound_links }
    }
}

fn selector_strs(values: &[String]) -> Vec<&str> {
    values.iter().map(|s| s.as_str()).collect()
}

fn first_selector_match(document: &Html, selectors: &[&str]) -> Option<String> {
    for raw in selectors {
        if let Ok(sel) = Selector::parse(raw) {
            if let Some(el) = document.select(&sel).next() {
                let text = el.text().collect::<Vec<_>>().join(" ").trim().to_string();
                if !text.is_empty() {
                    return Some(text);
                }
            }
        }
    }
    None
}

fn extract_links(document: &Html, base_url: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse("a") else { return Vec::new() };
    let Ok(base) = url::Url::parse(base_url) else { return Vec::new() };

    document
        .select(&selector)
        .filter_map(|el| el.value().attr("href"))
        .filter_map(|href| base.join(href).ok())
        .map(|u| u.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_title_description_and_links() {
        let html = r#"
            <html><head>
                <title>Hello World</title>
                <meta name="description" content="A test page">
            </head><body>
                <p>Some body text.</p>
                <a href="/relative">link</a>
                <a href="https://other.example.com/x">other</a>
            </body></html>
        "#;
        let parsed =
            ScraperContentParser.parse(html, "https://example.com/page", &SelectorLists::default());
        assert_eq!(parsed.title.as_deref(), Some("Hello World"));
        assert_eq!(parsed.description.as_deref(), Some("A test page"));
        assert!(parsed.text_content.contains("Some body text."));
        assert!(parsed.outbound_links.contains(&"https://example.com/relative".to_string()));
        assert!(parsed.outbound_links.contains(&"https://other.example.com/x".to_string()));
    }
}
