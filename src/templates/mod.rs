//! Crawl templates (SUPPLEMENT, spec §6 "Crawl templates on disk"),
//! grounded 1:1 in `original_source/include/search_engine/crawler/
//! templates/{TemplateTypes,TemplateRegistry,TemplateValidator,
//! TemplateApplier,PrebuiltTemplates}.h`.

pub mod prebuilt;

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::models::CrawlConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlConfigOverrides {
    pub max_pages: Option<usize>,
    pub max_depth: Option<u32>,
    pub spa_rendering_enabled: Option<bool>,
    pub extract_text_content: Option<bool>,
    pub politeness_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectorPatterns {
    #[serde(default)]
    pub article_selectors: Vec<String>,
    #[serde(default)]
    pub title_selectors: Vec<String>,
    #[serde(default)]
    pub content_selectors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateDefinition {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub config: CrawlConfigOverrides,
    #[serde(default)]
    pub patterns: SelectorPatterns,
}

/// Lowercases and trims a proposed template name (spec §6: "lowercased on
/// persist").
pub fn normalize_template_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// `name` must be 1..50 chars, `[A-Za-z0-9_-]` (spec §6).
pub fn is_valid_template_name(name: &str) -> bool {
    !name.is_empty() && name.len() <= 50 && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Validates a parsed [`TemplateDefinition`] against spec §6's bounds,
/// mirroring `TemplateValidator::validateTemplateJson`'s numeric caps.
pub fn validate_template(def: &TemplateDefinition) -> Result<()> {
    if !is_valid_template_name(&def.name) {
        return Err(CoreError::InvalidRequest {
            field: "name".to_string(),
            message: "name must be 1-50 characters, alphanumeric with hyphens/underscores only".to_string(),
        });
    }
    if let Some(max_pages) = def.config.max_pages {
        if max_pages == 0 || max_pages > 10_000 {
            return Err(CoreError::InvalidRequest {
                field: "config.maxPages".to_string(),
                message: "config.maxPages must be between 1 and 10000".to_string(),
            });
        }
    }
    if let Some(max_depth) = def.config.max_depth {
        if max_depth == 0 || max_depth > 10 {
            return Err(CoreError::InvalidRequest {
                field: "config.maxDepth".to_string(),
                message: "config.maxDepth must be between 1 and 10".to_string(),
            });
        }
    }
    if let Some(delay_ms) = def.config.politeness_delay_ms {
        if delay_ms > 60_000 {
            return Err(CoreError::InvalidRequest {
                field: "config.politenessDelay".to_string(),
                message: "config.politenessDelay must be between 0 and 60000 ms".to_string(),
            });
        }
    }
    Ok(())
}

/// Merges a template's overrides onto a [`CrawlConfig`] (spec §6),
/// mirroring `applyTemplateToConfig`.
pub fn apply_template(def: &TemplateDefinition, cfg: &mut CrawlConfig) {
    if let Some(max_pages) = def.config.max_pages {
        cfg.max_pages = max_pages;
    }
    if let Some(max_depth) = def.config.max_depth {
        cfg.max_depth = max_depth;
    }
    if let Some(delay_ms) = def.config.politeness_delay_ms {
        cfg.politeness_delay = std::time::Duration::from_millis(delay_ms);
    }
    if let Some(spa) = def.config.spa_rendering_enabled {
        cfg.spa_rendering_enabled = spa;
    }
    if let Some(extract) = def.config.extract_text_content {
        cfg.extract_text_content = extract;
    }

    if !def.patterns.article_selectors.is_empty() {
        cfg.selectors.article_selectors = def.patterns.article_selectors.clone();
    }
    if !def.patterns.title_selectors.is_empty() {
        cfg.selectors.title_selectors = def.patterns.title_selectors.clone();
    }
    if !def.patterns.content_selectors.is_empty() {
        cfg.selectors.content_selectors = def.patterns.content_selectors.clone();
    }
}

/// In-process registry of named templates, matching `TemplateRegistry`'s
/// singleton-map shape with one coarse mutex.
pub struct TemplateRegistry {
    templates: Mutex<HashMap<String, TemplateDefinition>>,
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self { templates: Mutex::new(HashMap::new()) }
    }

    /// Builds a registry pre-seeded with the seven prebuilt templates
    /// (spec §6), then merges any on-disk templates found at `path`.
    pub fn seeded(path: Option<&Path>) -> Result<Self> {
        let registry = Self::new();
        for def in prebuilt::seed_templates() {
            registry.upsert(def).expect("prebuilt templates are always valid");
        }
        if let Some(path) = path {
            for def in load_from_path(path)? {
                registry.upsert(def)?;
            }
        }
        Ok(registry)
    }

    pub fn upsert(&self, mut def: TemplateDefinition) -> Result<()> {
        def.name = normalize_template_name(&def.name);
        validate_template(&def)?;
        self.templates.lock().unwrap().insert(def.name.clone(), def);
        Ok(())
    }

    pub fn remove(&self, name: &str) -> bool {
        self.templates.lock().unwrap().remove(&normalize_template_name(name)).is_some()
    }

    pub fn get(&self, name: &str) -> Option<TemplateDefinition> {
        self.templates.lock().unwrap().get(&normalize_template_name(name)).cloned()
    }

    pub fn list(&self) -> Vec<TemplateDefinition> {
        self.templates.lock().unwrap().values().cloned().collect()
    }
}

/// Loads `.json` template files from a directory, or a single `.json` file
/// (spec §6: "directory or single JSON file").
pub fn load_from_path(path: &Path) -> Result<Vec<TemplateDefinition>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let files: Vec<_> = if path.is_dir() {
        fs::read_dir(path)
            .map_err(|e| CoreError::Other(e.into()))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
            .collect()
    } else {
        vec![path.to_path_buf()]
    };

    let mut defs = Vec::with_capacity(files.len());
    for file in files {
        let raw = fs::read_to_string(&file).map_err(|e| CoreError::Other(e.into()))?;
        let def: TemplateDefinition = serde_json::from_str(&raw).map_err(|e| CoreError::Other(e.into()))?;
        validate_template(&def)?;
        defs.push(def);
    }
    Ok(defs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_overlong_template_names() {
        let def = TemplateDefinition {
            name: "a".repeat(51),
            description: String::new(),
            config: CrawlConfigOverrides::default(),
            patterns: SelectorPatterns::default(),
        };
        assert!(validate_template(&def).is_err());
    }

    #[test]
    fn rejects_out_of_range_max_pages() {
        let def = TemplateDefinition {
            name: "custom".to_string(),
            description: String::new(),
            config: CrawlConfigOverrides { max_pages: Some(20_000), ..Default::default() },
            patterns: SelectorPatterns::default(),
        };
        assert!(validate_template(&def).is_err());
    }

    #[test]
    fn apply_template_overrides_only_set_fields() {
        let def = TemplateDefinition {
            name: "news".to_string(),
            description: String::new(),
            config: CrawlConfigOverrides { max_pages: Some(500), ..Default::default() },
            patterns: SelectorPatterns::default(),
        };
        let mut cfg = CrawlConfig::default();
        let original_depth = cfg.max_depth;
        apply_template(&def, &mut cfg);
        assert_eq!(cfg.max_pages, 500);
        assert_eq!(cfg.max_depth, original_depth);
    }

    #[test]
    fn registry_seeds_seven_prebuilt_templates() {
        let registry = TemplateRegistry::seeded(None).unwrap();
        assert_eq!(registry.list().len(), 7);
        assert!(registry.get("news-site").is_some());
    }

    #[test]
    fn registry_normalizes_names_on_lookup() {
        let registry = TemplateRegistry::new();
        registry.upsert(TemplateDefinition {
            name: "  MyTemplate  ".to_string(),
            description: "x".to_string(),
            config: CrawlConfigOverrides::default(),
            patterns: SelectorPatterns::default(),
        }).unwrap();
        assert!(registry.get("mytemplate").is_some());
    }
}
