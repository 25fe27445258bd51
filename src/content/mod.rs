//! 文档页内容：章节顺序来自 `order.json`，语言列表来自 `languages.json`。

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::infrastructure::error::SiteError;

/// 文档章节
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub name: String,
    pub content: String,
    pub subsections: Vec<String>,
}

/// `order.json` 中的一项；缺字段的条目会被跳过
#[derive(Debug, Deserialize)]
struct OrderEntry {
    name: Option<String>,
    filename: Option<String>,
    #[serde(default)]
    subsections: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct OrderFile {
    files: Vec<OrderEntry>,
}

#[derive(Debug, Deserialize)]
struct LanguagesFile {
    languages: Vec<String>,
}

/// 启动时加载的站点内容
#[derive(Debug, Clone, Default, Serialize)]
pub struct SiteContent {
    pub sections: Vec<Section>,
    pub languages: Vec<String>,
}

impl SiteContent {
    /// 从内容目录加载
    pub fn load(content_dir: &Path) -> Result<Self, SiteError> {
        let order: OrderFile = read_json(content_dir, "order.json")?;

        let mut sections = Vec::with_capacity(order.files.len());
        for entry in order.files {
            let (name, filename) = match (entry.name, entry.filename) {
                (Some(name), Some(filename)) => (name, filename),
                _ => {
                    tracing::warn!("Missing name or filename in order.json");
                    continue;
                }
            };

            let path = content_dir.join(&filename);
            let content = std::fs::read_to_string(&path).map_err(|e| {
                SiteError::content(format!("Unable to read section '{}': {}", name, e), filename.clone())
            })?;

            sections.push(Section {
                name,
                content,
                subsections: entry.subsections,
            });
        }

        let languages: LanguagesFile = read_json(content_dir, "languages.json")?;

        tracing::info!(
            sections = sections.len(),
            languages = languages.languages.len(),
            "Loaded documentation content"
        );

        Ok(Self {
            sections,
            languages: languages.languages,
        })
    }

    /// 传给前端脚本的全局变量
    pub fn globals(&self) -> serde_json::Value {
        serde_json::json!({ "languages": self.languages })
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(dir: &Path, file: &str) -> Result<T, SiteError> {
    let path = dir.join(file);
    let raw = std::fs::read_to_string(&path)
        .map_err(|e| SiteError::content(format!("Unable to read: {}", e), file))?;
    serde_json::from_str(&raw).map_err(|e| SiteError::content(format!("Invalid JSON: {}", e), file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn content_dir(order: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("order.json"), order).unwrap();
        std::fs::write(dir.path().join("languages.json"), r#"{"languages": ["python", "java", "c++"]}"#).unwrap();
        std::fs::write(dir.path().join("intro.html"), "<h1>Intro</h1>").unwrap();
        std::fs::write(dir.path().join("format.html"), "<h1>Format</h1>").unwrap();
        dir
    }

    #[test]
    fn test_load_sections_in_order() {
        let dir = content_dir(
            r#"{"files": [
                {"name": "Introduction", "filename": "intro.html"},
                {"name": "Format", "filename": "format.html", "subsections": ["Head", "Body"]}
            ]}"#,
        );

        let content = SiteContent::load(dir.path()).unwrap();
        assert_eq!(content.sections.len(), 2);
        assert_eq!(content.sections[0].name, "Introduction");
        assert!(content.sections[0].subsections.is_empty());
        assert_eq!(content.sections[1].content, "<h1>Format</h1>");
        assert_eq!(content.sections[1].subsections, vec!["Head", "Body"]);
        assert_eq!(content.languages, vec!["python", "java", "c++"]);
    }

    #[test]
    fn test_incomplete_entries_are_skipped() {
        let dir = content_dir(
            r#"{"files": [
                {"name": "Nameless file"},
                {"filename": "intro.html"},
                {"name": "Introduction", "filename": "intro.html"}
            ]}"#,
        );

        let content = SiteContent::load(dir.path()).unwrap();
        assert_eq!(content.sections.len(), 1);
    }

    #[test]
    fn test_missing_section_file_is_an_error() {
        let dir = content_dir(r#"{"files": [{"name": "Gone", "filename": "gone.html"}]}"#);
        let err = SiteContent::load(dir.path()).unwrap_err();
        assert!(matches!(err, SiteError::Content { ref file, .. } if file == "gone.html"));
    }

    #[test]
    fn test_globals() {
        let content = SiteContent {
            sections: Vec::new(),
            languages: vec!["python".to_string()],
        };
        assert_eq!(content.globals(), serde_json::json!({"languages": ["python"]}));
    }
}
