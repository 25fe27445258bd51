use std::path::Path;

use super::{GeneratedFile, GenerationPayload, GenerationResult};
use crate::infrastructure::error::SiteError;

const UTIL_FILE_PREFIX: &str = "InstaParseUtil.";
const DATA_FILE_PREFIX: &str = "InstaParseData.";

/// 文件在生成结果中的角色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceRole {
    Main,
    Util,
    Data,
    Class,
}

/// 按文件名判断角色
pub fn classify(file_name: &str, main_name: &str) -> SourceRole {
    if file_name.contains(&format!("{}.", main_name)) {
        SourceRole::Main
    } else if file_name.contains(UTIL_FILE_PREFIX) {
        SourceRole::Util
    } else if file_name.contains(DATA_FILE_PREFIX) {
        SourceRole::Data
    } else {
        SourceRole::Class
    }
}

/// 收集编译器在 `dir` 中产生的源文件，跳过格式文件本身。
///
/// 返回的内容已做百分号编码，可以直接写入响应。
pub async fn collect_sources(
    dir: &Path,
    format_file_name: &str,
    main_name: &str,
) -> Result<GenerationResult, SiteError> {
    let mut main = None;
    let mut util = None;
    let mut data = None;
    let mut classes = Vec::new();

    let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| {
        SiteError::file_system(
            format!("Unable to list generated sources: {}", e),
            Some(dir.display().to_string()),
        )
    })?;

    while let Some(entry) = entries.next_entry().await? {
        let file_name = entry.file_name().to_string_lossy().to_string();
        if file_name == format_file_name || !entry.file_type().await?.is_file() {
            continue;
        }

        let content = tokio::fs::read_to_string(entry.path()).await.map_err(|e| {
            SiteError::file_system(
                format!("Unable to read generated source: {}", e),
                Some(entry.path().display().to_string()),
            )
        })?;
        let file = GeneratedFile::new(file_name.as_str(), content).encoded();

        match classify(&file_name, main_name) {
            SourceRole::Main => assign_role(&mut main, file, &format!("{}.", main_name), SourceRole::Main),
            SourceRole::Util => assign_role(&mut util, file, UTIL_FILE_PREFIX, SourceRole::Util),
            SourceRole::Data => assign_role(&mut data, file, DATA_FILE_PREFIX, SourceRole::Data),
            SourceRole::Class => classes.push(file),
        }
    }

    // read_dir 的顺序不确定
    classes.sort_by(|a, b| a.name.cmp(&b.name));

    let main = main.ok_or_else(|| SiteError::compiler("compiler produced no main file"))?;
    let util = util.ok_or_else(|| SiteError::compiler("compiler produced no util file"))?;
    let payload = match (data, classes.is_empty()) {
        (Some(data), true) => GenerationPayload::Data(data),
        (None, false) => GenerationPayload::Classes(classes),
        (Some(_), false) => {
            return Err(SiteError::compiler("compiler produced both a data file and class files"))
        }
        (None, true) => {
            return Err(SiteError::compiler("compiler produced neither a data file nor class files"))
        }
    };

    tracing::debug!(
        main = %main.name,
        files = 2 + payload.files().len(),
        "Collected generated sources"
    );

    Ok(GenerationResult { main, util, payload })
}

/// 同一角色出现多个文件时，以 `prefix` 开头的文件优先，其余的被丢弃
fn assign_role(slot: &mut Option<GeneratedFile>, file: GeneratedFile, prefix: &str, role: SourceRole) {
    match slot {
        None => *slot = Some(file),
        Some(current) => {
            let replace = file.name.starts_with(prefix) && !current.name.starts_with(prefix);
            let (kept, dropped) = if replace {
                (file.name.as_str(), current.name.as_str())
            } else {
                (current.name.as_str(), file.name.as_str())
            };
            tracing::warn!(?role, kept, dropped, "Multiple generated files match the same role");
            if replace {
                *slot = Some(file);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) {
        std::fs::write(dir.path().join(name), content).unwrap();
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("Main.py", "Main"), SourceRole::Main);
        assert_eq!(classify("InstaParseUtil.h", "Main"), SourceRole::Util);
        assert_eq!(classify("InstaParseData.py", "Main"), SourceRole::Data);
        assert_eq!(classify("Point.java", "Main"), SourceRole::Class);
        // 主文件名匹配需要带上扩展名分隔符
        assert_eq!(classify("MainWindow.java", "Main"), SourceRole::Class);
    }

    #[tokio::test]
    async fn test_collect_python_sources() {
        let dir = TempDir::new().unwrap();
        write(&dir, "format.instaparse", "<head>\n");
        write(&dir, "Main.py", "print 'hi'\n");
        write(&dir, "InstaParseUtil.py", "def parseInt(): pass\n");
        write(&dir, "InstaParseData.py", "class Data: pass\n");

        let result = collect_sources(dir.path(), "format.instaparse", "Main").await.unwrap();
        assert_eq!(result.main.name, "Main.py");
        assert_eq!(result.main.content, "print%20'hi'%0A");
        assert_eq!(result.util.name, "InstaParseUtil.py");
        assert!(matches!(result.payload, GenerationPayload::Data(ref f) if f.name == "InstaParseData.py"));
        assert_eq!(result.file_count(), 3);
    }

    #[tokio::test]
    async fn test_collect_java_sources_sorted() {
        let dir = TempDir::new().unwrap();
        write(&dir, "format.instaparse", "");
        write(&dir, "Main.java", "");
        write(&dir, "InstaParseUtil.java", "");
        write(&dir, "Zeta.java", "");
        write(&dir, "Alpha.java", "");

        let result = collect_sources(dir.path(), "format.instaparse", "Main").await.unwrap();
        let names: Vec<&str> = result.payload.files().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha.java", "Zeta.java"]);
    }

    #[tokio::test]
    async fn test_collect_prefers_exact_main_name() {
        let dir = TempDir::new().unwrap();
        write(&dir, "AMain.java", "class AMain {}");
        write(&dir, "Main.java", "class Main {}");
        write(&dir, "XMain.java", "class XMain {}");
        write(&dir, "InstaParseUtil.java", "");
        write(&dir, "Point.java", "");

        let result = collect_sources(dir.path(), "format.instaparse", "Main").await.unwrap();
        assert_eq!(result.main.name, "Main.java");
        let names: Vec<&str> = result.payload.files().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Point.java"]);
    }

    #[tokio::test]
    async fn test_collect_requires_main_and_util() {
        let dir = TempDir::new().unwrap();
        write(&dir, "InstaParseData.py", "");
        let err = collect_sources(dir.path(), "format.instaparse", "Main").await.unwrap_err();
        assert!(err.to_string().contains("main"));
    }

    #[tokio::test]
    async fn test_collect_rejects_mixed_payload() {
        let dir = TempDir::new().unwrap();
        write(&dir, "Main.py", "");
        write(&dir, "InstaParseUtil.py", "");
        write(&dir, "InstaParseData.py", "");
        write(&dir, "Extra.py", "");
        assert!(collect_sources(dir.path(), "format.instaparse", "Main").await.is_err());
    }
}
