//! 代码生成的领域模型：目标语言、生成文件以及 `/gencode` 的响应格式。
//!
//! 服务端与客户端共用这里的类型，保证线上格式只有一处定义。

pub mod collect;
pub mod compiler;
pub mod encoding;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::infrastructure::error::SiteError;

pub use collect::collect_sources;
pub use compiler::{InstaparseCompiler, SourceGenerator};

/// 目标语言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "python")]
    Python,
    #[serde(rename = "java")]
    Java,
    #[serde(rename = "c++")]
    Cpp,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::Python, Language::Java, Language::Cpp];

    /// 线上及命令行使用的名称
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Java => "java",
            Language::Cpp => "c++",
        }
    }

    /// 根据输出文件扩展名推断语言，未知扩展名返回 None
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "py" => Some(Language::Python),
            "java" => Some(Language::Java),
            "c" | "cc" | "cpp" => Some(Language::Cpp),
            _ => None,
        }
    }

    /// 根据输出文件名推断语言；没有扩展名时默认 Python
    pub fn infer_from_output(output_name: &str) -> Option<Self> {
        match output_name.find('.') {
            None => Some(Language::Python),
            Some(index) => Self::from_extension(&output_name[index + 1..]),
        }
    }

    /// 编辑器的语法模式
    pub fn editor_mode(&self) -> &'static str {
        match self {
            Language::Java => "text/x-java",
            Language::Cpp => "text/x-c++hdr",
            Language::Python => "python",
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::Python
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = SiteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "python" => Ok(Language::Python),
            "java" => Ok(Language::Java),
            "c++" => Ok(Language::Cpp),
            other => Err(SiteError::unsupported_language(other)),
        }
    }
}

/// 单个生成文件，`content` 在线上是百分号编码的
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFile {
    pub name: String,
    pub content: String,
}

impl GeneratedFile {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// 解码线上内容
    pub fn decoded(&self) -> Result<GeneratedFile, SiteError> {
        Ok(GeneratedFile {
            name: self.name.clone(),
            content: encoding::decode_content(&self.content)?,
        })
    }

    /// 编码为线上内容
    pub fn encoded(&self) -> GeneratedFile {
        GeneratedFile {
            name: self.name.clone(),
            content: encoding::encode_content(&self.content),
        }
    }
}

/// 主文件与工具文件之外的那部分输出：单个数据文件或一组类文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationPayload {
    Data(GeneratedFile),
    Classes(Vec<GeneratedFile>),
}

impl GenerationPayload {
    pub fn files(&self) -> &[GeneratedFile] {
        match self {
            GenerationPayload::Data(file) => std::slice::from_ref(file),
            GenerationPayload::Classes(files) => files,
        }
    }
}

/// 一次成功的代码生成结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireResult", into = "WireResult")]
pub struct GenerationResult {
    pub main: GeneratedFile,
    pub util: GeneratedFile,
    pub payload: GenerationPayload,
}

impl GenerationResult {
    /// 按 main、util、payload 的顺序返回全部文件
    pub fn files(&self) -> Vec<&GeneratedFile> {
        let mut files = vec![&self.main, &self.util];
        files.extend(self.payload.files());
        files
    }

    pub fn file_count(&self) -> usize {
        2 + self.payload.files().len()
    }

    /// 解码所有文件内容
    pub fn decoded(&self) -> Result<GenerationResult, SiteError> {
        let payload = match &self.payload {
            GenerationPayload::Data(file) => GenerationPayload::Data(file.decoded()?),
            GenerationPayload::Classes(files) => GenerationPayload::Classes(
                files.iter().map(GeneratedFile::decoded).collect::<Result<_, _>>()?,
            ),
        };

        Ok(GenerationResult {
            main: self.main.decoded()?,
            util: self.util.decoded()?,
            payload,
        })
    }
}

/// 线上格式：`data` 与 `classes` 以可选字段出现
#[derive(Debug, Serialize, Deserialize)]
struct WireResult {
    main: GeneratedFile,
    util: GeneratedFile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<GeneratedFile>,
    #[serde(default)]
    classes: Vec<GeneratedFile>,
}

impl TryFrom<WireResult> for GenerationResult {
    type Error = String;

    fn try_from(wire: WireResult) -> Result<Self, Self::Error> {
        let payload = match (wire.data, wire.classes.is_empty()) {
            (Some(data), true) => GenerationPayload::Data(data),
            (None, false) => GenerationPayload::Classes(wire.classes),
            (Some(_), false) => return Err("response carries both data and classes".to_string()),
            (None, true) => return Err("response carries neither data nor classes".to_string()),
        };

        Ok(GenerationResult {
            main: wire.main,
            util: wire.util,
            payload,
        })
    }
}

impl From<GenerationResult> for WireResult {
    fn from(result: GenerationResult) -> Self {
        let (data, classes) = match result.payload {
            GenerationPayload::Data(file) => (Some(file), Vec::new()),
            GenerationPayload::Classes(files) => (None, files),
        };

        WireResult {
            main: result.main,
            util: result.util,
            data,
            classes,
        }
    }
}

/// `/gencode` 的完整响应：失败时只有 `error` 字段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GencodeResponse {
    Failure { error: String },
    Success(GenerationResult),
}

impl GencodeResponse {
    pub fn into_result(self) -> Result<GenerationResult, String> {
        match self {
            GencodeResponse::Success(result) => Ok(result),
            GencodeResponse::Failure { error } => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_language_parsing() {
        assert_eq!("python".parse::<Language>().unwrap(), Language::Python);
        assert_eq!("c++".parse::<Language>().unwrap(), Language::Cpp);
        assert!("cobol".parse::<Language>().is_err());
        assert_eq!(Language::Cpp.to_string(), "c++");
    }

    #[test]
    fn test_language_inference() {
        assert_eq!(Language::infer_from_output("out"), Some(Language::Python));
        assert_eq!(Language::infer_from_output("Parser.java"), Some(Language::Java));
        assert_eq!(Language::infer_from_output("parser.cc"), Some(Language::Cpp));
        assert_eq!(Language::infer_from_output("parser.rs"), None);
    }

    #[test]
    fn test_editor_modes() {
        assert_eq!(Language::Java.editor_mode(), "text/x-java");
        assert_eq!(Language::Cpp.editor_mode(), "text/x-c++hdr");
        assert_eq!(Language::Python.editor_mode(), "python");
    }

    #[test]
    fn test_data_response_deserializes() {
        let value = json!({
            "main": {"name": "Main.py", "content": "a"},
            "util": {"name": "InstaParseUtil.py", "content": "b"},
            "data": {"name": "InstaParseData.py", "content": "c"},
            "classes": []
        });
        let response: GencodeResponse = serde_json::from_value(value).unwrap();
        let result = response.into_result().unwrap();
        assert_eq!(result.file_count(), 3);
        assert!(matches!(result.payload, GenerationPayload::Data(ref f) if f.name == "InstaParseData.py"));
    }

    #[test]
    fn test_classes_response_deserializes() {
        let value = json!({
            "main": {"name": "Main.java", "content": "a"},
            "util": {"name": "InstaParseUtil.java", "content": "b"},
            "classes": [
                {"name": "A.java", "content": "x"},
                {"name": "B.java", "content": "y"}
            ]
        });
        let result = serde_json::from_value::<GencodeResponse>(value)
            .unwrap()
            .into_result()
            .unwrap();
        assert_eq!(result.file_count(), 4);
        match result.payload {
            GenerationPayload::Classes(files) => assert_eq!(files.len(), 2),
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[test]
    fn test_error_response_deserializes() {
        let response: GencodeResponse =
            serde_json::from_value(json!({"error": "parse failure"})).unwrap();
        assert_eq!(response.into_result().unwrap_err(), "parse failure");
    }

    #[test]
    fn test_ambiguous_payload_rejected() {
        let both = json!({
            "main": {"name": "Main.py", "content": ""},
            "util": {"name": "InstaParseUtil.py", "content": ""},
            "data": {"name": "InstaParseData.py", "content": ""},
            "classes": [{"name": "A.py", "content": ""}]
        });
        assert!(serde_json::from_value::<GencodeResponse>(both).is_err());

        let neither = json!({
            "main": {"name": "Main.py", "content": ""},
            "util": {"name": "InstaParseUtil.py", "content": ""}
        });
        assert!(serde_json::from_value::<GencodeResponse>(neither).is_err());
    }

    #[test]
    fn test_serialized_shape() {
        let result = GenerationResult {
            main: GeneratedFile::new("Main.java", ""),
            util: GeneratedFile::new("InstaParseUtil.java", ""),
            payload: GenerationPayload::Classes(vec![GeneratedFile::new("A.java", "")]),
        };
        let value = serde_json::to_value(GencodeResponse::Success(result)).unwrap();
        assert!(value.get("data").is_none());
        assert_eq!(value["classes"][0]["name"], "A.java");
    }
}
