use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::infrastructure::error::SiteError;

/// 下载的压缩包文件名
pub const ARCHIVE_NAME: &str = "parser.zip";
/// 压缩包内的根目录
pub const ARCHIVE_ROOT: &str = "src";

/// 打包好的生成文件
#[derive(Debug, Clone)]
pub struct OutputArchive {
    bytes: Vec<u8>,
    entries: Vec<String>,
}

impl OutputArchive {
    /// 把 (文件名, 内容) 依次写入 `src/` 下
    pub fn build<'a, I>(files: I) -> Result<Self, SiteError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut entries = Vec::new();

        for (name, content) in files {
            let entry = format!("{}/{}", ARCHIVE_ROOT, name);
            writer.start_file(entry.as_str(), options)?;
            writer.write_all(content.as_bytes())?;
            entries.push(entry);
        }

        let bytes = writer.finish()?.into_inner();
        tracing::debug!(files = entries.len(), bytes = bytes.len(), "Built output archive");

        Ok(Self { bytes, entries })
    }

    pub fn name(&self) -> &'static str {
        ARCHIVE_NAME
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// 保存到目录下，返回写入的路径
    pub fn save_to(&self, dir: &Path) -> Result<PathBuf, SiteError> {
        let path = dir.join(ARCHIVE_NAME);
        std::fs::write(&path, &self.bytes).map_err(|e| {
            SiteError::file_system(format!("Unable to save archive: {}", e), Some(path.display().to_string()))
        })?;

        tracing::info!(path = %path.display(), "Saved generated parser archive");
        Ok(path)
    }
}
