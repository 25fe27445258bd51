use std::path::{Component, Path, PathBuf};

use crate::infrastructure::error::SiteError;

/// 读取到的静态资源
#[derive(Debug, Clone)]
pub struct StaticAsset {
    pub body: Vec<u8>,
    pub content_type: String,
}

/// 把请求路径映射到 public 目录下的文件，拒绝任何越出该目录的路径
pub fn resolve(public_dir: &Path, request_path: &str) -> Option<PathBuf> {
    let relative = Path::new(request_path.trim_start_matches('/'));
    let mut resolved = public_dir.to_path_buf();

    for component in relative.components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }

    if resolved == public_dir {
        return None;
    }
    Some(resolved)
}

pub async fn load(public_dir: &Path, request_path: &str) -> Result<StaticAsset, SiteError> {
    let path = resolve(public_dir, request_path).ok_or_else(|| SiteError::not_found(request_path))?;

    let body = match tokio::fs::read(&path).await {
        Ok(body) => body,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(SiteError::not_found(request_path));
        }
        // 目录等无法按文件读取的路径也视为不存在
        Err(e) if path.is_dir() => {
            tracing::debug!(path = %path.display(), error = %e, "Refusing to serve directory");
            return Err(SiteError::not_found(request_path));
        }
        Err(e) => {
            return Err(SiteError::file_system(e.to_string(), Some(path.display().to_string())));
        }
    };

    let content_type = mime_guess::from_path(&path).first_or_octet_stream().to_string();
    Ok(StaticAsset { body, content_type })
}
