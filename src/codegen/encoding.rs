use crate::infrastructure::error::SiteError;

/// 生成文件内容中保持原样的标点字符
const CONTENT_SAFE: &[u8] = b"~@#$&()*!+=:;,.?/'_-";

/// 百分号编码生成文件内容，只转义空白、引号、括号等会破坏传输的字符
pub fn encode_content(content: &str) -> String {
    let mut encoded = String::with_capacity(content.len());
    for &byte in content.as_bytes() {
        if byte.is_ascii_alphanumeric() || CONTENT_SAFE.contains(&byte) {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{:02X}", byte));
        }
    }
    encoded
}

/// 解码服务端返回的文件内容
pub fn decode_content(content: &str) -> Result<String, SiteError> {
    urlencoding::decode(content)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| SiteError::internal(format!("Invalid percent-encoded content: {}", e)))
}

/// 编码查询参数。除非保留字符外全部转义，`&`、`+`、`#`、`=` 都不会漏出
pub fn encode_query_component(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}
