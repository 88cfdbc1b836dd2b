use std::collections::BTreeMap;

/// A file attached to a multipart body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Media {
    key: String,
    filename: String,
    mime_type: String,
    data: Vec<u8>,
}

impl Media {
    /// Create a new media item for the form field `key`
    pub fn new(
        key: impl Into<String>,
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            key: key.into(),
            filename: filename.into(),
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Read a file from disk, guessing the MIME type from its extension
    /// when none is given
    pub fn from_path(
        key: impl Into<String>,
        path: impl AsRef<std::path::Path>,
        mime_type: Option<&str>,
    ) -> std::io::Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file")
            .to_string();
        let mime_type = mime_type
            .map(str::to_string)
            .or_else(|| content_type_for_path(path))
            .unwrap_or_else(|| "application/octet-stream".to_string());
        Ok(Self::new(key, filename, mime_type, data))
    }

    /// Get the form field name
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Get the file name
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Get the MIME type
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Get the file contents
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Parameters and files waiting to be encoded as `multipart/form-data`
#[derive(Debug, Clone)]
pub(crate) struct MultipartData {
    pub(crate) parameters: BTreeMap<String, String>,
    pub(crate) media: Vec<Media>,
    pub(crate) boundary: String,
}

impl MultipartData {
    pub(crate) fn new(parameters: Option<BTreeMap<String, String>>, media: Option<Vec<Media>>) -> Self {
        Self {
            parameters: parameters.unwrap_or_default(),
            media: media.unwrap_or_default(),
            boundary: generate_boundary(),
        }
    }

    /// Value for the request's `Content-Type` header
    pub(crate) fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Encode parameters, then media, then the closing delimiter
    pub(crate) fn encode(&self) -> Vec<u8> {
        const CRLF: &str = "\r\n";
        let boundary = &self.boundary;
        let mut body = Vec::new();

        for (key, value) in &self.parameters {
            body.extend_from_slice(format!("--{boundary}{CRLF}").as_bytes());
            body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{key}\"{CRLF}{CRLF}").as_bytes(),
            );
            body.extend_from_slice(format!("{value}{CRLF}").as_bytes());
        }

        for file in &self.media {
            body.extend_from_slice(format!("--{boundary}{CRLF}").as_bytes());
            body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"{CRLF}",
                    file.key, file.filename
                )
                .as_bytes(),
            );
            body.extend_from_slice(format!("Content-Type: {}{CRLF}{CRLF}", file.mime_type).as_bytes());
            body.extend_from_slice(&file.data);
            body.extend_from_slice(CRLF.as_bytes());
        }

        body.extend_from_slice(format!("--{boundary}--{CRLF}").as_bytes());
        body
    }
}

/// Generate a random boundary for multipart forms
fn generate_boundary() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let bytes: [u8; 16] = rng.gen();
    format!("Boundary-{}", hex::encode(bytes))
}

/// Get the content type for a file based on its extension
fn content_type_for_path(path: &std::path::Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some("image/jpeg"),
            "png" => Some("image/png"),
            "gif" => Some("image/gif"),
            "pdf" => Some("application/pdf"),
            "txt" => Some("text/plain"),
            "html" | "htm" => Some("text/html"),
            "json" => Some("application/json"),
            "xml" => Some("application/xml"),
            "zip" => Some("application/zip"),
            _ => None,
        })
        .map(|s| s.to_string())
}
