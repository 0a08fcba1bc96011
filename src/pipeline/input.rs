//! Source resolution: turn a user-supplied paper reference into raw bytes.
//!
//! A reference is a local path, the stdin marker `-`, or an HTTP/HTTPS URL.
//! Each resolves to a [`RawDocument`] holding the bytes plus a content hint
//! ([`ContentKind`]) for the extractor. Resolution makes exactly one attempt;
//! there is no retry.

use crate::error::ReviewError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, info};

/// Origin label used for stdin input in logs and errors.
pub const STDIN_ORIGIN: &str = "<stdin>";

/// Where the paper comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaperSource {
    /// A file on the local file system.
    LocalPath(PathBuf),
    /// The process' standard input, read to end-of-stream.
    Stdin,
    /// An HTTP or HTTPS URL.
    RemoteUrl(String),
}

impl PaperSource {
    /// Classify a CLI-style reference: `-` is stdin, `http(s)://` is a URL,
    /// anything else is a local path.
    pub fn parse(reference: &str) -> Self {
        if reference == "-" {
            PaperSource::Stdin
        } else if is_url(reference) {
            PaperSource::RemoteUrl(reference.to_string())
        } else {
            PaperSource::LocalPath(PathBuf::from(reference))
        }
    }

    /// Human-readable label for logs, errors and report metadata.
    pub fn origin(&self) -> String {
        match self {
            PaperSource::LocalPath(p) => p.display().to_string(),
            PaperSource::Stdin => STDIN_ORIGIN.to_string(),
            PaperSource::RemoteUrl(u) => u.clone(),
        }
    }
}

/// Content hint attached to raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Pdf,
    #[default]
    Text,
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKind::Pdf => f.write_str("pdf"),
            ContentKind::Text => f.write_str("text"),
        }
    }
}

impl FromStr for ContentKind {
    type Err = ReviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pdf" => Ok(ContentKind::Pdf),
            "text" | "txt" => Ok(ContentKind::Text),
            other => Err(ReviewError::Config(format!(
                "unknown paper type '{other}' (expected pdf or text)"
            ))),
        }
    }
}

impl ContentKind {
    /// `.pdf` (any case) → Pdf, everything else → Text.
    pub fn from_extension(name: &str) -> Self {
        if has_pdf_extension(name) {
            ContentKind::Pdf
        } else {
            ContentKind::Text
        }
    }
}

/// Bytes of a paper plus the hint that tells the extractor how to read them.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub bytes: Vec<u8>,
    pub kind: ContentKind,
    /// Path, URL, `<stdin>` or upload file name.
    pub origin: String,
}

impl RawDocument {
    pub fn new(bytes: impl Into<Vec<u8>>, kind: ContentKind, origin: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            kind,
            origin: origin.into(),
        }
    }

    /// Wrap an uploaded file. A `.pdf` file name or a declared content type
    /// mentioning pdf selects the PDF extractor.
    pub fn from_upload(file_name: Option<&str>, content_type: Option<&str>, bytes: Vec<u8>) -> Self {
        let name = file_name.filter(|n| !n.is_empty()).unwrap_or("uploaded-file");
        let declared_pdf = content_type
            .map(|ct| ct.to_lowercase().contains("pdf"))
            .unwrap_or(false);
        let kind = if declared_pdf || has_pdf_extension(name) {
            ContentKind::Pdf
        } else {
            ContentKind::Text
        };
        Self::new(bytes, kind, name)
    }
}

/// Knobs for [`resolve`].
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Force the content hint instead of inferring it.
    pub kind_override: Option<ContentKind>,
    /// Timeout for URL downloads in seconds.
    pub download_timeout_secs: u64,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            kind_override: None,
            download_timeout_secs: 30,
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

fn has_pdf_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// Resolve a source to raw bytes, reading stdin from the process.
pub async fn resolve(
    source: &PaperSource,
    options: &ResolveOptions,
) -> Result<RawDocument, ReviewError> {
    resolve_with_stdin(source, options, tokio::io::stdin()).await
}

/// Resolve a source to raw bytes, reading [`PaperSource::Stdin`] from `stdin`.
pub async fn resolve_with_stdin<R>(
    source: &PaperSource,
    options: &ResolveOptions,
    stdin: R,
) -> Result<RawDocument, ReviewError>
where
    R: AsyncRead + Unpin,
{
    let mut doc = match source {
        PaperSource::LocalPath(path) => read_local(path).await?,
        PaperSource::Stdin => read_stdin(stdin).await?,
        PaperSource::RemoteUrl(url) => download_url(url, options.download_timeout_secs).await?,
    };

    if let Some(kind) = options.kind_override {
        doc.kind = kind;
    }

    debug!(
        "Resolved {} → {} bytes ({})",
        doc.origin,
        doc.bytes.len(),
        doc.kind
    );
    Ok(doc)
}

/// Read a local file, distinguishing "missing" from other I/O failures.
async fn read_local(path: &Path) -> Result<RawDocument, ReviewError> {
    let origin = path.display().to_string();

    match tokio::fs::read(path).await {
        Ok(bytes) => {
            let kind = ContentKind::from_extension(&origin);
            Ok(RawDocument::new(bytes, kind, origin))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ReviewError::NotFound {
            path: path.to_path_buf(),
        }),
        Err(source) => Err(ReviewError::Read { origin, source }),
    }
}

async fn read_stdin<R>(mut stdin: R) -> Result<RawDocument, ReviewError>
where
    R: AsyncRead + Unpin,
{
    let mut bytes = Vec::new();
    stdin
        .read_to_end(&mut bytes)
        .await
        .map_err(|source| ReviewError::Read {
            origin: STDIN_ORIGIN.to_string(),
            source,
        })?;
    Ok(RawDocument::new(bytes, ContentKind::Text, STDIN_ORIGIN))
}

/// Download a URL into memory with a single GET.
///
/// Redirects follow reqwest's default policy (up to 10 hops).
async fn download_url(url: &str, timeout_secs: u64) -> Result<RawDocument, ReviewError> {
    info!("Downloading paper from: {}", url);

    let fetch_err = |status: Option<u16>, reason: String| ReviewError::Fetch {
        url: url.to_string(),
        status,
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| fetch_err(None, e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            fetch_err(None, format!("timed out after {timeout_secs}s"))
        } else {
            fetch_err(None, e.to_string())
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(fetch_err(Some(status.as_u16()), format!("HTTP {status}")));
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    // Use the post-redirect URL so `/abs/x → /pdf/x.pdf` hops still infer pdf.
    let final_url = response.url().clone();

    let bytes = response
        .bytes()
        .await
        .map_err(|e| fetch_err(Some(status.as_u16()), e.to_string()))?;

    let kind = infer_remote_kind(content_type.as_deref(), final_url.path());
    info!("Downloaded {} bytes ({}) from {}", bytes.len(), kind, url);

    Ok(RawDocument::new(bytes.to_vec(), kind, url))
}

/// Content hint for a download: an explicit pdf or `text/*` header wins;
/// a missing or generic header (e.g. `application/octet-stream`) defers to
/// the URL path extension; the fallback is text.
pub fn infer_remote_kind(content_type: Option<&str>, url_path: &str) -> ContentKind {
    if let Some(ct) = content_type.map(str::to_lowercase) {
        if ct.contains("pdf") {
            return ContentKind::Pdf;
        }
        if ct.starts_with("text/") {
            return ContentKind::Text;
        }
    }
    ContentKind::from_extension(url_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn parse_reference() {
        assert_eq!(PaperSource::parse("-"), PaperSource::Stdin);
        assert_eq!(
            PaperSource::parse("https://arxiv.org/pdf/1706.03762"),
            PaperSource::RemoteUrl("https://arxiv.org/pdf/1706.03762".into())
        );
        assert_eq!(
            PaperSource::parse("papers/a.pdf"),
            PaperSource::LocalPath(PathBuf::from("papers/a.pdf"))
        );
    }

    #[test]
    fn extension_inference() {
        assert_eq!(ContentKind::from_extension("paper.PDF"), ContentKind::Pdf);
        assert_eq!(ContentKind::from_extension("paper.txt"), ContentKind::Text);
        assert_eq!(ContentKind::from_extension("README"), ContentKind::Text);
    }

    #[test]
    fn remote_kind_inference() {
        assert_eq!(
            infer_remote_kind(Some("application/pdf"), "/pdf/1706.03762"),
            ContentKind::Pdf
        );
        assert_eq!(
            infer_remote_kind(Some("text/plain; charset=utf-8"), "/x.pdf"),
            ContentKind::Text
        );
        assert_eq!(
            infer_remote_kind(Some("application/octet-stream"), "/x.pdf"),
            ContentKind::Pdf
        );
        assert_eq!(infer_remote_kind(None, "/x.pdf"), ContentKind::Pdf);
        assert_eq!(infer_remote_kind(None, "/abs/1706.03762"), ContentKind::Text);
    }

    #[test]
    fn paper_type_parsing() {
        assert_eq!("PDF".parse::<ContentKind>().unwrap(), ContentKind::Pdf);
        assert_eq!("txt".parse::<ContentKind>().unwrap(), ContentKind::Text);
        assert!(matches!(
            "docx".parse::<ContentKind>(),
            Err(ReviewError::Config(_))
        ));
    }

    #[test]
    fn upload_kind() {
        let doc = RawDocument::from_upload(Some("paper.pdf"), None, vec![1]);
        assert_eq!(doc.kind, ContentKind::Pdf);
        let doc = RawDocument::from_upload(Some("blob"), Some("application/pdf"), vec![1]);
        assert_eq!(doc.kind, ContentKind::Pdf);
        let doc = RawDocument::from_upload(None, Some("text/plain"), vec![1]);
        assert_eq!(doc.kind, ContentKind::Text);
        assert_eq!(doc.origin, "uploaded-file");
    }

    #[tokio::test]
    async fn missing_local_file_is_not_found() {
        let source = PaperSource::parse("/definitely/not/a/real/paper.txt");
        let err = resolve(&source, &ResolveOptions::default()).await.unwrap_err();
        assert!(matches!(err, ReviewError::NotFound { .. }), "got: {err:?}");
    }

    #[tokio::test]
    async fn directory_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = PaperSource::LocalPath(dir.path().to_path_buf());
        let err = resolve(&source, &ResolveOptions::default()).await.unwrap_err();
        assert!(matches!(err, ReviewError::Read { .. }), "got: {err:?}");
    }

    #[tokio::test]
    async fn local_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paper.txt");
        std::fs::write(&path, "hello").unwrap();
        let doc = resolve(&PaperSource::LocalPath(path), &ResolveOptions::default())
            .await
            .unwrap();
        assert_eq!(doc.bytes, b"hello");
        assert_eq!(doc.kind, ContentKind::Text);
    }

    #[tokio::test]
    async fn stdin_defaults_to_text_and_honours_override() {
        let doc = resolve_with_stdin(&PaperSource::Stdin, &ResolveOptions::default(), &b"abc"[..])
            .await
            .unwrap();
        assert_eq!(doc.kind, ContentKind::Text);
        assert_eq!(doc.origin, STDIN_ORIGIN);

        let opts = ResolveOptions {
            kind_override: Some(ContentKind::Pdf),
            ..Default::default()
        };
        let doc = resolve_with_stdin(&PaperSource::Stdin, &opts, &b"%PDF"[..])
            .await
            .unwrap();
        assert_eq!(doc.kind, ContentKind::Pdf);
    }

    #[tokio::test]
    async fn empty_stdin_is_not_an_error_here() {
        let doc = resolve_with_stdin(&PaperSource::Stdin, &ResolveOptions::default(), &b""[..])
            .await
            .unwrap();
        assert!(doc.bytes.is_empty());
    }
}
