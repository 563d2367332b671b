//! # Config artifacts for the external server.
//!
//! A [`ConfigWriter`] produces one [`ConfigArtifact`] per start attempt. The
//! server removes the previous artifact before writing a new one and discards
//! the artifact right after a successful launch.
//!
//! [`LighttpdConfig`] writes files like:
//! ```text
//! server.document-root = "/data/app/docs"
//! server.bind = "localhost"
//! server.errorlog-use-syslog = "enable"
//! server.upload-dirs = ( "/tmp/__static-server__/uploads" )
//! server.port = 8080
//! index-file.names += ("index.xhtml", "index.html", ...)
//! mimetype.assign = ( ".html" => "text/html", ..., "" => "application/octet-stream" )
//! ```

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tracing::debug;

use crate::error::ServerError;

const CONFIG_TARGET: &str = "staticvisor::config";

/// Per-process counter keeping artifact names unique within one millisecond.
static ARTIFACT_SEQ: AtomicU64 = AtomicU64::new(0);

const INDEX_FILES: &[&str] = &[
    "index.xhtml",
    "index.html",
    "index.htm",
    "default.htm",
    "index.php",
];

const MIME_TYPES: &[(&str, &str)] = &[
    (".epub", "application/epub+zip"),
    (".ncx", "application/xml"),
    (".pdf", "application/pdf"),
    (".sig", "application/pgp-signature"),
    (".class", "application/octet-stream"),
    (".ps", "application/postscript"),
    (".torrent", "application/x-bittorrent"),
    (".gz", "application/x-gzip"),
    (".tar.gz", "application/x-tgz"),
    (".tgz", "application/x-tgz"),
    (".tar", "application/x-tar"),
    (".zip", "application/zip"),
    (".mp3", "audio/mpeg"),
    (".m3u", "audio/x-mpegurl"),
    (".ogg", "application/ogg"),
    (".wav", "audio/x-wav"),
    (".gif", "image/gif"),
    (".jpg", "image/jpeg"),
    (".jpeg", "image/jpeg"),
    (".png", "image/png"),
    (".svg", "image/svg+xml"),
    (".css", "text/css; charset=utf-8"),
    (".html", "text/html"),
    (".htm", "text/html"),
    (".js", "text/javascript"),
    (".txt", "text/plain; charset=utf-8"),
    (".log", "text/plain; charset=utf-8"),
    (".conf", "text/plain; charset=utf-8"),
    (".dtd", "text/xml"),
    (".xml", "text/xml"),
    (".mpeg", "video/mpeg"),
    (".mpg", "video/mpeg"),
    (".mov", "video/quicktime"),
    (".avi", "video/x-msvideo"),
    (".bz2", "application/x-bzip"),
    (".tar.bz2", "application/x-bzip-compressed-tar"),
    (".odt", "application/vnd.oasis.opendocument.text"),
    (".ods", "application/vnd.oasis.opendocument.spreadsheet"),
    (".odp", "application/vnd.oasis.opendocument.presentation"),
    (".opf", "application/oebps-package+xml"),
    (".otf", "font/otf"),
    (".ttf", "font/ttf"),
    (".xhtml", "application/xhtml+xml"),
    ("", "application/octet-stream"),
];

/// Inputs of one config artifact.
#[derive(Debug, Clone, Copy)]
pub struct ConfigRequest<'a> {
    /// Directory to serve.
    pub file_dir: &'a Path,
    /// Hostname to bind.
    pub hostname: &'a str,
    /// Port to bind.
    pub port: u16,
}

/// Opaque reference to a produced configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigArtifact {
    path: PathBuf,
}

impl ConfigArtifact {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the artifact.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Produces and discards config artifacts.
#[async_trait]
pub trait ConfigWriter: Send + Sync + 'static {
    /// Produces a new artifact for `req`.
    async fn write(&self, req: ConfigRequest<'_>) -> Result<ConfigArtifact, ServerError>;

    /// Discards `artifact`. Best-effort: failures are swallowed.
    async fn remove(&self, artifact: &ConfigArtifact);
}

/// Default writer producing lighttpd config files in a work directory.
#[derive(Debug, Clone)]
pub struct LighttpdConfig {
    work_dir: PathBuf,
}

impl LighttpdConfig {
    /// Writer using `<temp_dir>/__static-server__` as work directory.
    pub fn new() -> Self {
        Self::with_work_dir(std::env::temp_dir().join("__static-server__"))
    }

    /// Writer using a custom work directory.
    pub fn with_work_dir(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
        }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Renders the config text for `req`.
    pub fn render(&self, req: ConfigRequest<'_>) -> String {
        let uploads = self.work_dir.join("uploads");
        let mut out = String::new();
        let _ = writeln!(out, "server.document-root = \"{}\"", req.file_dir.display());
        let _ = writeln!(out, "server.bind = \"{}\"", req.hostname);
        let _ = writeln!(out, "server.errorlog-use-syslog = \"enable\"");
        let _ = writeln!(out, "server.upload-dirs = ( \"{}\" )", uploads.display());
        let _ = writeln!(out, "server.port = {}", req.port);

        let index = INDEX_FILES
            .iter()
            .map(|f| format!("\"{f}\""))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(out, "index-file.names += ({index})");

        out.push_str("mimetype.assign = (\n");
        for (ext, mime) in MIME_TYPES {
            let _ = writeln!(out, "  \"{ext}\" => \"{mime}\",");
        }
        out.push_str(")\n");
        out
    }

    fn next_artifact_path(&self) -> PathBuf {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let seq = ARTIFACT_SEQ.fetch_add(1, AtomicOrdering::Relaxed);
        self.work_dir.join(format!("config-{millis}-{seq}.txt"))
    }
}

impl Default for LighttpdConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfigWriter for LighttpdConfig {
    async fn write(&self, req: ConfigRequest<'_>) -> Result<ConfigArtifact, ServerError> {
        tokio::fs::create_dir_all(self.work_dir.join("uploads"))
            .await
            .map_err(ServerError::external)?;
        let path = self.next_artifact_path();
        tokio::fs::write(&path, self.render(req))
            .await
            .map_err(ServerError::external)?;
        debug!(target: CONFIG_TARGET, file = %path.display(), "config written");
        Ok(ConfigArtifact::new(path))
    }

    async fn remove(&self, artifact: &ConfigArtifact) {
        if let Err(error) = tokio::fs::remove_file(artifact.path()).await {
            debug!(
                target: CONFIG_TARGET,
                file = %artifact.path().display(),
                error = %error,
                "config removal skipped"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(dir: &Path) -> ConfigRequest<'_> {
        ConfigRequest {
            file_dir: dir,
            hostname: "localhost",
            port: 8123,
        }
    }

    #[test]
    fn renders_core_directives() {
        let writer = LighttpdConfig::with_work_dir("/tmp/work");
        let text = writer.render(request(Path::new("/srv/docs")));

        assert!(text.contains("server.document-root = \"/srv/docs\""));
        assert!(text.contains("server.bind = \"localhost\""));
        assert!(text.contains("server.port = 8123"));
        assert!(text.contains("server.upload-dirs = ( \"/tmp/work/uploads\" )"));
        assert!(text.contains("\".html\" => \"text/html\""));
        assert!(text.contains("\"\" => \"application/octet-stream\""));
    }

    #[tokio::test]
    async fn writes_and_removes_artifact() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = LighttpdConfig::with_work_dir(tmp.path().join("work"));

        let first = writer.write(request(Path::new("/srv"))).await.unwrap();
        let second = writer.write(request(Path::new("/srv"))).await.unwrap();
        assert_ne!(first, second);
        assert!(first.path().exists());
        assert!(tmp.path().join("work/uploads").is_dir());

        writer.remove(&first).await;
        assert!(!first.path().exists());
        // Removing twice is harmless.
        writer.remove(&first).await;
        assert!(second.path().exists());
    }
}
