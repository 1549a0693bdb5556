use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use tracing::{error, info, warn};

use crate::error::Result;
use crate::scraper::WebSource;

/// One discovered document. Local sources carry their text and no URL; web
/// sources carry a URL and get their text from the summarizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceDescriptor {
    pub title: String,
    pub url: Option<String>,
    pub content: Option<String>,
    pub is_local: bool,
}

impl SourceDescriptor {
    pub fn local(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: None,
            content: Some(content.into()),
            is_local: true,
        }
    }

    pub fn web(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: Some(url.into()),
            content: None,
            is_local: false,
        }
    }
}

/// Only plain relative names below the sources root are accepted.
fn source_dir_path(root: &Path, name: &str) -> Option<PathBuf> {
    let relative = Path::new(name);
    let plain = relative
        .components()
        .all(|component| matches!(component, Component::Normal(_)));
    if name.trim().is_empty() || !plain {
        return None;
    }
    Some(root.join(relative))
}

/// Every regular file in `root/name`, in file-name order. Read errors are
/// logged and yield whatever was readable.
pub fn collect_local(root: &Path, name: &str) -> Vec<SourceDescriptor> {
    let Some(dir) = source_dir_path(root, name) else {
        warn!(source_dir = %name, "Rejected local source directory name");
        return Vec::new();
    };

    let entries = match fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) => {
            error!("Error reading local directory {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .collect();
    files.sort();

    let mut sources = Vec::with_capacity(files.len());
    for path in files {
        let title = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match fs::read_to_string(&path) {
            Ok(content) => sources.push(SourceDescriptor::local(title, content)),
            Err(e) => warn!("Skipping unreadable local source {}: {}", path.display(), e),
        }
    }

    info!(dir = %dir.display(), count = sources.len(), "Loaded local sources");
    sources
}

pub async fn collect_web(web: &dyn WebSource, keyword: &str) -> Result<Vec<SourceDescriptor>> {
    let hits = web.search(keyword).await?;
    Ok(hits
        .into_iter()
        .map(|hit| SourceDescriptor::web(hit.title, hit.url))
        .collect())
}
