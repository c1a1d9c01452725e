use std::path::{Path, PathBuf};

use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::TrackedPost;

use super::schema::{PostRecord, HEADER};

/// CSV-backed list of tracked posts.
///
/// Every operation reads the whole file and every mutation rewrites it.
/// Read-modify-write cycles are serialized behind one mutex, and writes go
/// through a temp file that is renamed over the store.
pub struct PostStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl PostStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if !tokio::fs::try_exists(&path).await? {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            write_posts(&path, &[]).await?;
            tracing::info!("Created post store at {}", path.display());
        }

        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<Vec<TrackedPost>> {
        let _guard = self.lock.lock().await;
        read_posts(&self.path).await
    }

    pub async fn append(&self, post: TrackedPost) -> Result<()> {
        self.modify(move |posts| posts.push(post)).await
    }

    /// Reload the store, apply `f`, and write the result back as one step.
    pub async fn modify<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Vec<TrackedPost>) -> T + Send,
        T: Send,
    {
        let _guard = self.lock.lock().await;
        let mut posts = read_posts(&self.path).await?;
        let out = f(&mut posts);
        write_posts(&self.path, &posts).await?;
        Ok(out)
    }
}

async fn read_posts(path: &Path) -> Result<Vec<TrackedPost>> {
    let bytes = tokio::fs::read(path).await?;
    let mut reader = csv::Reader::from_reader(bytes.as_slice());

    reader
        .deserialize::<PostRecord>()
        .map(|record| record.map_err(AppError::from).and_then(TrackedPost::try_from))
        .collect()
}

async fn write_posts(path: &Path, posts: &[TrackedPost]) -> Result<()> {
    // Header is written by hand so an empty store still carries it.
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(HEADER)?;
    for post in posts {
        writer.serialize(PostRecord::from(post))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Io(e.into_error()))?;

    let tmp_path = path.with_extension("csv.tmp");
    tokio::fs::write(&tmp_path, bytes).await?;
    tokio::fs::rename(&tmp_path, path).await?;
    Ok(())
}
