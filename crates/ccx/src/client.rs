//! 🧰 client.rs: the helper operations every object-store test reaches for.
//!
//! Write a string to a path. Read it back. Is it there? What's under this
//! directory? Delete the evidence. Small things, done the same way every time,
//! and counted, so a test can assert how chatty it was with the store.
//!
//! 🧠 Knowledge graph:
//! - Wraps `Arc<dyn ObjectStore>` (built by `stores::build_store`)
//! - Counters live in `stats::StatisticsCounters`, shared by every clone of the client
//! - Listing goes through `remote_iter::ListingIterator`, which calls back into `list_dir`
//! - "Not found" is a normal answer here (`exists`, `head_opt`), not an error
//!
//! 🦆 The duck has read access only. It insisted.

use std::sync::Arc;

use anyhow::{Context, Result};
use futures::TryStreamExt;
use object_store::{ObjectMeta, ObjectStore, PutPayload, path::Path};
use tracing::{debug, trace};

use crate::remote_iter::{ListingIterator, RemoteIterator, collect_remote};
use crate::stats::{Statistic, StatisticsCounters, StorageStatistic};

/// 📄 What we know about one file in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStatus {
    pub location: Path,
    pub size: u64,
    pub last_modified: String,
    pub e_tag: Option<String>,
}

impl From<ObjectMeta> for FileStatus {
    fn from(meta: ObjectMeta) -> Self {
        Self {
            size: meta.size as u64,
            last_modified: meta.last_modified.to_rfc3339(),
            e_tag: meta.e_tag,
            location: meta.location,
        }
    }
}

/// 📂 One directory's worth of listing: its files and its immediate sub-directories.
#[derive(Debug, Default)]
pub(crate) struct DirListing {
    pub(crate) files: Vec<FileStatus>,
    pub(crate) dirs: Vec<Path>,
}

/// 🧰 A cheaply clonable handle over an object store, with statistics.
///
/// Clones share both the store and the counters, so a listing iterator handed
/// out by one clone still shows up in the original's statistics.
#[derive(Clone)]
pub struct StorageClient {
    store: Arc<dyn ObjectStore>,
    counters: Arc<StatisticsCounters>,
}

impl std::fmt::Debug for StorageClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // -- 🎭 the store's Debug output includes credentials on some backends. no thanks.
        f.debug_struct("StorageClient")
            .field("store", &self.store.to_string())
            .finish()
    }
}

/// 🔎 Was this error the store saying "nope, not here"?
pub fn is_not_found(err: &object_store::Error) -> bool {
    matches!(err, object_store::Error::NotFound { .. })
}

/// 🪓 Treat "" and "/" as the store root.
fn prefix_of(path: &Path) -> Option<&Path> {
    if path.as_ref().is_empty() {
        None
    } else {
        Some(path)
    }
}

impl StorageClient {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            counters: Arc::new(StatisticsCounters::default()),
        }
    }

    /// 🔓 The raw store, for the rare test that needs to go off-road.
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// 📸 Current statistics, sorted by name descending.
    pub fn statistics(&self) -> Vec<StorageStatistic> {
        self.counters.snapshot()
    }

    pub fn statistic(&self, statistic: Statistic) -> u64 {
        self.counters.get(statistic)
    }

    pub fn reset_statistics(&self) {
        self.counters.reset();
    }

    /// ✍️ Write `contents` to `path`, replacing whatever was there.
    pub async fn put_string(&self, path: &Path, contents: impl Into<String>) -> Result<()> {
        self.put_bytes(path, contents.into().into_bytes()).await
    }

    /// ✍️ Write raw bytes to `path`, replacing whatever was there.
    pub async fn put_bytes(&self, path: &Path, bytes: Vec<u8>) -> Result<()> {
        let length = bytes.len() as u64;
        // -- 📊 the request counts even if it fails; the bytes only count once they landed
        self.counters.increment(Statistic::ObjectPutRequest);
        self.store
            .put(path, PutPayload::from(bytes))
            .await
            .with_context(|| format!("💀 could not write {} bytes to '{}'", length, path))?;
        self.counters.add(Statistic::StreamWriteBytes, length);
        trace!("✍️ wrote {} bytes to {}", length, path);
        Ok(())
    }

    /// 📥 Read the whole object. Raw `object_store` errors come back untouched,
    /// so callers can tell a missing object from a broken one.
    pub async fn get_bytes(&self, path: &Path) -> object_store::Result<Vec<u8>> {
        self.counters.increment(Statistic::ObjectGetRequest);
        // -- 📥 two awaits, two chances to fail: the request, then draining the body
        let fetched = match self.store.get(path).await {
            Ok(result) => result.bytes().await,
            Err(err) => Err(err),
        };
        match fetched {
            Ok(bytes) => {
                self.counters
                    .add(Statistic::StreamReadBytes, bytes.len() as u64);
                Ok(bytes.to_vec())
            }
            Err(err) => {
                // 🫥 a 404 is still a GET, and also its own statistic
                if is_not_found(&err) {
                    self.counters.increment(Statistic::ObjectNotFound);
                }
                Err(err)
            }
        }
    }

    /// 📥 Read the whole object or fail with context.
    pub async fn read_bytes(&self, path: &Path) -> Result<Vec<u8>> {
        self.get_bytes(path)
            .await
            .with_context(|| format!("💀 could not read '{}'", path))
    }

    /// 📖 Read the whole object as UTF-8 text.
    pub async fn read_string(&self, path: &Path) -> Result<String> {
        let bytes = self.read_bytes(path).await?;
        String::from_utf8(bytes).with_context(|| format!("💀 '{}' is not UTF-8 text", path))
    }

    /// 📖 Read the object as lines, without their terminators.
    pub async fn read_lines(&self, path: &Path) -> Result<Vec<String>> {
        let text = self.read_string(path).await?;
        Ok(text.lines().map(str::to_string).collect())
    }

    /// 🏷️ Metadata for one object. Missing objects are an error here.
    pub async fn head(&self, path: &Path) -> Result<FileStatus> {
        self.head_opt(path)
            .await?
            .with_context(|| format!("💀 '{}' does not exist", path))
    }

    /// 🏷️ Metadata for one object, `None` when it does not exist.
    pub async fn head_opt(&self, path: &Path) -> Result<Option<FileStatus>> {
        self.counters.increment(Statistic::ObjectMetadataRequest);
        match self.store.head(path).await {
            Ok(meta) => Ok(Some(meta.into())),
            Err(err) if is_not_found(&err) => {
                self.counters.increment(Statistic::ObjectNotFound);
                Ok(None)
            }
            Err(err) => Err(err).with_context(|| format!("💀 could not stat '{}'", path)),
        }
    }

    /// ❓ Is there an object at `path`?
    pub async fn exists(&self, path: &Path) -> Result<bool> {
        Ok(self.head_opt(path).await?.is_some())
    }

    /// 🗑️ Delete one object. Deleting something already gone is fine.
    pub async fn delete(&self, path: &Path) -> Result<()> {
        self.counters.increment(Statistic::ObjectDeleteRequest);
        match self.store.delete(path).await {
            Ok(()) => Ok(()),
            // -- 🗑️ already gone counts as deleted; some stores say 404, some say nothing
            Err(err) if is_not_found(&err) => Ok(()),
            Err(err) => Err(err).with_context(|| format!("💀 could not delete '{}'", path)),
        }
    }

    /// 🧹 Delete every object under `prefix`. Returns how many went.
    pub async fn delete_tree(&self, prefix: &Path) -> Result<usize> {
        let doomed = self.list_files_vec(prefix, true).await?;
        // -- 🐢 one DELETE per object, each one counted
        for status in &doomed {
            self.delete(&status.location).await?;
        }
        debug!("🧹 deleted {} object(s) under '{}'", doomed.len(), prefix);
        Ok(doomed.len())
    }

    /// 🌲 Files under `path`, as a remote iterator. Non-recursive means direct children only.
    pub fn list_files(&self, path: &Path, recursive: bool) -> ListingIterator {
        ListingIterator::new(self.clone(), path.clone(), recursive)
    }

    /// 🌲 Files under `path`, collected and sorted by location.
    pub async fn list_files_vec(&self, path: &Path, recursive: bool) -> Result<Vec<FileStatus>> {
        let mut iter = self.list_files(path, recursive);
        let mut files = collect_remote(&mut iter).await?;
        files.sort_by(|a, b| a.location.cmp(&b.location));
        Ok(files)
    }

    /// 📋 Every object under `prefix` in one flat listing; no directory walking.
    pub async fn list_all(&self, prefix: &Path) -> Result<Vec<FileStatus>> {
        self.counters.increment(Statistic::ObjectListRequest);
        let mut files: Vec<FileStatus> = self
            .store
            .list(prefix_of(prefix))
            .map_ok(FileStatus::from)
            .try_collect()
            .await
            .with_context(|| format!("💀 could not list '{}'", prefix))?;
        files.sort_by(|a, b| a.location.cmp(&b.location));
        Ok(files)
    }

    /// 📂 One directory level: files directly inside `dir` and its sub-directories.
    pub(crate) async fn list_dir(&self, dir: &Path) -> Result<DirListing> {
        self.counters.increment(Statistic::ObjectListRequest);
        let result = self
            .store
            .list_with_delimiter(prefix_of(dir))
            .await
            .with_context(|| format!("💀 could not list directory '{}'", dir))?;
        // -- 📂 `common_prefixes` are the sub-directories, `objects` are the files right here
        Ok(DirListing {
            files: result.objects.into_iter().map(FileStatus::from).collect(),
            dirs: result.common_prefixes,
        })
    }

    /// 🔢 Count the files under `path`, walking the tree lazily.
    pub async fn count_files(&self, path: &Path, recursive: bool) -> Result<usize> {
        let mut iter = self.list_files(path, recursive);
        let mut count = 0usize;
        while iter.next().await?.is_some() {
            count += 1;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::memory::InMemory;

    fn in_memory_client() -> StorageClient {
        StorageClient::new(Arc::new(InMemory::new()))
    }

    async fn plant_a_tree(client: &StorageClient) -> Result<()> {
        for (path, body) in [
            ("tree/a.txt", "alpha"),
            ("tree/b.txt", "bravo"),
            ("tree/sub/c.txt", "charlie"),
            ("tree/sub/deeper/d.txt", "delta"),
            ("elsewhere/e.txt", "echo"),
        ] {
            client.put_string(&Path::from(path), body).await?;
        }
        Ok(())
    }

    fn names(files: &[FileStatus]) -> Vec<&str> {
        files.iter().map(|f| f.location.as_ref()).collect()
    }

    #[tokio::test]
    async fn the_one_where_a_string_goes_in_and_the_same_string_comes_out() -> Result<()> {
        let client = in_memory_client();
        let path = Path::from("notes/hello.txt");
        client.put_string(&path, "hello\nworld\n").await?;

        assert_eq!(client.read_string(&path).await?, "hello\nworld\n");
        assert_eq!(client.read_lines(&path).await?, vec!["hello", "world"]);
        assert_eq!(client.head(&path).await?.size, 12);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_missing_files_are_an_answer_not_an_error() -> Result<()> {
        let client = in_memory_client();
        let ghost = Path::from("nobody/home");

        assert!(!client.exists(&ghost).await?);
        assert!(client.head_opt(&ghost).await?.is_none());
        assert!(client.head(&ghost).await.is_err());
        assert!(client.read_string(&ghost).await.is_err());
        let raw = client.get_bytes(&ghost).await;
        assert!(matches!(raw, Err(ref err) if is_not_found(err)));
        assert_eq!(client.statistic(Statistic::ObjectNotFound), 5);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_recursive_listing_finds_the_deep_ones() -> Result<()> {
        let client = in_memory_client();
        plant_a_tree(&client).await?;

        let everything = client.list_files_vec(&Path::from("tree"), true).await?;
        assert_eq!(
            names(&everything),
            vec![
                "tree/a.txt",
                "tree/b.txt",
                "tree/sub/c.txt",
                "tree/sub/deeper/d.txt"
            ]
        );

        let shallow = client.list_files_vec(&Path::from("tree"), false).await?;
        assert_eq!(names(&shallow), vec!["tree/a.txt", "tree/b.txt"]);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_listing_the_iterator_walks_depth_first_in_name_order() -> Result<()> {
        let client = in_memory_client();
        plant_a_tree(&client).await?;

        let mut iter = client.list_files(&Path::from("tree"), true);
        let walked = collect_remote(&mut iter).await?;
        // -- 🌲 files of a directory come before its sub-directories
        assert_eq!(
            names(&walked),
            vec![
                "tree/a.txt",
                "tree/b.txt",
                "tree/sub/c.txt",
                "tree/sub/deeper/d.txt"
            ]
        );
        assert_eq!(client.count_files(&Path::from(""), true).await?, 5);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_listing_a_file_yields_the_file() -> Result<()> {
        let client = in_memory_client();
        plant_a_tree(&client).await?;

        let lonely = client.list_files_vec(&Path::from("tree/a.txt"), true).await?;
        assert_eq!(names(&lonely), vec!["tree/a.txt"]);

        let nothing = client.list_files_vec(&Path::from("no/such/dir"), true).await?;
        assert!(nothing.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_delete_tree_leaves_the_neighbours_alone() -> Result<()> {
        let client = in_memory_client();
        plant_a_tree(&client).await?;

        assert_eq!(client.delete_tree(&Path::from("tree")).await?, 4);
        assert!(client.list_all(&Path::from("tree")).await?.is_empty());
        assert_eq!(
            names(&client.list_all(&Path::from("")).await?),
            vec!["elsewhere/e.txt"]
        );
        // -- 🗑️ deleting twice is not a crime
        client.delete(&Path::from("tree/a.txt")).await?;
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_every_call_is_counted() -> Result<()> {
        let client = in_memory_client();
        let path = Path::from("counted.txt");
        client.put_string(&path, "1234").await?;
        client.read_string(&path).await?;
        client.exists(&path).await?;
        client.list_files_vec(&Path::from(""), false).await?;
        client.delete(&path).await?;

        assert_eq!(client.statistic(Statistic::ObjectPutRequest), 1);
        assert_eq!(client.statistic(Statistic::StreamWriteBytes), 4);
        assert_eq!(client.statistic(Statistic::ObjectGetRequest), 1);
        assert_eq!(client.statistic(Statistic::StreamReadBytes), 4);
        assert_eq!(client.statistic(Statistic::ObjectMetadataRequest), 1);
        assert_eq!(client.statistic(Statistic::ObjectListRequest), 1);
        assert_eq!(client.statistic(Statistic::ObjectDeleteRequest), 1);

        let cloned = client.clone();
        cloned.reset_statistics();
        assert!(client.statistics().iter().all(|s| s.value == 0));
        Ok(())
    }
}
