//! 🔁 remote_iter.rs: iterators where every `next()` might be a network round trip.
//!
//! A listing over an object store does not arrive as a tidy Vec. It arrives one
//! directory (or one page) at a time, and every step can fail. `RemoteIterator`
//! is that shape: async, fallible, `None` at the end. The adapters below turn it
//! into the shapes the rest of Rust expects: a `Stream`, or just a `Vec`.
//!
//! 🧠 Knowledge graph:
//! - `RemoteIterator<T>`: the trait. `next()` → `Ok(Some)` | `Ok(None)` | `Err`
//! - `into_stream`: RemoteIterator → `BoxStream<Result<T>>`
//! - `collect_remote`: RemoteIterator → `Vec<T>` (first error wins)
//! - `ListingIterator`: depth-first directory walk, one `list_with_delimiter` per directory
//! - `VecRemoteIterator`: fixtures, tests, and anyone who already has the Vec

use std::collections::VecDeque;

use anyhow::Result;
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use object_store::path::Path;
use tracing::trace;

use crate::client::{FileStatus, StorageClient};

/// 📡 An iterator whose items come from somewhere slow and unreliable.
///
/// # Contract 📜
/// - `Ok(Some(item))` while items flow.
/// - `Ok(None)` once exhausted, and on every call after that.
/// - `Err(...)` when the remote end had a bad day. Callers usually stop there.
#[async_trait]
pub trait RemoteIterator<T: Send>: Send {
    async fn next(&mut self) -> Result<Option<T>>;
}

/// 🌊 Adapt a remote iterator into a `Stream` of results.
pub fn into_stream<T, I>(iter: I) -> BoxStream<'static, Result<T>>
where
    T: Send + 'static,
    I: RemoteIterator<T> + 'static,
{
    stream::try_unfold(iter, |mut iter| async move {
        Ok(iter.next().await?.map(|item| (item, iter)))
    })
    .boxed()
}

/// 📦 Drain a remote iterator into a Vec. The first error aborts the drain.
pub async fn collect_remote<T, I>(iter: &mut I) -> Result<Vec<T>>
where
    T: Send,
    I: RemoteIterator<T> + ?Sized,
{
    let mut items = Vec::new();
    while let Some(item) = iter.next().await? {
        items.push(item);
    }
    Ok(items)
}

/// 📋 A remote iterator that is not remote at all. Honest about it, though.
#[derive(Debug, Default)]
pub struct VecRemoteIterator<T> {
    items: VecDeque<T>,
}

impl<T> VecRemoteIterator<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: items.into(),
        }
    }
}

#[async_trait]
impl<T: Send> RemoteIterator<T> for VecRemoteIterator<T> {
    async fn next(&mut self) -> Result<Option<T>> {
        Ok(self.items.pop_front())
    }
}

/// 🌲 Walks a directory tree in the object store, one directory per remote call.
///
/// Files of the current directory are buffered and handed out one at a time;
/// sub-directories go on a stack and are visited depth-first in name order.
/// Pointed at a plain file instead of a directory, it yields that one file.
#[derive(Debug)]
pub struct ListingIterator {
    client: StorageClient,
    root: Path,
    recursive: bool,
    pending_dirs: Vec<Path>,
    buffered: VecDeque<FileStatus>,
    root_listed: bool,
}

impl ListingIterator {
    pub(crate) fn new(client: StorageClient, root: Path, recursive: bool) -> Self {
        Self {
            client,
            pending_dirs: vec![root.clone()],
            root,
            recursive,
            buffered: VecDeque::new(),
            root_listed: false,
        }
    }
}

#[async_trait]
impl RemoteIterator<FileStatus> for ListingIterator {
    async fn next(&mut self) -> Result<Option<FileStatus>> {
        loop {
            if let Some(status) = self.buffered.pop_front() {
                return Ok(Some(status));
            }
            let Some(dir) = self.pending_dirs.pop() else {
                return Ok(None);
            };

            let listing = self.client.list_dir(&dir).await?;
            trace!(
                "🌲 {}: {} file(s), {} sub-directorie(s)",
                dir,
                listing.files.len(),
                listing.dirs.len()
            );

            if !self.root_listed {
                self.root_listed = true;
                // -- 📄 an empty "directory" might be a file wearing a trench coat
                if listing.files.is_empty() && listing.dirs.is_empty() && !dir.as_ref().is_empty()
                {
                    if let Some(status) = self.client.head_opt(&self.root).await? {
                        return Ok(Some(status));
                    }
                }
            }

            if self.recursive {
                // -- 🔃 reversed onto the stack so the smallest name pops first
                let mut dirs = listing.dirs;
                dirs.sort();
                self.pending_dirs.extend(dirs.into_iter().rev());
            }
            let mut files = listing.files;
            files.sort_by(|a, b| a.location.cmp(&b.location));
            self.buffered.extend(files);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    #[tokio::test]
    async fn the_one_where_a_vec_pretends_to_be_remote() -> Result<()> {
        let mut iter = VecRemoteIterator::new(vec![1, 2, 3]);
        assert_eq!(collect_remote(&mut iter).await?, vec![1, 2, 3]);
        // -- 🏁 exhausted stays exhausted
        assert_eq!(iter.next().await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_the_stream_adapter_yields_everything_in_order() -> Result<()> {
        let streamed: Vec<&str> = into_stream(VecRemoteIterator::new(vec!["a", "b", "c"]))
            .try_collect()
            .await?;
        assert_eq!(streamed, vec!["a", "b", "c"]);
        Ok(())
    }

    /// 💥 Yields one item, then errors. The remote end's villain arc.
    struct FlakyIterator {
        calls: u32,
    }

    #[async_trait]
    impl RemoteIterator<u32> for FlakyIterator {
        async fn next(&mut self) -> Result<Option<u32>> {
            self.calls += 1;
            if self.calls == 1 {
                Ok(Some(7))
            } else {
                anyhow::bail!("💀 connection reset by peer, and by fate")
            }
        }
    }

    #[tokio::test]
    async fn the_one_where_an_error_mid_iteration_surfaces() {
        let mut iter = FlakyIterator { calls: 0 };
        assert!(collect_remote(&mut iter).await.is_err());

        let mut stream = into_stream(FlakyIterator { calls: 0 });
        assert_eq!(stream.next().await.map(|r| r.ok()), Some(Some(7)));
        assert!(matches!(stream.next().await, Some(Err(_))));
    }
}
