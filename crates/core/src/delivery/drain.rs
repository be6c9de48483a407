//! Lazy FIFO iteration over the offline queue.
//!
//! The stream pages through the queue with keyset pagination
//! (`id > last_seen`), so entries acknowledged mid-iteration never shift the
//! cursor. It does not remove anything; restarting means building a new
//! stream, which re-queries the store.

use std::collections::VecDeque;
use std::sync::Arc;

use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use sensorlink_domain::{CachedEntry, Result};

use super::ports::OfflineQueue;

struct DrainCursor {
    queue: Arc<dyn OfflineQueue>,
    after_id: i64,
    page_size: usize,
    buffer: VecDeque<CachedEntry>,
    exhausted: bool,
}

/// Stream every queued entry in insertion order.
///
/// A storage error is yielded once and ends the stream.
pub fn drain(
    queue: Arc<dyn OfflineQueue>,
    page_size: usize,
) -> BoxStream<'static, Result<CachedEntry>> {
    let cursor = DrainCursor {
        queue,
        after_id: 0,
        page_size: page_size.max(1),
        buffer: VecDeque::new(),
        exhausted: false,
    };

    stream::unfold(cursor, |mut cursor| async move {
        loop {
            if let Some(entry) = cursor.buffer.pop_front() {
                cursor.after_id = entry.id;
                return Some((Ok(entry), cursor));
            }
            if cursor.exhausted {
                return None;
            }

            match cursor.queue.list_after(cursor.after_id, cursor.page_size).await {
                Ok(page) => {
                    cursor.exhausted = page.len() < cursor.page_size;
                    if page.is_empty() {
                        return None;
                    }
                    cursor.buffer.extend(page);
                }
                Err(err) => {
                    cursor.exhausted = true;
                    return Some((Err(err), cursor));
                }
            }
        }
    })
    .boxed()
}

/// Collect the whole queue, in FIFO order.
///
/// # Errors
///
/// Returns the first storage error encountered.
pub async fn pending_entries(
    queue: Arc<dyn OfflineQueue>,
    page_size: usize,
) -> Result<Vec<CachedEntry>> {
    drain(queue, page_size).try_collect().await
}
