use chronos_shared::{Collection, Document, Filter};
use tokio::{
    sync::{broadcast::error::RecvError, mpsc},
    task::JoinHandle,
};

use crate::SharedStore;

/// Live query over one collection.
///
/// Delivers the current matching documents right away, then a fresh snapshot
/// after every write to the collection that changes the result. Dropping the
/// subscription unsubscribes.
pub struct Subscription {
    receiver: mpsc::Receiver<Vec<Document>>,
    handle: JoinHandle<()>,
}

impl Subscription {
    pub fn spawn(store: SharedStore, collection: Collection, filters: Vec<Filter>) -> Self {
        let (sender, receiver) = mpsc::channel(16);
        let mut changes = store.changes();

        let handle = tokio::spawn(async move {
            let mut last: Option<Vec<Document>> = None;

            loop {
                match store.query(collection, &filters).await {
                    Ok(docs) if last.as_ref() != Some(&docs) => {
                        if sender.send(docs.clone()).await.is_err() {
                            return;
                        }

                        last = Some(docs);
                    }
                    Ok(_) => {}
                    Err(err) => {
                        tracing::warn!(%collection, "subscription query failed: {err}");
                    }
                }

                loop {
                    match changes.recv().await {
                        Ok(changed) if changed == collection => break,
                        Ok(_) => continue,
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::debug!(%collection, skipped, "subscription lagged");
                            break;
                        }
                        Err(RecvError::Closed) => return,
                    }
                }
            }
        });

        Self { receiver, handle }
    }

    pub async fn next(&mut self) -> Option<Vec<Document>> {
        self.receiver.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Next snapshot of an optional subscription. Never resolves when there is no
/// subscription or when it has ended, so it can sit in a `select!` arm.
pub async fn next_snapshot(subscription: &mut Option<Subscription>) -> Vec<Document> {
    let Some(subscription) = subscription else {
        return std::future::pending().await;
    };

    match subscription.next().await {
        Some(docs) => docs,
        None => std::future::pending().await,
    }
}
