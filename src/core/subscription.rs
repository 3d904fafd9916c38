//! Notification of new on-chain reviews
//!
//! The listener re-reads the whole list after each `ReviewSubmitted` event and
//! reports the newest review it finds. Delivery is at-least-once and may
//! report a review other than the one named in the event.

use ethers::providers::Middleware;
use futures::StreamExt;
use tokio::task::JoinHandle;

use super::session::WalletSession;
use crate::models::Review;

/// Live listener for review submissions. Dropping it stops the listener.
#[derive(Debug)]
pub struct ReviewSubscription {
    task: JoinHandle<()>,
}

impl ReviewSubscription {
    pub(crate) fn spawn<M, F>(session: WalletSession<M>, callback: F) -> Self
    where
        M: Middleware + 'static,
        F: Fn(Review, u64) + Send + Sync + 'static,
    {
        let task = tokio::spawn(async move {
            let event = session.review_contract().review_submitted_filter();
            let mut stream = match event.stream().await {
                Ok(stream) => stream,
                Err(e) => {
                    tracing::error!("Could not watch ReviewSubmitted events: {}", e);
                    return;
                }
            };
            tracing::info!("Watching for new reviews");

            while let Some(item) = stream.next().await {
                let log = match item {
                    Ok(log) => log,
                    Err(e) => {
                        tracing::warn!("Skipping undecodable ReviewSubmitted log: {}", e);
                        continue;
                    }
                };
                tracing::debug!("ReviewSubmitted {} by {:?}", log.review_id, log.submitter);

                // let the node's view catch up with the event
                tokio::time::sleep(session.settle_delay).await;

                match session.newest_review().await {
                    Ok(Some((review, count))) => callback(review, count),
                    Ok(None) => tracing::debug!("Event seen but review list is empty"),
                    Err(e) => tracing::warn!("Could not refresh reviews after event: {}", e),
                }
            }

            tracing::debug!("ReviewSubmitted stream ended");
        });

        Self { task }
    }

    /// Stop listening now. The task winds down on its next scheduling point.
    pub fn cancel(&self) {
        self.task.abort();
    }

    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for ReviewSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}
