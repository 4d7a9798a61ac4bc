use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::client::TelegramClient;
use crate::handlers::ChatHandler;
use crate::types::Update;

const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Long-polls `getUpdates` until `shutdown` resolves. Each update is handled
/// on its own task so a slow catalog lookup does not hold up the chat.
pub async fn run(client: Arc<TelegramClient>, handler: ChatHandler, shutdown: impl Future<Output = ()>) {
    tokio::pin!(shutdown);
    let mut offset = 0;
    info!("Telegram poller started");

    loop {
        let updates = tokio::select! {
            _ = &mut shutdown => break,
            result = client.get_updates(offset) => result,
        };

        let updates = match updates {
            Ok(updates) => updates,
            Err(e) => {
                warn!("getUpdates failed: {}", e);
                tokio::select! {
                    _ = &mut shutdown => break,
                    _ = tokio::time::sleep(RETRY_DELAY) => continue,
                }
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            let client = client.clone();
            let handler = handler.clone();
            tokio::spawn(async move { dispatch(&client, &handler, update).await });
        }
    }

    info!("Telegram poller stopped");
}

async fn dispatch(client: &TelegramClient, handler: &ChatHandler, update: Update) {
    debug!("Update {}", update.update_id);

    if let Some(message) = update.message {
        handler.handle_message(&message).await;
    } else if let Some(query) = update.callback_query {
        let notice = handler.handle_callback(&query).await;
        if let Err(e) = client.answer_callback_query(&query.id, notice.as_deref()).await {
            warn!("Failed to answer callback {}: {}", query.id, e);
        }
    }
}
