//! Background update polling into the single-slot remote command channel

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use super::{ChatTransport, ChatUpdate, RemoteCommand, UpdateDedup};

/// Publishing side of the remote command slot
pub type RemoteSender = watch::Sender<Option<RemoteCommand>>;

/// Session side of the remote command slot
pub type RemoteReceiver = watch::Receiver<Option<RemoteCommand>>;

/// Create an empty remote command slot
#[must_use]
pub fn remote_channel() -> (RemoteSender, RemoteReceiver) {
    watch::channel(None)
}

/// Spawn a task that polls `transport` every `interval`
///
/// Each accepted text update replaces whatever is waiting in the slot. Chats not
/// in `allowed_chats` are ignored unless the list is empty. The task ends when
/// every receiver is gone.
pub fn spawn_poller(
    transport: Arc<dyn ChatTransport>,
    tx: RemoteSender,
    interval: Duration,
    allowed_chats: Vec<i64>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut offset: Option<i64> = None;
        let mut dedup = UpdateDedup::default();

        tracing::info!(channel = transport.name(), "polling for remote commands");

        while !tx.is_closed() {
            match transport.get_updates(offset).await {
                Ok(updates) => {
                    for update in updates {
                        offset = Some(offset.map_or(update.update_id + 1, |o| o.max(update.update_id + 1)));
                        if dedup.is_duplicate(update.update_id) {
                            continue;
                        }
                        if let Some(command) = accept(update, &allowed_chats) {
                            tracing::info!(chat_id = command.chat_id, text = %command.text, "remote command");
                            tx.send_replace(Some(command));
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(channel = transport.name(), error = %e, "update poll failed");
                }
            }

            tokio::time::sleep(interval).await;
        }
    })
}

fn accept(update: ChatUpdate, allowed_chats: &[i64]) -> Option<RemoteCommand> {
    if !allowed_chats.is_empty() && !allowed_chats.contains(&update.chat_id) {
        tracing::debug!(chat_id = update.chat_id, "ignoring message from unlisted chat");
        return None;
    }
    let text = update.text.trim();
    if text.is_empty() {
        return None;
    }
    Some(RemoteCommand {
        chat_id: update.chat_id,
        text: text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::Result;

    struct ScriptedTransport {
        batches: Mutex<Vec<Vec<ChatUpdate>>>,
        offsets: Mutex<Vec<Option<i64>>>,
    }

    #[async_trait]
    impl ChatTransport for ScriptedTransport {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<ChatUpdate>> {
            self.offsets.lock().unwrap().push(offset);
            let mut batches = self.batches.lock().unwrap();
            Ok(if batches.is_empty() { Vec::new() } else { batches.remove(0) })
        }

        async fn send_message(&self, _chat_id: i64, _text: &str) -> Result<()> {
            Ok(())
        }
    }

    fn update(update_id: i64, chat_id: i64, text: &str) -> ChatUpdate {
        ChatUpdate {
            update_id,
            chat_id,
            text: text.to_string(),
        }
    }

    #[test]
    fn filters_unlisted_chats_and_blank_text() {
        assert!(accept(update(1, 5, "hi"), &[7]).is_none());
        assert!(accept(update(1, 7, "   "), &[7]).is_none());
        assert_eq!(
            accept(update(1, 7, " what time is it "), &[]).unwrap().text,
            "what time is it"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn publishes_latest_and_advances_offset() {
        let transport = Arc::new(ScriptedTransport {
            batches: Mutex::new(vec![
                vec![update(3, 1, "first"), update(4, 1, "second")],
                vec![update(4, 1, "second")],
            ]),
            offsets: Mutex::new(Vec::new()),
        });
        let (tx, mut rx) = remote_channel();
        let handle = spawn_poller(transport.clone(), tx, Duration::from_millis(10), Vec::new());

        rx.changed().await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.abort();

        let latest = rx.borrow_and_update().clone().unwrap();
        assert_eq!(latest.text, "second");

        let offsets = transport.offsets.lock().unwrap().clone();
        assert_eq!(offsets[0], None);
        assert_eq!(offsets[1], Some(5));
    }
}
