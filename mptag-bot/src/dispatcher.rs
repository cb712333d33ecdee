//! Update dispatch
//!
//! Long-polls `getUpdates` and fans updates out to per-chat lanes. Each
//! lane is an unbounded channel drained by one task, so a single chat's
//! updates apply strictly in arrival order while different chats progress
//! concurrently. Updates without a chat are dropped up front.

use crate::controller::Controller;
use crate::telegram::{BotClient, Update};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Server-side long-poll window
const POLL_TIMEOUT_SECS: u64 = 30;

/// Backoff after a failed poll before retrying
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Fans updates out to one FIFO lane per chat
pub struct Dispatcher {
    controller: Arc<Controller>,
    lanes: Mutex<HashMap<i64, mpsc::UnboundedSender<Update>>>,
}

impl Dispatcher {
    pub fn new(controller: Arc<Controller>) -> Self {
        Self {
            controller,
            lanes: Mutex::new(HashMap::new()),
        }
    }

    /// Route one update onto its chat's lane, creating the lane on first use
    pub fn dispatch(&self, update: Update) {
        let Some(chat) = update.chat_id() else {
            debug!(update_id = update.update_id, "Update without chat; dropped");
            return;
        };

        let mut lanes = self.lanes.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let sender = lanes.entry(chat).or_insert_with(|| self.spawn_lane(chat));
        if let Err(mpsc::error::SendError(update)) = sender.send(update) {
            // Lane worker is gone (panicked handler); start a fresh one
            let sender = self.spawn_lane(chat);
            let _ = sender.send(update);
            lanes.insert(chat, sender);
        }
    }

    fn spawn_lane(&self, chat: i64) -> mpsc::UnboundedSender<Update> {
        debug!(chat = chat, "Starting chat lane");
        let (sender, mut receiver) = mpsc::unbounded_channel::<Update>();
        let controller = self.controller.clone();
        tokio::spawn(async move {
            while let Some(update) = receiver.recv().await {
                controller.handle_update(update).await;
            }
        });
        sender
    }
}

/// Poll the Bot API forever, feeding the dispatcher
///
/// Poll failures back off and retry; they never terminate the loop.
pub async fn run_polling(client: Arc<BotClient>, dispatcher: Arc<Dispatcher>) {
    info!("Polling for updates (timeout {}s)", POLL_TIMEOUT_SECS);
    let mut offset = 0i64;
    loop {
        match client.get_updates(offset, POLL_TIMEOUT_SECS).await {
            Ok(updates) => {
                for update in updates {
                    offset = offset.max(update.update_id + 1);
                    dispatcher.dispatch(update);
                }
            }
            Err(e) => {
                error!("getUpdates failed: {}; retrying in {:?}", e, POLL_RETRY_DELAY);
                tokio::time::sleep(POLL_RETRY_DELAY).await;
            }
        }
    }
}
