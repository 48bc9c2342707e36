use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, warn};

use shared_utils::ScheduledTask;

use crate::services::messages::MessageService;

/// Keeps an unread-message count fresh on a fixed interval.
///
/// The count is published on a watch channel. A failed poll keeps the last
/// known count. The polling task stops when the poller is stopped or dropped
/// and only starts again on an explicit `start`.
pub struct UnreadPoller {
    service: MessageService,
    sender: Arc<watch::Sender<usize>>,
    receiver: watch::Receiver<usize>,
    task: Option<ScheduledTask>,
}

impl UnreadPoller {
    pub fn new(service: MessageService) -> Self {
        let (sender, receiver) = watch::channel(0);
        Self {
            service,
            sender: Arc::new(sender),
            receiver,
            task: None,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.receiver.clone()
    }

    pub fn latest(&self) -> usize {
        *self.receiver.borrow()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().map(|t| !t.is_finished()).unwrap_or(false)
    }

    /// Starts polling, replacing any previous task.
    pub fn start(&mut self, interval: Duration) {
        let service = self.service.clone();
        let sender = Arc::clone(&self.sender);

        let task = ScheduledTask::every("unread-poller", interval, move || {
            let service = service.clone();
            let sender = Arc::clone(&sender);
            async move {
                let Some(session) = service.session().current() else {
                    debug!("Skipping unread poll: no session");
                    return;
                };

                match service.unread_count(session.user_id()).await {
                    Ok(count) => {
                        sender.send_if_modified(|current| {
                            if *current == count {
                                false
                            } else {
                                *current = count;
                                true
                            }
                        });
                    }
                    Err(e) => warn!("Unread count poll failed: {}", e),
                }
            }
        });

        self.task = Some(task);
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.cancel();
        }
    }
}
