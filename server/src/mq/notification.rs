use std::sync::{Arc, Mutex};
use std::time::Duration;

use driver::database::{RedisDatabase, RedisMessageQueue};
use driver::notification::TelegramClient;
use error_stack::Report;
use kernel::interface::mq::{
    ErrorOperation, ErroredInfo, HandlerResult, MQConfig, MessageQueue, QueueInfo,
};
use kernel::interface::notify::{ChatId, Notification, Notifier};
use kernel::prelude::entity::{SelectLimit, SelectOffset};
use kernel::KernelError;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};

pub const NOTIFICATION_WORKER: &str = "notification_worker";

pub type NotificationHandler = fn(TelegramClient, Notification) -> HandlerResult;
pub type NotificationQueue = RedisMessageQueue<TelegramClient, Notification, NotificationHandler>;

pub fn init_notification_worker(db: RedisDatabase, client: TelegramClient) -> NotificationQueue {
    RedisMessageQueue::with_handler(
        db,
        client,
        NOTIFICATION_WORKER,
        MQConfig::default(),
        deliver as NotificationHandler,
    )
}

fn deliver(client: TelegramClient, notification: Notification) -> HandlerResult {
    Box::pin(async move {
        client
            .send(&notification)
            .await
            .map_err(|report| {
                let operation = retry_policy(report.current_context());
                report.change_context(operation)
            })
    })
}

fn retry_policy(error: &KernelError) -> ErrorOperation {
    match error {
        KernelError::Timeout => ErrorOperation::Delay,
        _ => ErrorOperation::Failed,
    }
}

/// One page of deliveries the workers gave up on.
#[derive(Debug)]
pub struct FailedNotifications {
    pub total: usize,
    pub infos: Vec<ErroredInfo<Notification>>,
}

/// Queues every message for the worker pool.
///
/// Enqueueing runs on its own task so callers never wait on Redis; failures
/// end up in the log only.
#[derive(Clone)]
pub struct QueueNotifier {
    queue: Arc<NotificationQueue>,
    chat_id: ChatId,
    in_flight: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl QueueNotifier {
    pub fn new(queue: NotificationQueue, chat_id: ChatId) -> Self {
        Self {
            queue: Arc::new(queue),
            chat_id,
            in_flight: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn start_workers(&self) {
        self.queue.start_workers();
    }

    pub async fn failed(
        &self,
        limit: &SelectLimit,
        offset: &SelectOffset,
    ) -> error_stack::Result<FailedNotifications, KernelError> {
        let total = self.queue.get_failed_len().await?;
        let infos = self
            .queue
            .get_failed_infos(limit.as_ref(), offset.as_ref())
            .await?;
        Ok(FailedNotifications { total, infos })
    }

    /// Waits until every spawned enqueue finished and the stream drained, or
    /// `timeout` passed. Returns how many entries are still queued.
    pub async fn drain(&self, timeout: Duration) -> error_stack::Result<usize, KernelError> {
        let handles = match self.in_flight.lock() {
            Ok(mut in_flight) => std::mem::take(&mut *in_flight),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        for handle in handles {
            if let Err(error) = handle.await {
                tracing::error!("Notification task panicked: {error}");
            }
        }

        let deadline = Instant::now() + timeout;
        loop {
            let queued = self.queue.get_queued_len().await?;
            if queued == 0 || Instant::now() >= deadline {
                return Ok(queued);
            }
            sleep(Duration::from_millis(200)).await;
        }
    }
}

#[async_trait::async_trait]
impl Notifier for QueueNotifier {
    async fn notify(&self, text: String) {
        let info = QueueInfo::from(Notification::new(self.chat_id.clone(), text));
        let queue = Arc::clone(&self.queue);
        let handle = tokio::spawn(async move {
            if let Err(report) = queue.queue(&info).await {
                let report: Report<KernelError> =
                    report.attach_printable(format!("Dropped notification {}", info.id()));
                tracing::error!("{report:?}");
            }
        });
        match self.in_flight.lock() {
            Ok(mut in_flight) => {
                in_flight.retain(|handle| !handle.is_finished());
                in_flight.push(handle);
            }
            Err(_) => tracing::warn!("Notification tracker poisoned; not tracking task"),
        }
    }
}
