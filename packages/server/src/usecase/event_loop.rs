//! Room event loop: the single logical worker for the chat room.
//!
//! Connection handlers and the HTTP post endpoint never mutate the room
//! directly. They submit to this queue, and one task handles commands strictly
//! one at a time, which keeps per-connection order and serialises room
//! mutations.

use std::sync::Arc;

use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};

use crate::domain::{ChatMessage, ConnectionId};

use super::{
    chat_room::{ChatRoomCoordinator, RoomEvent},
    error::PostMessageError,
};

type PostReply = oneshot::Sender<Result<ChatMessage, PostMessageError>>;

/// One unit of work for the room event loop.
#[derive(Debug)]
pub enum RoomCommand {
    /// An event from one connection.
    Connection {
        connection_id: ConnectionId,
        event: RoomEvent,
    },
    /// A message posted over HTTP. The outcome goes back on `reply`.
    HttpPost {
        author: Option<String>,
        text: Option<String>,
        reply: PostReply,
    },
}

/// Submission handle for the room event loop.
#[derive(Debug, Clone)]
pub struct RoomEventSender {
    tx: mpsc::UnboundedSender<RoomCommand>,
}

impl RoomEventSender {
    /// Queue an event. Returns `false` when the loop has stopped.
    pub fn submit(&self, connection_id: ConnectionId, event: RoomEvent) -> bool {
        match self.tx.send(RoomCommand::Connection {
            connection_id,
            event,
        }) {
            Ok(()) => true,
            Err(e) => {
                if let RoomCommand::Connection { connection_id, .. } = e.0 {
                    tracing::warn!(
                        connection_id = %connection_id,
                        "Room event loop has stopped; event dropped"
                    );
                }
                false
            }
        }
    }

    /// Queue an HTTP post and wait for the loop to append and broadcast it.
    pub async fn post_message(
        &self,
        author: Option<String>,
        text: Option<String>,
    ) -> Result<ChatMessage, PostMessageError> {
        let (reply, outcome) = oneshot::channel();
        if self
            .tx
            .send(RoomCommand::HttpPost {
                author,
                text,
                reply,
            })
            .is_err()
        {
            tracing::warn!("Room event loop has stopped; HTTP post dropped");
            return Err(PostMessageError::Unavailable);
        }
        outcome.await.unwrap_or(Err(PostMessageError::Unavailable))
    }
}

pub struct RoomEventLoop {
    coordinator: Arc<ChatRoomCoordinator>,
    rx: mpsc::UnboundedReceiver<RoomCommand>,
}

impl RoomEventLoop {
    pub fn new(coordinator: Arc<ChatRoomCoordinator>) -> (Self, RoomEventSender) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { coordinator, rx }, RoomEventSender { tx })
    }

    /// Handle commands until every sender has been dropped.
    pub async fn run(mut self) {
        tracing::debug!("Room event loop started");
        while let Some(command) = self.rx.recv().await {
            match command {
                RoomCommand::Connection {
                    connection_id,
                    event,
                } => self.coordinator.handle(&connection_id, event).await,
                RoomCommand::HttpPost {
                    author,
                    text,
                    reply,
                } => {
                    let outcome = self.coordinator.post_http_message(author, text).await;
                    if reply.send(outcome).is_err() {
                        tracing::debug!("HTTP caller went away before the post completed");
                    }
                }
            }
        }
        tracing::debug!("Room event loop stopped");
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        domain::{
            DirectoryError, PresenceRecord, Room, TypingState, UserDirectory, UserId, UserRecord,
        },
        infrastructure::{
            directory::InMemoryUserDirectory, message_pusher::WebSocketMessagePusher,
            repository::InMemoryRoomRepository,
        },
        usecase::{
            chat_room::JoinRequest,
            directory_adapter::{DEFAULT_DIRECTORY_TIMEOUT, DirectoryAdapter},
        },
    };
    use async_trait::async_trait;
    use clubroom_shared::time::SystemClock;
    use serde_json::Value;
    use tokio::sync::Mutex;

    fn coordinator_with(directory: Arc<dyn UserDirectory>) -> Arc<ChatRoomCoordinator> {
        let clock = Arc::new(SystemClock);
        let repository = Arc::new(InMemoryRoomRepository::new(Arc::new(Mutex::new(Room::new()))));
        let pusher = Arc::new(WebSocketMessagePusher::default());
        let directory = Arc::new(DirectoryAdapter::new(
            directory,
            clock.clone(),
            DEFAULT_DIRECTORY_TIMEOUT,
        ));
        Arc::new(ChatRoomCoordinator::new(repository, pusher, directory, clock))
    }

    fn coordinator() -> Arc<ChatRoomCoordinator> {
        coordinator_with(Arc::new(InMemoryUserDirectory::new()))
    }

    /// Knows nobody and takes 100 ms to record presence.
    struct SlowPresenceDirectory;

    #[async_trait]
    impl UserDirectory for SlowPresenceDirectory {
        async fn find_user(&self, _user_id: &UserId) -> Result<Option<UserRecord>, DirectoryError> {
            Ok(None)
        }

        async fn update_presence(
            &self,
            _user_id: &UserId,
            _presence: PresenceRecord,
        ) -> Result<(), DirectoryError> {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok(())
        }

        async fn list_where_online(&self) -> Result<Vec<UserRecord>, DirectoryError> {
            Ok(vec![])
        }
    }

    fn conn(id: &str) -> ConnectionId {
        ConnectionId::new(id.to_string()).unwrap()
    }

    fn join(user_id: &str, name: &str) -> RoomEvent {
        RoomEvent::Join(JoinRequest {
            user_id: Some(user_id.to_string()),
            name: Some(name.to_string()),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_events_from_one_connection_are_handled_in_order() {
        // given (preconditions):
        let coordinator = coordinator();
        let (event_loop, sender) = RoomEventLoop::new(coordinator.clone());
        let (tx, _rx) = mpsc::unbounded_channel();
        coordinator.connect(conn("a"), tx).await;

        // when (operation): join, typing and three messages queued back to back
        assert!(sender.submit(conn("a"), join("u1", "Alice")));
        assert!(sender.submit(conn("a"), RoomEvent::Typing(TypingState::Started)));
        for text in ["one", "two", "three"] {
            sender.submit(
                conn("a"),
                RoomEvent::SendMessage {
                    text: text.to_string(),
                },
            );
        }
        drop(sender);
        event_loop.run().await;

        // then (expected): the join landed before the messages
        let texts: Vec<String> = coordinator
            .history()
            .await
            .into_iter()
            .map(|m| m.text.into_string())
            .collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn test_concurrent_joins_see_each_other() {
        // given (preconditions):
        let coordinator = coordinator();
        let (event_loop, sender) = RoomEventLoop::new(coordinator.clone());
        let handle = event_loop.spawn();
        let mut receivers = Vec::new();
        for id in ["a", "b"] {
            let (tx, rx) = mpsc::unbounded_channel();
            coordinator.connect(conn(id), tx).await;
            receivers.push(rx);
        }

        // when (operation): both joins submitted from separate tasks
        let tasks: Vec<_> = [("a", "u1", "Alice"), ("b", "u2", "Bob")]
            .into_iter()
            .map(|(id, user, name)| {
                let sender = sender.clone();
                tokio::spawn(async move { sender.submit(conn(id), join(user, name)) })
            })
            .collect();
        for task in tasks {
            assert!(task.await.unwrap());
        }
        drop(sender);
        handle.await.unwrap();

        // then (expected): each connection's last active-users holds both
        for rx in receivers.iter_mut() {
            let mut last_snapshot = None;
            while let Ok(frame) = rx.try_recv() {
                let event: serde_json::Value = serde_json::from_str(&frame).unwrap();
                if event["event"] == "active-users" {
                    last_snapshot = Some(event["data"].as_array().unwrap().len());
                }
            }
            assert_eq!(last_snapshot, Some(2));
        }
    }

    #[tokio::test]
    async fn test_submit_after_loop_stopped_returns_false() {
        let (event_loop, sender) = RoomEventLoop::new(coordinator());
        drop(event_loop);

        assert!(!sender.submit(conn("a"), RoomEvent::Leave));
    }

    #[tokio::test]
    async fn test_http_post_during_slow_join_reaches_joiner_once_after_init() {
        // Test: a post issued while a join waits on the directory is handled after the join
        // given (preconditions):
        let coordinator = coordinator_with(Arc::new(SlowPresenceDirectory));
        let (event_loop, sender) = RoomEventLoop::new(coordinator.clone());
        let handle = event_loop.spawn();
        let (tx, mut rx) = mpsc::unbounded_channel();
        coordinator.connect(conn("a"), tx).await;

        // when (operation): the post arrives 20 ms into the 100 ms presence write
        assert!(sender.submit(conn("a"), join("u1", "Alice")));
        tokio::time::sleep(Duration::from_millis(20)).await;
        let posted = sender
            .post_message(None, Some("X".to_string()))
            .await
            .unwrap();
        drop(sender);
        handle.await.unwrap();

        // then (expected): init comes first and is empty, X arrives exactly once afterwards
        let mut events = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            events.push(serde_json::from_str::<Value>(&frame).unwrap());
        }
        assert_eq!(events[0]["event"], "init");
        assert_eq!(events[0]["data"], serde_json::json!([]));
        let deliveries: Vec<&Value> = events
            .iter()
            .filter(|e| e["event"] == "new-message" && e["data"]["text"] == "X")
            .collect();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0]["data"]["id"], posted.id.value());
        assert_eq!(posted.author_name.as_str(), "Anonymous");
    }

    #[tokio::test]
    async fn test_http_post_after_loop_stopped_is_unavailable() {
        let (event_loop, sender) = RoomEventLoop::new(coordinator());
        drop(event_loop);

        let result = sender.post_message(None, Some("hello".to_string())).await;

        assert_eq!(result, Err(PostMessageError::Unavailable));
    }
}
