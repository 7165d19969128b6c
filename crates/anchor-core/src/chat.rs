//! Support chat rooms.
//!
//! There is no real messaging backend. Each room keeps its history in the
//! local key-value table, and replies come from a [`Responder`] that stands
//! in for the other members.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use rand::seq::SliceRandom;
use rusqlite::{params, OptionalExtension, TransactionBehavior};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{GatewayError, Result, ValidationError};
use crate::storage::{ChatConfig, Database};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub member_count: u32,
}

pub const ROOMS: [Room; 8] = [
    Room {
        id: "general",
        name: "General Support",
        description: "Share your thoughts and get support from the community",
        member_count: 42,
    },
    Room {
        id: "anxiety",
        name: "Anxiety Support",
        description: "Connect with others managing anxiety",
        member_count: 28,
    },
    Room {
        id: "motivation",
        name: "Daily Motivation",
        description: "Share wins and motivate each other",
        member_count: 35,
    },
    Room {
        id: "mindfulness",
        name: "Mindfulness & Meditation",
        description: "Discuss meditation and mindfulness practices",
        member_count: 19,
    },
    Room {
        id: "learning",
        name: "Learning & Growth",
        description: "Share resources and learning experiences",
        member_count: 23,
    },
    Room {
        id: "fitness",
        name: "Mental Health & Fitness",
        description: "Discuss the connection between physical and mental health",
        member_count: 31,
    },
    Room {
        id: "creative",
        name: "Creative Expression",
        description: "Share art, music, and creative outlets",
        member_count: 16,
    },
    Room {
        id: "music",
        name: "Music & Mood",
        description: "Share music that helps with your mental health",
        member_count: 27,
    },
];

pub fn rooms() -> &'static [Room] {
    &ROOMS
}

pub fn room(id: &str) -> std::result::Result<&'static Room, ValidationError> {
    ROOMS
        .iter()
        .find(|r| r.id == id)
        .ok_or_else(|| ValidationError::UnknownId {
            kind: "chat room",
            id: id.to_string(),
        })
}

/// One message in a room's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub content: String,
    /// Unix milliseconds
    pub timestamp: i64,
    pub group_id: String,
    pub is_own: bool,
}

/// Stand-in for the other members of a room.
pub trait Responder: Send + Sync {
    /// Pause before the others "start typing".
    fn typing_delay(&self) -> Duration;

    /// Pause while they type.
    fn reply_delay(&self) -> Duration;

    fn respond(&self, room: &Room, message: &ChatMessage) -> String;
}

pub const CANNED_REPLIES: [&str; 7] = [
    "Thanks for sharing! I can relate to that 💙",
    "That's really helpful, thank you!",
    "I'm going through something similar. You're not alone 🤗",
    "Great perspective! This community is amazing",
    "Sending positive vibes your way ✨",
    "I appreciate you opening up about this",
    "This really resonates with me. Thank you for sharing",
];

/// Picks uniformly from [`CANNED_REPLIES`].
#[derive(Debug, Clone)]
pub struct CannedResponder {
    typing_delay: Duration,
    reply_delay: Duration,
}

impl CannedResponder {
    pub fn new(typing_delay: Duration, reply_delay: Duration) -> Self {
        Self {
            typing_delay,
            reply_delay,
        }
    }

    pub fn from_config(config: &ChatConfig) -> Self {
        Self::new(
            Duration::from_millis(config.typing_delay_ms),
            Duration::from_millis(config.reply_delay_ms),
        )
    }

    pub fn immediate() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }
}

impl Default for CannedResponder {
    fn default() -> Self {
        Self::from_config(&ChatConfig::default())
    }
}

impl Responder for CannedResponder {
    fn typing_delay(&self) -> Duration {
        self.typing_delay
    }

    fn reply_delay(&self) -> Duration {
        self.reply_delay
    }

    fn respond(&self, _room: &Room, _message: &ChatMessage) -> String {
        CANNED_REPLIES
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(CANNED_REPLIES[0])
            .to_string()
    }
}

/// What a send produced.
#[derive(Debug, Clone, Serialize)]
pub struct Exchange {
    pub sent: ChatMessage,
    pub reply: ChatMessage,
}

fn history_key(room_id: &str) -> String {
    format!("anchor-chat-{room_id}")
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn welcome_messages(room: &Room) -> Vec<ChatMessage> {
    let now = now_millis();
    vec![
        ChatMessage {
            id: "welcome-1".to_string(),
            content: format!("Welcome to {}! 👋", room.name),
            timestamp: now - 5 * 60 * 1000,
            group_id: room.id.to_string(),
            is_own: false,
        },
        ChatMessage {
            id: "welcome-2".to_string(),
            content: "This is a safe space to share and connect. Remember to be kind and supportive! 💙"
                .to_string(),
            timestamp: now - 4 * 60 * 1000,
            group_id: room.id.to_string(),
            is_own: false,
        },
    ]
}

/// Per-room message history in the local key-value table.
pub struct ChatStore {
    db: Mutex<Database>,
}

impl ChatStore {
    pub fn new(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    pub fn open() -> std::result::Result<Self, GatewayError> {
        Ok(Self::new(Database::open()?))
    }

    pub fn open_memory() -> std::result::Result<Self, GatewayError> {
        Ok(Self::new(Database::open_memory()?))
    }

    fn db(&self) -> MutexGuard<'_, Database> {
        self.db.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn load(&self, room_id: &str) -> Result<Option<Vec<ChatMessage>>> {
        let raw = self.db().kv_get(&history_key(room_id))?;
        Ok(raw.map(|s| serde_json::from_str(&s)).transpose()?)
    }

    fn save(&self, room_id: &str, messages: &[ChatMessage]) -> Result<()> {
        let raw = serde_json::to_string(messages)?;
        self.db().kv_set(&history_key(room_id), &raw)?;
        Ok(())
    }

    /// Add one message to the end of the stored history.
    ///
    /// The history is re-read under the write lock, so messages another
    /// process posted in the meantime are kept.
    fn append(&self, room: &Room, message: &ChatMessage) -> Result<()> {
        let key = history_key(room.id);
        let mut db = self.db();
        let tx = db
            .conn_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let raw: Option<String> = tx
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        let mut messages: Vec<ChatMessage> = match raw {
            Some(raw) => serde_json::from_str(&raw)?,
            None => welcome_messages(room),
        };
        messages.push(message.clone());
        tx.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, serde_json::to_string(&messages)?],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Messages in the room, oldest first. The first open seeds the
    /// welcome messages.
    pub fn history(&self, room_id: &str) -> Result<Vec<ChatMessage>> {
        let room = room(room_id)?;
        if let Some(messages) = self.load(room.id)? {
            return Ok(messages);
        }
        let messages = welcome_messages(room);
        self.save(room.id, &messages)?;
        tracing::debug!(room = room.id, "seeded chat history");
        Ok(messages)
    }

    /// Post `text` to the room and wait for the responder's reply.
    pub async fn send(
        &self,
        room_id: &str,
        text: &str,
        responder: &dyn Responder,
    ) -> Result<Exchange> {
        let room = room(room_id)?;
        let content = text.trim();
        if content.is_empty() {
            return Err(ValidationError::Empty("message").into());
        }

        let sent = ChatMessage {
            id: format!("msg-{}", Uuid::new_v4()),
            content: content.to_string(),
            timestamp: now_millis(),
            group_id: room.id.to_string(),
            is_own: true,
        };
        self.append(room, &sent)?;

        tokio::time::sleep(responder.typing_delay()).await;
        tokio::time::sleep(responder.reply_delay()).await;

        let reply = ChatMessage {
            id: format!("response-{}", Uuid::new_v4()),
            content: responder.respond(room, &sent),
            timestamp: now_millis(),
            group_id: room.id.to_string(),
            is_own: false,
        };
        self.append(room, &reply)?;

        Ok(Exchange { sent, reply })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    struct Echo;

    impl Responder for Echo {
        fn typing_delay(&self) -> Duration {
            Duration::ZERO
        }
        fn reply_delay(&self) -> Duration {
            Duration::ZERO
        }
        fn respond(&self, room: &Room, message: &ChatMessage) -> String {
            format!("{}: {}", room.id, message.content)
        }
    }

    #[test]
    fn first_open_seeds_welcome_messages() {
        let store = ChatStore::open_memory().unwrap();
        let history = store.history("anxiety").unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "Welcome to Anxiety Support! 👋");
        assert!(history[0].timestamp < history[1].timestamp);
        assert!(history.iter().all(|m| !m.is_own && m.group_id == "anxiety"));

        // Seeding happens once.
        assert_eq!(store.history("anxiety").unwrap(), history);
    }

    #[test]
    fn unknown_room_is_rejected() {
        let store = ChatStore::open_memory().unwrap();
        assert!(matches!(
            store.history("poker"),
            Err(CoreError::Validation(ValidationError::UnknownId { .. }))
        ));
    }

    #[tokio::test]
    async fn send_appends_own_message_and_reply() {
        let store = ChatStore::open_memory().unwrap();
        let exchange = store.send("music", "  hello there ", &Echo).await.unwrap();
        assert_eq!(exchange.sent.content, "hello there");
        assert!(exchange.sent.is_own);
        assert_eq!(exchange.reply.content, "music: hello there");
        assert!(!exchange.reply.is_own);

        let history = store.history("music").unwrap();
        assert_eq!(history.len(), 4);
        assert_eq!(history[2], exchange.sent);
        assert_eq!(history[3], exchange.reply);
    }

    struct Slow;

    impl Responder for Slow {
        fn typing_delay(&self) -> Duration {
            Duration::from_millis(20)
        }
        fn reply_delay(&self) -> Duration {
            Duration::from_millis(60)
        }
        fn respond(&self, _room: &Room, _message: &ChatMessage) -> String {
            "slow reply".to_string()
        }
    }

    #[tokio::test]
    async fn reply_keeps_messages_posted_while_waiting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anchor.db");
        let first = ChatStore::new(Database::open_at(&path).unwrap());
        let second = ChatStore::new(Database::open_at(&path).unwrap());

        let (slow, quick) = tokio::join!(first.send("music", "first", &Slow), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            second.send("music", "second", &Echo).await
        });
        slow.unwrap();
        quick.unwrap();

        let contents: Vec<String> = first
            .history("music")
            .unwrap()
            .into_iter()
            .skip(2)
            .map(|m| m.content)
            .collect();
        assert_eq!(
            contents,
            vec!["first", "second", "music: second", "slow reply"]
        );
    }

    #[tokio::test]
    async fn blank_message_is_rejected_without_touching_history() {
        let store = ChatStore::open_memory().unwrap();
        let err = store.send("general", "   ", &Echo).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::Empty("message"))
        ));
        assert_eq!(store.history("general").unwrap().len(), 2);
    }

    #[tokio::test]
    async fn canned_responder_picks_from_catalog() {
        let store = ChatStore::open_memory().unwrap();
        let exchange = store
            .send("general", "hi", &CannedResponder::immediate())
            .await
            .unwrap();
        assert!(CANNED_REPLIES.contains(&exchange.reply.content.as_str()));
    }

    #[test]
    fn history_is_stored_under_room_key() {
        let store = ChatStore::open_memory().unwrap();
        store.history("creative").unwrap();
        let raw = store.db().kv_get("anchor-chat-creative").unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json[0]["groupId"], "creative");
        assert_eq!(json[0]["isOwn"], false);
    }

    #[test]
    fn eight_rooms() {
        assert_eq!(rooms().len(), 8);
        assert_eq!(room("fitness").unwrap().member_count, 31);
    }
}
