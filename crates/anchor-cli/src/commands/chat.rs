use clap::Subcommand;

use anchor_core::chat::{self, CannedResponder, ChatMessage, ChatStore};
use anchor_core::Config;

#[derive(Subcommand)]
pub enum ChatAction {
    /// List rooms
    Rooms,
    /// Show a room's messages
    Open {
        /// Room ID (e.g. general, anxiety)
        room: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Post a message and wait for a reply
    Send {
        room: String,
        text: String,
    },
}

fn print_message(msg: &ChatMessage) {
    let time = chrono::DateTime::from_timestamp_millis(msg.timestamp)
        .map(|t| t.with_timezone(&chrono::Local).format("%H:%M").to_string())
        .unwrap_or_default();
    let who = if msg.is_own { "you" } else { "member" };
    println!("[{time}] {who}: {}", msg.content);
}

pub async fn run(action: ChatAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ChatAction::Rooms => {
            for room in chat::rooms() {
                println!(
                    "{:<12} {:<26} {:>3} members  {}",
                    room.id, room.name, room.member_count, room.description
                );
            }
        }
        ChatAction::Open { room, json } => {
            let store = ChatStore::open()?;
            let history = store.history(&room)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&history)?);
            } else {
                println!("# {}", chat::room(&room)?.name);
                history.iter().for_each(print_message);
            }
        }
        ChatAction::Send { room, text } => {
            let config = Config::load()?;
            let responder = CannedResponder::from_config(&config.chat);
            let store = ChatStore::open()?;
            let exchange = store.send(&room, &text, &responder).await?;
            print_message(&exchange.sent);
            print_message(&exchange.reply);
        }
    }
    Ok(())
}
