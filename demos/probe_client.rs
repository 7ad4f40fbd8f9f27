//! Minimal relay client: connect, send one message, print the replies
//!
//! ```text
//! cargo run --example probe_client -- ws://localhost:8000/ws
//! ```

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "ws://localhost:8000/ws".to_string());

    println!("🔌 Connecting to {}...", url);
    let (mut ws, _) = connect_async(url.as_str()).await?;
    println!("✅ Connected");

    println!("📨 Welcome: {}", next_json(&mut ws).await?);

    let timestamp = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs_f64();
    let outgoing = json!({
        "type": "message",
        "message": "Hello from the probe client!",
        "timestamp": timestamp,
    });
    println!("📤 Sending: {}", outgoing);
    ws.send(Message::Text(outgoing.to_string().into())).await?;

    println!("📨 Echo: {}", next_json(&mut ws).await?);
    println!("📨 Broadcast: {}", next_json(&mut ws).await?);

    ws.close(None).await?;
    println!("🎉 Relay is working");
    Ok(())
}

async fn next_json<S>(ws: &mut S) -> anyhow::Result<Value>
where
    S: futures_util::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let frame = timeout(Duration::from_secs(5), ws.next())
            .await?
            .ok_or_else(|| anyhow::anyhow!("connection closed"))??;

        if let Message::Text(text) = frame {
            return Ok(serde_json::from_str(&text)?);
        }
    }
}
