use clap::{Arg, ArgAction, Command};
use futures_util::{SinkExt, StreamExt};
use pmis_backend::websocket::{ClientFrame, ServerFrame};
use std::time::Duration;
use tokio::io::AsyncBufReadExt;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message as TungsteniteMessage};
use url::Url;
use uuid::Uuid;

fn print_frame(frame: &ServerFrame) {
    match frame {
        ServerFrame::Welcome { connection_id, user_id, organization_id } => {
            println!("connected as {} in {} (connection {})", user_id, organization_id, connection_id)
        }
        ServerFrame::Pong { timestamp } => println!("pong {}", timestamp),
        ServerFrame::Message { message } => {
            println!("[{}] {}: {}", message.conversation_id, message.sender_id, message.body)
        }
        ServerFrame::Typing { conversation_id, user_id } => {
            println!("[{}] {} is typing", conversation_id, user_id)
        }
        ServerFrame::Notification { title, body, .. } => println!("* {}: {}", title, body),
        ServerFrame::Error { code, message } => eprintln!("error {}: {}", code, message),
    }
}

/// Parses one input line: `/typing`, `/read`, `/ping`, or message text.
fn parse_line(line: &str, conversation_id: Uuid) -> Option<ClientFrame> {
    match line.trim() {
        "" => None,
        "/ping" => Some(ClientFrame::Ping),
        "/typing" => Some(ClientFrame::Typing { conversation_id }),
        "/read" => Some(ClientFrame::MarkRead { conversation_id }),
        text => Some(ClientFrame::SendMessage {
            conversation_id,
            body: text.to_string(),
        }),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = Command::new("chat_client")
        .about("Interactive client for the chat WebSocket")
        .arg(
            Arg::new("url")
                .long("url")
                .default_value("ws://127.0.0.1:8000/ws")
                .help("WebSocket endpoint"),
        )
        .arg(Arg::new("token").long("token").required(true).help("Access token"))
        .arg(
            Arg::new("conversation")
                .long("conversation")
                .required(true)
                .help("Conversation id to post into"),
        )
        .arg(
            Arg::new("ping-interval")
                .long("ping-interval")
                .default_value("30")
                .help("Seconds between keep-alive pings"),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .action(ArgAction::SetTrue)
                .help("Do not print pongs"),
        )
        .get_matches();

    let base = matches.get_one::<String>("url").cloned().unwrap_or_default();
    let token = matches.get_one::<String>("token").cloned().unwrap_or_default();
    let conversation_id: Uuid = matches
        .get_one::<String>("conversation")
        .map(|s| s.parse())
        .transpose()?
        .ok_or("conversation is required")?;
    let ping_every: u64 = matches
        .get_one::<String>("ping-interval")
        .map(|s| s.parse())
        .transpose()?
        .unwrap_or(30);
    let quiet = matches.get_flag("quiet");

    let mut url = Url::parse(&base)?;
    url.query_pairs_mut().append_pair("token", &token);

    let (ws_stream, response) = connect_async(url).await?;
    println!("WebSocket connection established ({})", response.status());
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let receive_handle = tokio::spawn(async move {
        while let Some(msg) = ws_receiver.next().await {
            match msg {
                Ok(TungsteniteMessage::Text(text)) => match serde_json::from_str::<ServerFrame>(&text) {
                    Ok(ServerFrame::Pong { .. }) if quiet => {}
                    Ok(frame) => print_frame(&frame),
                    Err(_) => println!("{}", text),
                },
                Ok(TungsteniteMessage::Close(_)) => {
                    println!("Server closed the connection");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    eprintln!("WebSocket error: {}", e);
                    break;
                }
            }
        }
    });

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    let mut ping = tokio::time::interval(Duration::from_secs(ping_every.max(1)));

    loop {
        let frame = tokio::select! {
            _ = ping.tick() => Some(ClientFrame::Ping),
            line = lines.next_line() => match line? {
                Some(line) => parse_line(&line, conversation_id),
                None => break,
            },
        };
        if let Some(frame) = frame {
            ws_sender.send(TungsteniteMessage::Text(serde_json::to_string(&frame)?)).await?;
        }
    }

    ws_sender.send(TungsteniteMessage::Close(None)).await?;
    receive_handle.abort();
    Ok(())
}
