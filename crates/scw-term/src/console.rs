//! Console run loop: owns the cancellation token, spawns the poll loop and
//! feeds stdin lines to the session.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::info;

use scw_core::{config::Config, session::ChatSession};

#[derive(Clone, Debug, PartialEq, Eq)]
enum Command {
    Empty,
    Say(String),
    Close,
    Quit,
}

fn parse_command(line: &str) -> Command {
    let line = line.trim();
    match line {
        "" => Command::Empty,
        "/close" => Command::Close,
        "/quit" | "/q" => Command::Quit,
        _ => Command::Say(line.to_string()),
    }
}

pub async fn run_console(cfg: Arc<Config>, session: Arc<ChatSession>) -> anyhow::Result<()> {
    println!("scw connected to {}", cfg.base_url);
    match &cfg.ticket {
        Some(t) => println!("Ticket: {}", t.0),
        None => println!("Ticket: (folded into token)"),
    }
    println!("Type a message and press Enter. /close resolves the ticket, /quit detaches.");

    let cancel = CancellationToken::new();
    let mut poll_task = {
        let session = session.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { session.run(cancel).await })
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut poll_result = None;

    while poll_result.is_none() {
        tokio::select! {
            res = &mut poll_task => {
                // The session loop only returns on its own when it broke;
                // stop reading input and report below.
                poll_result = Some(res);
            }
            maybe = lines.next_line() => {
                let Some(line) = maybe? else { break };
                match parse_command(&line) {
                    Command::Empty => {}
                    Command::Say(text) => {
                        // Delivery failures keep the text on screen in
                        // scrollback; nothing is treated as sent until the
                        // server said so.
                        if let Err(e) = session.send(&text).await {
                            eprintln!("send failed: {e} (not delivered: {text})");
                        }
                    }
                    Command::Close => match session.close().await {
                        Ok(()) => {
                            println!("ticket closed");
                            break;
                        }
                        Err(e) => eprintln!("close failed: {e} (ticket still open)"),
                    },
                    Command::Quit => break,
                }
            }
        }
    }

    cancel.cancel();
    let joined = match poll_result {
        Some(res) => res,
        None => poll_task.await,
    };
    match joined {
        Ok(r) => r.map_err(|e| anyhow::anyhow!("session loop failed: {e}"))?,
        Err(e) => return Err(anyhow::anyhow!("session loop panicked: {e}")),
    }

    let stats = session.stats().await;
    info!(
        "session over: {} polls, {} messages rendered",
        stats.polls, stats.rendered
    );
    Ok(())
}
