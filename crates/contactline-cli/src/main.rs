mod health;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use contactline_core::channel::telegram::{TelegramConfig, TelegramTransport};
use contactline_core::channel::Transport;
use contactline_core::relay::{
    RelayEngine, RelayFlags, ReplyAddressRegistry, SentMessageLog, SessionStore,
};

#[derive(Parser, Debug)]
#[command(
    name = "contactline",
    version,
    about = "Telegram bot that relays user messages to a single operator"
)]
struct Args {
    /// Telegram Bot API token.
    #[arg(long, env = "BOT_TOKEN", hide_env_values = true)]
    bot_token: String,

    /// Chat ID of the operator who receives relayed messages.
    #[arg(long, env = "OPERATOR_ID")]
    operator_id: String,

    /// Port for the HTTP health endpoint.
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// Ask users to pick a category before writing their message.
    #[arg(long, env = "COLLECT_CATEGORY", default_value_t = true, action = clap::ArgAction::Set)]
    collect_category: bool,

    /// Ask users for optional contact info after their message.
    #[arg(long, env = "COLLECT_CONTACT_INFO", default_value_t = true, action = clap::ArgAction::Set)]
    collect_contact_info: bool,

    /// Track sent bot messages so reset can retract them.
    #[arg(long, env = "TRACK_SENT_MESSAGES", default_value_t = false, action = clap::ArgAction::Set)]
    track_sent_messages: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    let transport = Arc::new(TelegramTransport::new(TelegramConfig::new(args.bot_token.clone())));
    if !transport.is_configured() {
        anyhow::bail!("BOT_TOKEN is empty");
    }
    match transport.test_connection().await {
        Ok(me) => info!(
            "Connected as @{}",
            me.username.as_deref().unwrap_or("unknown")
        ),
        Err(e) => warn!("Could not verify bot token yet: {}", e),
    }

    let flags = RelayFlags {
        collect_category: args.collect_category,
        collect_contact_info: args.collect_contact_info,
        track_sent_messages: args.track_sent_messages,
    };
    info!(
        "Starting contactline (category: {}, contact info: {}, retraction: {})",
        flags.collect_category, flags.collect_contact_info, flags.track_sent_messages
    );

    let engine = RelayEngine::new(
        transport,
        args.operator_id,
        flags,
        SessionStore::new(),
        ReplyAddressRegistry::new(),
        SentMessageLog::new(),
    );

    let port = args.port;
    tokio::spawn(async move {
        if let Err(e) = health::serve(port).await {
            error!("Health endpoint failed: {}", e);
        }
    });

    engine.run().await;
    Ok(())
}
