use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use gesture_driver::{DriverScript, ScriptedDriver};
use pilot_core::{load_settings, Action, ActionRegistry, Controller, PilotContext};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Drives the controller against a scripted stand-in of the chat app.
#[derive(Parser, Debug)]
struct Args {
    /// Remote app layout and incoming activity, as TOML.
    #[arg(long)]
    script: PathBuf,
    #[arg(long, default_value = "pilot.toml")]
    config: PathBuf,
    /// Message to send, as `chat=text`. Repeatable.
    #[arg(long = "send", value_parser = parse_send)]
    sends: Vec<(String, String)>,
    /// How long to let the loop poll before quitting.
    #[arg(long, default_value_t = 2000)]
    run_for_ms: u64,
}

fn parse_send(raw: &str) -> Result<(String, String)> {
    let (chat, text) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected chat=text, got '{raw}'"))?;
    if chat.is_empty() {
        return Err(anyhow!("chat name must not be empty in '{raw}'"));
    }
    Ok((chat.to_string(), text.to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let settings = load_settings(&args.config)?;
    let script = DriverScript::load(&args.script)
        .with_context(|| format!("failed to load script '{}'", args.script.display()))?;
    let driver = Arc::new(ScriptedDriver::new(script));

    let controller = Controller::new(
        driver.clone(),
        ActionRegistry::default(),
        PilotContext::new(settings),
    );
    controller.events().on_message_received(|chat, message| {
        println!("[{chat}] {message}");
        Ok(())
    });

    controller.start()?;
    for (chat, text) in args.sends {
        controller.enqueue(Action::send_message(chat, text))?;
    }

    tokio::time::sleep(Duration::from_millis(args.run_for_ms)).await;
    controller.quit();
    let state = controller.wait_for_finish().await?;

    info!(%state, gestures = driver.gestures().len(), "simulation finished");
    for (chat, text) in driver.sent_messages() {
        println!("sent to {chat}: {text}");
    }
    Ok(())
}
