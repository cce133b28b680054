use anyhow::{Context, Result};
use crossterm::event::{Event, KeyCode, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use price_console::engine::binance::TickerClient;
use price_console::engine::config::FeedConfig;
use price_console::engine::session::{ConsoleState, Controller, KeyPress, Transition};
use price_console::engine::term::LiveScreen;
use std::io::{self, Write};
use tracing::error;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let config = FeedConfig::from_env()?;
    let source = TickerClient::new(&config)?;
    let mut console = Controller::new(config, source, LiveScreen::new());

    enable_raw_mode().context("enable raw mode")?;
    let result = run_console(&mut console).await;
    disable_raw_mode().context("disable raw mode")?;
    result
}

async fn run_console(console: &mut Controller<TickerClient, LiveScreen>) -> Result<()> {
    display_menu(console.config())?;

    loop {
        if console.state() == ConsoleState::Menu {
            prompt()?;
        }

        let event = match next_event().await {
            Ok(event) => event,
            Err(err) => {
                // Without a working keyboard the console cannot continue.
                error!(err = %err, "keyboard read failed");
                console.shutdown().await;
                return Ok(());
            }
        };
        let Some(key) = key_press(event) else {
            continue;
        };

        match console.handle_key(key).await {
            Transition::Quit => {
                print_line("\r\nExiting...")?;
                return Ok(());
            }
            Transition::Menu => display_menu(console.config())?,
            Transition::Streaming | Transition::Prompt | Transition::Ignored => {}
        }
    }
}

async fn next_event() -> Result<Event> {
    tokio::task::spawn_blocking(crossterm::event::read)
        .await
        .context("keyboard task failed")?
        .context("keyboard read failed")
}

fn key_press(event: Event) -> Option<KeyPress> {
    let Event::Key(key) = event else {
        return None;
    };
    if key.kind != KeyEventKind::Press {
        return None;
    }
    Some(match key.code {
        KeyCode::Char(c) => KeyPress::Char(c),
        KeyCode::Backspace | KeyCode::Enter => KeyPress::Back,
        _ => KeyPress::Other,
    })
}

fn display_menu(config: &FeedConfig) -> Result<()> {
    let mut out = io::stdout();
    write!(out, "\r\nMenu:\r\n")?;
    for (i, symbol) in config.symbols().enumerate() {
        write!(out, "{}. {}\r\n", i + 1, symbol)?;
    }
    write!(
        out,
        "Press 1-{} to chart a feed, BACKSPACE or ENTER to return here, q to quit.\r\n",
        config.len()
    )?;
    out.flush().context("flush menu")?;
    Ok(())
}

fn prompt() -> Result<()> {
    let mut out = io::stdout();
    write!(out, "\r\nEnter command: ")?;
    out.flush().context("flush prompt")?;
    Ok(())
}

fn print_line(text: &str) -> Result<()> {
    let mut out = io::stdout();
    write!(out, "{text}\r\n")?;
    out.flush().context("flush output")?;
    Ok(())
}
