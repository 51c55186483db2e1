use std::sync::Arc;

use anyhow::{anyhow, Result};

mod app;
mod config;
mod gemini;
mod handler;
mod markdown;
mod tui;
mod ui;

use app::App;
use config::Config;
use gemini::{GeminiClient, DEFAULT_MODEL};

#[tokio::main]
async fn main() -> Result<()> {
    // Resolve credentials before touching the terminal so errors print
    // as plain text.
    let config = Config::load().unwrap_or_else(|_| Config::new());

    let api_key = config.resolve_api_key().ok_or_else(|| {
        let config_path = Config::config_path()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|_| "the config file".to_string());
        anyhow!(
            "No Gemini API key found. Set {} or add \"gemini_api_key\" to {}",
            config::API_KEY_ENV,
            config_path
        )
    })?;

    let model = config.model.unwrap_or_else(|| DEFAULT_MODEL.to_string());
    let client = GeminiClient::new(&api_key, &model);
    let mut app = App::new(Arc::new(client), model);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();

    let result = run(&mut terminal, &mut events, &mut app).await;

    tui::restore()?;
    result
}

async fn run(
    terminal: &mut tui::Tui,
    events: &mut tui::EventHandler,
    app: &mut App,
) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        if let Some(event) = events.next().await {
            handler::handle_event(app, event);
        }

        // The 300ms tick keeps this loop turning, so a settled call is
        // joined promptly even when the user is idle.
        if app.answer_ready() {
            app.resolve().await;
        }
    }

    Ok(())
}
