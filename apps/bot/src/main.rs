mod bot;
mod config;
mod errors;
mod ideas;
mod llm_client;
mod meals;
mod models;
mod notifier;
mod routes;
mod scheduler;
mod state;
mod store;
#[cfg(test)]
mod testing;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{NaiveTime, Utc};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::bot::{startup_message, InspirationBot, Pipelines, SendResult};
use crate::config::Config;
use crate::ideas::generator::IdeaGenerator;
use crate::llm_client::{CompletionService, GeminiClient};
use crate::meals::diet::ToyangDiet;
use crate::meals::recommender::MealRecommender;
use crate::notifier::telegram::TelegramNotifier;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::history::{Alternating, HistoryStore, HISTORY_FILE};
use crate::store::meals::{MealHistory, MEAL_HISTORY_FILE};
use crate::store::summary::{SummaryStore, SUMMARY_FILE};

#[derive(Parser, Debug)]
#[command(
    name = "inspiration-bot",
    about = "Sends novel project ideas and dinner menus to Telegram on a schedule",
    version
)]
struct Args {
    /// Generate and send one idea now, then exit
    #[arg(long, conflicts_with = "test_meal")]
    test: bool,

    /// Generate and send one dinner menu now, then exit
    #[arg(long)]
    test_meal: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Inspiration Bot v{}", env!("CARGO_PKG_VERSION"));

    let meal_at = NaiveTime::from_hms_opt(config.meal_send_hour, config.meal_send_minute, 0)
        .context("MEAL_SEND_HOUR / MEAL_SEND_MINUTE do not form a valid time")?;
    std::fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("Failed to create data dir {}", config.data_dir.display()))?;

    // Initialize Gemini client on the best available model
    let llm: Arc<dyn CompletionService> = Arc::new(
        GeminiClient::detect(config.gemini_api_key.clone(), config.gemini_model.clone()).await,
    );

    // Initialize stores and pipelines
    let mut history = HistoryStore::load(config.data_dir.join(HISTORY_FILE));
    if config.generation.alternate_kinds {
        history = history.with_policy(Alternating);
        info!("Alternating software and mixed ideas");
    }
    let summaries = SummaryStore::open(config.data_dir.join(SUMMARY_FILE), config.utc_offset);
    let meal_history = MealHistory::load(config.data_dir.join(MEAL_HISTORY_FILE), config.utc_offset);

    let pipelines = Pipelines {
        ideas: IdeaGenerator::new(llm.clone(), history, summaries, &config.generation),
        meals: MealRecommender::new(llm, ToyangDiet, meal_history),
    };

    let channel = Arc::new(TelegramNotifier::new(
        config.telegram_bot_token.clone(),
        config.telegram_chat_id.clone(),
    ));
    let cancel = CancellationToken::new();
    let bot = Arc::new(InspirationBot::new(pipelines, channel, cancel.clone()));

    // One-shot test modes
    if args.test || args.test_meal {
        let result = if args.test {
            info!("Test mode: sending one idea now");
            bot.send_inspiration().await
        } else {
            info!("Test mode: sending one dinner menu now");
            bot.send_dinner().await
        };
        println!("\nTest result: {result:?}");
        anyhow::ensure!(result == SendResult::Delivered, "test delivery failed");
        return Ok(());
    }

    // Schedules
    let idea_job = scheduler::spawn_interval(
        "idea",
        Duration::from_secs(config.send_interval_minutes * 60),
        cancel.clone(),
        {
            let bot = bot.clone();
            move || {
                let bot = bot.clone();
                async move {
                    bot.send_inspiration().await;
                }
            }
        },
    );
    let meal_job = scheduler::spawn_daily("dinner", meal_at, config.utc_offset, cancel.clone(), {
        let bot = bot.clone();
        move || {
            let bot = bot.clone();
            async move {
                bot.send_dinner().await;
            }
        }
    });

    info!(
        "Schedules running: idea every {}m, dinner daily at {}",
        config.send_interval_minutes,
        meal_at.format("%H:%M")
    );
    let started = Utc::now().with_timezone(&config.utc_offset);
    let notice = startup_message(config.send_interval_minutes, meal_at, started);
    if !bot.announce(&notice).await {
        warn!("Startup notice was not delivered");
    }

    // Build router
    let app = build_router(AppState { bot }).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel.clone()))
        .await?;

    // Let an in-flight job reach its next cancellation point
    cancel.cancel();
    for (name, handle) in [("idea", idea_job), ("dinner", meal_job)] {
        if let Err(e) = handle.await {
            error!("{name} schedule ended abnormally: {e}");
        }
    }

    info!("Inspiration Bot stopped");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM and cancels every schedule.
async fn shutdown_signal(cancel: CancellationToken) {
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to register SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = terminate => {}
    }
    info!("Shutting down");
    cancel.cancel();
}
