//! Command handlers
//!
//! Each handler drives one core component and prints the result. None of
//! them contains device logic of its own.

use anyhow::{Result, bail};
use async_trait::async_trait;
use farmwatch_core::model::{Alert, CameraState, SettingsPatch, SirenAction};
use farmwatch_core::{ActuatorOutcome, ClearOutcome, ClientEngine, ConfirmClear, EngineEvent, View};
use serde_json::json;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Run the engine with `views` active, logging events until a signal arrives
pub async fn watch(
    engine: &ClientEngine,
    mut events: mpsc::Receiver<EngineEvent>,
    views: &[View],
) -> Result<()> {
    let logger = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            log_event(&event);
        }
    });

    info!(
        "Watching {}",
        views.iter().map(View::to_string).collect::<Vec<_>>().join(", ")
    );
    let result = engine.run(views).await;
    logger.abort();
    Ok(result?)
}

fn log_event(event: &EngineEvent) {
    match event {
        EngineEvent::StatusPolled {
            status,
            display_enabled,
        } => info!(
            "System {} (device {}, siren {})",
            if *display_enabled { "armed" } else { "disarmed" },
            status.status,
            status.siren_state
        ),
        EngineEvent::CameraStatusPolled { status } => {
            info!("Camera {}", camera_label(status.status))
        }
        EngineEvent::AlertsLoaded { count } => info!("{} alert(s) on the device", count),
        EngineEvent::FeedConnected { url } => info!("Live feed connected: {}", url),
        EngineEvent::StatusUnavailable { error }
        | EngineEvent::AlertsLoadFailed { error }
        | EngineEvent::FeedFailed { error, .. } => warn!("{}", error),
        EngineEvent::FeedNotConfigured => warn!("No live feed URL configured"),
        other => tracing::debug!("{:?}", other),
    }
}

/// Poll once and print the reconciled system view
pub async fn status(engine: &ClientEngine, as_json: bool) -> Result<()> {
    let view = engine.reconciler().poll_once().await;
    let camera = engine.camera().poll_once().await;

    if as_json {
        let out = json!({
            "display_enabled": view.display_enabled,
            "local_intent": view.local_intent,
            "remote": view.remote,
            "camera": camera,
            "mock": engine.settings().get().mock,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!(
        "System:  {}",
        if view.display_enabled { "ARMED" } else { "DISARMED" }
    );
    match &view.remote.message {
        Some(message) => println!("Device:  {} ({})", view.remote.status, message),
        None => println!("Device:  {}", view.remote.status),
    }
    println!("Siren:   {}", view.remote.siren_state);
    println!("Camera:  {}", camera_label(camera.status));
    Ok(())
}

/// Arm, disarm, or flip the displayed system state
pub async fn toggle_system(engine: &ClientEngine, target: Option<bool>, as_json: bool) -> Result<()> {
    let enabled = match target {
        Some(enabled) => enabled,
        None => !engine.reconciler().poll_once().await.display_enabled,
    };

    match engine.system().request(enabled).await {
        ActuatorOutcome::Applied(intent) => {
            if as_json {
                println!("{}", serde_json::to_string_pretty(&intent)?);
            } else {
                println!("System {}", if intent.enabled { "armed" } else { "disarmed" });
            }
            Ok(())
        }
        ActuatorOutcome::Failed(error) => bail!(error),
        ActuatorOutcome::Busy => bail!("A system request is already in flight"),
    }
}

/// Switch the siren; without a target, the device's reported state is flipped
pub async fn toggle_siren(engine: &ClientEngine, target: Option<bool>, as_json: bool) -> Result<()> {
    let on = match target {
        Some(on) => on,
        None => !engine.reconciler().poll_once().await.remote.siren_state.is_on(),
    };
    let action = if on { SirenAction::On } else { SirenAction::Off };

    match engine.siren().request(action).await {
        ActuatorOutcome::Applied(reply) => {
            if as_json {
                println!("{}", serde_json::to_string_pretty(&reply)?);
            } else {
                let message = reply
                    .message
                    .unwrap_or_else(|| format!("Siren turned {action}"));
                println!("{}", message);
            }
            Ok(())
        }
        ActuatorOutcome::Failed(error) => bail!(error),
        ActuatorOutcome::Busy => bail!("A siren request is already in flight"),
    }
}

/// Load the alert log and print it newest first
pub async fn alerts(engine: &ClientEngine, limit: usize, as_json: bool) -> Result<()> {
    engine.alerts().load().await;
    let state = engine.alerts().state();
    if let Some(error) = state.error {
        bail!("Failed to load alerts: {}", error);
    }

    let shown = if limit == 0 {
        &state.alerts[..]
    } else {
        &state.alerts[..limit.min(state.alerts.len())]
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(shown)?);
        return Ok(());
    }

    if shown.is_empty() {
        println!("No detections recorded");
        return Ok(());
    }
    for alert in shown {
        println!("{}", alert_line(alert));
    }
    Ok(())
}

fn alert_line(alert: &Alert) -> String {
    let siren = match alert.siren {
        Some(true) => "  [siren]",
        _ => "",
    };
    format!(
        "{:<22} {:<13} {}{}",
        alert.display_time(),
        alert.kind(),
        alert.device(),
        siren
    )
}

/// Asks on the terminal before the log is wiped
struct TerminalConfirm;

#[async_trait]
impl ConfirmClear for TerminalConfirm {
    async fn confirm(&self, prompt: &str) -> bool {
        print!("{} [y/N] ", prompt);
        if std::io::stdout().flush().is_err() {
            return false;
        }

        let mut line = String::new();
        match BufReader::new(tokio::io::stdin()).read_line(&mut line).await {
            Ok(_) => matches!(line.trim().to_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }
}

/// Clear the alert log after confirmation
pub async fn clear_alerts(engine: &ClientEngine, assume_yes: bool) -> Result<()> {
    engine.alerts().load().await;
    if let Some(error) = engine.alerts().state().error {
        bail!("Failed to load alerts: {}", error);
    }

    let outcome = if assume_yes {
        engine.alerts().clear(&|_: &str| true).await
    } else {
        engine.alerts().clear(&TerminalConfirm).await
    };

    match outcome {
        ClearOutcome::Cleared => println!("Detection log cleared"),
        ClearOutcome::Declined => println!("Nothing cleared"),
        ClearOutcome::Disabled => println!("No detections to clear"),
        ClearOutcome::Failed(error) => bail!(error),
    }
    Ok(())
}

/// Print the settings, applying `patch` first when given
pub async fn settings(engine: &ClientEngine, patch: Option<SettingsPatch>, as_json: bool) -> Result<()> {
    let settings = match patch {
        Some(patch) => engine.settings().update(patch).await?,
        None => engine.settings().get(),
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&settings)?);
    } else {
        println!("API base URL: {}", settings.api_base_url);
        println!("Stream URL:   {}", settings.stream_url);
        println!("Background:   {}", settings.bg_url);
        println!("Mock mode:    {}", settings.mock);
    }
    Ok(())
}

/// Print the resolved live feed URL
pub fn feed_url(engine: &ClientEngine, as_json: bool) -> Result<()> {
    let url = farmwatch_core::resolve(&engine.settings().get());
    if as_json {
        println!("{}", json!({ "url": url }));
    } else if url.is_empty() {
        println!("No live feed URL configured");
    } else {
        println!("{}", url);
    }
    Ok(())
}

fn camera_label(state: CameraState) -> &'static str {
    match state {
        CameraState::Streaming => "streaming",
        CameraState::Disconnected => "disconnected",
    }
}
