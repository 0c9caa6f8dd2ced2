use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Local};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, warn};

use crate::api::client::calendar_url;
use crate::api::{extract, Fetcher, Snapshot};
use crate::config::{AppConfig, ForceRefreshPolicy, ModeCycle};
use crate::error::CycleError;
use crate::events::{spawn_ticker, AppEvent, KeyAction};
use crate::state::DisplayState;
use crate::ui::{DashboardView, Renderer};

const TICK_PERIOD: Duration = Duration::from_secs(1);

/// A refresh cycle that has been started but has not reported back yet.
struct InFlight {
    cycle: u64,
    handle: JoinHandle<()>,
}

/// The event loop. It is the only owner of the display state, the latest
/// snapshot and the renderer; everything else talks to it through
/// [`AppEvent`]s.
pub struct App<F: Fetcher, R: Renderer> {
    config: AppConfig,
    fetcher: Arc<F>,
    renderer: R,
    state: DisplayState,
    snapshot: Snapshot,
    error_message: Option<String>,
    last_update: Option<DateTime<Local>>,
    cycle: u64,
    in_flight: Option<InFlight>,
    should_quit: bool,
    event_tx: UnboundedSender<AppEvent>,
    event_rx: Option<UnboundedReceiver<AppEvent>>,
}

impl<F: Fetcher, R: Renderer> App<F, R> {
    pub fn new(config: AppConfig, fetcher: F, renderer: R) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let state = DisplayState::new(config.initial_mode(), config.refresh_period(), Instant::now());

        Self {
            config,
            fetcher: Arc::new(fetcher),
            renderer,
            state,
            snapshot: Snapshot::default(),
            error_message: None,
            last_update: None,
            cycle: 0,
            in_flight: None,
            should_quit: false,
            event_tx,
            event_rx: Some(event_rx),
        }
    }

    /// Handle for producers (keyboard reader, tests) to feed the loop.
    pub fn sender(&self) -> UnboundedSender<AppEvent> {
        self.event_tx.clone()
    }

    /// Run until quit. Renderer failures and a closed keyboard end the loop
    /// with an error.
    pub async fn run(&mut self) -> Result<()> {
        let mut event_rx = self
            .event_rx
            .take()
            .ok_or_else(|| anyhow!("event loop already ran"))?;

        info!(
            mode = self.state.mode.label(),
            refresh_secs = self.config.refresh_interval,
            "dashboard started"
        );

        let ticker = spawn_ticker(self.event_tx.clone(), TICK_PERIOD);
        let result = self.event_loop(&mut event_rx).await;

        ticker.abort();
        self.abort_cycle();
        info!("dashboard stopped");
        result
    }

    async fn event_loop(&mut self, event_rx: &mut UnboundedReceiver<AppEvent>) -> Result<()> {
        self.draw(false)?;

        while !self.should_quit {
            let deadline = self.state.next_refresh_at;
            let armed = !self.state.paused && self.in_flight.is_none();

            tokio::select! {
                biased;

                event = event_rx.recv() => match event {
                    Some(event) => self.handle_event(event)?,
                    None => break,
                },
                _ = sleep_until(deadline), if armed => self.start_cycle(),
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: AppEvent) -> Result<()> {
        match event {
            AppEvent::Key(action) => self.handle_key(action),
            AppEvent::Tick => self.draw(true),
            AppEvent::Resize => self.draw(false),
            AppEvent::CycleFinished { cycle, outcome } => self.finish_cycle(cycle, outcome),
            AppEvent::InputClosed(reason) => {
                error!(%reason, "keyboard input closed");
                self.should_quit = true;
                Err(anyhow!("keyboard input closed: {reason}"))
            }
        }
    }

    fn handle_key(&mut self, action: KeyAction) -> Result<()> {
        debug!(?action, "key pressed");
        match action {
            KeyAction::Quit => {
                self.should_quit = true;
                return Ok(());
            }
            KeyAction::ForceRefresh => {
                self.state.force_refresh(Instant::now());
                if self.state.paused && self.config.force_refresh == ForceRefreshPolicy::RespectPause {
                    debug!("paused, forced refresh waits for resume");
                } else {
                    self.start_cycle();
                }
            }
            KeyAction::TogglePause => {
                self.state.toggle_pause();
                info!(status = self.state.status_label(), "refresh toggled");
            }
            KeyAction::AdvanceMode => {
                match self.config.mode_cycle {
                    ModeCycle::Full => self.state.advance_mode(),
                    ModeCycle::Restricted => self.state.advance_mode_restricted(),
                }
                debug!(mode = self.state.mode.label(), "display mode changed");
            }
            KeyAction::ToggleHelp => self.state.toggle_help(),
            KeyAction::CloseHelp => self.state.close_help(),
            KeyAction::None => return Ok(()),
        }
        self.draw(false)
    }

    /// Start a new refresh cycle, abandoning any cycle still in flight.
    fn start_cycle(&mut self) {
        self.abort_cycle();

        self.cycle += 1;
        let cycle = self.cycle;
        let url = calendar_url(&self.config.source.base_url, Local::now().date_naive());
        info!(cycle, %url, "refresh cycle started");

        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.event_tx.clone();
        let handle = tokio::spawn(async move {
            let outcome = fetch_snapshot(fetcher.as_ref(), &url).await;
            // The loop may already be gone on quit.
            let _ = tx.send(AppEvent::CycleFinished { cycle, outcome });
        });

        self.in_flight = Some(InFlight { cycle, handle });
    }

    fn abort_cycle(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            debug!(cycle = in_flight.cycle, "aborting refresh cycle");
            in_flight.handle.abort();
        }
    }

    fn finish_cycle(&mut self, cycle: u64, outcome: Result<Snapshot, CycleError>) -> Result<()> {
        if self.in_flight.as_ref().map(|f| f.cycle) != Some(cycle) {
            debug!(cycle, latest = self.cycle, "discarding stale cycle result");
            return Ok(());
        }
        self.in_flight = None;

        match outcome {
            Ok(snapshot) => {
                info!(
                    cycle,
                    events = snapshot.events.len(),
                    important = snapshot.important.len(),
                    rates = snapshot.rates.len(),
                    "refresh cycle finished"
                );
                if snapshot.is_empty() {
                    warn!(cycle, "calendar page held no records");
                }
                for drift in &snapshot.skipped {
                    warn!(cycle, error = %drift, "table skipped");
                }
                self.snapshot = snapshot;
                self.error_message = None;
                self.last_update = Some(Local::now());
            }
            Err(e) => {
                warn!(cycle, error = %e, "refresh cycle failed");
                self.error_message = Some(e.to_string());
            }
        }

        self.state.schedule_next(Instant::now());
        self.draw(false)
    }

    fn draw(&mut self, status_only: bool) -> Result<()> {
        let view = DashboardView {
            state: &self.state,
            snapshot: &self.snapshot,
            error: self.error_message.as_deref(),
            last_update: self.last_update,
            ui: &self.config.ui,
            now: Instant::now(),
        };

        if status_only {
            self.renderer.render_status(&view)?;
        } else {
            self.renderer.render(&view)?;
        }
        Ok(())
    }
}

async fn fetch_snapshot<F: Fetcher>(fetcher: &F, url: &str) -> Result<Snapshot, CycleError> {
    let markup = fetcher.fetch(url).await?;
    Ok(extract(&markup)?)
}
