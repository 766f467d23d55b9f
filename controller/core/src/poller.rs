//! Poll Loop
//!
//! Runs a [`Controller`] on its own task. The task owns the controller, so
//! reconciler ticks and operator actions are serialized without locks:
//!
//! ```text
//!   interval ──┐
//!   events  ───┼──▶ select! ──▶ Controller ──▶ ControllerMessage
//!   cancel  ───┘
//! ```
//!
//! An action that asks for a re-poll runs its tick inline. The interval is
//! not reset by it, so the next scheduled tick may follow soon after.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::controller::Controller;
use crate::events::{Action, ControlEvent};
use crate::gateway::ContentGateway;
use crate::messages::ControllerMessage;

/// Capacity of the event queue into the poll loop
pub const EVENT_QUEUE_CAPACITY: usize = 64;

/// Handle to a running poll loop
pub struct PollerHandle {
    events: mpsc::Sender<ControlEvent>,
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl PollerHandle {
    /// Queue an event for the loop
    ///
    /// Returns `false` if the loop has already stopped.
    pub async fn send(&self, event: impl Into<ControlEvent>) -> bool {
        self.events.send(event.into()).await.is_ok()
    }

    /// Queue an operator action
    pub async fn perform(&self, action: Action) -> bool {
        self.send(ControlEvent::Action(action)).await
    }

    /// Stop the loop without waiting for queued events
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Stop the loop after queued events and wait for it to exit
    pub async fn shutdown(self) {
        if self.events.send(ControlEvent::Shutdown).await.is_err() {
            self.cancel.cancel();
        }
        if let Err(e) = self.join.await {
            tracing::error!("Poll loop task failed: {}", e);
        }
    }
}

/// Start `controller` and run it on a new task
///
/// The first tick happens during start-up; the interval then fires every
/// `poll_interval` from the configuration.
pub fn spawn<G>(controller: Controller<G>) -> PollerHandle
where
    G: ContentGateway + 'static,
{
    let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
    let cancel = CancellationToken::new();
    let join = tokio::spawn(run(controller, events_rx, cancel.clone()));

    PollerHandle {
        events: events_tx,
        cancel,
        join,
    }
}

async fn run<G>(
    mut controller: Controller<G>,
    mut events: mpsc::Receiver<ControlEvent>,
    cancel: CancellationToken,
) where
    G: ContentGateway + 'static,
{
    let period = controller.config().poll_interval.max(Duration::from_millis(100));
    controller.start().await;

    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!(interval_ms = period.as_millis() as u64, "Poll loop running");

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                tracing::info!("Poll loop cancelled");
                break;
            }
            event = events.recv() => {
                let Some(event) = event else {
                    tracing::info!("All event senders dropped, stopping poll loop");
                    break;
                };
                if !controller.handle_event(event).await {
                    break;
                }
            }
            _ = interval.tick() => {
                controller.tick().await;
            }
        }
    }

    controller.send(ControllerMessage::Stopped).await;
}
