//! Actor driving the scheduler one send at a time.

use std::time::Duration;

use ractor::{Actor, ActorProcessingErr, ActorRef};

use crate::channel::SharedChannel;
use crate::messages::SchedulerMessage;
use crate::persistence::JobStore;
use crate::scheduler::{SchedulerConfig, SchedulerState, StepOutcome};

/// State for the scheduler actor.
pub struct SchedulerActorState {
    pub scheduler: SchedulerState,
    /// A `Step` is already queued or waiting out a backoff.
    stepping: bool,
}

impl SchedulerActorState {
    /// Queue a `Step` unless one is already pending.
    fn kick(&mut self, myself: &ActorRef<SchedulerMessage>) -> Result<(), ActorProcessingErr> {
        if !self.stepping {
            self.stepping = true;
            myself.send_message(SchedulerMessage::Step)?;
        }
        Ok(())
    }
}

/// Scheduler actor arguments.
pub struct SchedulerArgs {
    pub config: SchedulerConfig,
    pub store: JobStore,
    pub channel: SharedChannel,
}

/// Scheduler actor. Every send is its own `Step` message so control
/// messages are handled between pixels.
pub struct SchedulerActor;

impl Actor for SchedulerActor {
    type Msg = SchedulerMessage;
    type State = SchedulerActorState;
    type Arguments = SchedulerArgs;

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::info!("Starting canvas scheduler");

        // Start periodic tick; the first one fires immediately and
        // picks up jobs left over from a previous run.
        let tick = args.config.tick_interval.max(Duration::from_millis(10));
        let myself_clone = myself.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            loop {
                interval.tick().await;
                if myself_clone.send_message(SchedulerMessage::Tick).is_err() {
                    break;
                }
            }
        });

        Ok(SchedulerActorState {
            scheduler: SchedulerState::new(args.config, args.store, args.channel),
            stepping: false,
        })
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            SchedulerMessage::Submit { job, reply } => {
                let result = state.scheduler.submit(*job).await;
                let accepted = result.is_ok();
                let _ = reply.send(result);
                if accepted {
                    state.kick(&myself)?;
                }
            }

            SchedulerMessage::Pause => state.scheduler.pause(),

            SchedulerMessage::Resume => {
                state.scheduler.resume();
                state.kick(&myself)?;
            }

            SchedulerMessage::Cancel { target, reply } => {
                let _ = reply.send(state.scheduler.cancel(target));
                state.kick(&myself)?;
            }

            SchedulerMessage::Status { job_id, reply } => {
                let _ = reply.send(state.scheduler.status(&job_id));
            }

            SchedulerMessage::List { reply } => {
                let _ = reply.send(state.scheduler.list());
            }

            SchedulerMessage::Step => {
                state.stepping = false;
                let outcome = state.scheduler.step().await;

                if outcome.has_more() {
                    state.kick(&myself)?;
                } else if let StepOutcome::Stalled { .. } = outcome {
                    state.stepping = true;
                    let backoff = state.scheduler.config().retry_backoff;
                    let myself_clone = myself.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(backoff).await;
                        let _ = myself_clone.send_message(SchedulerMessage::Step);
                    });
                }
            }

            SchedulerMessage::Tick => {
                if let Err(e) = state.scheduler.discover().await {
                    tracing::warn!("Failed to scan persisted jobs: {}", e);
                }
                state.kick(&myself)?;
            }

            SchedulerMessage::Shutdown { reply } => {
                tracing::info!("Shutting down canvas scheduler");
                if let Err(e) = state.scheduler.flush().await {
                    tracing::warn!("Failed to checkpoint on shutdown: {}", e);
                }
                let _ = reply.send(());
                myself.stop(None);
            }
        }

        Ok(())
    }
}

/// Spawn a scheduler actor.
pub async fn start_scheduler(
    args: SchedulerArgs,
) -> Result<(ActorRef<SchedulerMessage>, tokio::task::JoinHandle<()>), ractor::SpawnErr> {
    Actor::spawn(None, SchedulerActor, args).await
}
