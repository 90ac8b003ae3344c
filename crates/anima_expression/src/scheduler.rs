//! The autonomous loop: observe, classify, gate, render, emit.
//!
//! Each sensor runs in its own task on a mood-dependent interval. A separate
//! heartbeat task decays emotions and re-evaluates the stage gates. Lock order
//! is always tracker before ledger.

use crate::classify::classify;
use crate::presence::PresenceFilter;
use crate::render::Renderer;
use crate::sink::ActionSink;
use anima_core::config::BackoffConfig;
use anima_core::{
    Action, ActionChannel, AnimaConfig, AnimaError, BehaviorIntent, Clock, DialogueGenerator,
    EmotionChannel, EmotionSnapshot, IntentKind, MemoryStage, Observation, ObservationPayload,
    Persona, Priority, Sensor, StageAndEmotionContext,
};
use anima_limbic::{AffectEvent, EmotionLedger, HeartbeatConfig, SharedLedger, TriggerSource};
use anima_memory::{
    MemoryStageTracker, PersistedState, SharedTracker, StageTransition, StateStore,
    TrackerSummary, UtteranceSignals,
};
use anima_perception::Backoff;
use anima_reasoning::templates;
use anyhow::Context;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Loneliness eased by any message from the user.
const MESSAGE_COMFORT: f32 = -0.05;

/// Everything the scheduler takes ownership of at construction.
pub struct SchedulerParts {
    pub ledger: EmotionLedger,
    pub tracker: MemoryStageTracker,
    pub generator: Arc<dyn DialogueGenerator>,
    pub persona: Persona,
    pub clock: Arc<dyn Clock>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailOutcome {
    /// The fragment was locked and is now recovered.
    Unlocked,
    /// Already recovered; the stored detail was replaced.
    Updated,
    /// Ignored, with the reason.
    Rejected(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageOutcome {
    pub care: bool,
    pub shared_task: bool,
    /// Memory the message reminded the companion of, if any.
    pub shared_memory: Option<Action>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub summary: TrackerSummary,
    pub dominant: EmotionChannel,
    pub mood: EmotionSnapshot,
    pub queued: usize,
}

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | feeling {} ({}) | {} queued",
            self.summary,
            self.dominant,
            self.mood.describe(),
            self.queued
        )
    }
}

pub struct AutonomousScheduler {
    ledger: SharedLedger,
    tracker: SharedTracker,
    renderer: Renderer,
    sink: Arc<ActionSink>,
    presence: PresenceFilter,
    persona: Persona,
    clock: Arc<dyn Clock>,
    store: Option<StateStore>,
    heartbeat: HeartbeatConfig,
    backoff: BackoffConfig,
    poll_timeout: Duration,
    autosave: Duration,
    last_interaction: RwLock<Instant>,
}

impl AutonomousScheduler {
    pub fn new(parts: SchedulerParts, config: &AnimaConfig) -> Self {
        Self {
            ledger: Arc::new(RwLock::new(parts.ledger)),
            tracker: Arc::new(Mutex::new(parts.tracker)),
            renderer: Renderer::new(parts.generator, config.engine.generation_timeout()),
            sink: Arc::new(ActionSink::new(config.engine.queue_capacity)),
            presence: PresenceFilter::from_config(&config.presence),
            persona: parts.persona,
            clock: parts.clock,
            store: None,
            heartbeat: HeartbeatConfig::from_engine(&config.engine),
            backoff: config.backoff.clone(),
            poll_timeout: config.engine.poll_timeout(),
            autosave: Duration::from_secs(config.engine.autosave_secs),
            last_interaction: RwLock::new(Instant::now()),
        }
    }

    pub fn with_store(mut self, store: StateStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_presence(mut self, presence: PresenceFilter) -> Self {
        self.presence = presence;
        self
    }

    pub fn with_heartbeat(mut self, heartbeat: HeartbeatConfig) -> Self {
        self.heartbeat = heartbeat;
        self
    }

    pub fn ledger(&self) -> &SharedLedger {
        &self.ledger
    }

    pub fn tracker(&self) -> &SharedTracker {
        &self.tracker
    }

    pub fn sink(&self) -> &Arc<ActionSink> {
        &self.sink
    }

    pub async fn mood(&self) -> EmotionSnapshot {
        self.ledger.read().await.snapshot()
    }

    pub async fn stage(&self) -> MemoryStage {
        self.tracker.lock().await.stage()
    }

    /// One pass of observe → classify → gate → render → emit.
    ///
    /// Approved intents are emitted in descending priority. Only fatal
    /// errors (unknown channel, stage regression) come back as `Err`.
    pub async fn run_cycle(&self, observation: Observation) -> Result<Vec<Action>, AnimaError> {
        let now = self.clock.now();
        tracing::debug!(sensor = %observation.sensor_kind, "Observation: {}", observation.payload.summary());

        match &observation.payload {
            ObservationPayload::ScanCompleted { .. } => {
                self.tracker.lock().await.record_scan_completed();
            }
            ObservationPayload::UserArrived { .. } => self.mark_contact().await,
            _ => {}
        }

        let stage = self.stage().await;
        let mood = self.mood().await;
        let mut approved: Vec<BehaviorIntent> = classify(&observation)
            .into_iter()
            .filter(|intent| self.approve(intent, stage, &mood, now))
            .collect();
        approved.sort_by(|a, b| b.priority.cmp(&a.priority));

        let mut emitted = Vec::with_capacity(approved.len());
        for intent in approved {
            emitted.push(self.express(intent).await?);
        }
        Ok(emitted)
    }

    fn approve(
        &self,
        intent: &BehaviorIntent,
        stage: MemoryStage,
        mood: &EmotionSnapshot,
        now: chrono::DateTime<chrono::Utc>,
    ) -> bool {
        if stage < intent.required_stage {
            tracing::debug!(stage = ?stage, required = ?intent.required_stage, "Suppressed {}", intent.kind);
            return false;
        }
        if !intent.preconditions_met(mood) {
            tracing::debug!("Suppressed {}: mood does not fit", intent.kind);
            return false;
        }
        if !self.presence.admits(intent.priority, now) {
            tracing::debug!("Suppressed {}: quiet hours", intent.kind);
            return false;
        }
        true
    }

    /// Apply an approved intent's effects, render it and queue the action.
    async fn express(&self, intent: BehaviorIntent) -> Result<Action, AnimaError> {
        let now = self.clock.now();
        {
            let mut ledger = self.ledger.write().await;
            for &(channel, delta) in &intent.effects.emotions {
                ledger.apply_trigger(channel, delta, TriggerSource::Intent(intent.kind), now)?;
            }
        }
        if intent.effects.records_interaction {
            self.tracker.lock().await.record_interaction();
        }

        let context = self.context_for(intent.kind, &intent.payload).await;
        let rendered = self.renderer.render(&context).await;
        let action = Action::new(
            intent.kind.channel(),
            intent.priority,
            Some(intent.kind),
            rendered.text,
            self.clock.now(),
        )
        .fallback(rendered.used_fallback);

        tracing::info!("[{}] {}", action.channel, action.rendered_payload);
        self.sink.push(action.clone());
        Ok(action)
    }

    async fn context_for(&self, intent: IntentKind, situation: &str) -> StageAndEmotionContext {
        let (stage, memories) = {
            let tracker = self.tracker.lock().await;
            (tracker.stage(), tracker.context_lines())
        };
        let mood = self.mood().await;
        StageAndEmotionContext::new(self.persona.clone(), stage, mood, memories, intent, situation)
    }

    async fn mark_contact(&self) {
        *self.last_interaction.write().await = Instant::now();
    }

    /// One heartbeat: decay, neglect, then at most one stage transition.
    pub async fn decay_tick(&self, elapsed: Duration) -> Result<Option<StageTransition>, AnimaError> {
        let now = self.clock.now();
        self.ledger.write().await.tick_decay(elapsed);

        let neglected = {
            let mut last = self.last_interaction.write().await;
            if last.elapsed() >= self.heartbeat.neglect_after {
                *last = Instant::now();
                true
            } else {
                false
            }
        };
        if neglected {
            tracing::debug!("No contact for {:?}", self.heartbeat.neglect_after);
            self.ledger.write().await.apply_event(AffectEvent::UserNeglect, now)?;
        }

        let transition = {
            let mut tracker = self.tracker.lock().await;
            let transition = tracker.evaluate_transition(now)?;
            if let Some(t) = &transition {
                self.ledger.write().await.apply_stage_entry(t.to, now)?;
            }
            transition
        };

        if let Some(t) = &transition {
            tracing::info!(stage = ?t.to, unlocked = ?t.unlocked, "Stage {} -> {}", t.from, t.to);
            self.sink.push(Action::new(
                ActionChannel::Status,
                Priority::High,
                None,
                templates::stage_entry_line(t.to),
                now,
            ));
        }
        Ok(transition)
    }

    /// Feed a user utterance through the interaction, care and task signals.
    pub async fn handle_user_message(&self, text: &str) -> Result<MessageOutcome, AnimaError> {
        let now = self.clock.now();
        self.mark_contact().await;
        let signals = UtteranceSignals::analyze(text);

        let recalled = {
            let mut tracker = self.tracker.lock().await;
            tracker.record_interaction();
            if signals.care {
                tracker.record_care_event();
            }
            tracker
                .recall(text)
                .first()
                .map(|f| (f.render(), f.emotional_impact))
        };
        {
            let mut ledger = self.ledger.write().await;
            ledger.apply_trigger(EmotionChannel::Lonely, MESSAGE_COMFORT, TriggerSource::UserMessage, now)?;
            if signals.care {
                ledger.apply_event(AffectEvent::UserCare, now)?;
            }
            if signals.shared_task {
                ledger.apply_event(AffectEvent::TaskCompletion, now)?;
            }
        }

        let shared_memory = match recalled {
            Some((content, impact)) => Some(self.share_memory(content, impact).await?),
            None => None,
        };
        Ok(MessageOutcome {
            care: signals.care,
            shared_task: signals.shared_task,
            shared_memory,
        })
    }

    /// Count a care event the caller recognised on its own.
    pub async fn acknowledge_care(&self) -> Result<(), AnimaError> {
        let now = self.clock.now();
        self.mark_contact().await;
        self.tracker.lock().await.record_care_event();
        self.ledger.write().await.apply_event(AffectEvent::UserCare, now)
    }

    /// Offer a user detail for a detail-gated fragment.
    ///
    /// Premature or unknown details are logged and rejected without touching
    /// the tracker.
    pub async fn supply_memory_detail(
        &self,
        fragment_id: &str,
        detail: &str,
    ) -> Result<DetailOutcome, AnimaError> {
        let now = self.clock.now();
        self.mark_contact().await;

        let result = {
            let mut tracker = self.tracker.lock().await;
            match tracker.record_user_detail(fragment_id, detail, now) {
                Ok(unlocked) => {
                    tracker.record_interaction();
                    Ok(tracker
                        .fragment(fragment_id)
                        .map(|f| (unlocked, f.render(), f.emotional_impact)))
                }
                Err(e) => Err(e),
            }
        };

        match result {
            Ok(Some((true, content, impact))) => {
                tracing::info!("Recovered memory {}", fragment_id);
                self.ledger.write().await.apply_event(AffectEvent::MemoryRecovered, now)?;
                self.share_memory(content, impact).await?;
                Ok(DetailOutcome::Unlocked)
            }
            Ok(_) => Ok(DetailOutcome::Updated),
            Err(e @ (AnimaError::PrematureDetail { .. } | AnimaError::UnknownFragment(_))) => {
                tracing::warn!("Ignoring memory detail: {}", e);
                Ok(DetailOutcome::Rejected(e.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    async fn share_memory(&self, content: String, impact: f32) -> Result<Action, AnimaError> {
        let intent = BehaviorIntent::new(IntentKind::MemoryShare, Priority::Medium, content)
            .with_emotion(EmotionChannel::Happy, impact * 0.5);
        self.express(intent).await
    }

    pub async fn status(&self) -> EngineStatus {
        let summary = self.tracker.lock().await.summary();
        let mood = self.mood().await;
        EngineStatus {
            summary,
            dominant: mood.dominant(),
            mood,
            queued: self.sink.len(),
        }
    }

    pub async fn snapshot_state(&self) -> PersistedState {
        let tracker = self.tracker.lock().await.snapshot();
        let ledger = self.ledger.read().await.snapshot();
        PersistedState::new(ledger, tracker, self.clock.now())
    }

    /// Write the current state if a store is configured.
    pub async fn save(&self) -> Result<(), AnimaError> {
        if let Some(store) = &self.store {
            let state = self.snapshot_state().await;
            store.save(&state).await?;
            tracing::debug!("State saved to {}", store.path().display());
        }
        Ok(())
    }

    /// Start one task per sensor plus the heartbeat and autosave tasks.
    pub fn spawn(self: Arc<Self>, sensors: Vec<Arc<dyn Sensor>>) -> SchedulerHandle {
        let (shutdown_tx, _) = watch::channel(false);
        let shutdown = Arc::new(shutdown_tx);
        let mut tasks = Vec::new();

        for sensor in sensors {
            tracing::info!("Starting {} sensor", sensor.kind());
            tasks.push(tokio::spawn(self.clone().sensor_loop(sensor, shutdown.clone())));
        }
        tasks.push(tokio::spawn(self.clone().heartbeat_loop(shutdown.clone())));
        if self.store.is_some() && !self.autosave.is_zero() {
            tasks.push(tokio::spawn(self.clone().autosave_loop(shutdown.clone())));
        }

        SchedulerHandle {
            scheduler: self,
            shutdown,
            tasks,
        }
    }

    async fn sensor_loop(
        self: Arc<Self>,
        sensor: Arc<dyn Sensor>,
        shutdown: Arc<watch::Sender<bool>>,
    ) -> Result<(), AnimaError> {
        let mut stop = shutdown.subscribe();
        let mut backoff = Backoff::from_config(&self.backoff);
        let mut delay = sensor.interval(&self.mood().await);

        loop {
            if *stop.borrow() {
                break;
            }
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = stop.changed() => break,
            }

            let polled = match tokio::time::timeout(self.poll_timeout, sensor.poll()).await {
                Ok(result) => result,
                Err(_) => Err(AnimaError::sensor_unavailable(sensor.kind(), "poll timed out")),
            };

            delay = match polled {
                Ok(observation) => {
                    backoff.reset();
                    if let Some(observation) = observation {
                        match self.run_cycle(observation).await {
                            Ok(_) => {}
                            Err(e) if e.is_fatal() => {
                                tracing::error!("Fatal error in {} cycle: {}", sensor.kind(), e);
                                shutdown.send_replace(true);
                                return Err(e);
                            }
                            Err(e) => tracing::warn!("{} cycle failed: {}", sensor.kind(), e),
                        }
                    }
                    sensor.interval(&self.mood().await)
                }
                Err(e @ AnimaError::SensorUnavailable { .. }) => {
                    let retry = backoff.next_delay();
                    tracing::warn!(sensor = %sensor.kind(), retry = ?retry, "{}", e);
                    retry
                }
                Err(e) if e.is_fatal() => {
                    tracing::error!("Fatal error from {} sensor: {}", sensor.kind(), e);
                    shutdown.send_replace(true);
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!("{} sensor error: {}", sensor.kind(), e);
                    sensor.interval(&self.mood().await)
                }
            };
        }
        tracing::debug!("{} sensor loop stopped", sensor.kind());
        Ok(())
    }

    async fn heartbeat_loop(self: Arc<Self>, shutdown: Arc<watch::Sender<bool>>) -> Result<(), AnimaError> {
        let mut stop = shutdown.subscribe();
        let mut ticker = tokio::time::interval(self.heartbeat.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_tick = Instant::now();

        loop {
            if *stop.borrow() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {}
                _ = stop.changed() => break,
            }
            let now = Instant::now();
            let dt = now.duration_since(last_tick);
            last_tick = now;

            if let Err(e) = self.decay_tick(dt).await {
                if e.is_fatal() {
                    tracing::error!("Fatal error in heartbeat: {}", e);
                    shutdown.send_replace(true);
                    return Err(e);
                }
                tracing::warn!("Heartbeat error: {}", e);
            }
        }
        Ok(())
    }

    async fn autosave_loop(self: Arc<Self>, shutdown: Arc<watch::Sender<bool>>) -> Result<(), AnimaError> {
        let mut stop = shutdown.subscribe();
        loop {
            if *stop.borrow() {
                break;
            }
            tokio::select! {
                _ = tokio::time::sleep(self.autosave) => {}
                _ = stop.changed() => break,
            }
            if let Err(e) = self.save().await {
                tracing::warn!("Autosave failed: {}", e);
            }
        }
        Ok(())
    }
}

/// Running scheduler. Dropping it leaves the tasks running; call `shutdown`.
pub struct SchedulerHandle {
    scheduler: Arc<AutonomousScheduler>,
    shutdown: Arc<watch::Sender<bool>>,
    tasks: Vec<JoinHandle<Result<(), AnimaError>>>,
}

impl SchedulerHandle {
    pub fn scheduler(&self) -> &Arc<AutonomousScheduler> {
        &self.scheduler
    }

    /// Flips to `true` when shutdown starts, including after a fatal error.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// Stop every loop after its current cycle, then save and close the sink.
    pub async fn shutdown(self) -> anyhow::Result<()> {
        tracing::info!("Scheduler shutting down");
        self.shutdown.send_replace(true);

        let mut fatal = None;
        for task in self.tasks {
            match task.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    fatal.get_or_insert(e);
                }
                Err(e) => tracing::error!("Scheduler task panicked: {}", e),
            }
        }

        self.scheduler.save().await.context("Final state save failed")?;
        self.scheduler.sink.close();

        match fatal {
            Some(e) => Err(anyhow::Error::new(e).context("Scheduler stopped on a fatal error")),
            None => Ok(()),
        }
    }
}
