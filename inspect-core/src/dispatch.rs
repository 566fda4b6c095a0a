use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::{RetrySettings, Settings};
use crate::cooldown::CooldownTracker;
use crate::error::LookupError;
use crate::hooks::{OperatorRoster, PermissionOracle};
use crate::lookup::engine::check_page_quota;
use crate::lookup::{
    FilterPolicy, LogLineParser, LogSource, LookupKind, LookupOutcome, PageFetcher,
    PaginationEngine, TargetIdentity,
};
use crate::Actor;

/// Delivered once per accepted request, success or not.
#[derive(Debug, Clone)]
pub struct InspectEvent {
    pub request_id: Uuid,
    pub actor: Actor,
    pub result: Result<LookupOutcome, LookupError>,
}

/// Handed back when a request passes the up-front checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupTicket {
    pub request_id: Uuid,
}

/// Turns outcomes into whatever the actor sees.
pub trait Presentation: Send + Sync {
    fn render_and_send(&self, actor: &Actor, outcome: &LookupOutcome);
    fn send_notice(&self, actor: &Actor, notice: &LookupError);
}

/// Everything the worker needs, frozen before the handoff.
#[derive(Debug)]
struct LookupJob {
    request_id: Uuid,
    actor: Actor,
    kind: LookupKind,
    target: TargetIdentity,
    filter: FilterPolicy,
    page: u32,
}

/// The lookup front door.
///
/// `request` does the cheap checks on the caller's task; the page walk runs
/// on a blocking worker and its result comes back on the event channel.
pub struct Inspector<S> {
    settings: Arc<Settings>,
    engine: Arc<PaginationEngine<S>>,
    oracle: Arc<dyn PermissionOracle>,
    cooldowns: Arc<dyn CooldownTracker>,
    roster: Arc<dyn OperatorRoster>,
    event_tx: mpsc::Sender<InspectEvent>,
}

impl<S> std::fmt::Debug for Inspector<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inspector")
            .field("settings", &self.settings)
            .finish()
    }
}

impl<S: LogSource + 'static> Inspector<S> {
    /// Build the inspector. Outcomes arrive on the returned receiver.
    pub fn start(
        settings: Settings,
        source: S,
        oracle: Arc<dyn PermissionOracle>,
        cooldowns: Arc<dyn CooldownTracker>,
        roster: Arc<dyn OperatorRoster>,
    ) -> (Self, mpsc::Receiver<InspectEvent>) {
        let (event_tx, event_rx) = mpsc::channel(64);

        let parser = LogLineParser::new(settings.format);
        let engine = PaginationEngine::new(
            PageFetcher::new(source),
            parser,
            settings.history_limit_page,
        );

        let inspector = Self {
            settings: Arc::new(settings),
            engine: Arc::new(engine),
            oracle,
            cooldowns,
            roster,
            event_tx,
        };

        (inspector, event_rx)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn engine(&self) -> &PaginationEngine<S> {
        &self.engine
    }

    /// Check permission, cooldown and page quota, then hand the lookup to a
    /// worker. Must be called from inside a Tokio runtime.
    pub fn request(
        &self,
        actor: &Actor,
        kind: LookupKind,
        target: TargetIdentity,
        page: u32,
    ) -> Result<LookupTicket, LookupError> {
        let pos = target.pos();

        let claim = self
            .oracle
            .resolve_claim(actor, pos)
            .ok_or(LookupError::NotInsideClaim)?;

        let required = &self.settings.required_roles;
        if !self.oracle.has_role(&claim, actor, pos, required) {
            return Err(LookupError::PermissionDenied {
                required: required.clone(),
            });
        }

        if self.cooldowns.is_active(actor) {
            return Err(LookupError::RateLimited {
                remaining_millis: self.cooldowns.remaining_millis(actor),
            });
        }

        if self.settings.cooldown_enabled() {
            self.cooldowns.arm(actor);
        }

        check_page_quota(page, self.settings.history_limit_page)?;

        let job = LookupJob {
            request_id: Uuid::new_v4(),
            actor: actor.clone(),
            kind,
            target,
            filter: self.settings.filter_policy(self.roster.operator_names()),
            page,
        };
        let ticket = LookupTicket {
            request_id: job.request_id,
        };

        info!(
            request_id = %job.request_id,
            actor = %actor.name,
            kind = kind.label(),
            page,
            "lookup handed to worker"
        );

        tokio::spawn(run_lookup(
            self.engine.clone(),
            self.settings.retry.clone(),
            Arc::new(job),
            self.event_tx.clone(),
        ));

        Ok(ticket)
    }
}

/// Runs one request to completion, re-running all of it while the log
/// source is unavailable.
async fn run_lookup<S: LogSource + 'static>(
    engine: Arc<PaginationEngine<S>>,
    retry: RetrySettings,
    job: Arc<LookupJob>,
    event_tx: mpsc::Sender<InspectEvent>,
) {
    let mut attempts: u32 = 0;

    let result = loop {
        attempts += 1;

        let engine = engine.clone();
        let attempt = job.clone();
        let joined = tokio::task::spawn_blocking(move || {
            engine.lookup(attempt.kind, &attempt.target, &attempt.filter, attempt.page)
        })
        .await;

        match joined {
            Ok(Err(LookupError::Unavailable)) => {
                if retry.max_attempts.is_some_and(|max| attempts >= max) {
                    warn!(request_id = %job.request_id, attempts, "log source unavailable; giving up");
                    break Err(LookupError::Abandoned { attempts });
                }
                warn!(
                    request_id = %job.request_id,
                    attempts,
                    delay_ms = retry.delay_millis,
                    "log source unavailable; retrying"
                );
                tokio::time::sleep(retry.delay()).await;
            }
            Ok(Err(LookupError::QueryFailure(msg))) => {
                error!(request_id = %job.request_id, "lookup query failed: {}", msg);
                break Err(LookupError::QueryFailure(msg));
            }
            Ok(result) => break result,
            Err(e) => {
                error!(request_id = %job.request_id, "lookup worker died: {}", e);
                break Err(LookupError::QueryFailure(e.to_string()));
            }
        }
    };

    let event = InspectEvent {
        request_id: job.request_id,
        actor: job.actor.clone(),
        result,
    };
    if event_tx.send(event).await.is_err() {
        warn!(request_id = %job.request_id, "lookup finished but nobody is listening");
    }
}

/// Forward every event to the presentation layer until the inspector is dropped.
pub async fn drain<P: Presentation + ?Sized>(
    mut event_rx: mpsc::Receiver<InspectEvent>,
    presentation: &P,
) {
    while let Some(event) = event_rx.recv().await {
        match &event.result {
            Ok(outcome) => presentation.render_and_send(&event.actor, outcome),
            Err(notice) => presentation.send_notice(&event.actor, notice),
        }
    }
}
