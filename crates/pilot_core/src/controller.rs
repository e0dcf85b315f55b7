use std::{
    sync::{
        atomic::{AtomicBool, AtomicU8, Ordering},
        Arc, Mutex, PoisonError,
    },
    time::Duration,
};

use gesture_driver::GestureDriver;
use shared::domain::{ControllerStatus, ScreenState};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, error, info, Instrument};

use crate::{
    actions::{Action, ActionRegistry},
    buffer::ActionBuffer,
    checker::ActivityChecker,
    config::CallbackFailurePolicy,
    context::PilotContext,
    dispatcher::ActionDispatcher,
    error::PilotError,
    events::EventBus,
    reconciler::StateReconciler,
};

/// Lock-free cell holding a [`ControllerStatus`].
pub struct AtomicStatus(AtomicU8);

impl AtomicStatus {
    pub fn new(status: ControllerStatus) -> Self {
        Self(AtomicU8::new(status as u8))
    }

    pub fn load(&self) -> ControllerStatus {
        ControllerStatus::try_from(self.0.load(Ordering::SeqCst))
            .unwrap_or(ControllerStatus::Stopped)
    }

    pub fn store(&self, status: ControllerStatus) {
        self.0.store(status as u8, Ordering::SeqCst);
    }

    /// Moves `from -> to` only if the status still is `from`.
    pub fn promote(&self, from: ControllerStatus, to: ControllerStatus) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

type LoopHandle = JoinHandle<Result<ScreenState, PilotError>>;

/// Owns the pending actions and the coordination loop that alternates
/// activity polling with action dispatch.
pub struct Controller {
    buffer: Arc<ActionBuffer>,
    status: Arc<AtomicStatus>,
    believed: Arc<watch::Sender<ScreenState>>,
    checker: Arc<ActivityChecker>,
    dispatcher: Arc<ActionDispatcher>,
    context: PilotContext,
    spawned: AtomicBool,
    handle: Mutex<Option<LoopHandle>>,
}

impl Controller {
    /// The remote app is assumed to sit on its main screen.
    pub fn new(
        driver: Arc<dyn GestureDriver>,
        registry: ActionRegistry,
        context: PilotContext,
    ) -> Self {
        let buffer = Arc::new(ActionBuffer::default());
        let reconciler = Arc::new(StateReconciler::new(driver, context.settings.clone()));
        let checker = Arc::new(ActivityChecker::new(reconciler.clone(), context.clone()));
        let dispatcher = Arc::new(ActionDispatcher::new(
            buffer.clone(),
            Arc::new(registry),
            reconciler,
            context.clone(),
        ));
        let (believed, _) = watch::channel(ScreenState::Main);

        Self {
            buffer,
            status: Arc::new(AtomicStatus::new(ControllerStatus::Starting)),
            believed: Arc::new(believed),
            checker,
            dispatcher,
            context,
            spawned: AtomicBool::new(false),
            handle: Mutex::new(None),
        }
    }

    pub fn enqueue(&self, action: Action) -> Result<(), PilotError> {
        self.buffer.push(action).map_err(|rejected| {
            debug!(kind = rejected.kind(), "rejecting action after quit");
            PilotError::ShuttingDown
        })
    }

    /// Spawns the coordination loop on the current tokio runtime. The loop
    /// itself promotes the status to `Running` before its first iteration.
    pub fn start(&self) -> Result<(), PilotError> {
        if self.status.load() == ControllerStatus::Stopped {
            return Err(PilotError::ShuttingDown);
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| PilotError::NoRuntime)?;
        if self.spawned.swap(true, Ordering::SeqCst) {
            return Err(PilotError::AlreadyStarted);
        }

        let job = CoordinationLoop {
            buffer: self.buffer.clone(),
            status: self.status.clone(),
            believed: self.believed.clone(),
            checker: self.checker.clone(),
            dispatcher: self.dispatcher.clone(),
            delay: self.context.settings.loop_delay(),
            policy: self.context.settings.callback_failure_policy,
        };
        let handle = runtime.spawn(job.run().instrument(self.context.span.clone()));
        *self.handle.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        Ok(())
    }

    /// Asks the loop to stop once the pending actions are drained. Takes
    /// effect between steps; nothing in flight is interrupted.
    pub fn quit(&self) {
        self.buffer.seal();
        self.status.store(ControllerStatus::Stopped);
        info!(pending = self.buffer.len(), "controller quit requested");
    }

    /// Resolves once the loop has exited, with the final believed state or
    /// the error that ended it.
    pub async fn wait_for_finish(&self) -> Result<ScreenState, PilotError> {
        let handle = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(PilotError::NotRunning)?;
        handle
            .await
            .map_err(|err| PilotError::LoopAborted(err.to_string()))?
    }

    pub fn status(&self) -> ControllerStatus {
        self.status.load()
    }

    pub fn is_on(&self) -> bool {
        self.status.load() > ControllerStatus::Stopped
    }

    pub fn has_started(&self) -> bool {
        self.status.load() > ControllerStatus::Starting
    }

    pub fn believed_state(&self) -> ScreenState {
        self.believed.borrow().clone()
    }

    pub fn watch_state(&self) -> watch::Receiver<ScreenState> {
        self.believed.subscribe()
    }

    pub fn events(&self) -> &EventBus {
        &self.context.events
    }

    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

struct CoordinationLoop {
    buffer: Arc<ActionBuffer>,
    status: Arc<AtomicStatus>,
    believed: Arc<watch::Sender<ScreenState>>,
    checker: Arc<ActivityChecker>,
    dispatcher: Arc<ActionDispatcher>,
    delay: Duration,
    policy: CallbackFailurePolicy,
}

impl CoordinationLoop {
    async fn run(self) -> Result<ScreenState, PilotError> {
        let result = self.drive().await;

        self.buffer.seal();
        self.status.store(ControllerStatus::Stopped);
        match &result {
            Ok(state) => info!(%state, "coordination loop finished"),
            Err(err) => {
                let abandoned = self.buffer.len();
                error!(error = %err, abandoned, "coordination loop aborted");
            }
        }
        result
    }

    async fn drive(&self) -> Result<ScreenState, PilotError> {
        if self
            .status
            .promote(ControllerStatus::Starting, ControllerStatus::Running)
        {
            info!("controller running");
        } else {
            debug!("quit before the first iteration");
        }

        let mut current = self.believed.borrow().clone();
        while self.status.load() != ControllerStatus::Stopped || !self.buffer.is_empty() {
            current = self.absorb(self.checker.poll(current).await)?;
            self.believed.send_replace(current.clone());

            current = self.absorb(self.dispatcher.step(current).await)?;
            self.believed.send_replace(current.clone());

            if self.delay.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(self.delay).await;
            }
        }
        Ok(current)
    }

    fn absorb(&self, outcome: Result<ScreenState, PilotError>) -> Result<ScreenState, PilotError> {
        match outcome {
            Err(PilotError::Callback {
                event,
                believed,
                source,
            }) if self.policy == CallbackFailurePolicy::LogAndContinue => {
                error!(
                    %event,
                    error = %source,
                    state = %believed,
                    "event callback failed; continuing"
                );
                Ok(believed)
            }
            other => other,
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
