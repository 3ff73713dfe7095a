use crate::state::SharedState;
use crate::types::{FatalKind, SessionEvent};
use std::ops::ControlFlow;

/// Receive session lifecycle.
///
/// `Aborting` is terminal: it is entered on a fatal OS notification and
/// the process exits right after the diagnostic is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Armed,
    Receiving,
    Aborting,
}

/// External alarm-tick delegate.
///
/// The periodic alarm touches the backend and the frontend, which are not
/// this subsystem's concern, so the controller only hands the tick over.
/// Transitions out of `Armed` happen exclusively inside a delegate.
pub trait AlarmHandler: Send {
    fn on_alarm(&mut self, session: &mut SessionController);
}

/// Signal-driven state machine arming and running timed receive sessions.
///
/// Events reach it through the single event-loop queue; the signal thread
/// never mutates shared state directly. The controller is the only writer
/// of the `receiving` flag and the armed duration.
pub struct SessionController {
    state: SessionState,
    shared: SharedState,
    remaining: u32,
    alarm: Option<Box<dyn AlarmHandler>>,
}

impl SessionController {
    pub fn new(shared: SharedState, alarm: Box<dyn AlarmHandler>) -> Self {
        Self {
            state: SessionState::Idle,
            shared,
            remaining: 0,
            alarm: Some(alarm),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Seconds left in the running session
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Arm a session. An explicit duration overrides the armed duration
    /// from the profile; with neither set, the profile default applies.
    pub fn arm(&mut self, duration: Option<u32>) {
        if self.state != SessionState::Idle {
            log::warn!("arm requested while {:?}, ignored", self.state);
            return;
        }
        let mut st = self.shared.write();
        let secs = duration
            .filter(|&d| d > 0)
            .or(Some(st.session.decode_timer).filter(|&d| d > 0))
            .unwrap_or(st.session.default_timer);
        st.session.decode_timer = secs;
        drop(st);

        self.remaining = secs;
        self.state = SessionState::Armed;
        log::info!("session armed for {secs} sec");
    }

    /// Start the countdown. Called from an alarm delegate (or directly by
    /// the frontend's start control); a no-op unless armed.
    pub fn begin(&mut self) {
        if self.state != SessionState::Armed {
            return;
        }
        let mut st = self.shared.write();
        st.flags.receiving = true;
        st.session.receiving_since = Some(chrono::Utc::now());
        drop(st);

        self.state = SessionState::Receiving;
        log::info!("receive session started, {} sec", self.remaining);
    }

    /// Advance the countdown by one alarm period.
    pub fn tick(&mut self) {
        if self.state != SessionState::Receiving {
            return;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.complete();
        }
    }

    /// Normal completion: back to Idle with the receiving flag cleared.
    fn complete(&mut self) {
        let mut st = self.shared.write();
        st.flags.receiving = false;
        st.session.receiving_since = None;
        drop(st);

        self.state = SessionState::Idle;
        log::info!("receive session complete");
    }

    /// Apply one queued event. A fatal event clears the receiving flag,
    /// moves to `Aborting` and breaks with the condition; the caller owns
    /// the diagnostic and the process exit.
    pub fn handle_event(&mut self, event: SessionEvent) -> ControlFlow<FatalKind> {
        match event {
            SessionEvent::Alarm => {
                if let Some(mut handler) = self.alarm.take() {
                    handler.on_alarm(self);
                    self.alarm = Some(handler);
                }
                ControlFlow::Continue(())
            }
            // Internal wakeup call
            SessionEvent::Wake => ControlFlow::Continue(()),
            SessionEvent::Fatal(kind) => {
                self.shared.write().flags.receiving = false;
                self.state = SessionState::Aborting;
                ControlFlow::Break(kind)
            }
        }
    }
}

/// Bundled alarm delegate: starts the countdown on the first tick after
/// arming, then counts the session down, re-arming the periodic alarm for
/// as long as the session runs.
pub struct CountdownAlarm {
    rearm: Box<dyn FnMut() + Send>,
}

impl CountdownAlarm {
    pub fn new(rearm: impl FnMut() + Send + 'static) -> Self {
        Self {
            rearm: Box::new(rearm),
        }
    }
}

impl AlarmHandler for CountdownAlarm {
    fn on_alarm(&mut self, session: &mut SessionController) {
        match session.state() {
            SessionState::Armed => {
                session.begin();
                (self.rearm)();
            }
            SessionState::Receiving => {
                session.tick();
                if session.state() == SessionState::Receiving {
                    (self.rearm)();
                }
            }
            SessionState::Idle | SessionState::Aborting => {}
        }
    }
}
