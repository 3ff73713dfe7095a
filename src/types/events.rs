/// Events delivered to the session controller through the event queue.
///
/// The signal listener translates raw OS signals into these; nothing else
/// is allowed to touch shared state from signal context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Periodic alarm tick (SIGALRM) advancing the receive countdown
    Alarm,
    /// Benign wakeup (SIGCONT), used only to unblock a waiting operation
    Wake,
    /// Abnormal condition; always fatal to the process
    Fatal(FatalKind),
}

/// Abnormal OS notifications. All of them terminate the process after a
/// one-line diagnostic; a crashed or interrupted receive session cannot be
/// resumed mid-stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatalKind {
    Interrupt,
    Termination,
    Abort,
    Fault,
}

impl FatalKind {
    /// One-line diagnostic printed before the process exits
    pub fn diagnostic(&self) -> &'static str {
        match self {
            FatalKind::Interrupt => "lrpt-rx: Exiting via User Interrupt",
            FatalKind::Termination => "lrpt-rx: Termination Request received",
            FatalKind::Abort => "lrpt-rx: Abort Signal received",
            FatalKind::Fault => "lrpt-rx: Fatal Fault Signal received",
        }
    }
}

/// Notifications pushed to external collaborators (frontend, backend)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A profile was loaded and the control state is fully populated
    ProfileActivated { satellite: String },
    /// Gain selection derived from the loaded tuner gain value
    GainMode(GainSelection),
}

/// Gain control selection exposed to the frontend after a profile load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GainSelection {
    /// Manual gain armed (loaded gain > 0)
    Manual,
    /// Automatic gain control (loaded gain == 0)
    Auto,
}
