use crate::types::{FatalKind, SessionEvent};
use anyhow::{Context, Result};
use crossbeam::channel::Sender;
use signal_hook::consts::signal::{SIGABRT, SIGALRM, SIGCONT, SIGINT, SIGTERM};
use signal_hook::iterator::backend::Handle;
use signal_hook::iterator::Signals;
use std::thread;

/// Translate a raw signal number into a session event.
///
/// Everything the listener subscribes to maps somewhere; an unexpected
/// number yields nothing and is dropped.
pub fn map_signal(signal: i32) -> Option<SessionEvent> {
    match signal {
        SIGALRM => Some(SessionEvent::Alarm),
        SIGCONT => Some(SessionEvent::Wake),
        SIGINT => Some(SessionEvent::Fatal(FatalKind::Interrupt)),
        SIGTERM => Some(SessionEvent::Fatal(FatalKind::Termination)),
        SIGABRT => Some(SessionEvent::Fatal(FatalKind::Abort)),
        // Faults are handled out-of-band; the mapping is kept total so a
        // fault arriving through the queue is still treated as fatal
        libc::SIGSEGV | libc::SIGFPE => Some(SessionEvent::Fatal(FatalKind::Fault)),
        _ => None,
    }
}

/// Handle to the running signal listener thread
pub struct SignalListener {
    handle: Handle,
    thread: Option<thread::JoinHandle<()>>,
}

impl SignalListener {
    /// Stop listening and join the thread
    pub fn close(mut self) {
        self.handle.close();
        if let Some(t) = self.thread.take() {
            let _ = t.join();
        }
    }
}

/// Spawn the thread that converts catchable OS signals into queued
/// session events.
///
/// The handler side does nothing beyond enqueueing; all effects on shared
/// state happen when the event loop drains the queue, so the single-writer
/// discipline on the control state holds even under signal delivery at
/// arbitrary points.
pub fn spawn_listener(events: Sender<SessionEvent>) -> Result<SignalListener> {
    let mut signals = Signals::new([SIGALRM, SIGCONT, SIGINT, SIGTERM, SIGABRT])
        .context("failed to register signal handlers")?;
    let handle = signals.handle();

    let thread = thread::spawn(move || {
        for signal in signals.forever() {
            log::debug!("signal {signal} received");
            if let Some(event) = map_signal(signal) {
                if events.send(event).is_err() {
                    break;
                }
            }
        }
    });

    Ok(SignalListener {
        handle,
        thread: Some(thread),
    })
}

/// Request a SIGALRM after `secs` seconds
pub fn schedule_alarm(secs: u32) {
    unsafe {
        libc::alarm(secs);
    }
}

/// Minimal async-signal-safe handler for synchronous fault signals.
///
/// Only `write` and `_exit` are used here; these faults cannot be routed
/// through the event queue because the faulting thread cannot continue.
extern "C" fn fault_handler(signal: libc::c_int) {
    let msg: &[u8] = match signal {
        libc::SIGSEGV => b"\nlrpt-rx: Segmentation Fault\n",
        libc::SIGFPE => b"\nlrpt-rx: Floating Point Exception\n",
        _ => b"\nlrpt-rx: Fatal Fault Signal received\n",
    };
    unsafe {
        libc::write(libc::STDERR_FILENO, msg.as_ptr().cast(), msg.len());
        libc::_exit(1);
    }
}

/// Install handlers for the fault signals the iterator API refuses
/// (SIGSEGV, SIGFPE). There is no recovery from these; the handler
/// prints one line and exits.
pub fn install_fault_handlers() {
    unsafe {
        let handler: extern "C" fn(libc::c_int) = fault_handler;
        let mut action: libc::sigaction = std::mem::zeroed();
        action.sa_sigaction = handler as usize;
        libc::sigemptyset(&mut action.sa_mask);
        action.sa_flags = 0;
        libc::sigaction(libc::SIGSEGV, &action, std::ptr::null_mut());
        libc::sigaction(libc::SIGFPE, &action, std::ptr::null_mut());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signals_map_to_session_events() {
        assert_eq!(map_signal(SIGALRM), Some(SessionEvent::Alarm));
        assert_eq!(map_signal(SIGCONT), Some(SessionEvent::Wake));
        assert_eq!(
            map_signal(SIGINT),
            Some(SessionEvent::Fatal(FatalKind::Interrupt))
        );
        assert_eq!(
            map_signal(SIGTERM),
            Some(SessionEvent::Fatal(FatalKind::Termination))
        );
        assert_eq!(
            map_signal(SIGABRT),
            Some(SessionEvent::Fatal(FatalKind::Abort))
        );
        assert_eq!(
            map_signal(libc::SIGSEGV),
            Some(SessionEvent::Fatal(FatalKind::Fault))
        );
    }

    #[test]
    fn unexpected_signals_are_dropped() {
        assert_eq!(map_signal(libc::SIGUSR1), None);
        assert_eq!(map_signal(0), None);
    }
}
