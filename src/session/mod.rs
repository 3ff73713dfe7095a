pub mod controller;
pub mod signals;

// Re-export commonly used types
pub use controller::{AlarmHandler, CountdownAlarm, SessionController, SessionState};
pub use signals::{
    install_fault_handlers, map_signal, schedule_alarm, spawn_listener, SignalListener,
};
