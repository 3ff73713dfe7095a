pub mod control;

// Re-export commonly used types
pub use control::{
    ControlState, DecoderParams, DemodParams, Flags, NormRange, RadioState, SessionTiming,
    SharedState, CHANNEL_IMAGE_NUM,
};
