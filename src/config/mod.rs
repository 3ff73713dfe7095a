pub mod discovery;
pub mod error;
pub mod lexer;
pub mod limits;
pub mod loader;

// Re-export commonly used types
pub use discovery::{default_profile_dir, find_profiles, ProfileSet};
pub use error::{ConfigError, DiscoveryError};
pub use lexer::{Line, LineReader};
pub use loader::{load_from, load_profile};
