//! Player rig: the character the camera follows.
//!
//! The rig never moves; the drum spins underneath it. Per tick it only
//! advances its animation mixer, after applying a finished model load if one
//! is waiting.
//!
//! # Invariants
//! - The model load is one-shot with exactly two outcomes: loaded or placeholder.
//! - Load completion is only observed at a tick boundary on the frame thread.
//! - Once a visual is present it stays for the rig's lifetime.

mod loader;
mod mixer;
mod rig;

pub use loader::{LoadOutcome, PendingLoad};
pub use mixer::{AnimationMixer, ClipAction};
pub use rig::{PLACEHOLDER_COLOR, PLACEHOLDER_SIZE, PlayerRig, TorchLight, Visual};
