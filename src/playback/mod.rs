//! Session lifecycle: frame cache, prefetching, the scheduled loop and pointer interaction.

pub mod cache;
pub mod interaction;
pub mod player;
pub mod prefetch;
pub(crate) mod scheduler;
pub mod session;
