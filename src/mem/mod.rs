mod arena;

pub use arena::{Arena, ArenaError, ArenaSlot};
