//! User history: typed records and the store they are read from.
//!
//! Every analysis in this crate is a pure function of a [`HistorySnapshot`].
//! Nothing derived from history is cached; callers reload the snapshot after
//! new records are ingested.

mod records;
mod store;

pub use records::{
    CompletionRecord, EnergyEntry, EnergyLevel, FocusSessionRecord, Mood, MoodEntry,
};
pub use store::{HistorySnapshot, HistoryStore, MemoryHistoryStore, TimeRange};
