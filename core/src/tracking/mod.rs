pub mod history;
pub mod store;
pub mod track;

pub use history::HistoryRing;
pub use store::TrackStore;
pub use track::{FusedObservation, Track, TrackPoint};
