//! Shared test mocks and utilities for the Hearth request workflow.

mod clock;
mod repository;

pub use clock::FixedClock;
pub use repository::{
    EmptyEventRepository, FailingEventRepository, InMemoryEventRepository,
    RecordingEventRepository,
};
