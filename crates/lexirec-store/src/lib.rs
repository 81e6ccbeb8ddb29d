pub mod schema;
pub mod store;

pub use schema::{
    AttemptRecord, EmbeddingRecord, ExerciseContext, ExerciseInfo, LessonRecord, QueueRecord,
    WeaknessRecord,
};
pub use store::{AttemptInsert, CandidateFilter, ContentStore, StoreStats};
