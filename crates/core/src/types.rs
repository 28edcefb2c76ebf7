/// Opaque task identifier assigned by the backend on submission.
pub type TaskId = String;

/// Identifier of a rendered video. The backend reuses the task id.
pub type VideoId = String;

/// All durations exchanged with the backend are seconds.
pub type Seconds = f64;
