#![allow(dead_code)]

pub use startorder_test_utils::builders;
pub use startorder_test_utils::recording_action::{Event, RecordingAction};
pub use startorder_test_utils::{init_tracing, with_timeout};
