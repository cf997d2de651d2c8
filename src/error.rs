use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AlarmError {
    #[error("Set a duration longer than 0 minutes.")]
    NonPositiveDuration,
}
