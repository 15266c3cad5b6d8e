#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid channel name {name:?}: {reason}")]
    InvalidChannel { name: String, reason: &'static str },

    #[error("Invalid task id: {0}")]
    InvalidTaskId(&'static str),
}
