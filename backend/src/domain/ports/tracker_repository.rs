//! Read-only port for acquisition trackers recorded by the host application.
use async_trait::async_trait;

use super::define_port_error;
use crate::domain::{Tracker, UserId};

define_port_error! {
    /// Errors raised while reading trackers.
    pub enum TrackerRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "tracker repository connection failed: {message}",
        /// Query failed or returned malformed data.
        Query { message: String } => "tracker repository query failed: {message}",
    }
}

/// Lookup of acquisition metadata by user.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TrackerRepository: Send + Sync {
    /// Fetch the tracker for a user, if one was recorded.
    async fn find_by_user(&self, user_id: &UserId)
    -> Result<Option<Tracker>, TrackerRepositoryError>;
}
