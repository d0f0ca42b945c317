//! Error types for daemon collaborators and target selection.

use std::error::Error;
use std::fmt::{self, Display, Formatter};

use thiserror::Error;

use crate::model::TorrentFilter;

/// Failure reported by a torrent daemon collaborator.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The daemon could not be reached, or the exchange broke off mid-flight.
    #[error("torrent daemon unreachable during {operation}")]
    Connection {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying transport failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The daemon refused the supplied credentials or session.
    #[error("torrent daemon refused authentication during {operation}")]
    Unauthorized {
        /// Operation identifier.
        operation: &'static str,
    },
    /// The daemon did not recognise a state filter value.
    #[error("torrent daemon rejected state filter '{value}'")]
    InvalidFilter {
        /// Filter value sent to the daemon.
        value: String,
    },
    /// The daemon answered with a non-success status.
    #[error("torrent daemon rejected {operation} (status {status}){}", reason_suffix(.message))]
    Rejected {
        /// Operation identifier.
        operation: &'static str,
        /// HTTP status code returned by the daemon.
        status: u16,
        /// Response body, trimmed.
        message: String,
    },
}

impl ClientError {
    /// Wrap a transport failure for the given operation.
    pub fn connection(
        operation: &'static str,
        source: impl Into<Box<dyn Error + Send + Sync>>,
    ) -> Self {
        Self::Connection {
            operation,
            source: source.into(),
        }
    }

    /// Whether the failure means the daemon could not be used at all.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Unauthorized { .. })
    }
}

/// Convenience alias for collaborator results.
pub type ClientResult<T> = Result<T, ClientError>;

fn reason_suffix(message: &str) -> String {
    if message.is_empty() {
        String::new()
    } else {
        format!(": {message}")
    }
}

/// Selection input whose inventory query failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Criterion {
    /// The state filter query.
    Filter(TorrentFilter),
    /// A per-category query.
    Category(String),
}

impl Display for Criterion {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Filter(filter) => write!(formatter, "filter '{filter}'"),
            Self::Category(category) => write!(formatter, "category '{category}'"),
        }
    }
}

/// Failure while resolving selection criteria into a target set.
#[derive(Debug, Error)]
pub enum SelectionError {
    /// An inventory query failed; no partial result is kept.
    #[error("could not get torrents for {criterion}")]
    Query {
        /// Criterion whose query failed.
        criterion: Criterion,
        /// Collaborator failure.
        #[source]
        source: ClientError,
    },
}

impl SelectionError {
    /// Criterion whose query failed.
    #[must_use]
    pub const fn criterion(&self) -> &Criterion {
        match self {
            Self::Query { criterion, .. } => criterion,
        }
    }

    /// Collaborator failure behind the selection error.
    #[must_use]
    pub const fn client_error(&self) -> &ClientError {
        match self {
            Self::Query { source, .. } => source,
        }
    }
}

/// Convenience alias for selection results.
pub type SelectionResult<T> = Result<T, SelectionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn criterion_display_names_the_input() {
        assert_eq!(
            Criterion::Filter(TorrentFilter::StalledUploading).to_string(),
            "filter 'stalled_uploading'"
        );
        assert_eq!(
            Criterion::Category("movies".into()).to_string(),
            "category 'movies'"
        );
    }

    #[test]
    fn selection_error_exposes_criterion_and_source() {
        let err = SelectionError::Query {
            criterion: Criterion::Category("tv".into()),
            source: ClientError::Rejected {
                operation: "list",
                status: 500,
                message: "boom".into(),
            },
        };

        assert_eq!(err.to_string(), "could not get torrents for category 'tv'");
        assert_eq!(err.criterion(), &Criterion::Category("tv".into()));
        assert!(!err.client_error().is_connection());
    }

    #[test]
    fn connection_class_covers_unauthorized() {
        let unreachable = ClientError::connection("login", "connection refused");
        assert!(unreachable.is_connection());
        assert_eq!(
            unreachable.to_string(),
            "torrent daemon unreachable during login"
        );
        assert!(ClientError::Unauthorized { operation: "list" }.is_connection());
        assert!(
            !ClientError::InvalidFilter {
                value: "bogus".into()
            }
            .is_connection()
        );
    }

    #[test]
    fn rejection_carries_the_daemon_reason() {
        let err = ClientError::Rejected {
            operation: "delete",
            status: 409,
            message: "torrent is being moved".into(),
        };
        assert_eq!(
            err.to_string(),
            "torrent daemon rejected delete (status 409): torrent is being moved"
        );

        let silent = ClientError::Rejected {
            operation: "list",
            status: 500,
            message: String::new(),
        };
        assert_eq!(
            silent.to_string(),
            "torrent daemon rejected list (status 500)"
        );
    }
}
