use async_trait::async_trait;
use snafu::Snafu;

use crate::domain::model::error::Error as ModelError;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Connection Error: {}", source))]
    Connection {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[snafu(display("Authentication Error: {}", details))]
    Authentication { details: String },
}

/// A remote endpoint from which a session (`Conn`) can be established.
#[async_trait]
pub trait Remote {
    type Conn;
    async fn conn(self) -> Result<Self::Conn, Error>;
}

impl From<Error> for ModelError {
    fn from(err: Error) -> ModelError {
        ModelError::Connection {
            source: Box::new(err),
        }
    }
}
