//! Background tasks.
//!
//! Each submodule provides a long-running async function or struct intended
//! to be spawned via `tokio::spawn`. All tasks accept a
//! [`CancellationToken`](tokio_util::sync::CancellationToken) for graceful
//! shutdown.

pub mod dispatcher;
pub mod token_cleanup;
