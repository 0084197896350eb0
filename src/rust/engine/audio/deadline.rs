//! Race a future against a host-provided deadline

use std::future::Future;
use std::pin::pin;
use std::time::Duration;

use futures::future::{Either, select};

use super::error::{AudioError, AudioResult};
use crate::engine::host::AudioHost;

/// Tagged outcome of a bounded wait
#[derive(Debug, Clone, PartialEq)]
pub enum Raced<T> {
    Completed(T),
    TimedOut {
        operation: &'static str,
        bound: Duration,
    },
}

impl<T> Raced<T> {
    pub fn is_timed_out(&self) -> bool {
        matches!(self, Raced::TimedOut { .. })
    }

    pub fn into_result(self) -> AudioResult<T> {
        match self {
            Raced::Completed(value) => Ok(value),
            Raced::TimedOut { operation, bound } => Err(AudioError::timeout(operation, bound)),
        }
    }
}

impl<T> Raced<AudioResult<T>> {
    /// Collapse a bounded fallible operation into one result
    pub fn flatten(self) -> AudioResult<T> {
        self.into_result().and_then(|inner| inner)
    }
}

/// The losing side is dropped, not cancelled on the platform: a resume call
/// that outlives its bound may still complete later.
pub async fn race<F>(
    host: &dyn AudioHost,
    operation: &'static str,
    bound: Duration,
    fut: F,
) -> Raced<F::Output>
where
    F: Future,
{
    let fut = pin!(fut);
    let timer = host.sleep(bound);

    match select(fut, timer).await {
        Either::Left((value, _)) => Raced::Completed(value),
        Either::Right(((), _)) => Raced::TimedOut { operation, bound },
    }
}
