use std::fmt::Debug;
use std::time::Duration;

use super::Remote;
use super::flight::FlightGuard;
use crate::FetchError;

/// Steps of one [`Fetcher::fetch_cached`](crate::Fetcher::fetch_cached) run.
///
/// `F` is the not-yet-invoked remote call. It moves from state to state
/// until `RemoteCall` consumes it, so the remote is called at most once.
pub(crate) enum State<T, F> {
    /// Look for a fresh entry.
    CheckCache { remote_call: F },
    /// Take the per-key flight (single-flight only).
    AwaitFlight { remote_call: F },
    /// Another caller held the flight: it may have refreshed the cache.
    RecheckCache { remote_call: F, flight: FlightGuard },
    /// Wait out an armed throttle window.
    Throttle {
        remote_call: F,
        flight: Option<FlightGuard>,
    },
    /// Invoke the remote.
    RemoteCall {
        remote_call: F,
        flight: Option<FlightGuard>,
    },
    /// Persist a successful result and forward its rate-limit hint.
    WriteCache {
        remote: Remote<T>,
        flight: Option<FlightGuard>,
    },
    /// The remote rate limited us. The flight is held until the throttle
    /// is armed, so waiters stall instead of calling the remote again.
    ArmThrottle {
        retry_after: Option<Duration>,
        flight: Option<FlightGuard>,
    },
    /// Final state with a value.
    Return(T),
    /// Final state with a failure.
    ReturnFailure(FetchError),
}

impl<T, F> Debug for State<T, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            State::CheckCache { .. } => f.write_str("State::CheckCache"),
            State::AwaitFlight { .. } => f.write_str("State::AwaitFlight"),
            State::RecheckCache { .. } => f.write_str("State::RecheckCache"),
            State::Throttle { .. } => f.write_str("State::Throttle"),
            State::RemoteCall { .. } => f.write_str("State::RemoteCall"),
            State::WriteCache { .. } => f.write_str("State::WriteCache"),
            State::ArmThrottle { .. } => f.write_str("State::ArmThrottle"),
            State::Return(_) => f.write_str("State::Return"),
            State::ReturnFailure(_) => f.write_str("State::ReturnFailure"),
        }
    }
}
