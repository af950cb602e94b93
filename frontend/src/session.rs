use std::time::Duration;

/// Delay before the first retry after a failed connection attempt.
pub const BASE_RECONNECT_DELAY: Duration = Duration::from_millis(100);
const BACKOFF_FACTOR: f64 = 1.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    /// At least one frame has been received on the current socket.
    Open,
}

/// Reconnection policy for the conversation socket.
///
/// | state        | event          | next         | effect                         |
/// |--------------|----------------|--------------|--------------------------------|
/// | Disconnected | connect        | Connecting   |                                |
/// | Connecting   | first message  | Open         | backoff reset                  |
/// | Open         | close          | Disconnected | reconnect now, backoff reset   |
/// | Connecting   | close          | Disconnected | reconnect after `base·1.5^(n-1)` |
///
/// There is no retry limit and no cap on the delay.
#[derive(Clone, Debug)]
pub struct Reconnect {
    state: ConnectionState,
    base: Duration,
    failures: u32,
}

impl Default for Reconnect {
    fn default() -> Self {
        Self::new(BASE_RECONNECT_DELAY)
    }
}

impl Reconnect {
    pub fn new(base: Duration) -> Self {
        Self { state: ConnectionState::Disconnected, base, failures: 0 }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// A new socket is being opened.
    pub fn connecting(&mut self) {
        self.state = ConnectionState::Connecting;
    }

    /// A frame arrived. Returns `true` if this opened the connection.
    pub fn on_message(&mut self) -> bool {
        if self.state == ConnectionState::Open {
            return false;
        }
        self.state = ConnectionState::Open;
        self.failures = 0;
        true
    }

    /// The socket closed. Returns how long to wait before reconnecting.
    pub fn on_close(&mut self) -> Duration {
        let was_open = self.state == ConnectionState::Open;
        self.state = ConnectionState::Disconnected;
        if was_open {
            self.failures = 0;
            return Duration::ZERO;
        }
        self.failures = self.failures.saturating_add(1);
        self.retry_delay(self.failures)
    }

    /// Delay before the `n`th consecutive retry (1-based).
    pub fn retry_delay(&self, n: u32) -> Duration {
        let exponent = n.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.base.as_secs_f64() * BACKOFF_FACTOR.powi(exponent);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(d: Duration) -> f64 {
        d.as_secs_f64() * 1000.0
    }

    #[test]
    fn failed_attempts_back_off_geometrically() {
        let mut reconnect = Reconnect::default();
        let mut delays = Vec::new();
        for _ in 0..4 {
            reconnect.connecting();
            delays.push(ms(reconnect.on_close()));
        }
        let expected = [100.0, 150.0, 225.0, 337.5];
        for (got, want) in delays.iter().zip(expected) {
            assert!((got - want).abs() < 1e-6, "{got} != {want}");
        }
        assert_eq!(reconnect.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn first_message_opens_and_resets_backoff() {
        let mut reconnect = Reconnect::default();
        reconnect.connecting();
        reconnect.on_close();
        reconnect.connecting();
        reconnect.on_close();

        reconnect.connecting();
        assert_eq!(reconnect.state(), ConnectionState::Connecting);
        assert!(reconnect.on_message());
        assert!(!reconnect.on_message());
        assert!(reconnect.is_open());

        // a drop after a successful open reconnects at once
        assert_eq!(reconnect.on_close(), Duration::ZERO);
        reconnect.connecting();
        assert!((ms(reconnect.on_close()) - 100.0).abs() < 1e-6);
    }

    #[test]
    fn delay_is_uncapped_and_never_panics() {
        let reconnect = Reconnect::default();
        assert!(reconnect.retry_delay(25) > Duration::from_secs(1000));
        assert_eq!(reconnect.retry_delay(u32::MAX), Duration::MAX);
    }
}
