//! Configuration used by fragmentation and reassembly.

use std::{num::NonZeroUsize, time::Duration};

use super::{FragmentationError, Fragmenter};

/// Default wire size per fragment; stays below a typical Ethernet MTU once IP
/// and UDP headers are added.
pub const DEFAULT_MAX_FRAGMENT_SIZE: usize = 1400;
/// Default time an incomplete message may wait for its remaining fragments.
pub const DEFAULT_REASSEMBLY_TIMEOUT: Duration = Duration::from_secs(5);
/// Default bound on simultaneously collecting messages.
pub const DEFAULT_MAX_IN_FLIGHT: NonZeroUsize = NonZeroUsize::new(1024).unwrap();
/// Default cap on a reassembled payload.
pub const DEFAULT_MAX_MESSAGE_SIZE: NonZeroUsize = NonZeroUsize::new(16 * 1024 * 1024).unwrap();
/// Default period of the eviction sweep.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Settings that bound fragment sizes and reassembly resource usage.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use wirefrag::fragment::FragmentationConfig;
///
/// let config = FragmentationConfig::new(512)
///     .expect("valid fragment size")
///     .with_reassembly_timeout(Duration::from_millis(250));
/// assert_eq!(config.fragmenter().nominal_length().get(), 488);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FragmentationConfig {
    fragmenter: Fragmenter,
    /// Duration after which incomplete messages are evicted.
    pub reassembly_timeout: Duration,
    /// Upper bound on messages collecting fragments at the same time.
    pub max_in_flight: NonZeroUsize,
    /// Hard cap on the declared length of a message admitted for reassembly.
    pub max_message_size: NonZeroUsize,
    /// How often the background sweep looks for expired messages.
    pub sweep_interval: Duration,
}

impl FragmentationConfig {
    /// Derive a configuration from the maximum wire size of one fragment.
    ///
    /// # Errors
    ///
    /// Returns [`FragmentationError::Configuration`] when the size cannot hold
    /// a header plus one content byte.
    pub fn new(max_fragment_size: usize) -> Result<Self, FragmentationError> {
        Ok(Self {
            fragmenter: Fragmenter::new(max_fragment_size)?,
            reassembly_timeout: DEFAULT_REASSEMBLY_TIMEOUT,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        })
    }

    /// Fragmenter matching the configured fragment size.
    #[must_use]
    pub const fn fragmenter(&self) -> Fragmenter { self.fragmenter }

    /// Wire size ceiling per fragment, header included.
    #[must_use]
    pub const fn max_fragment_size(&self) -> usize { self.fragmenter.max_fragment_size() }

    /// Override the reassembly timeout.
    #[must_use]
    pub const fn with_reassembly_timeout(mut self, timeout: Duration) -> Self {
        self.reassembly_timeout = timeout;
        self
    }

    /// Override the in-flight message bound.
    #[must_use]
    pub const fn with_max_in_flight(mut self, limit: NonZeroUsize) -> Self {
        self.max_in_flight = limit;
        self
    }

    /// Override the reassembled message size cap.
    #[must_use]
    pub const fn with_max_message_size(mut self, limit: NonZeroUsize) -> Self {
        self.max_message_size = limit;
        self
    }

    /// Override the eviction sweep period.
    #[must_use]
    pub const fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }
}

impl Default for FragmentationConfig {
    fn default() -> Self {
        Self {
            fragmenter: Fragmenter::default(),
            reassembly_timeout: DEFAULT_REASSEMBLY_TIMEOUT,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}
