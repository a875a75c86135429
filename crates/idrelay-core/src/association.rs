//! WiFi association
//!
//! [`associate`] starts the association and then polls until the link
//! reports connected, bounded by an [`AssociationPolicy`]. A start that fails
//! costs one poll and is tried again on the next one.

use core::fmt::Debug;

use embedded_hal_async::delay::DelayNs;
use log::{debug, info, warn};
use thiserror_no_std::Error;

use crate::app_state::message;
use crate::config::{AssociationPolicy, WifiConfig};

/// Live network reachability.
///
/// Queried before every network-dependent operation; implementations must
/// not cache the answer.
pub trait Connectivity {
    fn is_connected(&mut self) -> bool;
}

pub trait WifiLink: Connectivity {
    type Error: Debug;

    /// Start joining `ssid`. May return before the link is up, and is called
    /// again on a later poll when it fails.
    fn begin(
        &mut self,
        ssid: &str,
        password: &str,
    ) -> impl Future<Output = Result<(), Self::Error>>;
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssociationError {
    /// Every start attempt failed until the poll budget ran out.
    #[error("could not start association: {0}")]
    Begin(heapless::String<64>),
    #[error("not connected after {attempts} polls")]
    TimedOut { attempts: u32 },
}

/// Associate and wait for the link.
///
/// Returns the number of polls that found the link still down.
pub async fn associate<L, D>(
    link: &mut L,
    wifi: &WifiConfig<'_>,
    policy: &AssociationPolicy,
    delay: &mut D,
) -> Result<u32, AssociationError>
where
    L: WifiLink,
    D: DelayNs,
{
    info!("Associating with \"{}\"", wifi.ssid);
    let mut attempts: u32 = 0;
    let mut start_error = None;
    let mut started = false;

    loop {
        if !started {
            match link.begin(wifi.ssid, wifi.password).await {
                Ok(()) => {
                    started = true;
                    start_error = None;
                }
                Err(e) => {
                    warn!("Association start failed: {:?}", e);
                    start_error = Some(message(format_args!("{:?}", e)));
                }
            }
        }

        if started && link.is_connected() {
            info!("WiFi connected after {} polls", attempts);
            return Ok(attempts);
        }

        if let Some(max) = policy.max_attempts
            && attempts >= max
        {
            warn!("WiFi still down after {} polls, giving up", attempts);
            return Err(match start_error {
                Some(reason) => AssociationError::Begin(reason),
                None => AssociationError::TimedOut { attempts },
            });
        }

        delay.delay_ms(policy.poll_interval_ms).await;
        attempts = attempts.saturating_add(1);
        debug!("Waiting for WiFi ({} polls)", attempts);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockLink, RecordingDelay};
    use embassy_futures::block_on;

    #[test]
    fn waits_until_connected() {
        let mut link = MockLink::connecting_after(3);
        let mut delay = RecordingDelay::default();
        let polls = block_on(associate(
            &mut link,
            &WifiConfig::default(),
            &AssociationPolicy::default(),
            &mut delay,
        ))
        .unwrap();

        assert_eq!(polls, 3);
        assert_eq!(link.begun_with.as_deref(), Some("Wokwi-GUEST"));
        assert_eq!(delay.total_ms(), 900);
    }

    #[test]
    fn already_connected_does_not_sleep() {
        let mut link = MockLink::connected();
        let mut delay = RecordingDelay::default();
        let polls = block_on(associate(
            &mut link,
            &WifiConfig::default(),
            &AssociationPolicy::default(),
            &mut delay,
        ))
        .unwrap();
        assert_eq!(polls, 0);
        assert_eq!(delay.total_ms(), 0);
    }

    #[test]
    fn bounded_policy_gives_up() {
        let mut link = MockLink::never_connecting();
        let mut delay = RecordingDelay::default();
        let policy = AssociationPolicy {
            poll_interval_ms: 300,
            max_attempts: Some(5),
        };
        let err = block_on(associate(
            &mut link,
            &WifiConfig::default(),
            &policy,
            &mut delay,
        ))
        .unwrap_err();

        assert_eq!(err, AssociationError::TimedOut { attempts: 5 });
        assert_eq!(delay.total_ms(), 1_500);
        assert_eq!(link.status_queries, 6);
    }

    #[test]
    fn unbounded_policy_keeps_polling() {
        let mut link = MockLink::connecting_after(1_000);
        let mut delay = RecordingDelay::default();
        let polls = block_on(associate(
            &mut link,
            &WifiConfig::default(),
            &AssociationPolicy::unbounded(300),
            &mut delay,
        ))
        .unwrap();
        assert_eq!(polls, 1_000);
    }

    #[test]
    fn failed_start_is_retried_on_the_next_poll() {
        let mut link = MockLink::failing_first_begins(1);
        let mut delay = RecordingDelay::default();
        let polls = block_on(associate(
            &mut link,
            &WifiConfig::default(),
            &AssociationPolicy::unbounded(300),
            &mut delay,
        ))
        .unwrap();

        assert_eq!(polls, 1);
        assert_eq!(link.begin_calls, 2);
        assert_eq!(delay.total_ms(), 300);
    }

    #[test]
    fn failed_starts_use_up_the_poll_budget() {
        let mut link = MockLink::failing_begin();
        let mut delay = RecordingDelay::default();
        let policy = AssociationPolicy {
            poll_interval_ms: 300,
            max_attempts: Some(3),
        };
        let err = block_on(associate(
            &mut link,
            &WifiConfig::default(),
            &policy,
            &mut delay,
        ))
        .unwrap_err();

        assert_eq!(
            err,
            AssociationError::Begin(message(format_args!("{:?}", "radio not started")))
        );
        assert_eq!(link.begin_calls, 4);
        assert_eq!(link.status_queries, 0);
        assert_eq!(delay.total_ms(), 900);
    }
}
