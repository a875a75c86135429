//! Boot sequence and the serial poll loop

use core::fmt::Debug;

use embedded_hal_async::delay::DelayNs;
use log::{error, info, warn};

use crate::app_state::{AppError, AppRunState};
use crate::association::{WifiLink, associate};
use crate::config::Config;
use crate::console::{Console, FIRST_PROMPT, NEXT_PROMPT, say};
use crate::display::{CharacterDisplay, StatusScreen};
use crate::identifier::{Identifier, LineReader};
use crate::submit::Submitter;
use crate::transport::{HttpTransport, SubmissionResult};

/// How long "WiFi OK" stays on screen after boot.
const CONNECTED_HOLD_MS: u32 = 1_000;

/// What one [`App::poll`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// No complete, non-empty line was available.
    Idle,
    /// A line was read and handed to the submission routine. `None` means
    /// the network was down and nothing was sent.
    Submitted(Identifier, Option<SubmissionResult>),
}

fn report<E: Debug>(what: &str, result: Result<(), E>) {
    if let Err(e) = result {
        warn!("Display {} failed: {:?}", what, e);
    }
}

pub struct App<'a, C, D, L, T, W> {
    config: &'a Config<'a>,
    console: C,
    screen: StatusScreen<D>,
    link: L,
    submitter: Submitter<'a, T>,
    delay: W,
    reader: LineReader,
    run_state: AppRunState,
}

impl<'a, C, D, L, T, W> App<'a, C, D, L, T, W>
where
    C: Console,
    D: CharacterDisplay,
    L: WifiLink,
    T: HttpTransport,
    W: DelayNs,
{
    /// Wire the ports together. Fails only on an unusable Orion URL.
    pub fn new(
        config: &'a Config<'a>,
        console: C,
        display: D,
        link: L,
        transport: T,
        delay: W,
    ) -> Result<Self, AppError> {
        let endpoint = config.orion_endpoint()?;
        Ok(Self {
            config,
            console,
            screen: StatusScreen::new(display),
            link,
            submitter: Submitter::new(endpoint, transport),
            delay,
            reader: LineReader::new(),
            run_state: AppRunState::Uninitialized,
        })
    }

    pub fn run_state(&self) -> AppRunState {
        self.run_state
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    pub fn console_mut(&mut self) -> &mut C {
        &mut self.console
    }

    pub fn display(&self) -> &D {
        self.screen.display()
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    pub fn transport(&self) -> &T {
        self.submitter.transport()
    }

    /// Run once at startup: display, association, prompt.
    pub async fn boot(&mut self) -> Result<(), AppError> {
        self.run_state = AppRunState::Booting;
        info!(
            "Booting, serial at {} baud, Orion at {}",
            self.config.serial.baud_rate, self.config.orion.url
        );

        report("power on", self.screen.power_on().await);
        report("boot screen", self.screen.show_booting().await);

        self.run_state = AppRunState::WifiConnecting;
        report("association screen", self.screen.show_associating().await);

        if let Err(e) = associate(
            &mut self.link,
            &self.config.wifi,
            &self.config.association,
            &mut self.delay,
        )
        .await
        {
            error!("Association failed: {}", e);
            self.run_state = AppRunState::WifiFailed;
            report(
                "failure screen",
                self.screen
                    .show_association_failed(self.config.wifi.ssid)
                    .await,
            );
            return Err(e.into());
        }

        self.run_state = AppRunState::WifiConnected;
        report("connected screen", self.screen.show_connected().await);
        self.delay.delay_ms(CONNECTED_HOLD_MS).await;
        report("clear", self.screen.clear().await);

        say(&mut self.console, FIRST_PROMPT);
        Ok(())
    }

    /// One loop iteration. Never waits for input.
    pub async fn poll(&mut self) -> PollOutcome {
        let Some(identifier) = self.next_line() else {
            return PollOutcome::Idle;
        };

        info!("Received ID \"{}\"", identifier);
        report("sending screen", self.screen.show_sending(&identifier).await);

        let result = self
            .submitter
            .submit(&identifier, &mut self.link, &mut self.console)
            .await;

        say(&mut self.console, NEXT_PROMPT);
        PollOutcome::Submitted(identifier, result)
    }

    /// Poll forever, pausing `serial.poll_interval_ms` between iterations.
    pub async fn run(&mut self) -> ! {
        loop {
            self.poll().await;
            self.delay
                .delay_ms(self.config.serial.poll_interval_ms)
                .await;
        }
    }

    /// Drain pending serial bytes until a non-empty line completes.
    fn next_line(&mut self) -> Option<Identifier> {
        let mut byte = [0u8; 1];
        loop {
            match self.console.read_available(&mut byte) {
                Ok(0) => return None,
                Ok(_) => {
                    if let Some(identifier) = self.reader.push(byte[0]) {
                        return Some(identifier);
                    }
                }
                Err(e) => {
                    warn!("Serial read failed: {:?}", e);
                    return None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AssociationPolicy;
    use crate::display::SENDING_LABEL;
    use crate::submit::{FAILURE_MESSAGE, NOT_CONNECTED_MESSAGE};
    use crate::testing::{MockConsole, MockDisplay, MockLink, MockTransport, RecordingDelay};
    use crate::transport::TransportError;
    use embassy_futures::block_on;

    type TestApp<'a> = App<'a, MockConsole, MockDisplay, MockLink, MockTransport, RecordingDelay>;

    fn app<'a>(config: &'a Config<'a>, link: MockLink, transport: MockTransport) -> TestApp<'a> {
        App::new(
            config,
            MockConsole::default(),
            MockDisplay::new(16, 2),
            link,
            transport,
            RecordingDelay::default(),
        )
        .unwrap()
    }

    fn booted<'a>(config: &'a Config<'a>, transport: MockTransport) -> TestApp<'a> {
        let mut app = app(config, MockLink::connecting_after(2), transport);
        block_on(app.boot()).unwrap();
        app
    }

    #[test]
    fn boot_sequence() {
        let config = Config::default();
        let mut app = app(&config, MockLink::connecting_after(2), MockTransport::replying(204, ""));
        assert_eq!(app.run_state(), AppRunState::Uninitialized);

        block_on(app.boot()).unwrap();

        assert_eq!(app.run_state(), AppRunState::WifiConnected);
        assert!(app.display().backlight);
        assert!(app.display().is_blank());
        assert_eq!(app.console().lines, [FIRST_PROMPT]);
        // 2 association polls at 300 ms, then the 1 s confirmation hold
        assert_eq!(app.delay.total_ms(), 1_600);
    }

    #[test]
    fn boot_gives_up_with_bounded_policy() {
        let mut config = Config::default();
        config.association = AssociationPolicy {
            poll_interval_ms: 300,
            max_attempts: Some(3),
        };
        let mut app = app(&config, MockLink::never_connecting(), MockTransport::replying(204, ""));

        let err = block_on(app.boot()).unwrap_err();
        assert!(matches!(err, AppError::Association(_)));
        assert_eq!(app.run_state(), AppRunState::WifiFailed);
        assert_eq!(app.display().row(0), "WiFi failed");
        assert_eq!(app.display().row(1), "Wokwi-GUEST");
        assert!(app.console().lines.is_empty());
    }

    #[test]
    fn invalid_url_is_rejected_up_front() {
        let mut config = Config::default();
        config.orion.url = "orion:1026";
        let result = App::new(
            &config,
            MockConsole::default(),
            MockDisplay::new(16, 2),
            MockLink::connected(),
            MockTransport::replying(204, ""),
            RecordingDelay::default(),
        );
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn idle_without_input() {
        let config = Config::default();
        let mut app = booted(&config, MockTransport::replying(204, ""));
        assert_eq!(block_on(app.poll()), PollOutcome::Idle);
        assert!(app.transport().requests.is_empty());
    }

    #[test]
    fn line_is_displayed_and_submitted() {
        let config = Config::default();
        let mut app = booted(&config, MockTransport::replying(204, ""));
        app.console_mut().type_text("12345\n");

        let outcome = block_on(app.poll());
        let PollOutcome::Submitted(id, Some(result)) = outcome else {
            panic!("expected a submission, got {outcome:?}");
        };
        assert_eq!(id.as_str(), "12345");
        assert_eq!(result.status, 204);

        assert_eq!(app.display().row(0), SENDING_LABEL);
        assert_eq!(app.display().row(1), "12345");
        assert_eq!(app.transport().requests.len(), 1);
        assert_eq!(
            app.console().lines,
            [FIRST_PROMPT, "Status Orion: 204", "", NEXT_PROMPT]
        );
    }

    #[test]
    fn blank_lines_do_nothing() {
        let config = Config::default();
        let mut app = booted(&config, MockTransport::replying(204, ""));
        let clears_after_boot = app.display().clears;
        app.console_mut().type_text("\n \r\n\t\n");

        assert_eq!(block_on(app.poll()), PollOutcome::Idle);
        assert_eq!(app.display().clears, clears_after_boot);
        assert!(app.display().is_blank());
        assert!(app.transport().requests.is_empty());
        assert_eq!(app.console().lines, [FIRST_PROMPT]);
    }

    #[test]
    fn one_line_per_poll() {
        let config = Config::default();
        let mut app = booted(&config, MockTransport::replying(204, ""));
        app.console_mut().type_text("a\nb\n");

        assert!(matches!(block_on(app.poll()), PollOutcome::Submitted(ref id, _) if id.as_str() == "a"));
        assert_eq!(app.transport().requests.len(), 1);
        assert!(matches!(block_on(app.poll()), PollOutcome::Submitted(ref id, _) if id.as_str() == "b"));
        assert_eq!(app.transport().requests.len(), 2);
        assert_eq!(block_on(app.poll()), PollOutcome::Idle);
    }

    #[test]
    fn partial_line_waits_for_terminator() {
        let config = Config::default();
        let mut app = booted(&config, MockTransport::replying(204, ""));
        app.console_mut().type_text("99");
        assert_eq!(block_on(app.poll()), PollOutcome::Idle);
        app.console_mut().type_text("999\r\n");
        assert!(matches!(block_on(app.poll()), PollOutcome::Submitted(ref id, _) if id.as_str() == "99999"));
    }

    #[test]
    fn dropped_link_after_boot_skips_request() {
        let config = Config::default();
        let mut app = booted(&config, MockTransport::replying(204, ""));
        app.link_mut().drop_link();
        app.console_mut().type_text("12345\n");

        let outcome = block_on(app.poll());
        assert!(matches!(outcome, PollOutcome::Submitted(_, None)));
        assert!(app.transport().requests.is_empty());
        assert_eq!(app.display().row(1), "12345");
        assert_eq!(
            app.console().lines,
            [FIRST_PROMPT, NOT_CONNECTED_MESSAGE, NEXT_PROMPT]
        );
    }

    #[test]
    fn transport_failure_is_reported_and_loop_continues() {
        let config = Config::default();
        let mut app = booted(&config, MockTransport::failing(TransportError::ReadTimeout));
        app.console_mut().type_text("1\n2\n");

        block_on(app.poll());
        block_on(app.poll());
        assert_eq!(
            app.console().lines,
            [
                FIRST_PROMPT,
                "Status Orion: -11",
                FAILURE_MESSAGE,
                NEXT_PROMPT,
                "Status Orion: -11",
                FAILURE_MESSAGE,
                NEXT_PROMPT,
            ]
        );
        assert_eq!(app.display().row(1), "2");
    }
}
