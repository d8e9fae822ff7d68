//! Demo application and main event loop
//!
//! A small interactive screen exercising the logger: a counter logging through the
//! default logger, an `auth` section logging through a named logger that forwards to
//! the console, and a component that crashes inside an error boundary. The DevTools
//! panel is docked below (or above) the content.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use serde::Serialize;
use serde_json::Value;

use crate::boundary::ErrorBoundary;
use crate::config::Config;
use crate::logger::{CapturedError, Logger};
use crate::registry::LoggerOverrides;
use crate::scope;
use crate::tui::devtools::DevTools;
use crate::tui::{views, Tui};

/// Name of the demo's named logger
pub const AUTH_LOGGER: &str = "auth";

const CRASH_MESSAGE: &str = "This is a deliberate error to test the Error Boundary!";

/// Context attached to the demo's log calls
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppLogContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<&'static str>,
}

impl AppLogContext {
    fn counter(count: i64) -> Self {
        Self {
            count: Some(count),
            component: Some("Counter"),
            ..Default::default()
        }
    }

    fn user() -> Self {
        Self {
            user_id: Some("user_123"),
            ..Default::default()
        }
    }

    fn into_value(self) -> Option<Value> {
        serde_json::to_value(self).ok()
    }
}

/// Actions available on the demo screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoButton {
    Increment,
    Decrement,
    Warn,
    Error,
    Login,
    SessionWarning,
    AuthError,
    Crash,
    Recover,
    Download,
    Clear,
}

impl DemoButton {
    pub const ALL: [DemoButton; 11] = [
        DemoButton::Increment,
        DemoButton::Decrement,
        DemoButton::Warn,
        DemoButton::Error,
        DemoButton::Login,
        DemoButton::SessionWarning,
        DemoButton::AuthError,
        DemoButton::Crash,
        DemoButton::Recover,
        DemoButton::Download,
        DemoButton::Clear,
    ];

    pub fn key(&self) -> char {
        match self {
            DemoButton::Increment => '+',
            DemoButton::Decrement => '-',
            DemoButton::Warn => 'w',
            DemoButton::Error => 'e',
            DemoButton::Login => 'l',
            DemoButton::SessionWarning => 'x',
            DemoButton::AuthError => 'a',
            DemoButton::Crash => '!',
            DemoButton::Recover => 'r',
            DemoButton::Download => 'd',
            DemoButton::Clear => 'C',
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DemoButton::Increment => "Increment counter",
            DemoButton::Decrement => "Decrement counter",
            DemoButton::Warn => "Log warning",
            DemoButton::Error => "Log error",
            DemoButton::Login => "Auth: log in",
            DemoButton::SessionWarning => "Auth: session warning",
            DemoButton::AuthError => "Auth: token error",
            DemoButton::Crash => "Trigger crash (error boundary)",
            DemoButton::Recover => "Try again",
            DemoButton::Download => "Download logs",
            DemoButton::Clear => "Clear logs",
        }
    }

    pub fn from_key(c: char) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.key() == c)
    }
}

/// Demo application state
pub struct App {
    logger: Arc<Logger>,
    auth: Arc<Logger>,
    boundary: ErrorBoundary,
    devtools: DevTools,
    counter: i64,
    /// The crashing component's own state; reset when the boundary recovers
    should_throw: bool,
    crash_renders: u64,
    notice: Option<String>,
    pub should_quit: bool,
}

impl App {
    /// Build the demo from the logger scope of the current thread
    pub fn new(config: &Config) -> Result<Self> {
        let logger = scope::try_current::<Value>()?;
        let auth = scope::named::<Value>(
            AUTH_LOGGER,
            &LoggerOverrides::new().forward_to_console(true),
        )?;
        let boundary = ErrorBoundary::new(Arc::clone(&logger)).with_name("BuggyComponent");
        let mut devtools = DevTools::new(Arc::clone(&logger), config.devtools.clone());
        devtools.watch(Arc::clone(&auth));

        Ok(Self {
            logger,
            auth,
            boundary,
            devtools,
            counter: 0,
            should_throw: false,
            crash_renders: 0,
            notice: None,
            should_quit: false,
        })
    }

    pub fn devtools(&self) -> &DevTools {
        &self.devtools
    }

    pub fn boundary(&self) -> &ErrorBoundary {
        &self.boundary
    }

    pub fn counter(&self) -> i64 {
        self.counter
    }

    pub fn crash_renders(&self) -> u64 {
        self.crash_renders
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Run the application
    pub fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;

        tracing::info!("LogDumper demo started. Press Tab to open the panel, 'q' to quit.");

        let result = self.event_loop(&mut tui);

        // Exit TUI mode (also done in Drop, but explicit is clearer)
        tui.exit()?;

        result
    }

    fn event_loop(&mut self, tui: &mut Tui) -> Result<()> {
        let tick_rate = Duration::from_millis(50);

        loop {
            self.tick();
            tui.draw(|frame| views::render(frame, self))?;

            if event::poll(tick_rate)? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key);
                }
            }

            if self.should_quit {
                tracing::info!("Quitting");
                break;
            }
        }

        Ok(())
    }

    /// Advance one frame: render the crashing component and pull new entries into the panel
    pub fn tick(&mut self) {
        if !self.boundary.has_error() {
            let should_throw = self.should_throw;
            let rendered = scope::provide_with_boundary(&mut self.boundary, || {
                if should_throw {
                    panic!("{}", CRASH_MESSAGE);
                }
            });
            if rendered.is_ok() {
                self.crash_renders += 1;
            }
        }
        self.devtools.sync();
    }

    /// Dispatch a key press to the panel first, then to the demo
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        if self.devtools.handle_key(key) {
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char(c) => {
                if let Some(button) = DemoButton::from_key(c) {
                    self.press(button);
                }
            }
            _ => {}
        }
    }

    /// Perform a demo action
    pub fn press(&mut self, button: DemoButton) {
        self.notice = None;
        match button {
            DemoButton::Increment => {
                let context = AppLogContext::counter(self.counter);
                self.logger.log_debug(
                    "Increment button hover detected",
                    AppLogContext {
                        component: Some("Counter"),
                        ..Default::default()
                    }
                    .into_value(),
                    None,
                );
                self.logger
                    .log_action("Increment button clicked", context.into_value(), None);
                self.counter += 1;
            }
            DemoButton::Decrement => {
                let context = AppLogContext::counter(self.counter);
                self.logger.log_info("Decrement action", context.into_value(), None);
                self.counter -= 1;
            }
            DemoButton::Warn => {
                let context = AppLogContext {
                    count: Some(self.counter),
                    action: Some("warn-test"),
                    ..Default::default()
                };
                self.logger
                    .log_warn("This is a warning message", context.into_value(), None);
            }
            DemoButton::Error => {
                let context = AppLogContext {
                    count: Some(self.counter),
                    action: Some("error-test"),
                    ..Default::default()
                };
                let error = CapturedError::new("Demo error for testing!");
                self.logger.log_error(&error, context.into_value(), None);
            }
            DemoButton::Login => {
                let context = AppLogContext {
                    action: Some("login"),
                    ..AppLogContext::user()
                };
                self.auth.log_info("User logged in", context.into_value(), None);
            }
            DemoButton::SessionWarning => {
                self.auth
                    .log_warn("Session expiring soon", AppLogContext::user().into_value(), None);
            }
            DemoButton::AuthError => {
                let error = CapturedError::new("Auth token expired");
                self.auth
                    .log_error(&error, AppLogContext::user().into_value(), None);
            }
            DemoButton::Crash => self.should_throw = true,
            DemoButton::Recover => {
                if self.boundary.has_error() {
                    self.boundary.reset();
                    self.should_throw = false;
                }
            }
            DemoButton::Download => {
                self.notice = Some(match self.logger.download_log(None) {
                    Ok(path) => format!("Saved {}", path.display()),
                    Err(e) => format!("Download failed: {}", e),
                });
            }
            DemoButton::Clear => self.devtools.clear(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::{LogFilter, LogLevel, LogType, LoggerOptions};
    use crate::registry::LoggerRegistry;

    fn with_app(f: impl FnOnce(&mut App, &Arc<Logger>)) {
        let logger: Arc<Logger> =
            Arc::new(Logger::new(LoggerOptions::default().with_capture_metadata(false)));
        let registry = Arc::new(LoggerRegistry::new(Arc::clone(&logger)));
        scope::provide_registry(registry, || {
            let mut app = App::new(&Config::default()).unwrap();
            f(&mut app, &logger);
        });
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_new_requires_provider() {
        assert!(App::new(&Config::default()).is_err());
    }

    #[test]
    fn test_button_keys_are_unique() {
        for (i, a) in DemoButton::ALL.iter().enumerate() {
            for b in &DemoButton::ALL[i + 1..] {
                assert_ne!(a.key(), b.key());
            }
            assert_eq!(DemoButton::from_key(a.key()), Some(*a));
        }
    }

    #[test]
    fn test_increment_logs_debug_and_action() {
        with_app(|app, logger| {
            app.press(DemoButton::Increment);
            assert_eq!(app.counter(), 1);

            let entries = logger.all_entries();
            assert_eq!(entries.len(), 2);
            assert_eq!(entries[0].level, LogLevel::Debug);
            assert_eq!(entries[1].level, LogLevel::Info);
            assert_eq!(entries[1].message, "Increment button clicked");
            let context = entries[1].context.as_ref().unwrap();
            assert_eq!(context["count"], 0);
            assert_eq!(context["component"], "Counter");
        });
    }

    #[test]
    fn test_auth_logs_through_named_logger() {
        with_app(|app, logger| {
            app.press(DemoButton::Login);
            app.tick();

            // named loggers keep their own buffer
            assert!(logger.is_empty());
            let entries = app.auth.all_entries();
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].logger_name.as_deref(), Some(AUTH_LOGGER));
            assert_eq!(entries[0].context.as_ref().unwrap()["userId"], "user_123");
            assert!(app.auth.options().forward_to_console);

            // the panel shows them next to the root logger's entries
            app.press(DemoButton::Decrement);
            app.tick();
            let shown: Vec<_> = app
                .devtools()
                .logs()
                .iter()
                .map(|e| e.logger_name.clone())
                .collect();
            assert_eq!(shown, [Some(AUTH_LOGGER.to_string()), None]);
        });
    }

    #[test]
    fn test_crash_is_caught_and_recovers() {
        with_app(|app, logger| {
            app.tick();
            assert_eq!(app.crash_renders(), 1);

            app.press(DemoButton::Crash);
            app.tick();
            assert!(app.boundary().has_error());
            let text = app.boundary().fallback_text().unwrap();
            assert!(text.contains(CRASH_MESSAGE));

            let errors = logger.get_logs(&LogFilter::new().log_type(LogType::Error));
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].context.as_ref().unwrap()["errorBoundary"], true);

            app.press(DemoButton::Recover);
            app.tick();
            assert!(!app.boundary().has_error());
            assert_eq!(app.crash_renders(), 2);
        });
    }

    #[test]
    fn test_keys_reach_panel_before_demo() {
        with_app(|app, logger| {
            app.handle_key(press(KeyCode::Char('e')));
            app.tick();
            assert_eq!(app.devtools().error_count(), 1);

            // Collapsed panel: 'c' is not consumed and means nothing to the demo
            app.handle_key(press(KeyCode::Char('c')));
            assert_eq!(logger.len(), 1);

            app.handle_key(press(KeyCode::Tab));
            app.handle_key(press(KeyCode::Char('c')));
            assert!(logger.is_empty());
        });
    }

    #[test]
    fn test_clear_button_clears_logger_and_panel() {
        with_app(|app, logger| {
            app.press(DemoButton::Warn);
            app.tick();
            app.press(DemoButton::Clear);
            assert!(logger.is_empty());
            assert!(app.devtools().logs().is_empty());
        });
    }

    #[test]
    fn test_quit_keys() {
        with_app(|app, _| {
            app.handle_key(press(KeyCode::Char('q')));
            assert!(app.should_quit);
        });
        with_app(|app, _| {
            app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
            assert!(app.should_quit);
        });
    }
}
