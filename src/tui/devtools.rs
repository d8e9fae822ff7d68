//! DevTools panel state and input handling
//!
//! The panel keeps its own snapshot of the loggers it watches: each is read once
//! through `get_logs()` and then kept current through a subscription. Level filtering
//! and text search run over that snapshot only.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

use crate::config::DevToolsConfig;
use crate::logger::{search_matches, LogEntry, LogFilter, LogLevel, Logger, Subscription};

/// Rows moved by PageUp/PageDown
const PAGE_SIZE: usize = 20;

/// Level filter of the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LevelFilter {
    #[default]
    All,
    Only(LogLevel),
}

impl LevelFilter {
    /// Cycle All -> debug -> info -> warn -> error -> All
    pub fn next(self) -> Self {
        match self {
            LevelFilter::All => LevelFilter::Only(LogLevel::Debug),
            LevelFilter::Only(LogLevel::Debug) => LevelFilter::Only(LogLevel::Info),
            LevelFilter::Only(LogLevel::Info) => LevelFilter::Only(LogLevel::Warn),
            LevelFilter::Only(LogLevel::Warn) => LevelFilter::Only(LogLevel::Error),
            LevelFilter::Only(LogLevel::Error) => LevelFilter::All,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LevelFilter::All => "all",
            LevelFilter::Only(level) => level.as_str(),
        }
    }

    fn accepts(&self, level: LogLevel) -> bool {
        match self {
            LevelFilter::All => true,
            LevelFilter::Only(only) => *only == level,
        }
    }
}

/// Live inspector over one or more loggers
///
/// The first logger is the primary one: downloads export its buffer. Clearing clears
/// every watched logger.
pub struct DevTools {
    /// Watched loggers, primary first
    sources: Vec<(Arc<Logger>, Subscription)>,
    outgoing: Sender<LogEntry>,
    incoming: Receiver<LogEntry>,
    logs: Vec<LogEntry>,
    level_filter: LevelFilter,
    search: String,
    searching: bool,
    expanded: HashSet<String>,
    collapsed: bool,
    /// Index into the visible (filtered) rows
    selected: usize,
    /// Keep the selection on the newest row
    auto_scroll: bool,
    /// Result of the last clear/download, shown in the footer
    status: Option<String>,
    /// Overrides the downloads directory
    download_dir: Option<PathBuf>,
    config: DevToolsConfig,
}

impl DevTools {
    /// Populate from the logger's current entries and subscribe for new ones
    pub fn new(logger: Arc<Logger>, config: DevToolsConfig) -> Self {
        let (tx, rx) = mpsc::channel::<LogEntry>();
        let mut devtools = Self {
            sources: Vec::new(),
            outgoing: tx,
            incoming: rx,
            logs: Vec::new(),
            level_filter: LevelFilter::All,
            search: String::new(),
            searching: false,
            expanded: HashSet::new(),
            collapsed: config.default_collapsed,
            selected: 0,
            auto_scroll: true,
            status: None,
            download_dir: None,
            config,
        };
        devtools.watch(logger);
        devtools
    }

    /// Also show the entries of `logger`, merged by timestamp
    ///
    /// Watching a logger twice is a no-op.
    pub fn watch(&mut self, logger: Arc<Logger>) {
        if self.is_watching(&logger) {
            return;
        }

        let tx: Mutex<Sender<LogEntry>> = Mutex::new(self.outgoing.clone());
        let subscription = logger.subscribe(move |entry: &LogEntry| {
            if let Ok(tx) = tx.lock() {
                let _ = tx.send(entry.clone());
            }
        });

        // Deliveries queued so far predate the snapshot below
        self.sync();
        self.logs.extend(logger.get_logs(&LogFilter::new()));
        self.logs.sort_by_key(|entry| entry.timestamp);
        self.sources.push((logger, subscription));
        if self.auto_scroll {
            self.selected = self.visible().len().saturating_sub(1);
        }
    }

    pub fn is_watching(&self, logger: &Arc<Logger>) -> bool {
        self.sources.iter().any(|(watched, _)| Arc::ptr_eq(watched, logger))
    }

    /// Combined bound of the watched loggers, `None` when any is unbounded
    fn bound(&self) -> Option<usize> {
        self.sources
            .iter()
            .map(|(logger, _)| logger.options().bound())
            .sum()
    }

    /// Write downloads into `dir` instead of the user's downloads directory
    pub fn with_download_dir(mut self, dir: PathBuf) -> Self {
        self.download_dir = Some(dir);
        self
    }

    /// Pull entries delivered since the last call. Returns how many arrived.
    pub fn sync(&mut self) -> usize {
        let mut received = 0;
        while let Ok(entry) = self.incoming.try_recv() {
            self.logs.push(entry);
            received += 1;
        }

        if let Some(max) = self.bound() {
            if self.logs.len() > max {
                let excess = self.logs.len() - max;
                for dropped in self.logs.drain(..excess) {
                    self.expanded.remove(&dropped.id);
                }
            }
        }

        if self.auto_scroll {
            self.selected = self.visible().len().saturating_sub(1);
        }
        received
    }

    /// Entries passing the level filter and the search, in insertion order
    pub fn visible(&self) -> Vec<&LogEntry> {
        let needle = self.search.to_lowercase();
        self.logs
            .iter()
            .filter(|entry| self.level_filter.accepts(entry.level))
            .filter(|entry| needle.is_empty() || search_matches(entry, &needle))
            .collect()
    }

    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    pub fn error_count(&self) -> usize {
        self.logs.iter().filter(|l| l.level == LogLevel::Error).count()
    }

    pub fn warn_count(&self) -> usize {
        self.logs.iter().filter(|l| l.level == LogLevel::Warn).count()
    }

    pub fn level_filter(&self) -> LevelFilter {
        self.level_filter
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn is_searching(&self) -> bool {
        self.searching
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.contains(id)
    }

    pub fn auto_scroll(&self) -> bool {
        self.auto_scroll
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn config(&self) -> &DevToolsConfig {
        &self.config
    }

    /// Selected row, clamped to the visible rows
    pub fn selected(&self) -> usize {
        self.selected.min(self.visible().len().saturating_sub(1))
    }

    pub fn toggle_collapsed(&mut self) {
        self.collapsed = !self.collapsed;
    }

    pub fn set_level_filter(&mut self, filter: LevelFilter) {
        self.level_filter = filter;
        self.selected = 0;
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
        self.selected = 0;
    }

    /// Expand or collapse the details of the selected row
    pub fn toggle_selected(&mut self) {
        let selected = self.selected();
        let id = match self.visible().get(selected) {
            Some(entry) if entry.has_details() => entry.id.clone(),
            _ => return,
        };
        if !self.expanded.remove(&id) {
            self.expanded.insert(id);
        }
    }

    /// Clear the watched loggers and the panel's own state
    pub fn clear(&mut self) {
        for (logger, _) in &self.sources {
            logger.clear_logs();
        }
        // Entries delivered before the clear must not reappear
        while self.incoming.try_recv().is_ok() {}
        self.logs.clear();
        self.expanded.clear();
        self.selected = 0;
        self.auto_scroll = true;
        self.status = Some("Logs cleared".to_string());
    }

    /// Export the primary logger's buffer
    pub fn download(&mut self) {
        let Some((logger, _)) = self.sources.first() else {
            return;
        };
        let result = match &self.download_dir {
            Some(dir) => logger.download_log_to(dir, None),
            None => logger.download_log(None),
        };
        self.status = Some(match result {
            Ok(path) => format!("Saved {}", path.display()),
            Err(e) => format!("Download failed: {}", e),
        });
    }

    fn move_selection(&mut self, delta: isize) {
        let last = self.visible().len().saturating_sub(1);
        let current = self.selected() as isize;
        let next = (current + delta).clamp(0, last as isize) as usize;
        self.selected = next;
        self.auto_scroll = next == last && delta > 0;
    }

    /// Handle a key press. Returns true when the panel consumed the key.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        // Only process key press events (not release/repeat)
        if key.kind != KeyEventKind::Press {
            return false;
        }
        self.status = None;

        if self.searching {
            match key.code {
                KeyCode::Char(c) => {
                    self.search.push(c);
                    self.selected = 0;
                }
                KeyCode::Backspace => {
                    self.search.pop();
                }
                KeyCode::Enter => self.searching = false,
                KeyCode::Esc => {
                    self.searching = false;
                    self.search.clear();
                }
                _ => {}
            }
            return true;
        }

        if key.code == KeyCode::Tab {
            self.toggle_collapsed();
            return true;
        }
        if self.collapsed {
            return false;
        }

        match key.code {
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
            KeyCode::PageDown => self.move_selection(PAGE_SIZE as isize),
            KeyCode::PageUp => self.move_selection(-(PAGE_SIZE as isize)),
            KeyCode::Char('g') => {
                // Jump to top (disable auto-scroll)
                self.auto_scroll = false;
                self.selected = 0;
            }
            KeyCode::Char('G') => {
                // Jump to bottom and enable auto-scroll
                self.auto_scroll = true;
                self.selected = self.visible().len().saturating_sub(1);
            }
            KeyCode::Enter => self.toggle_selected(),
            KeyCode::Char('f') => self.set_level_filter(self.level_filter.next()),
            KeyCode::Char('/') => self.searching = true,
            KeyCode::Char('c') => self.clear(),
            KeyCode::Char('s') => self.download(),
            KeyCode::Esc => self.collapsed = true,
            _ => return false,
        }
        true
    }
}

impl Drop for DevTools {
    fn drop(&mut self) {
        for (_, subscription) in &self.sources {
            subscription.unsubscribe();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::{CapturedError, LoggerOptions};
    use crossterm::event::KeyModifiers;
    use serde_json::json;
    use tempfile::TempDir;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn expanded_config() -> DevToolsConfig {
        DevToolsConfig {
            default_collapsed: false,
            ..Default::default()
        }
    }

    fn setup() -> (Arc<Logger>, DevTools) {
        let logger: Arc<Logger> = Arc::new(Logger::default());
        let devtools = DevTools::new(Arc::clone(&logger), expanded_config());
        (logger, devtools)
    }

    #[test]
    fn test_initial_population_and_live_updates() {
        let logger: Arc<Logger> = Arc::new(Logger::default());
        logger.log_info("before", None, None);

        let mut devtools = DevTools::new(Arc::clone(&logger), expanded_config());
        assert_eq!(devtools.logs().len(), 1);

        logger.log_warn("after", None, None);
        assert_eq!(devtools.sync(), 1);
        assert_eq!(devtools.logs().len(), 2);
        assert_eq!(devtools.warn_count(), 1);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let (logger, devtools) = setup();
        assert_eq!(logger.subscriber_count(), 1);
        drop(devtools);
        assert_eq!(logger.subscriber_count(), 0);
    }

    #[test]
    fn test_level_filter_cycle() {
        let mut filter = LevelFilter::All;
        let mut labels = Vec::new();
        for _ in 0..5 {
            filter = filter.next();
            labels.push(filter.label());
        }
        assert_eq!(labels, ["debug", "info", "warn", "error", "all"]);
    }

    #[test]
    fn test_filter_and_search() {
        let (logger, mut devtools) = setup();
        logger.log_info("User logged in", None, None);
        logger.log_warn("Session expiring", Some(json!({ "userId": "u1" })), None);
        logger.log_error(&CapturedError::new("Auth failed"), None, None);
        devtools.sync();

        devtools.set_level_filter(LevelFilter::Only(LogLevel::Warn));
        let visible: Vec<_> = devtools.visible().iter().map(|e| e.message.clone()).collect();
        assert_eq!(visible, ["Session expiring"]);

        devtools.set_level_filter(LevelFilter::All);
        devtools.set_search("USER");
        assert_eq!(devtools.visible().len(), 2);
        assert_eq!(devtools.error_count(), 1);
    }

    #[test]
    fn test_search_mode_keys() {
        let (logger, mut devtools) = setup();
        logger.log_info("alpha", None, None);
        logger.log_info("beta", None, None);
        devtools.sync();

        assert!(devtools.handle_key(press(KeyCode::Char('/'))));
        assert!(devtools.is_searching());
        for c in "bet".chars() {
            devtools.handle_key(press(KeyCode::Char(c)));
        }
        assert_eq!(devtools.search(), "bet");
        assert_eq!(devtools.visible().len(), 1);

        devtools.handle_key(press(KeyCode::Esc));
        assert!(!devtools.is_searching());
        assert_eq!(devtools.search(), "");
        assert_eq!(devtools.visible().len(), 2);
    }

    #[test]
    fn test_clear_empties_logger_and_panel() {
        let (logger, mut devtools) = setup();
        logger.log_info("a", None, None);
        devtools.sync();
        logger.log_info("pending", None, None);

        devtools.handle_key(press(KeyCode::Char('c')));
        assert!(logger.is_empty());
        assert!(devtools.logs().is_empty());
        assert_eq!(devtools.sync(), 0);
        assert_eq!(devtools.status(), Some("Logs cleared"));
    }

    #[test]
    fn test_download_writes_dump() {
        let temp_dir = TempDir::new().unwrap();
        let (logger, devtools) = setup();
        let mut devtools = devtools.with_download_dir(temp_dir.path().to_path_buf());
        logger.log_info("exported", None, None);

        devtools.handle_key(press(KeyCode::Char('s')));
        assert!(temp_dir.path().join("log-dump.json").exists());
        assert!(devtools.status().unwrap().starts_with("Saved"));
    }

    #[test]
    fn test_toggle_expanded_requires_details() {
        let logger: Arc<Logger> =
            Arc::new(Logger::new(LoggerOptions::default().with_capture_metadata(false)));
        let mut devtools = DevTools::new(Arc::clone(&logger), expanded_config());
        logger.log_info("plain", None, None);
        logger.log_info("detailed", Some(json!({ "k": "v" })), None);
        devtools.sync();

        devtools.handle_key(press(KeyCode::Char('g')));
        devtools.handle_key(press(KeyCode::Enter));
        let plain_id = devtools.logs()[0].id.clone();
        assert!(!devtools.is_expanded(&plain_id));

        devtools.handle_key(press(KeyCode::Char('j')));
        devtools.handle_key(press(KeyCode::Enter));
        let detailed_id = devtools.logs()[1].id.clone();
        assert!(devtools.is_expanded(&detailed_id));

        devtools.handle_key(press(KeyCode::Enter));
        assert!(!devtools.is_expanded(&detailed_id));
    }

    #[test]
    fn test_navigation_and_auto_scroll() {
        let (logger, mut devtools) = setup();
        for i in 0..5 {
            logger.log_info(format!("msg {}", i), None, None);
        }
        devtools.sync();
        assert_eq!(devtools.selected(), 4);

        devtools.handle_key(press(KeyCode::Char('k')));
        assert_eq!(devtools.selected(), 3);
        assert!(!devtools.auto_scroll());

        logger.log_info("new", None, None);
        devtools.sync();
        assert_eq!(devtools.selected(), 3);

        devtools.handle_key(press(KeyCode::Char('G')));
        assert_eq!(devtools.selected(), 5);
        assert!(devtools.auto_scroll());
    }

    #[test]
    fn test_collapsed_panel_ignores_keys() {
        let logger: Arc<Logger> = Arc::new(Logger::default());
        let mut devtools = DevTools::new(Arc::clone(&logger), DevToolsConfig::default());
        assert!(devtools.is_collapsed());

        assert!(!devtools.handle_key(press(KeyCode::Char('c'))));
        assert!(devtools.handle_key(press(KeyCode::Tab)));
        assert!(!devtools.is_collapsed());
    }

    #[test]
    fn test_panel_respects_logger_bound() {
        let logger: Arc<Logger> =
            Arc::new(Logger::new(LoggerOptions::default().with_max_entries(2)));
        let mut devtools = DevTools::new(Arc::clone(&logger), expanded_config());
        for message in ["a", "b", "c"] {
            logger.log_info(message, None, None);
        }
        devtools.sync();

        let messages: Vec<_> = devtools.logs().iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, ["b", "c"]);
    }

    #[test]
    fn test_watches_several_loggers() {
        let (root, mut devtools) = setup();
        let auth: Arc<Logger> =
            Arc::new(Logger::new(LoggerOptions::default().with_name("auth")));
        root.log_info("root first", None, None);
        auth.log_info("auth earlier", None, None);

        devtools.watch(Arc::clone(&auth));
        devtools.watch(Arc::clone(&auth));
        assert_eq!(auth.subscriber_count(), 1);
        assert_eq!(devtools.logs().len(), 2);

        auth.log_warn("Token expired", None, None);
        root.log_info("root later", None, None);
        devtools.sync();
        let messages: Vec<_> = devtools.logs().iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages[2..], ["Token expired", "root later"]);
        assert_eq!(devtools.logs()[2].logger_name.as_deref(), Some("auth"));

        devtools.clear();
        assert!(root.is_empty());
        assert!(auth.is_empty());

        drop(devtools);
        assert_eq!(root.subscriber_count(), 0);
        assert_eq!(auth.subscriber_count(), 0);
    }
}
