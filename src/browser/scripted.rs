//! Scripted in-memory page driver for crawl driver tests.

use crate::browser::{CrawlError, PageDriver};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

/// A fake browser: a map of URL to page source, plus scripted click
/// outcomes. Each `(css, nth)` key holds a queue of navigation targets;
/// once the queue drains, further clicks report the control as absent.
pub struct ScriptedDriver {
    state: Mutex<ScriptedState>,
    goto_delay: Duration,
}

#[derive(Default)]
struct ScriptedState {
    pages: HashMap<String, String>,
    clicks: HashMap<(String, usize), VecDeque<String>>,
    history: Vec<String>,
    current: String,
    goto_count: u32,
    click_count: u32,
}

impl ScriptedDriver {
    pub fn new() -> Self {
        Self { state: Mutex::new(ScriptedState::default()), goto_delay: Duration::ZERO }
    }

    /// Makes every `goto` take this long, for budget tests.
    pub fn with_goto_delay(mut self, delay: Duration) -> Self {
        self.goto_delay = delay;
        self
    }

    /// Registers a page the driver can navigate to.
    pub fn page(self, url: &str, html: &str) -> Self {
        self.state.lock().unwrap().pages.insert(url.to_string(), html.to_string());
        self
    }

    /// Scripts the next click on `(css, nth)` to land on `target_url`.
    /// Repeated calls queue further outcomes for the same control.
    pub fn click_goes_to(self, css: &str, nth: usize, target_url: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .clicks
            .entry((css.to_string(), nth))
            .or_default()
            .push_back(target_url.to_string());
        self
    }

    pub fn goto_count(&self) -> u32 {
        self.state.lock().unwrap().goto_count
    }

    pub fn click_count(&self) -> u32 {
        self.state.lock().unwrap().click_count
    }

    fn navigate(state: &mut ScriptedState, url: &str) -> Result<(), CrawlError> {
        if !state.pages.contains_key(url) {
            return Err(CrawlError::Navigation(format!("no page scripted for {url}")));
        }
        if !state.current.is_empty() {
            let from = state.current.clone();
            state.history.push(from);
        }
        state.current = url.to_string();
        Ok(())
    }
}

#[async_trait]
impl PageDriver for ScriptedDriver {
    async fn goto(&self, url: &str) -> Result<(), CrawlError> {
        if !self.goto_delay.is_zero() {
            tokio::time::sleep(self.goto_delay).await;
        }
        let mut state = self.state.lock().unwrap();
        state.goto_count += 1;
        Self::navigate(&mut state, url)
    }

    async fn current_url(&self) -> Result<String, CrawlError> {
        Ok(self.state.lock().unwrap().current.clone())
    }

    async fn source(&self) -> Result<String, CrawlError> {
        let state = self.state.lock().unwrap();
        state
            .pages
            .get(&state.current)
            .cloned()
            .ok_or_else(|| CrawlError::Navigation(format!("no source for {}", state.current)))
    }

    async fn try_click(&self, css: &str, nth: usize) -> Result<bool, CrawlError> {
        let mut state = self.state.lock().unwrap();
        state.click_count += 1;
        let target = state
            .clicks
            .get_mut(&(css.to_string(), nth))
            .and_then(|queue| queue.pop_front());
        match target {
            Some(url) => {
                Self::navigate(&mut state, &url)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn back(&self) -> Result<(), CrawlError> {
        let mut state = self.state.lock().unwrap();
        let previous = state
            .history
            .pop()
            .ok_or_else(|| CrawlError::Navigation("no history to go back to".to_string()))?;
        state.current = previous;
        Ok(())
    }

    async fn screenshot_png(&self) -> Result<Vec<u8>, CrawlError> {
        // PNG magic bytes are enough for the writer
        Ok(vec![0x89, 0x50, 0x4E, 0x47])
    }
}
