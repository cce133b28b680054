use crate::engine::buffer::SampleBuffer;
use crate::engine::config::FeedConfig;
use crate::engine::renderer::{self, RENDER_INTERVAL};
use crate::engine::sampler::{self, PriceSource, SAMPLE_INTERVAL};
use crate::engine::term::Screen;
use crate::engine::types::Symbol;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Samples kept per session.
const BUFFER_CAPACITY: usize = 100;

/// Console input, reduced to what the state machine cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPress {
    Char(char),
    /// Backspace or enter.
    Back,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleState {
    Menu,
    Streaming,
}

/// What a key press did; the console loop maps this onto menu/prompt glue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Key had no effect.
    Ignored,
    /// Key had no effect in the menu; re-show the input prompt.
    Prompt,
    /// A chart session is now running, fresh or replaced.
    Streaming,
    /// Back in the menu; the caller redraws it.
    Menu,
    /// Shut down; any session is already cancelled and joined.
    Quit,
}

/// One running sampler/renderer pair. Tearing it down consumes the value, so
/// each cancel signal is sent exactly once per session.
struct Session {
    symbol: Symbol,
    buffer: SampleBuffer,
    cancel_sampler: watch::Sender<bool>,
    cancel_renderer: watch::Sender<bool>,
    sampler: JoinHandle<()>,
    renderer: JoinHandle<()>,
}

impl Session {
    fn spawn<S, W>(
        source: &S,
        screen: W,
        symbol: Symbol,
        sample_interval: Duration,
        render_interval: Duration,
    ) -> Self
    where
        S: PriceSource + Clone + 'static,
        W: Screen + 'static,
    {
        let buffer = SampleBuffer::new(BUFFER_CAPACITY);
        let (cancel_sampler, sampler_cancel) = watch::channel(false);
        let (cancel_renderer, renderer_cancel) = watch::channel(false);

        let sampler = tokio::spawn(sampler::run(
            source.clone(),
            symbol.clone(),
            buffer.clone(),
            sample_interval,
            sampler_cancel,
        ));
        let renderer = tokio::spawn(renderer::run(
            screen,
            symbol.clone(),
            buffer.clone(),
            render_interval,
            renderer_cancel,
        ));

        Self {
            symbol,
            buffer,
            cancel_sampler,
            cancel_renderer,
            sampler,
            renderer,
        }
    }

    /// Signal both tasks and block until each has fully stopped. Only after
    /// this returns may the buffer be discarded or a new pair started.
    async fn shutdown(self) {
        let _ = self.cancel_sampler.send(true);
        let _ = self.cancel_renderer.send(true);
        if let Err(err) = self.sampler.await {
            error!(symbol = %self.symbol, err = %err, "sampler task failed");
        }
        if let Err(err) = self.renderer.await {
            error!(symbol = %self.symbol, err = %err, "renderer task failed");
        }
    }
}

/// Owns the menu/streaming state machine and at most one live [`Session`].
pub struct Controller<S, W> {
    config: FeedConfig,
    source: S,
    screen: W,
    session: Option<Session>,
    sample_interval: Duration,
    render_interval: Duration,
}

impl<S, W> Controller<S, W>
where
    S: PriceSource + Clone + 'static,
    W: Screen + Clone + 'static,
{
    pub fn new(config: FeedConfig, source: S, screen: W) -> Self {
        Self {
            config,
            source,
            screen,
            session: None,
            sample_interval: SAMPLE_INTERVAL,
            render_interval: RENDER_INTERVAL,
        }
    }

    /// Override the one-second defaults, e.g. for fast-cadence tests.
    pub fn with_cadence(mut self, sample: Duration, render: Duration) -> Self {
        self.sample_interval = sample;
        self.render_interval = render;
        self
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    pub fn state(&self) -> ConsoleState {
        if self.session.is_some() {
            ConsoleState::Streaming
        } else {
            ConsoleState::Menu
        }
    }

    pub fn current_symbol(&self) -> Option<&Symbol> {
        self.session.as_ref().map(|s| &s.symbol)
    }

    /// Buffer of the live session, if any.
    pub fn active_buffer(&self) -> Option<&SampleBuffer> {
        self.session.as_ref().map(|s| &s.buffer)
    }

    /// Apply one key press. Every path that ends a session has joined both
    /// of its tasks by the time this returns.
    pub async fn handle_key(&mut self, key: KeyPress) -> Transition {
        match key {
            KeyPress::Char('q') => {
                self.stop_session().await;
                Transition::Quit
            }
            KeyPress::Char(c) => match self.selected_symbol(c) {
                Some(symbol) => {
                    self.start_session(symbol).await;
                    Transition::Streaming
                }
                None => self.ignored(),
            },
            KeyPress::Back => {
                if self.session.is_some() {
                    self.stop_session().await;
                    Transition::Menu
                } else {
                    Transition::Prompt
                }
            }
            KeyPress::Other => self.ignored(),
        }
    }

    /// Cancel and join any live session; safe to call when none is running.
    pub async fn shutdown(&mut self) {
        self.stop_session().await;
    }

    fn ignored(&self) -> Transition {
        match self.state() {
            ConsoleState::Menu => Transition::Prompt,
            ConsoleState::Streaming => Transition::Ignored,
        }
    }

    fn selected_symbol(&self, key: char) -> Option<Symbol> {
        let digit = key.to_digit(10)? as usize;
        if digit == 0 {
            return None;
        }
        self.config.symbol_at(digit - 1).cloned()
    }

    async fn start_session(&mut self, symbol: Symbol) {
        // Replacing a pair: the old one must be fully stopped before the new
        // buffer and tasks exist.
        self.stop_session().await;

        if let Err(err) = self.screen.clear() {
            warn!(err = %err, "screen clear failed");
        }
        info!(symbol = %symbol, "chart session started");
        self.session = Some(Session::spawn(
            &self.source,
            self.screen.clone(),
            symbol,
            self.sample_interval,
            self.render_interval,
        ));
    }

    async fn stop_session(&mut self) {
        if let Some(session) = self.session.take() {
            info!(symbol = %session.symbol, "chart session stopped");
            session.shutdown().await;
        }
    }
}
