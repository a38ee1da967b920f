//! Streaming verification: checking a response while it is still being generated.
//!
//! A `VerifyStream` wraps a source of text chunks (typically an LLM token
//! stream) and is itself an iterator of `StreamUnit`s. It is pull-driven:
//! nothing happens until the caller asks for the next unit, and each call to
//! `next()` pulls at most one chunk from the source.
//!
//! Per pulled chunk:
//!
//! 1. Append the chunk to the accumulated response text.
//! 2. Add the chunk's whitespace-delimited token count to the counter.
//! 3. Counter below the interval → emit `Pending` with the chunk text.
//! 4. Otherwise verify the **whole accumulated text** against the context.
//!    A cross-chunk contradiction is only visible with everything said so
//!    far, so checks never look at the new chunk alone.
//!    - not blocked → emit `Checked`, reset the counter to zero
//!    - blocked → emit one `Blocked` unit and end the session
//!
//! The session ends in one of three terminal states: `Blocked`, `Exhausted`
//! (source ran dry), or `Failed` (a check returned an error, yielded as the
//! `Err` item). The chunk source is dropped on entering any terminal state,
//! so no chunk can be pulled and no check can run after the session ends.
//!
//! # Unverified remainder
//!
//! When the source runs dry, tokens counted since the last check are never
//! verified: no final check is forced on a sub-threshold remainder. Callers
//! that need full coverage must verify [`VerifyStream::accumulated`]
//! themselves once the stream ends; [`VerifyStream::unverified_tokens`]
//! reports how many tokens that remainder holds.

use std::iter::FusedIterator;

use tracing::{debug, info, warn};

use tensalis_contracts::{
    context::Context,
    error::{TensalisError, TensalisResult},
    stream::StreamUnit,
};

use crate::verifier::{validate_context, Verifier};

/// Where a streaming session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Chunks are still being pulled.
    Streaming,
    /// A check came back blocked. The last emitted unit was `Blocked`.
    Blocked,
    /// The chunk source ran dry without a block.
    Exhausted,
    /// A check returned an error, which was yielded as the last item.
    Failed,
}

/// Count whitespace-delimited tokens in a chunk.
pub fn count_tokens(chunk: &str) -> usize {
    chunk.split_whitespace().count()
}

/// A lazy, single-pass streaming verification session.
///
/// Created by [`Verifier::verify_stream`]. Each session owns its own
/// accumulation state; it is driven by exactly one consumer and cannot be
/// rewound. Dropping the stream at any point releases the chunk source and
/// stops all further verification.
pub struct VerifyStream<'v, I> {
    verifier: &'v Verifier,
    /// `None` once the session reaches a terminal state.
    chunks: Option<I>,
    context: Context,
    check_interval: usize,
    accumulated: String,
    tokens_since_check: usize,
    checks: usize,
    state: SessionState,
}

impl<'v, I> VerifyStream<'v, I>
where
    I: Iterator,
    I::Item: AsRef<str>,
{
    pub(crate) fn new(
        verifier: &'v Verifier,
        chunks: I,
        context: Context,
        check_interval: usize,
    ) -> TensalisResult<Self> {
        validate_context("context", &context)?;
        if check_interval == 0 {
            return Err(TensalisError::validation(
                "check_interval",
                "check interval must be at least one token",
            ));
        }

        debug!(
            check_interval,
            passages = context.len(),
            "streaming verification session started"
        );

        Ok(Self {
            verifier,
            chunks: Some(chunks),
            context,
            check_interval,
            accumulated: String::new(),
            tokens_since_check: 0,
            checks: 0,
            state: SessionState::Streaming,
        })
    }

    /// Run a check over everything accumulated so far.
    fn check(&mut self, text: String) -> TensalisResult<StreamUnit> {
        debug!(
            check = self.checks + 1,
            tokens_since_check = self.tokens_since_check,
            accumulated_chars = self.accumulated.len(),
            "check interval reached, verifying accumulated text"
        );

        let verdict = match self
            .verifier
            .verify_against(&self.accumulated, &self.context, None)
        {
            Ok(verdict) => verdict,
            Err(e) => {
                warn!(error = %e, checks = self.checks, "verification failed mid-stream, ending session");
                self.finish(SessionState::Failed);
                return Err(e);
            }
        };
        self.checks += 1;

        if verdict.is_blocked() {
            warn!(
                checks = self.checks,
                accumulated_chars = self.accumulated.len(),
                "stream blocked, no further chunks will be pulled"
            );
            self.finish(SessionState::Blocked);
            return Ok(StreamUnit::Blocked { verdict });
        }

        self.tokens_since_check = 0;
        Ok(StreamUnit::Checked { text, verdict })
    }

    fn finish(&mut self, state: SessionState) {
        self.state = state;
        self.chunks = None;
    }
}

impl<I> VerifyStream<'_, I> {
    /// The full response text pulled so far, including the chunk that
    /// triggered a block or a failed check. Neither of those chunks is
    /// yielded as text.
    pub fn accumulated(&self) -> &str {
        &self.accumulated
    }

    /// Tokens counted since the last successful check.
    pub fn tokens_since_check(&self) -> usize {
        self.tokens_since_check
    }

    /// Tokens at the tail of the accumulated text that no check has covered.
    ///
    /// After an `Exhausted` session this is the unverified remainder.
    pub fn unverified_tokens(&self) -> usize {
        match self.state {
            SessionState::Blocked => 0,
            _ => self.tokens_since_check,
        }
    }

    /// Number of checks that returned a verdict.
    pub fn checks_performed(&self) -> usize {
        self.checks
    }

    pub fn check_interval(&self) -> usize {
        self.check_interval
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state != SessionState::Streaming
    }
}

impl<I> Iterator for VerifyStream<'_, I>
where
    I: Iterator,
    I::Item: AsRef<str>,
{
    type Item = TensalisResult<StreamUnit>;

    fn next(&mut self) -> Option<Self::Item> {
        let chunks = self.chunks.as_mut()?;

        let Some(chunk) = chunks.next() else {
            info!(
                checks = self.checks,
                unverified_tokens = self.tokens_since_check,
                "chunk source exhausted"
            );
            self.finish(SessionState::Exhausted);
            return None;
        };

        let text = chunk.as_ref().to_owned();
        self.accumulated.push_str(&text);
        self.tokens_since_check += count_tokens(&text);

        if self.tokens_since_check < self.check_interval {
            return Some(Ok(StreamUnit::Pending { text }));
        }

        Some(self.check(text))
    }
}

impl<I> FusedIterator for VerifyStream<'_, I>
where
    I: Iterator,
    I::Item: AsRef<str>,
{
}

// ── Tests ─────────────────────────────────────────────────────────────────────
