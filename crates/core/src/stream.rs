//! Stream assembly for incrementally delivered model output.
//!
//! The transport pushes text fragments one at a time and finishes either with the `[DONE]`
//! sentinel or by closing. `StreamAssembler` concatenates fragments in arrival order and
//! decides when the buffer is complete; it performs no transformation of the text.
//!
//! The assembler is a small state machine:
//!
//! ```text
//! Accumulating --sentinel--> Complete
//! Accumulating --abort-----> Aborted
//! ```
//!
//! `finalize` consumes the assembler, so no fragment can be appended to a finalized buffer.
//! Fragments that arrive after completion or abort are ignored.

use crate::constants::SENTINEL;
use crate::{ScribeError, ScribeResult};
use tokio::sync::mpsc;

/// One event delivered by the transport collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A text increment.
    Fragment(String),
    /// The transport failed; the attempt must be abandoned.
    Failed(String),
}

/// Lifecycle state of a `StreamAssembler`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblerState {
    Accumulating,
    Complete,
    Aborted,
}

/// The complete raw document for one consultation request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssembledText(String);

impl AssembledText {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for AssembledText {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl From<&str> for AssembledText {
    fn from(text: &str) -> Self {
        Self(text.to_owned())
    }
}

/// Accumulates fragments until the sentinel arrives or the stream ends.
#[derive(Debug)]
pub struct StreamAssembler {
    buffer: String,
    state: AssemblerState,
    fragments: usize,
}

impl StreamAssembler {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            state: AssemblerState::Accumulating,
            fragments: 0,
        }
    }

    pub fn state(&self) -> AssemblerState {
        self.state
    }

    /// Number of fragments accepted so far (the sentinel counts when it arrives glued to text).
    pub fn fragments(&self) -> usize {
        self.fragments
    }

    /// Appends a fragment.
    ///
    /// Returns `true` when the fragment was accepted, `false` when it was ignored because the
    /// assembler already completed or was aborted.
    pub fn append(&mut self, fragment: &str) -> bool {
        if self.state != AssemblerState::Accumulating {
            tracing::debug!(
                state = ?self.state,
                len = fragment.len(),
                "ignoring fragment received after assembly ended"
            );
            return false;
        }

        self.fragments += 1;
        self.buffer.push_str(fragment);

        if let Some(cut) = sentinel_start(&self.buffer) {
            self.buffer.truncate(cut);
            self.state = AssemblerState::Complete;
            tracing::debug!(
                fragments = self.fragments,
                bytes = self.buffer.len(),
                "sentinel received"
            );
        }

        true
    }

    /// Whether the sentinel has been seen.
    pub fn is_complete(&self) -> bool {
        self.state == AssemblerState::Complete
    }

    /// Cooperative cancellation: stop accepting fragments and refuse to finalize.
    pub fn abort(&mut self) {
        if self.state == AssemblerState::Accumulating {
            tracing::debug!(fragments = self.fragments, "assembly aborted");
        }
        self.state = AssemblerState::Aborted;
    }

    /// Finishes assembly and yields the accumulated text.
    ///
    /// A stream that ended without the sentinel still finalizes with whatever was accumulated,
    /// including nothing at all.
    ///
    /// # Errors
    ///
    /// Returns `ScribeError::AssemblyAborted` if `abort` was called.
    pub fn finalize(self) -> ScribeResult<AssembledText> {
        match self.state {
            AssemblerState::Aborted => Err(ScribeError::AssemblyAborted),
            AssemblerState::Complete => Ok(AssembledText(self.buffer)),
            AssemblerState::Accumulating => {
                tracing::debug!(
                    fragments = self.fragments,
                    "stream ended without sentinel; finalizing partial document"
                );
                Ok(AssembledText(self.buffer))
            }
        }
    }
}

impl Default for StreamAssembler {
    fn default() -> Self {
        Self::new()
    }
}

/// Byte offset where a trailing sentinel starts, if the buffer ends with one.
///
/// Surrounding whitespace and ASCII case are ignored. The sentinel may span several fragments.
fn sentinel_start(buffer: &str) -> Option<usize> {
    let trimmed = buffer.trim_end();
    let start = trimmed.len().checked_sub(SENTINEL.len())?;
    let tail = trimmed.get(start..)?;
    if !tail.eq_ignore_ascii_case(SENTINEL) {
        return None;
    }
    let before = trimmed[..start].trim_end();
    Some(before.len())
}

/// Assembles one document from a synchronous sequence of fragments.
///
/// Fragments after the sentinel are ignored; running out of fragments counts as end-of-stream.
pub fn assemble_fragments<I, S>(fragments: I) -> AssembledText
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut assembler = StreamAssembler::new();
    for fragment in fragments {
        assembler.append(fragment.as_ref());
        if assembler.is_complete() {
            break;
        }
    }
    // Never aborted on this path.
    assembler.finalize().unwrap_or_default()
}

/// Assembles one document from transport events that were already collected, such as a
/// recorded event stream.
///
/// # Errors
///
/// Returns `ScribeError::Transport` if a failure event arrives before the sentinel.
pub fn assemble_events<I>(events: I) -> ScribeResult<AssembledText>
where
    I: IntoIterator<Item = TransportEvent>,
{
    let mut assembler = StreamAssembler::new();
    for event in events {
        match event {
            TransportEvent::Fragment(fragment) => {
                assembler.append(&fragment);
                if assembler.is_complete() {
                    break;
                }
            }
            TransportEvent::Failed(reason) => {
                tracing::warn!(
                    fragments = assembler.fragments(),
                    "transport failed during assembly: {}",
                    reason
                );
                assembler.abort();
                return Err(ScribeError::Transport(reason));
            }
        }
    }
    assembler.finalize()
}

/// Drives a `StreamAssembler` from a push-based transport channel.
///
/// Returns as soon as the sentinel arrives (remaining events are not read) or when every
/// sender has been dropped, which counts as end-of-stream.
///
/// # Errors
///
/// Returns `ScribeError::Transport` if the transport reports a failure. The partial buffer
/// is discarded and no document is produced for the attempt.
pub async fn assemble(mut events: mpsc::Receiver<TransportEvent>) -> ScribeResult<AssembledText> {
    let mut assembler = StreamAssembler::new();

    while let Some(event) = events.recv().await {
        match event {
            TransportEvent::Fragment(fragment) => {
                assembler.append(&fragment);
                if assembler.is_complete() {
                    break;
                }
            }
            TransportEvent::Failed(reason) => {
                tracing::warn!(
                    fragments = assembler.fragments(),
                    "transport failed during assembly: {}",
                    reason
                );
                assembler.abort();
                events.close();
                return Err(ScribeError::Transport(reason));
            }
        }
    }

    assembler.finalize()
}
