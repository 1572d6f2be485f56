//! Journal replay: rebuild a run from its header and apply every record.
//! This module exists to prove a journal reproduces the same run end to end.
//! It does not read journal files; journal_file.rs loads them first.

use std::fmt;

use crate::game::Game;
use crate::journal::{FORMAT_VERSION, InputJournal};
use crate::types::{GameError, RunOutcome};

#[derive(Debug, PartialEq, Eq)]
pub enum ReplayError {
    /// The journal was written under a different file format revision.
    FormatVersionMismatch { journal: u16, engine: u16 },
    /// The journal was recorded against a different content catalog.
    ContentHashMismatch { journal: u64, engine: u64 },
    /// The header could not rebuild the starting state.
    Setup(GameError),
    /// Records must arrive in exactly the order the engine accepted them.
    SequenceGap { expected: u64, found: u64 },
    /// The engine rejected a command it once accepted.
    InputRejected { seq: u64, error: GameError },
}

impl fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FormatVersionMismatch { journal, engine } => {
                write!(f, "journal format v{journal} does not match engine format v{engine}")
            }
            Self::ContentHashMismatch { journal, engine } => {
                write!(
                    f,
                    "journal content hash {journal:#018x} does not match engine \
                     content hash {engine:#018x}"
                )
            }
            Self::Setup(error) => write!(f, "run setup failed: {error}"),
            Self::SequenceGap { expected, found } => {
                write!(f, "expected record seq {expected}, found {found}")
            }
            Self::InputRejected { seq, error } => {
                write!(f, "record {seq} was rejected on replay: {error}")
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ReplayResult {
    pub final_outcome: Option<RunOutcome>,
    pub final_snapshot_hash: u64,
    pub inputs_applied: u64,
}

/// Rebuilds the run a journal describes and applies every record.
///
/// The header is enough to reconstruct the starting state. The returned
/// game is live; crash recovery resumes play on it. Any divergence from
/// the recorded run surfaces as a typed error instead of a silently
/// different end state.
pub fn replay_journal_inputs(journal: &InputJournal) -> Result<Game, ReplayError> {
    if journal.format_version != FORMAT_VERSION {
        return Err(ReplayError::FormatVersionMismatch {
            journal: journal.format_version,
            engine: FORMAT_VERSION,
        });
    }

    let hero_keys: Vec<&str> = journal.heroes.iter().map(String::as_str).collect();
    let mut game = Game::new(journal.seed, &hero_keys, journal.positions.as_deref())
        .map_err(ReplayError::Setup)?;

    let engine_hash = game.content().content_hash();
    if journal.content_hash != engine_hash {
        return Err(ReplayError::ContentHashMismatch {
            journal: journal.content_hash,
            engine: engine_hash,
        });
    }

    for record in &journal.inputs {
        let expected = game.next_input_seq();
        if record.seq != expected {
            return Err(ReplayError::SequenceGap { expected, found: record.seq });
        }
        game.apply_input(&record.payload)
            .map_err(|error| ReplayError::InputRejected { seq: record.seq, error })?;
    }

    Ok(game)
}

/// Replays a journal and reports only the end state.
pub fn replay_to_end(journal: &InputJournal) -> Result<ReplayResult, ReplayError> {
    let game = replay_journal_inputs(journal)?;
    Ok(ReplayResult {
        final_outcome: game.outcome(),
        final_snapshot_hash: game.snapshot_hash(),
        inputs_applied: game.next_input_seq(),
    })
}
