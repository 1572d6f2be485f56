pub mod content;
pub mod dice;
pub mod game;
pub mod journal;
pub mod journal_file;
pub mod replay;
pub mod state;
pub mod types;

pub use content::ContentPack;
pub use game::Game;
pub use journal::{InputJournal, InputPayload, InputRecord};
pub use journal_file::{JournalLoadError, JournalWriter, LoadedJournal, load_journal_from_file};
pub use replay::{ReplayError, ReplayResult, replay_journal_inputs, replay_to_end};
pub use state::GameState;
pub use types::*;
