use std::fs;

use delve_core::content::keys;
use delve_core::journal::{InputJournal, InputPayload};
use delve_core::replay::{replay_journal_inputs, replay_to_end};
use delve_core::{
    Game, JournalWriter, PendingInteraction, Phase, Pos, TileId, load_journal_from_file,
};

fn drive(game: &mut Game, journal: &mut InputJournal, payload: InputPayload) {
    let seq = game.next_input_seq();
    game.apply_input(&payload).expect("scripted command rejected");
    journal.append(seq, payload);
}

/// One scripted reaction to whatever the engine is waiting on. Dismisses
/// interactions, otherwise pushes the current phase forward.
fn step(game: &mut Game, journal: &mut InputJournal) {
    if let Some(pending) = game.pending() {
        let payload = match pending {
            PendingInteraction::EncounterDrawn { .. } => InputPayload::DismissEncounter,
            PendingInteraction::AttackResolved(_) => InputPayload::DismissAttackResult,
            PendingInteraction::TreasureDrawn { .. } => InputPayload::DismissTreasure,
            PendingInteraction::TrapDisarm(_) => InputPayload::DismissTrapResult,
            PendingInteraction::MonsterActed(_) => InputPayload::DismissMonsterReport,
            PendingInteraction::LairSpawn { .. } => {
                InputPayload::PlaceLairSpawn { tile: TileId(0) }
            }
            PendingInteraction::ActionSurge { hero } => {
                InputPayload::SkipActionSurge { hero: *hero }
            }
        };
        drive(game, journal, payload);
        return;
    }
    let payload = match game.state().turn.phase {
        Phase::Hero => InputPayload::EndHeroPhase,
        Phase::Exploration => InputPayload::EndExplorationPhase,
        Phase::Villain => {
            let active = game.state().turn.active_hero;
            let controlled = game.state().controlled_monsters(active);
            if game.state().turn.activation_index < controlled.len() {
                InputPayload::ActivateNextMonster
            } else {
                InputPayload::EndVillainPhase
            }
        }
    };
    drive(game, journal, payload);
}

fn record_run(
    seed: u64,
    heroes: &[&str],
    positions: Option<&[Pos]>,
    steps: usize,
) -> (Game, InputJournal) {
    let mut game = Game::new(seed, heroes, positions).expect("setup failed");
    let mut journal = InputJournal::new(seed, heroes, positions);
    for _ in 0..steps {
        if game.outcome().is_some() {
            break;
        }
        step(&mut game, &mut journal);
    }
    (game, journal)
}

/// Writes every accepted command of `journal` to a file under `dir` and
/// returns the path. The writer assigns seqs 0..n, matching a journal
/// recorded against a fresh game.
fn write_journal_file(dir: &tempfile::TempDir, name: &str, journal: &InputJournal) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut writer = JournalWriter::create(&path, journal).unwrap();
    for record in &journal.inputs {
        writer.append(&record.payload).unwrap();
    }
    path
}

/// Play a run recording inputs to a JSONL file, then load the file and
/// replay to completion. The snapshot hash must match.
#[test]
fn test_file_journal_replay_equivalence() {
    let dir = tempfile::tempdir().unwrap();
    let party = [keys::HERO_QUINN, keys::HERO_VISTRA];

    let (game, journal) = record_run(12345, &party, None, 200);
    let path = write_journal_file(&dir, "replay_equiv.jsonl", &journal);

    let loaded = load_journal_from_file(&path).unwrap();
    assert_eq!(loaded.journal, journal, "the file round trip must preserve the journal");
    assert_eq!(loaded.next_seq, journal.inputs.len() as u64);

    let replayed = replay_to_end(&loaded.journal).expect("replay failed");
    assert_eq!(
        replayed.final_snapshot_hash,
        game.snapshot_hash(),
        "file-journal replay must land on the live game's hash"
    );
    assert_eq!(replayed.inputs_applied, journal.inputs.len() as u64);
}

/// A corrupted record must stop the load instead of replaying garbage.
#[test]
fn test_corrupted_record_stops_the_load() {
    let dir = tempfile::tempdir().unwrap();
    let party = [keys::HERO_TARAK];

    let (_, journal) = record_run(999, &party, None, 30);
    assert!(journal.inputs.len() >= 3, "the run should accept a few commands");
    let path = write_journal_file(&dir, "corrupt.jsonl", &journal);

    let text = fs::read_to_string(&path).unwrap();
    let mut lines: Vec<String> = text.lines().map(str::to_owned).collect();
    lines[2] = lines[2].replacen("\"seq\"", "\"sqe\"", 1);
    fs::write(&path, lines.join("\n") + "\n").unwrap();

    assert!(load_journal_from_file(&path).is_err(), "a mangled record should fail to load");
}

/// `replay_journal_inputs` hands back a live game. A crash-recovery resume
/// continues from it exactly where the original run left off.
#[test]
fn test_replay_reconstructs_a_live_game() {
    let party = [keys::HERO_QUINN, keys::HERO_KEYLETH];
    let (mut game, journal) = record_run(777, &party, None, 40);

    let mut rebuilt = replay_journal_inputs(&journal).expect("replay failed");
    assert_eq!(
        rebuilt.snapshot_hash(),
        game.snapshot_hash(),
        "the rebuilt game must match the original at the cut point"
    );
    assert_eq!(rebuilt.next_input_seq(), game.next_input_seq());

    if game.outcome().is_none() {
        let mut original_tail = journal.clone();
        let mut rebuilt_tail = journal.clone();
        step(&mut game, &mut original_tail);
        step(&mut rebuilt, &mut rebuilt_tail);

        assert_eq!(
            original_tail.inputs.last(),
            rebuilt_tail.inputs.last(),
            "both copies should pick the same next command"
        );
        assert_eq!(rebuilt.snapshot_hash(), game.snapshot_hash());
    }
}
