use anyhow::Result;
use clap::Parser;
use delve_core::content::keys;
use delve_core::journal::{InputJournal, InputPayload};
use delve_core::replay::replay_to_end;
use delve_core::{
    Direction, EdgeState, Game, HeroId, MonsterId, PendingInteraction, Phase, Pos, TileId,
};
use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::{Rng, SeedableRng};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = 42)]
    seed: u64,
    #[arg(short, long, default_value_t = 400)]
    commands: u32,
}

const PARTIES: [&[&str]; 3] = [
    &[keys::HERO_QUINN],
    &[keys::HERO_QUINN, keys::HERO_VISTRA],
    &[keys::HERO_KEYLETH, keys::HERO_TARAK, keys::HERO_HASKAN],
];

const ENVIRONMENTS: [&str; 4] =
    [keys::ENC_DARK_FOG, keys::ENC_UNSTABLE_GROUND, keys::ENC_HIGH_ALERT, keys::ENC_CAVE_IN];

fn choose<T: Clone>(rng: &mut ChaCha8Rng, slice: &[T]) -> T {
    let p = rng.next_u64() as usize % slice.len();
    slice[p].clone()
}

fn random_monster(rng: &mut ChaCha8Rng, game: &Game) -> MonsterId {
    let roster = &game.state().roster;
    if roster.is_empty() {
        MonsterId::default()
    } else {
        roster[rng.next_u64() as usize % roster.len()]
    }
}

fn sample_resolution(rng: &mut ChaCha8Rng, game: &Game) -> InputPayload {
    match game.pending().expect("caller checked for a pending interaction") {
        PendingInteraction::EncounterDrawn { .. } => {
            if rng.next_u64() % 4 == 0 {
                InputPayload::CancelEncounter
            } else {
                InputPayload::DismissEncounter
            }
        }
        PendingInteraction::AttackResolved(_) => InputPayload::DismissAttackResult,
        PendingInteraction::TreasureDrawn { .. } => {
            if rng.next_u64() % 2 == 0 {
                let party = game.state().heroes.len() as u64;
                InputPayload::AssignTreasure { hero: HeroId((rng.next_u64() % party) as u8) }
            } else {
                InputPayload::DismissTreasure
            }
        }
        PendingInteraction::TrapDisarm(_) => InputPayload::DismissTrapResult,
        PendingInteraction::MonsterActed(_) => InputPayload::DismissMonsterReport,
        PendingInteraction::LairSpawn { .. } => {
            let tiles = game.state().tiles.len() as u64;
            InputPayload::PlaceLairSpawn { tile: TileId((rng.next_u64() % tiles) as u16) }
        }
        PendingInteraction::ActionSurge { hero } => {
            if rng.next_u64() % 8 == 0 {
                InputPayload::SkipActionSurge { hero: *hero }
            } else {
                InputPayload::UseActionSurge { hero: *hero }
            }
        }
    }
}

fn sample_command(rng: &mut ChaCha8Rng, game: &Game) -> InputPayload {
    if game.pending().is_some() {
        return sample_resolution(rng, game);
    }
    let state = game.state();
    let active = state.turn.active_hero;
    let hero_pos = state.hero(active).map_or(Pos { y: 0, x: 0 }, |h| h.pos);
    match rng.next_u64() % 16 {
        0 | 1 | 2 => match state.turn.phase {
            Phase::Hero => InputPayload::EndHeroPhase,
            Phase::Exploration => InputPayload::EndExplorationPhase,
            Phase::Villain => InputPayload::EndVillainPhase,
        },
        3 | 4 => {
            let dy = (rng.next_u64() % 5) as i32 - 2;
            let dx = (rng.next_u64() % 5) as i32 - 2;
            InputPayload::MoveHero { hero: active, to: hero_pos.offset(dy, dx) }
        }
        5 | 6 => InputPayload::AttackMonster { hero: active, target: random_monster(rng, game) },
        7 => InputPayload::ResolveAttack {
            hero: active,
            target: random_monster(rng, game),
            roll: 1 + (rng.next_u64() % 22) as i32,
        },
        8 | 9 => InputPayload::ActivateNextMonster,
        10 => InputPayload::ActivateTraps,
        11 => {
            let trap =
                state.traps.first().map_or_else(|| rng.next_u64() as u32 % 8, |t| t.id);
            InputPayload::DisarmTrap { trap }
        }
        12 => InputPayload::UseItem { hero: active, slot: (rng.next_u64() % 3) as usize },
        13 => {
            if rng.next_u64() % 3 == 0 {
                InputPayload::SetEnvironment { env: None }
            } else {
                InputPayload::SetEnvironment {
                    env: Some(choose(rng, &ENVIRONMENTS).to_owned()),
                }
            }
        }
        14 => InputPayload::EndVillainPhase,
        _ => InputPayload::EndHeroPhase,
    }
}

fn assert_invariants(game: &Game) {
    let state = game.state();
    for hero in &state.heroes {
        let def = game.content().hero(&hero.key).expect("hero def vanished");
        let max = def.levels[(hero.level - 1) as usize].max_hp;
        assert!(hero.hp >= 0 && hero.hp <= max, "Invariant failed: hero hp outside 0..=max");
        assert!(
            hero.removed_from_play || state.tile_at(hero.pos).is_some(),
            "Invariant failed: hero off the map"
        );
    }
    assert!(
        state.monsters.len() == state.roster.len(),
        "Invariant failed: roster and slot map disagree"
    );
    for &id in &state.roster {
        let monster = state.monsters.get(id).expect("Invariant failed: roster holds a ghost");
        assert!(monster.hp > 0, "Invariant failed: defeated monster still on the board");
        assert!(state.tile_at(monster.pos).is_some(), "Invariant failed: monster off the map");
    }
    for entry in &state.unexplored_edges {
        let tile = state.tile(entry.tile).expect("Invariant failed: frontier on a missing tile");
        assert!(
            tile.edges.get(entry.direction) == EdgeState::Unexplored,
            "Invariant failed: frontier entry on a resolved edge"
        );
    }
    for tile in &state.tiles {
        for dir in Direction::ALL {
            if tile.edges.get(dir) == EdgeState::Unexplored {
                assert!(
                    state.unexplored_edges.iter().any(|e| e.tile == tile.id && e.direction == dir),
                    "Invariant failed: unexplored edge with no frontier entry"
                );
            }
        }
    }
    assert!(
        state.party.xp >= 0 && state.party.healing_surges >= 0,
        "Invariant failed: party resources negative"
    );
}

fn main() -> Result<()> {
    let args = Args::parse();

    println!("Starting fuzz harness on seed {} for max {} commands...", args.seed, args.commands);
    let heroes = PARTIES[(args.seed % PARTIES.len() as u64) as usize];
    let mut game = Game::new(args.seed, heroes, None)
        .map_err(|e| anyhow::anyhow!("setup failed: {e}"))?;
    let mut journal = InputJournal::new(args.seed, heroes, None);
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);

    let mut accepted = 0u32;
    let mut rejected = 0u32;
    for _ in 0..args.commands {
        if let Some(outcome) = game.outcome() {
            println!("Finished with outcome {outcome:?} after {accepted} accepted commands");
            break;
        }
        let payload = sample_command(&mut rng, &game);
        let seq = game.next_input_seq();
        match game.apply_input(&payload) {
            Ok(()) => {
                journal.append(seq, payload);
                accepted += 1;
            }
            Err(_) => rejected += 1,
        }
        assert_invariants(&game);
    }

    let replayed = replay_to_end(&journal)
        .map_err(|e| anyhow::anyhow!("journal replay diverged: {e}"))?;
    assert!(
        replayed.final_snapshot_hash == game.snapshot_hash(),
        "Invariant failed: replay hash mismatch"
    );

    println!("Accepted {accepted} commands, rejected {rejected}.");
    println!("Turn {}, snapshot hash {:016x}.", game.state().turn.turn_number, game.snapshot_hash());
    println!("Fuzzing completed successfully.");
    Ok(())
}
