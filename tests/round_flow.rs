use emoji_smash::combo::ComboEvent;
use emoji_smash::field::{PuzzleField, TapOutcome};
use emoji_smash::grid::{Cell, Coord, FieldLayout, Grid, Tile, Variant};
use emoji_smash::pipeline::{PhaseTiming, Trigger};
use emoji_smash::round::{Round, RoundConfig, RoundEvent};
use emoji_smash::scoring::Rank;
use emoji_smash::session::{MemoryStore, RecordStore, Session};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::time::Duration;

/// Four 😀 stacked at the bottom of column 0, a 😎/😡 checkerboard elsewhere.
fn four_group_field() -> PuzzleField {
    let mut grid = Grid::empty();
    for at in Grid::coords() {
        let t = if at.col == 0 && at.row >= 4 {
            0
        } else {
            1 + ((at.row + at.col) % 2) as u8
        };
        grid.set(at, Cell::Emoji(Tile(t)));
    }
    PuzzleField::with_grid(grid, Variant::A, PhaseTiming::default())
}

fn new_round(session: &Session) -> Round<StdRng> {
    Round::with_field(
        RoundConfig::default(),
        four_group_field(),
        session.all_time_combo(),
        StdRng::seed_from_u64(2024),
    )
}

#[test]
fn four_tile_tap_scores_and_starts_a_streak() {
    let session = Session::open(Box::new(MemoryStore::default()));
    let mut round = new_round(&session);
    round.drain_events();

    assert_eq!(round.tap(Coord::new(5, 0)), TapOutcome::Started(4));
    // Second tap while the cycle runs: no evaluation, no events.
    assert_eq!(round.tap(Coord::new(0, 3)), TapOutcome::Busy);
    assert!(round.drain_events().is_empty());

    // 600 ms destroy window + 200 ms fall.
    round.advance(Duration::from_millis(799));
    assert!(
        !round
            .drain_events()
            .iter()
            .any(|e| matches!(e, RoundEvent::CycleCompleted { .. }))
    );
    round.advance(Duration::from_millis(1));
    let events = round.drain_events();
    assert!(events.contains(&RoundEvent::Combo(ComboEvent::StreakChanged(1))));
    assert!(events.contains(&RoundEvent::ScoreAdded {
        points: 210,
        total: 210
    }));
    assert!(events.contains(&RoundEvent::CycleCompleted {
        trigger: Trigger::Tap,
        destroyed: 4
    }));
    assert_eq!(round.score(), 210);
    assert!(round.field().grid().is_full());
}

#[test]
fn clicks_outside_the_board_do_nothing() {
    let session = Session::open(Box::new(MemoryStore::default()));
    let mut round = new_round(&session);
    let layout = FieldLayout {
        x: 10,
        y: 4,
        cell_width: 5,
        cell_height: 2,
    };
    assert_eq!(round.tap_at(3, 3, &layout), TapOutcome::Nothing);
    assert_eq!(round.tap_at(10 + 6 * 5, 4, &layout), TapOutcome::Nothing);
    // Row 5, column 0.
    assert_eq!(round.tap_at(12, 4 + 5 * 2 + 1, &layout), TapOutcome::Started(4));
}

#[test]
fn round_end_feeds_the_session_record() {
    let store = MemoryStore::new(0);
    let mut session = Session::open(Box::new(store.clone()));
    let mut round = new_round(&session);

    round.tap(Coord::new(7, 0));
    round.advance(Duration::from_secs(1));
    round.advance(Duration::from_secs(30));
    let over = round.drain_events().into_iter().find_map(|e| match e {
        RoundEvent::RoundOver(results) => Some(results),
        _ => None,
    });
    let results = over.expect("round should be over after 31 s");
    assert_eq!(results.longest_combo, 1);
    assert_eq!(results.all_time_combo, 1);
    assert!(results.new_record);
    assert_eq!(results.rank, Rank::for_score(results.score));

    assert!(session.finish_round(results.all_time_combo));
    assert_eq!(store.load().unwrap(), 1);

    // The next round starts from the saved record; nothing new, no save.
    let mut next = new_round(&session);
    next.advance(Duration::from_secs(31));
    let results = next.results().unwrap();
    assert!(!results.new_record);
    assert_eq!(results.all_time_combo, 1);
    assert!(!session.finish_round(results.all_time_combo));
    assert_eq!(session.rounds_played(), 2);
    assert_eq!(next.tap(Coord::new(7, 0)), TapOutcome::Busy);
}
