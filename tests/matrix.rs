//! Integration tests for the round/court matrix and the availability filter.

mod common;

use common::{matchup_with, ABCD};
use court_manager::{
    add_round, available_participants, count_games_for, initialize_matrix, remove_round,
    set_slot_field, GameSession, Gender, ParticipantId, PlayerField, RoundRemoval, SessionError,
    MAX_COURTS, MAX_ROUNDS,
};
use std::collections::HashSet;
use PlayerField::{Player1, Player2, Player3, Player4};

fn eight_players() -> Vec<(&'static str, Gender)> {
    ["P1", "P2", "P3", "P4", "P5", "P6", "P7", "P8"]
        .into_iter()
        .enumerate()
        .map(|(i, n)| (n, if i % 2 == 0 { Gender::Male } else { Gender::Female }))
        .collect()
}

fn rounds(s: &GameSession) -> Vec<u32> {
    s.slots.iter().map(|m| m.round_number).collect()
}

fn assert_no_double_booking(s: &GameSession) {
    for round in 1..=s.round_count {
        let mut seen = HashSet::new();
        for slot in s.round_slots(round) {
            for id in slot.players.iter().flatten() {
                assert!(seen.insert(*id), "participant booked twice in round {round}");
            }
        }
    }
}

#[test]
fn initialize_builds_round_major_grid() {
    let (mut s, _) = matchup_with(&ABCD, 1, 1);
    initialize_matrix(&mut s, 2, 3).unwrap();
    assert_eq!(s.slots.len(), 6);
    assert_eq!(rounds(&s), vec![1, 1, 1, 2, 2, 2]);
    let courts: Vec<u32> = s.slots.iter().map(|m| m.court_number).collect();
    assert_eq!(courts, vec![1, 2, 3, 1, 2, 3]);
    assert!(s.slots.iter().all(|m| m.players == [None; 4]));
}

#[test]
fn entering_matchup_uses_configured_counts() {
    let (s, _) = matchup_with(&ABCD, 2, 3);
    assert_eq!(s.slots.len(), 6);
    assert_eq!(s.round_count, 2);
    assert_eq!(s.court_count, 3);
}

#[test]
fn add_round_appends_one_slot_per_court() {
    let (mut s, ids) = matchup_with(&ABCD, 1, 2);
    set_slot_field(&mut s, 1, 1, Player1, Some(ids[0])).unwrap();
    assert_eq!(add_round(&mut s).unwrap(), 2);
    assert_eq!(rounds(&s), vec![1, 1, 2, 2]);
    assert_eq!(s.round_count, 2);
    assert_eq!(s.slot(1, 1).unwrap().get(Player1), Some(ids[0]));
    assert_eq!(s.slot(2, 2).unwrap().players, [None; 4]);
}

#[test]
fn remove_round_renumbers_later_rounds() {
    let (mut s, ids) = matchup_with(&ABCD, 3, 1);
    set_slot_field(&mut s, 3, 1, Player4, Some(ids[3])).unwrap();

    assert_eq!(remove_round(&mut s, 2).unwrap(), RoundRemoval::Removed);
    assert_eq!(rounds(&s), vec![1, 2]);
    assert_eq!(s.round_count, 2);
    // The old round 3 is now round 2, assignments intact.
    assert_eq!(s.slot(2, 1).unwrap().get(Player4), Some(ids[3]));
}

#[test]
fn remove_then_add_round_stays_contiguous() {
    let (mut s, _) = matchup_with(&ABCD, 2, 2);
    remove_round(&mut s, 1).unwrap();
    add_round(&mut s).unwrap();
    let numbers: HashSet<u32> = rounds(&s).into_iter().collect();
    assert_eq!(numbers, HashSet::from([1, 2]));
    assert_eq!(s.slots.len(), 4);
}

#[test]
fn removing_the_last_round_asks_to_delete_the_game() {
    let (mut s, _) = matchup_with(&ABCD, 1, 2);
    assert_eq!(remove_round(&mut s, 1).unwrap(), RoundRemoval::DeleteGameRequired);
    assert_eq!(s.slots.len(), 2);
    assert_eq!(remove_round(&mut s, 5), Err(SessionError::RoundNotFound(5)));
}

#[test]
fn availability_excludes_players_used_in_the_same_round() {
    let (mut s, ids) = matchup_with(&ABCD, 1, 2);
    let [a, b, c, d] = [ids[0], ids[1], ids[2], ids[3]];
    set_slot_field(&mut s, 1, 1, Player1, Some(a)).unwrap();
    set_slot_field(&mut s, 1, 1, Player2, Some(b)).unwrap();

    let offered: Vec<ParticipantId> = available_participants(&s, 1, 2, Player1)
        .iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(offered, vec![c, d]);
}

#[test]
fn availability_keeps_the_fields_own_value() {
    let (mut s, ids) = matchup_with(&ABCD, 1, 1);
    set_slot_field(&mut s, 1, 1, Player3, Some(ids[2])).unwrap();

    let offered: Vec<ParticipantId> = available_participants(&s, 1, 1, Player3)
        .iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(offered, ids);
    // Re-picking the current value is a no-op.
    set_slot_field(&mut s, 1, 1, Player3, Some(ids[2])).unwrap();
    assert_eq!(s.slot(1, 1).unwrap().get(Player3), Some(ids[2]));
}

#[test]
fn availability_is_per_round() {
    let (mut s, ids) = matchup_with(&ABCD, 2, 1);
    set_slot_field(&mut s, 1, 1, Player1, Some(ids[0])).unwrap();
    assert_eq!(available_participants(&s, 2, 1, Player1).len(), 4);
    set_slot_field(&mut s, 2, 1, Player1, Some(ids[0])).unwrap();
    assert_eq!(count_games_for(&s, ids[0]), 2);
}

#[test]
fn double_booking_is_rejected() {
    let (mut s, ids) = matchup_with(&ABCD, 1, 2);
    set_slot_field(&mut s, 1, 1, Player1, Some(ids[0])).unwrap();
    assert_eq!(
        set_slot_field(&mut s, 1, 2, Player3, Some(ids[0])),
        Err(SessionError::ParticipantUnavailable { id: ids[0], round: 1 })
    );
    assert_eq!(
        set_slot_field(&mut s, 1, 1, Player2, Some(ids[0])),
        Err(SessionError::ParticipantUnavailable { id: ids[0], round: 1 })
    );
    assert_eq!(
        set_slot_field(&mut s, 1, 3, Player1, Some(ids[1])),
        Err(SessionError::SlotNotFound { round: 1, court: 3 })
    );
}

#[test]
fn offered_assignments_never_double_book() {
    let players = eight_players();
    let (mut s, _) = matchup_with(&players, 3, 2);

    // Fill every field with the first participant on offer, round by round.
    for round in 1..=3 {
        for court in 1..=2 {
            for field in PlayerField::ALL {
                let pick = available_participants(&s, round, court, field)
                    .into_iter()
                    .find(|p| s.slot(round, court).unwrap().get(field) != Some(p.id))
                    .map(|p| p.id);
                set_slot_field(&mut s, round, court, field, pick).unwrap();
                assert_no_double_booking(&s);
            }
        }
    }
    assert!(s.slots.iter().all(|m| m.players.iter().all(Option::is_some)));

    // Reshuffle some fields with whatever is still offered.
    for (round, court, field) in [(1, 2, Player1), (2, 1, Player4), (3, 2, Player2)] {
        set_slot_field(&mut s, round, court, field, None).unwrap();
        let pick = available_participants(&s, round, court, field).last().map(|p| p.id);
        set_slot_field(&mut s, round, court, field, pick).unwrap();
        assert_no_double_booking(&s);
    }
}

#[test]
fn removing_a_participant_clears_only_their_fields() {
    let (mut s, ids) = matchup_with(&ABCD, 2, 1);
    for round in 1..=2 {
        for (field, id) in [Player1, Player2, Player3, Player4].into_iter().zip(&ids) {
            set_slot_field(&mut s, round, 1, field, Some(*id)).unwrap();
        }
    }
    assert_eq!(count_games_for(&s, ids[1]), 2);

    s.remove_participant(ids[1]).unwrap();
    for slot in &s.slots {
        assert_eq!(slot.get(Player2), None);
        assert_eq!(slot.get(Player1), Some(ids[0]));
        assert_eq!(slot.get(Player3), Some(ids[2]));
        assert_eq!(slot.get(Player4), Some(ids[3]));
    }
    assert_eq!(count_games_for(&s, ids[1]), 0);
}

#[test]
fn matrix_edits_require_matchup_editing() {
    let (mut s, ids) = common::session_with(&ABCD, 1, 1);
    assert_eq!(add_round(&mut s), Err(SessionError::InvalidState));
    assert_eq!(
        set_slot_field(&mut s, 1, 1, Player1, Some(ids[0])),
        Err(SessionError::InvalidState)
    );
}

#[test]
fn rounds_stop_at_the_maximum() {
    let (mut s, _) = matchup_with(&ABCD, MAX_ROUNDS - 1, 1);
    assert_eq!(add_round(&mut s), Ok(MAX_ROUNDS));
    assert_eq!(add_round(&mut s), Err(SessionError::InvalidCount));
    assert_eq!(s.round_count, MAX_ROUNDS);
    assert_eq!(s.slots.len(), MAX_ROUNDS as usize);
    assert_eq!(initialize_matrix(&mut s, 1, MAX_COURTS + 1), Err(SessionError::InvalidCount));
    assert_eq!(s.slots.len(), MAX_ROUNDS as usize);
}
