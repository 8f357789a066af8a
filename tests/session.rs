//! Integration tests for the participant registry, grades and the creation flow.

mod common;

use common::{grade_d, matchup_with, session_with, ABCD};
use court_manager::logic::matches_dimensions;
use court_manager::{
    back_to_basics, begin_submission, complete_submission, proceed_to_matchup, set_slot_field,
    submission_failed, AgeGroup, CreationStep, GameSession, Gender, Grade, GradeError, GradeType,
    ParticipantUpdate, PlayerField, SessionError, SkillTier, SubmittedGame, MAX_COURTS, MAX_ROUNDS,
};

#[test]
fn add_keeps_insertion_order_and_trims_names() {
    let (mut s, ids) = session_with(&ABCD, 1, 1);
    let e = s
        .add_participant("  Eun-ji ", Gender::Female, grade_d(), AgeGroup::default())
        .unwrap();
    let names: Vec<&str> = s.participants.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B", "C", "D", "Eun-ji"]);
    assert_eq!(s.participants[4].id, e);
    assert!(!ids.contains(&e));
}

#[test]
fn blank_and_duplicate_names_change_nothing() {
    let (mut s, _) = session_with(&ABCD, 1, 1);
    assert_eq!(
        s.add_participant("   ", Gender::Male, grade_d(), AgeGroup::default()),
        Err(SessionError::BlankName)
    );
    assert_eq!(
        s.add_participant("a", Gender::Male, grade_d(), AgeGroup::default()),
        Err(SessionError::DuplicateParticipantName)
    );
    assert_eq!(s.participants.len(), 4);
}

#[test]
fn grade_scope_must_match_the_session() {
    let mut s = GameSession::new("Open", 1, 1, GradeType::National).unwrap();
    assert_eq!(
        s.add_participant("Min", Gender::Male, grade_d(), AgeGroup::default()),
        Err(SessionError::GradeScopeMismatch {
            expected: GradeType::National,
            found: GradeType::Regional,
        })
    );
    let id = s
        .add_participant("Min", Gender::Male, Grade::national(SkillTier::Ss), AgeGroup::default())
        .unwrap();
    // Switching the session to regional would strand an SS player.
    assert!(s.set_basics("Open", 1, 1, GradeType::Regional).is_err());
    s.update_participant(id, ParticipantUpdate::Grade(Grade::national(SkillTier::A)))
        .unwrap();
    assert_eq!(s.participant(id).unwrap().grade.tier(), SkillTier::A);
}

#[test]
fn regional_grades_stop_at_a() {
    assert_eq!(Grade::regional(SkillTier::S), Err(GradeError::NotRegional(SkillTier::S)));
    assert_eq!(Grade::regional(SkillTier::Rookie), Ok(Grade::Regional(SkillTier::Rookie)));
    assert!(SkillTier::Rookie < SkillTier::D && SkillTier::S < SkillTier::Ss);
}

#[test]
fn grade_fields_resolve_once() {
    assert_eq!(
        Grade::resolve(Some("C"), Some("S"), Some("D"), GradeType::Regional),
        Ok(Grade::National(SkillTier::S))
    );
    assert_eq!(
        Grade::resolve(Some("B"), None, Some("D"), GradeType::National),
        Ok(Grade::Regional(SkillTier::B))
    );
    assert_eq!(
        Grade::resolve(None, Some(""), Some("D조"), GradeType::Regional),
        Ok(Grade::Regional(SkillTier::D))
    );
    assert_eq!(
        Grade::resolve(None, None, Some("초심"), GradeType::National),
        Ok(Grade::National(SkillTier::Rookie))
    );
    assert_eq!(Grade::resolve(None, None, None, GradeType::Regional), Err(GradeError::Missing));
    assert_eq!(
        Grade::resolve(None, None, Some("Z"), GradeType::Regional),
        Err(GradeError::Unknown("Z".to_string()))
    );
}

#[test]
fn grade_and_age_group_round_trip_through_json() {
    let grade: Grade = serde_json::from_str(r#"{"gradeType":"NATIONAL","tier":"SS"}"#).unwrap();
    assert_eq!(grade, Grade::National(SkillTier::Ss));
    assert!(serde_json::from_str::<Grade>(r#"{"gradeType":"REGIONAL","tier":"S"}"#).is_err());
    assert!(serde_json::from_str::<AgeGroup>("35").is_err());
    assert_eq!(serde_json::to_string(&AgeGroup::new(70).unwrap()).unwrap(), "70");
}

#[test]
fn update_edits_one_field() {
    let (mut s, ids) = session_with(&ABCD, 1, 1);
    s.update_participant(ids[0], ParticipantUpdate::Gender(Gender::Female))
        .unwrap();
    s.update_participant(ids[0], ParticipantUpdate::AgeGroup(AgeGroup::new(50).unwrap()))
        .unwrap();
    let a = s.participant(ids[0]).unwrap();
    assert_eq!(a.gender, Gender::Female);
    assert_eq!(a.age_group.value(), 50);
    assert_eq!(a.name, "A");

    let update: ParticipantUpdate = serde_json::from_str(r#"{"field":"gender","value":"MALE"}"#).unwrap();
    s.update_participant(ids[0], update).unwrap();
    assert_eq!(s.participant(ids[0]).unwrap().gender, Gender::Male);
}

#[test]
fn removing_an_unknown_participant_fails() {
    let (mut s, ids) = session_with(&ABCD, 1, 1);
    s.remove_participant(ids[0]).unwrap();
    assert_eq!(
        s.remove_participant(ids[0]),
        Err(SessionError::ParticipantNotFound(ids[0]))
    );
}

#[test]
fn matchup_needs_title_and_participants() {
    let mut s = GameSession::new("", 1, 1, GradeType::Regional).unwrap();
    assert_eq!(proceed_to_matchup(&mut s), Err(SessionError::EmptyTitle));
    s.set_basics("Saturday", 2, 2, GradeType::Regional).unwrap();
    assert_eq!(proceed_to_matchup(&mut s), Err(SessionError::NoParticipants));
}

#[test]
fn going_back_keeps_assignments_unless_counts_change() {
    let (mut s, ids) = matchup_with(&ABCD, 1, 1);
    set_slot_field(&mut s, 1, 1, PlayerField::Player1, Some(ids[0])).unwrap();

    back_to_basics(&mut s).unwrap();
    assert_eq!(s.step, CreationStep::CreateBasics);
    proceed_to_matchup(&mut s).unwrap();
    assert_eq!(s.slot(1, 1).unwrap().get(PlayerField::Player1), Some(ids[0]));

    back_to_basics(&mut s).unwrap();
    s.set_basics("Thursday club night", 2, 1, GradeType::Regional).unwrap();
    proceed_to_matchup(&mut s).unwrap();
    assert_eq!(s.slots.len(), 2);
    assert!(s.slots.iter().all(|m| m.players == [None; 4]));
}

#[test]
fn basics_are_locked_outside_create_basics() {
    let (mut s, _) = matchup_with(&ABCD, 1, 1);
    assert_eq!(
        s.set_basics("x", 1, 1, GradeType::Regional),
        Err(SessionError::InvalidState)
    );
    assert_eq!(back_to_basics(&mut s), Ok(()));
    assert_eq!(
        s.set_basics("x", 0, 1, GradeType::Regional),
        Err(SessionError::InvalidCount)
    );
}

#[test]
fn submission_transitions() {
    let (mut s, ids) = matchup_with(&ABCD, 1, 1);
    assert_eq!(submission_failed(&mut s), Err(SessionError::InvalidState));

    begin_submission(&mut s).unwrap();
    assert_eq!(s.step, CreationStep::Submitting);
    // Edits are blocked while submitting.
    assert_eq!(s.remove_participant(ids[0]), Err(SessionError::InvalidState));

    submission_failed(&mut s).unwrap();
    assert_eq!(s.step, CreationStep::MatchupEditing);

    begin_submission(&mut s).unwrap();
    let submitted = SubmittedGame {
        game_id: 7,
        share_url: "https://example.test/court_manager/game/7".to_string(),
    };
    complete_submission(&mut s, submitted.clone()).unwrap();
    assert!(s.is_complete());
    assert_eq!(s.submitted, Some(submitted));

    // Complete is terminal.
    assert_eq!(back_to_basics(&mut s), Err(SessionError::InvalidState));
    assert_eq!(begin_submission(&mut s), Err(SessionError::InvalidState));
    assert_eq!(
        s.add_participant("E", Gender::Male, grade_d(), AgeGroup::default()),
        Err(SessionError::InvalidState)
    );
}

#[test]
fn counts_are_bounded_on_every_path() {
    assert_eq!(
        GameSession::new("Open", 0, 1, GradeType::Regional).err(),
        Some(SessionError::InvalidCount)
    );
    assert_eq!(
        GameSession::new("Open", MAX_COURTS + 1, 1, GradeType::Regional).err(),
        Some(SessionError::InvalidCount)
    );
    assert!(GameSession::new("Open", MAX_COURTS, MAX_ROUNDS, GradeType::Regional).is_ok());

    let (mut s, _) = matchup_with(&ABCD, 1, 1);
    back_to_basics(&mut s).unwrap();
    assert_eq!(
        s.set_basics("t", 65536, 65536, GradeType::Regional),
        Err(SessionError::InvalidCount)
    );
    assert_eq!((s.court_count, s.round_count), (1, 1));

    // Counts written past the setters are caught before the matrix is built.
    s.court_count = 65536;
    s.round_count = 65536;
    assert!(!matches_dimensions(&s));
    assert_eq!(proceed_to_matchup(&mut s), Err(SessionError::InvalidCount));
    assert_eq!(s.slots.len(), 1);
    assert_eq!(s.step, CreationStep::CreateBasics);
}
