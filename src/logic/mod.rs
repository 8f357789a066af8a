//! Court manager business logic: matrix edits, availability, classification, creation flow.

mod availability;
mod classify;
mod flow;
mod matrix;

pub use availability::{available_participants, is_available};
pub use classify::{classify, classify_slot};
pub use flow::{back_to_basics, begin_submission, complete_submission, proceed_to_matchup, submission_failed};
pub use matrix::{
    add_round, count_games_for, initialize_matrix, matches_dimensions, remove_round, set_slot_field,
    RoundRemoval,
};
