//! Starting-count fabrication for never-voted options.
//!
//! Seeded counts exist so a freshly published poll does not render as
//! "0 votes". A store that prefers honest empty polls can skip seeding and
//! rely on missing entries reading as zero.

use crate::config::SeedRange;
use crate::model::question::Question;
use crate::model::vote::Aggregate;
use rand::Rng;

/// Plans seed counts for every option of `questions` missing from `existing`.
///
/// Options already present in `existing` (including explicit zero entries)
/// are skipped. An option id repeated across questions is seeded once.
pub fn plan_seeds<R: Rng>(
    questions: &[Question],
    existing: &Aggregate,
    range: SeedRange,
    rng: &mut R,
) -> Aggregate {
    let mut planned = Aggregate::new();
    for option in questions.iter().flat_map(|question| question.options.iter()) {
        if existing.contains(&option.id) || planned.contains(&option.id) {
            continue;
        }
        planned.set(option.id.as_str(), u64::from(rng.gen_range(range.as_range())));
    }
    planned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::question::{AnswerOption, QuestionKind};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn question(id: &str, option_ids: &[&str]) -> Question {
        Question {
            id: id.to_string(),
            prompt: format!("prompt {id}"),
            kind: QuestionKind::MultipleChoice,
            options: option_ids
                .iter()
                .map(|option_id| AnswerOption::new(*option_id, option_id.to_uppercase()))
                .collect(),
            correct_answer_id: option_ids[0].to_string(),
        }
    }

    #[test]
    fn plans_only_missing_options_within_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut existing = Aggregate::new();
        existing.set("a", 0);
        let questions = vec![question("q1", &["a", "b", "c"])];

        let planned = plan_seeds(&questions, &existing, SeedRange::default(), &mut rng);

        assert!(!planned.contains("a"));
        assert_eq!(planned.len(), 2);
        for (_, count) in planned.iter() {
            assert!((1..=5).contains(&count));
        }
    }

    #[test]
    fn shared_option_ids_are_planned_once() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let questions = vec![question("q1", &["x", "y"]), question("q2", &["y", "z"])];

        let planned = plan_seeds(&questions, &Aggregate::new(), SeedRange::default(), &mut rng);

        assert_eq!(planned.len(), 3);
    }

    #[test]
    fn degenerate_range_yields_fixed_counts() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let range = SeedRange::new(2, 2).expect("valid range");
        let questions = [question("q1", &["a", "b"])];
        let planned = plan_seeds(&questions, &Aggregate::new(), range, &mut rng);
        assert_eq!(planned.count("a"), 2);
        assert_eq!(planned.count("b"), 2);
    }
}
