use rand::Rng;
use rand::rng;
use rand::seq::SliceRandom;

/// Collect the correct answer and the distractors into one display list in
/// random order.
///
/// Inputs are never mutated and every permutation is equally likely; the
/// position of the correct answer carries no information.
pub fn shuffle_answers<R: Rng + ?Sized>(
    correct: &str,
    incorrect: &[String],
    rng: &mut R,
) -> Vec<String> {
    let mut answers = Vec::with_capacity(incorrect.len() + 1);
    answers.push(correct.to_owned());
    answers.extend(incorrect.iter().cloned());
    answers.shuffle(rng);
    answers
}

/// `shuffle_answers` with the thread-local generator.
#[must_use]
pub fn shuffle_answers_thread(correct: &str, incorrect: &[String]) -> Vec<String> {
    let mut rng = rng();
    shuffle_answers(correct, incorrect, &mut rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn distractors() -> Vec<String> {
        vec!["B".to_string(), "C".to_string(), "D".to_string()]
    }

    #[test]
    fn shuffle_keeps_every_answer_exactly_once() {
        let mut rng = StdRng::seed_from_u64(7);

        let mut shuffled = shuffle_answers("A", &distractors(), &mut rng);
        shuffled.sort();

        assert_eq!(shuffled, vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn shuffle_spreads_the_correct_answer_across_positions() {
        let incorrect = distractors();
        let mut rng = StdRng::seed_from_u64(42);
        let mut position_counts = [0usize; 4];

        for _ in 0..400 {
            let shuffled = shuffle_answers("A", &incorrect, &mut rng);
            let position = shuffled.iter().position(|a| a == "A").unwrap();
            position_counts[position] += 1;
        }

        // 100 expected per slot; a uniform shuffle stays far from the bound.
        for count in position_counts {
            assert!(count > 50, "position counts skewed: {position_counts:?}");
        }
    }

    #[test]
    fn shuffle_leaves_inputs_untouched() {
        let incorrect = distractors();
        let mut rng = StdRng::seed_from_u64(1);

        let _ = shuffle_answers("A", &incorrect, &mut rng);

        assert_eq!(incorrect, vec!["B", "C", "D"]);
    }
}
