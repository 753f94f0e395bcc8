use rand::Rng;

/// Cumulative-weight draw over `weights`, returning the chosen index.
///
/// A single weight is chosen without consuming randomness. When no weight is usable the first
/// index wins.
pub fn weighted_draw<R>(weights: &[f64], rng: &mut R) -> Option<usize>
where
    R: Rng + ?Sized,
{
    match weights.len() {
        0 => return None,
        1 => return Some(0),
        _ => {}
    }

    let total: f64 = weights
        .iter()
        .filter(|weight| weight.is_finite() && **weight > 0.0)
        .sum();
    if !(total.is_finite() && total > 0.0) {
        return Some(0);
    }

    let target = rng.gen::<f64>() * total;
    let mut cumulative = 0.0;
    let mut last_usable = 0;
    for (index, weight) in weights.iter().enumerate() {
        if !(weight.is_finite() && *weight > 0.0) {
            continue;
        }
        cumulative += weight;
        last_usable = index;
        if target < cumulative {
            return Some(index);
        }
    }
    // rounding can leave `target` a hair above the final cumulative sum
    Some(last_usable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{RngCore, SeedableRng};

    /// Fails the test if the draw reaches for randomness.
    struct Untouchable;

    impl RngCore for Untouchable {
        fn next_u32(&mut self) -> u32 {
            panic!("randomness consumed")
        }
        fn next_u64(&mut self) -> u64 {
            panic!("randomness consumed")
        }
        fn fill_bytes(&mut self, _dest: &mut [u8]) {
            panic!("randomness consumed")
        }
        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand::Error> {
            panic!("randomness consumed")
        }
    }

    #[test]
    fn single_candidate_is_chosen_without_randomness() {
        assert_eq!(weighted_draw(&[0.7], &mut Untouchable), Some(0));
        assert_eq!(weighted_draw(&[], &mut Untouchable), None);
    }

    #[test]
    fn zero_total_falls_back_to_the_first_candidate() {
        assert_eq!(weighted_draw(&[0.0, 0.0], &mut Untouchable), Some(0));
    }

    #[test]
    fn heavier_weights_win_more_often() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut hits = [0usize; 2];
        for _ in 0..2_000 {
            let index = weighted_draw(&[1.0, 9.0], &mut rng).expect("non-empty");
            hits[index] += 1;
        }
        assert!(hits[1] > hits[0] * 4, "unexpected distribution {hits:?}");
    }

    #[test]
    fn zero_weight_entries_are_never_drawn() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..500 {
            let index = weighted_draw(&[0.0, 1.0, 0.0], &mut rng).expect("non-empty");
            assert_eq!(index, 1);
        }
    }
}
