//! Geometric sampling for skip-list node heights.

use rand::Rng;

/// Count successive trials that succeed with probability `p`.
///
/// Returns the number of successes before the first failure, i.e. a sample
/// from a geometric distribution. With `p = 0.5` roughly half the draws
/// return 0, a quarter return 1, and so on.
pub fn geometric<R: Rng + ?Sized>(rng: &mut R, p: f64) -> u64 {
    let mut successes = 0;
    while rng.gen::<f64>() < p {
        successes += 1;
    }
    successes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometric_zero_probability_never_succeeds() {
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            assert_eq!(geometric(&mut rng, 0.0), 0);
        }
    }

    #[test]
    fn test_geometric_distribution_shape() {
        let mut rng = rand::thread_rng();
        let draws = 10_000;
        let mut zeros = 0u64;
        let mut total = 0u64;
        for _ in 0..draws {
            let sample = geometric(&mut rng, 0.5);
            total += sample;
            if sample == 0 {
                zeros += 1;
            }
        }
        // Mean of geometric(0.5) is 1; zeros land near half the draws.
        let mean = total as f64 / draws as f64;
        assert!(mean > 0.8 && mean < 1.2, "mean {mean} out of range");
        assert!(
            zeros > draws / 3 && zeros < 2 * draws / 3,
            "zeros {zeros} out of range"
        );
    }
}
