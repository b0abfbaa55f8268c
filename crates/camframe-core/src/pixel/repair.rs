/// Zero-sample count above which the repair pass runs.
pub const DEFAULT_REPAIR_THRESHOLD: usize = 100;

/// Interpolate isolated zero samples left behind by dropped wire bytes.
///
/// Runs only when more than `threshold` samples are zero. Each zero sample
/// with a neighbor on both sides becomes the integer mean of its left and
/// right neighbors, walking in sequence order so a repaired sample feeds the
/// next one. The first and last samples are left as is. Returns the number of
/// samples rewritten.
pub fn repair_zero_samples(samples: &mut [u16], threshold: usize) -> usize {
    let zeros = samples.iter().filter(|&&sample| sample == 0).count();
    if zeros <= threshold || samples.len() < 3 {
        return 0;
    }

    let mut repaired = 0;
    for index in 1..samples.len() - 1 {
        if samples[index] != 0 {
            continue;
        }
        let mean = (u32::from(samples[index - 1]) + u32::from(samples[index + 1])) / 2;
        samples[index] = mean as u16;
        repaired += 1;
    }
    repaired
}

#[cfg(test)]
mod tests {
    use super::repair_zero_samples;

    #[test]
    fn below_threshold_is_untouched() {
        let mut samples = vec![10, 0, 20];
        assert_eq!(repair_zero_samples(&mut samples, 1), 0);
        assert_eq!(samples, vec![10, 0, 20]);
    }

    #[test]
    fn replaces_inner_zeros_with_neighbor_mean() {
        let mut samples = vec![0, 10, 0, 20, 0, 0, 40, 0];
        let repaired = repair_zero_samples(&mut samples, 2);
        // index 4 sees a zero on its right, index 5 sees the repaired index 4
        assert_eq!(samples, vec![0, 10, 15, 20, 10, 25, 40, 0]);
        assert_eq!(repaired, 3);
    }

    #[test]
    fn mean_does_not_overflow() {
        let mut samples = vec![0xFFFF, 0, 0xFFFF, 0, 0];
        repair_zero_samples(&mut samples, 1);
        assert_eq!(samples[1], 0xFFFF);
    }
}
