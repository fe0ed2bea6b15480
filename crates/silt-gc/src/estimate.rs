//! Projected size of a consolidated pack before it is written.

use silt_store::PACK_OVERHEAD_BYTES;

/// Estimate the size of one pack produced by merging the given input packs.
///
/// Sums the inputs' on-disk sizes, then subtracts the header and trailer
/// bytes deduplicated per merged input: merging `n` packs keeps one header
/// and one trailer instead of `n`. The result is a pessimistic upper bound
/// on the output size, never an exact prediction, because shared objects
/// and recompression can only shrink it further.
pub fn estimated_pack_size(input_sizes: &[u64]) -> u64 {
    if input_sizes.is_empty() {
        return 0;
    }
    let total: u64 = input_sizes.iter().sum();
    let dedup = (input_sizes.len() as u64 - 1) * PACK_OVERHEAD_BYTES;
    total.saturating_sub(dedup)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_inputs_no_estimate() {
        assert_eq!(estimated_pack_size(&[]), 0);
    }

    #[test]
    fn single_input_passes_through() {
        assert_eq!(estimated_pack_size(&[4_096]), 4_096);
    }

    #[test]
    fn two_inputs_share_one_overhead() {
        assert_eq!(
            estimated_pack_size(&[1_000, 2_000]),
            3_000 - PACK_OVERHEAD_BYTES
        );
    }

    #[test]
    fn three_inputs_share_two_overheads() {
        assert_eq!(
            estimated_pack_size(&[1_000, 2_000, 3_000]),
            6_000 - 2 * PACK_OVERHEAD_BYTES
        );
    }

    #[test]
    fn estimate_never_underflows() {
        // Inputs smaller than their own overhead still yield a sane bound.
        assert_eq!(estimated_pack_size(&[10, 10, 10]), 0);
    }
}
