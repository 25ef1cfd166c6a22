//! Canonical placement of gap runs.
//!
//! When the bases flanking an insertion or a deletion are identical, the gap
//! can be placed at several offsets without changing what the alignment says.
//! Aligners do not always agree on a placement (a read and its reverse
//! complement are a common source of disagreement), so every gap run is
//! shifted as far right as it can go while the alignment stays equivalent.

use crate::alignment::GAP;

/// Normalizes one track of an alignment against its counterpart track.
///
/// Each maximal run of gaps in `track` is shifted one column right at a time.
/// A shift moves the base just after the run into the run's first column. It
/// is taken when the counterpart has the same base at both ends of the move
/// (so nothing observable changes), or when the moved base already disagrees
/// with the counterpart. Runs that reach the end of the track stay put.
///
/// Tracks without gaps are left untouched, and normalizing a track twice has
/// the same effect as normalizing it once.
///
/// # Examples
///
/// ```
/// use refcons::alignment::normalize::normalize;
///
/// let reference = b"ACAAAGT";
/// let mut read = b"AC-AAGT".to_vec();
///
/// normalize(&mut read, reference);
/// assert_eq!(read, b"ACAA-GT");
/// ```
pub fn normalize(track: &mut [u8], counterpart: &[u8]) {
    debug_assert_eq!(track.len(), counterpart.len());

    if !track.contains(&GAP) {
        return;
    }

    let len = track.len();
    let mut i = 0;

    while i < len {
        if track[i] != GAP {
            i += 1;
            continue;
        }

        let mut j = i + 1;
        while j < len && track[j] == GAP {
            j += 1;
        }

        if j >= len {
            break;
        }

        if counterpart[i] == counterpart[j] || track[j] != counterpart[j] {
            track.swap(i, j);
            i += 1;
        } else {
            i = j;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gap_free_track_is_untouched() {
        let mut track = b"ACGT".to_vec();
        normalize(&mut track, b"ACGA");
        assert_eq!(track, b"ACGT");
    }

    #[test]
    fn test_deletion_in_homopolymer_moves_right() {
        let mut read = b"A-AAC".to_vec();
        normalize(&mut read, b"AAAAC");
        assert_eq!(read, b"AAA-C");
    }

    #[test]
    fn test_multi_base_gap_run_moves_as_a_block() {
        let mut read = b"G--GGGT".to_vec();
        normalize(&mut read, b"GGGGGGT");
        assert_eq!(read, b"GGGG--T");
    }

    #[test]
    fn test_gap_run_at_the_end_stays_put() {
        let mut read = b"ACG--".to_vec();
        normalize(&mut read, b"ACGTT");
        assert_eq!(read, b"ACG--");
    }

    #[test]
    fn test_insertion_moves_right_in_reference_track() {
        // A `T` inserted before a run of `T`s.
        let read = b"ACTTTG";
        let mut reference = b"AC-TTG".to_vec();
        normalize(&mut reference, read);
        assert_eq!(reference, b"ACTT-G");
    }

    #[test]
    fn test_differently_placed_gaps_agree_after_normalizing() {
        let reference = b"CAAAAT";

        let mut first = b"C-AAAT".to_vec();
        let mut second = b"CAA-AT".to_vec();
        normalize(&mut first, reference);
        normalize(&mut second, reference);

        assert_eq!(first, second);
        assert_eq!(first, b"CAAA-T");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let counterpart = b"TTACAGGAT";
        for track in [
            b"T-ACAGGAT".to_vec(),
            b"TTA--GGAT".to_vec(),
            b"-TACAG-AT".to_vec(),
        ] {
            let mut once = track.clone();
            normalize(&mut once, counterpart);

            let mut twice = once.clone();
            normalize(&mut twice, counterpart);

            assert_eq!(once, twice);
        }
    }
}
