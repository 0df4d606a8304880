//! Result reduction: relate matches whose spans coincide, nest or overlap.
//! Nothing is removed here; flags let the caller choose its own policy.

use crate::geocoding::GeocoordMatch;

pub(super) fn flag_reductions(matches: &mut [GeocoordMatch]) {
    for i in 0..matches.len() {
        for j in i + 1..matches.len() {
            let (a_start, a_end) = (matches[i].start, matches[i].end);
            let (b_start, b_end) = (matches[j].start, matches[j].end);

            if a_start == b_start && a_end == b_end {
                matches[j].is_duplicate = true;
            } else if b_start >= a_start && b_end <= a_end {
                matches[j].is_submatch = true;
            } else if a_start >= b_start && a_end <= b_end {
                matches[i].is_submatch = true;
            } else if a_start < b_end && b_start < a_end {
                matches[i].is_overlap = true;
                matches[j].is_overlap = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Family;

    fn at(start: usize, end: usize) -> GeocoordMatch {
        GeocoordMatch::new(Family::Dd, "DD-01", "x", start, end)
    }

    #[test]
    fn identical_spans_mark_later_as_duplicate() {
        let mut ms = vec![at(5, 20), at(5, 20)];
        flag_reductions(&mut ms);
        assert!(!ms[0].is_duplicate);
        assert!(ms[1].is_duplicate);
    }

    #[test]
    fn contained_span_is_a_submatch() {
        let mut ms = vec![at(0, 20), at(4, 12)];
        flag_reductions(&mut ms);
        assert!(ms[1].is_submatch);
        assert!(!ms[0].is_submatch);

        let mut ms = vec![at(4, 12), at(0, 20)];
        flag_reductions(&mut ms);
        assert!(ms[0].is_submatch);
    }

    #[test]
    fn partial_overlap_marks_both() {
        let mut ms = vec![at(0, 10), at(5, 15)];
        flag_reductions(&mut ms);
        assert!(ms[0].is_overlap && ms[1].is_overlap);
    }

    #[test]
    fn disjoint_spans_untouched() {
        let mut ms = vec![at(0, 5), at(10, 15)];
        flag_reductions(&mut ms);
        assert!(!ms[0].is_overlap && !ms[1].is_overlap);
        assert!(!ms[0].is_submatch && !ms[1].is_submatch);
        assert!(!ms[0].is_duplicate && !ms[1].is_duplicate);
    }
}
