/// Blend coefficients of an intermediate frame.
///
/// `next` grows linearly from 0 at the previous original frame to 1 at the
/// next one. `prev` is derived as `1 - next` so the pair always sums to one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemporalWeights {
    /// Weight of the previous original frame.
    pub prev: f32,
    /// Weight of the next original frame.
    pub next: f32,
}

impl TemporalWeights {
    /// Weights of frame `index` between the originals at `prev_index` and `next_index`.
    ///
    /// `index` is expected in `prev_index..=next_index` and `prev_index < next_index`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tweenflow::weights::TemporalWeights;
    ///
    /// let w = TemporalWeights::at(4, 8, 5);
    ///
    /// assert_eq!(w.next, 0.25);
    /// assert_eq!(w.prev, 0.75);
    /// ```
    pub fn at(prev_index: usize, next_index: usize, index: usize) -> Self {
        let gap = next_index.saturating_sub(prev_index).max(1) as f32;
        let next = index.saturating_sub(prev_index) as f32 / gap;
        Self {
            prev: 1.0 - next,
            next,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_one() {
        for factor in 2..=17usize {
            for i in 0..4usize {
                let (prev, next) = (i * factor, (i + 1) * factor);
                for k in prev + 1..next {
                    let w = TemporalWeights::at(prev, next, k);
                    assert_eq!(w.prev + w.next, 1.0, "factor {factor} index {k}");
                    assert!(w.prev > 0.0 && w.next > 0.0);
                }
            }
        }
    }

    #[test]
    fn endpoints() {
        assert_eq!(
            TemporalWeights::at(6, 9, 6),
            TemporalWeights {
                prev: 1.0,
                next: 0.0
            }
        );
        assert_eq!(
            TemporalWeights::at(6, 9, 9),
            TemporalWeights {
                prev: 0.0,
                next: 1.0
            }
        );
    }

    #[test]
    fn factor_four() {
        let next = (1..4)
            .map(|k| TemporalWeights::at(0, 4, k).next)
            .collect::<Vec<_>>();
        assert_eq!(next, vec![0.25, 0.5, 0.75]);
    }
}
