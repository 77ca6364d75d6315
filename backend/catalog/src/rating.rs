/// Average and count of a book's review ratings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingSummary {
    pub average_rating: f64,
    pub total_reviews: u32,
}

impl RatingSummary {
    pub const EMPTY: RatingSummary = RatingSummary {
        average_rating: 0.0,
        total_reviews: 0,
    };

    /// Mean of `ratings` rounded to one decimal place, halves rounding up.
    /// Computed on integer tenths, so `4.25` is always `4.3`.
    pub fn from_ratings<I>(ratings: I) -> Self
    where
        I: IntoIterator<Item = u8>,
    {
        let (sum, count) = ratings
            .into_iter()
            .fold((0u64, 0u32), |(sum, count), rating| {
                (sum + u64::from(rating), count + 1)
            });

        if count == 0 {
            return Self::EMPTY;
        }

        let count_wide = u64::from(count);
        let tenths = (sum * 20 + count_wide) / (count_wide * 2);

        Self {
            average_rating: tenths as f64 / 10.0,
            total_reviews: count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RatingSummary;

    #[test]
    fn test_no_reviews() {
        assert_eq!(RatingSummary::from_ratings(Vec::new()), RatingSummary::EMPTY);
    }

    #[test]
    fn test_single_review() {
        let summary = RatingSummary::from_ratings([4]);

        assert_eq!(summary.average_rating, 4.0);
        assert_eq!(summary.total_reviews, 1);
    }

    #[test]
    fn test_rounds_to_one_decimal() {
        assert_eq!(RatingSummary::from_ratings([5, 4, 4]).average_rating, 4.3);
        assert_eq!(RatingSummary::from_ratings([5, 5, 4]).average_rating, 4.7);
        assert_eq!(RatingSummary::from_ratings([1, 2]).average_rating, 1.5);
    }

    #[test]
    fn test_half_rounds_up() {
        // 17 / 4 = 4.25
        assert_eq!(RatingSummary::from_ratings([5, 4, 4, 4]).average_rating, 4.3);
        // 13 / 4 = 3.25
        assert_eq!(RatingSummary::from_ratings([4, 3, 3, 3]).average_rating, 3.3);
    }

    #[test]
    fn test_counts_every_rating() {
        let summary = RatingSummary::from_ratings(vec![1; 250]);

        assert_eq!(summary.total_reviews, 250);
        assert_eq!(summary.average_rating, 1.0);
    }
}
