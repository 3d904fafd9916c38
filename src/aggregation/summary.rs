//! Per-location rating averages, keyword tallies and merged summaries

use std::collections::HashMap;

use crate::models::{KeywordCount, Location, LocationScores, Review};

/// Keywords kept by [`aggregate_keywords`]
pub const MAX_KEYWORDS: usize = 10;

/// Returned by [`aggregate_summary`] when no review has any text
pub const EMPTY_SUMMARY: &str = "No review summary yet";

fn one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn average_scores(location: &Location) -> LocationScores {
    average_review_scores(&location.reviews)
}

pub fn average_review_scores(reviews: &[Review]) -> LocationScores {
    if reviews.is_empty() {
        return LocationScores::default();
    }

    let mut totals = [0u64; 4];
    for review in reviews {
        totals[0] += u64::from(review.night_lighting);
        totals[1] += u64::from(review.security_status);
        totals[2] += u64::from(review.female_density);
        totals[3] += u64::from(review.overall_safety);
    }

    let count = reviews.len() as f64;
    let mean = |total: u64| total as f64 / count;

    LocationScores {
        night_lighting: one_decimal(mean(totals[0])),
        security_status: one_decimal(mean(totals[1])),
        female_density: one_decimal(mean(totals[2])),
        overall_safety: one_decimal(mean(totals[3])),
        overall: one_decimal(totals.iter().sum::<u64>() as f64 / (count * 4.0)),
    }
}

/// Most frequent tags across `reviews`, highest count first.
///
/// Tags are case sensitive. Equal counts keep first-seen order.
pub fn aggregate_keywords(reviews: &[Review]) -> Vec<KeywordCount> {
    let mut counts: Vec<KeywordCount> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    let tags = reviews
        .iter()
        .flat_map(|review| review.keywords.split(','))
        .map(str::trim)
        .filter(|tag| !tag.is_empty());

    for tag in tags {
        match index.get(tag) {
            Some(&slot) => counts[slot].count += 1,
            None => {
                index.insert(tag, counts.len());
                counts.push(KeywordCount {
                    keyword: tag.to_string(),
                    count: 1,
                });
            }
        }
    }

    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(MAX_KEYWORDS);
    counts
}

/// Join every review's summary, falling back to its free text
pub fn aggregate_summary(reviews: &[Review]) -> String {
    let summaries: Vec<&str> = reviews
        .iter()
        .map(|review| {
            if review.ai_summary.is_empty() {
                review.text_review.as_str()
            } else {
                review.ai_summary.as_str()
            }
        })
        .filter(|text| !text.trim().is_empty())
        .collect();

    match summaries.as_slice() {
        [] => EMPTY_SUMMARY.to_string(),
        [only] => only.to_string(),
        many => many.join("\n\n"),
    }
}

/// Render tags for display as `#tag`
pub fn format_keywords(entries: &[KeywordCount]) -> Vec<String> {
    entries.iter().map(|entry| format!("#{}", entry.keyword)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::test_support::{review_at, review_with};

    #[test]
    fn test_average_of_two_reviews() {
        let mut a = review_at("a", 0.0, 0.0);
        a.overall_safety = 3;
        a.night_lighting = 4;
        let mut b = review_at("b", 0.0, 0.0);
        b.overall_safety = 5;
        b.night_lighting = 1;

        let scores = average_review_scores(&[a, b]);

        assert_eq!(scores.overall_safety, 4.0);
        assert_eq!(scores.night_lighting, 2.5);
        // (4 + 1 + 3 + 5) / 8
        assert_eq!(scores.overall, 1.6);
    }

    #[test]
    fn test_average_rounds_to_one_decimal() {
        let ratings = [1u8, 2, 2];
        let reviews: Vec<_> = ratings
            .iter()
            .map(|&r| {
                let mut review = review_at("x", 0.0, 0.0);
                review.security_status = r;
                review
            })
            .collect();

        assert_eq!(average_review_scores(&reviews).security_status, 1.7);
    }

    #[test]
    fn test_average_of_nothing_is_zero() {
        assert_eq!(average_review_scores(&[]), LocationScores::default());
    }

    #[test]
    fn test_keywords_ranked_by_frequency() {
        let reviews = vec![
            review_with("安全,夜间", "", ""),
            review_with("安全,明亮", "", ""),
            review_with("安全", "", ""),
        ];

        let keywords = aggregate_keywords(&reviews);

        assert_eq!(keywords[0].keyword, "安全");
        assert_eq!(keywords[0].count, 3);
        assert_eq!(keywords.len(), 3);
        // ties keep first-seen order
        assert_eq!(keywords[1].keyword, "夜间");
        assert_eq!(keywords[2].keyword, "明亮");
    }

    #[test]
    fn test_keywords_trimmed_and_case_sensitive() {
        let reviews = vec![review_with(" Lit , lit,, ,Lit", "", "")];

        let keywords = aggregate_keywords(&reviews);

        assert_eq!(keywords.len(), 2);
        assert_eq!(keywords[0], KeywordCount { keyword: "Lit".into(), count: 2 });
        assert_eq!(keywords[1], KeywordCount { keyword: "lit".into(), count: 1 });
    }

    #[test]
    fn test_keywords_capped_at_ten() {
        let tags: Vec<String> = (0..15).map(|i| format!("tag{i}")).collect();
        let reviews = vec![review_with(&tags.join(","), "", "")];

        assert_eq!(aggregate_keywords(&reviews).len(), MAX_KEYWORDS);
    }

    #[test]
    fn test_summary_skips_blank_entries() {
        let reviews = vec![
            review_with("", "", ""),
            review_with("", "", "  "),
            review_with("", "", "good area"),
        ];

        assert_eq!(aggregate_summary(&reviews), "good area");
    }

    #[test]
    fn test_summary_placeholder_when_empty() {
        assert_eq!(aggregate_summary(&[]), EMPTY_SUMMARY);
    }

    #[test]
    fn test_summary_prefers_ai_text_and_joins() {
        let reviews = vec![
            review_with("", "quiet at night", "well lit street"),
            review_with("", "busy market", ""),
        ];

        assert_eq!(aggregate_summary(&reviews), "quiet at night\n\nbusy market");
    }

    #[test]
    fn test_format_keywords_adds_hash() {
        let entries = vec![
            KeywordCount { keyword: "安全".into(), count: 3 },
            KeywordCount { keyword: "lit".into(), count: 1 },
        ];

        assert_eq!(format_keywords(&entries), vec!["#安全", "#lit"]);
        assert!(format_keywords(&[]).is_empty());
    }
}
