use ingest::DatasetSummary;
use yelp_core::{Cap, ChartSpec, RecordKind, group_thousands};

use crate::tables::{MIN_CATEGORY_BUSINESSES, top_categories_by_average_stars};

fn chart(number: u8, slug: &str, title: impl Into<String>) -> ChartSpec {
    ChartSpec::new(format!("{number:02}_{slug}.png"), title)
}

fn processed(summary: &DatasetSummary, kind: RecordKind) -> String {
    group_thousands(summary.pass(kind).map_or(0, |stats| stats.processed))
}

fn cap_note(summary: &DatasetSummary, kind: RecordKind) -> String {
    summary.pass(kind).map_or(Cap::Skip, |stats| stats.cap).note()
}

/// Chart descriptors for every figure whose accumulator has data, in figure order.
pub fn plan_charts(summary: &DatasetSummary, top_n: usize) -> Vec<ChartSpec> {
    let mut specs = Vec::new();
    plan_business(summary, top_n, &mut specs);
    plan_checkins(summary, &mut specs);
    plan_reviews(summary, &mut specs);
    plan_users(summary, &mut specs);
    plan_tips(summary, &mut specs);
    plan_photos(summary, &mut specs);
    specs
}

fn plan_business(summary: &DatasetSummary, top_n: usize, specs: &mut Vec<ChartSpec>) {
    let business = &summary.business;
    let selected = group_thousands(summary.selected_businesses as u64);

    if !business.stars.is_empty() {
        specs.push(
            chart(
                1,
                "business_star_distribution",
                "What is the distribution of business star ratings?",
            )
            .with_notes(format!("{selected} businesses")),
        );
    }
    if !business.review_counts.is_empty() {
        specs.push(chart(
            2,
            "business_reviewcount_distribution",
            "What is the distribution of business review counts? (symlog scale)",
        ));
    }
    if !business.open_counts.is_empty() {
        specs.push(chart(
            3,
            "open_vs_closed",
            "What share of businesses are marked open vs closed?",
        ));
    }
    if !business.stars.is_empty() && !business.review_counts.is_empty() {
        specs.push(chart(
            4,
            "reviewcount_vs_stars_hexbin",
            "How do star ratings vary with review count? (hexbin; log x)",
        ));
    }
    if !business.categories_per_business.is_empty() {
        specs.push(chart(
            5,
            "categories_per_business",
            "How many categories are listed per business?",
        ));
    }

    let top_categories = business.category_counts.most_common(Some(top_n));
    if !top_categories.is_empty() {
        specs.push(chart(
            6,
            "top_categories_by_count",
            format!(
                "Which categories appear most often? (Top {} by business count)",
                top_categories.len()
            ),
        ));
    }
    let by_stars = top_categories_by_average_stars(business, MIN_CATEGORY_BUSINESSES, top_n);
    if !by_stars.is_empty() {
        specs.push(
            chart(
                7,
                "top_categories_by_avg_stars",
                format!(
                    "Which categories have the highest average star rating? (≥{MIN_CATEGORY_BUSINESSES} businesses; top {})",
                    by_stars.len()
                ),
            )
            .with_notes(format!(
                "filtered to categories with ≥{MIN_CATEGORY_BUSINESSES} businesses"
            )),
        );
    }
    let top_cities = business.city_state_counts.most_common(Some(top_n));
    if !top_cities.is_empty() {
        specs.push(chart(
            8,
            "top_cities",
            format!(
                "Which cities have the most businesses? (Top {} city+state pairs)",
                top_cities.len()
            ),
        ));
    }
    if !business.state_counts.is_empty() {
        let shown = business.state_counts.len().min(top_n);
        specs.push(chart(
            9,
            "top_states",
            format!(
                "Which states/provinces have the most businesses? (Top {shown} by business count)"
            ),
        ));
        specs.push(chart(
            10,
            "country_distribution",
            "How are businesses split across Canada, the U.S., and other? (from state code)",
        ));
    }
    if business.located > 0 {
        specs.push(
            chart(
                11,
                "location_density_hexbin",
                "Where are businesses located geographically? (latitude/longitude density)",
            )
            .with_notes(format!(
                "hexbin over lat/long; {} businesses located",
                group_thousands(business.located)
            )),
        );
    }
    if summary.selected_businesses > 0 {
        specs.push(chart(
            12,
            "business_missingness",
            "Which key business fields are most often missing?",
        ));
    }
    if !business.days_open_counts.is_empty() {
        specs.push(
            chart(
                13,
                "days_open_per_week",
                "How many days per week do businesses report hours? (0–7 days listed)",
            )
            .with_notes("0 = missing `hours`"),
        );
    }

    let priced: u64 = business
        .price_range_counts
        .iter()
        .filter(|(price, _)| (1..=4).contains(*price))
        .map(|(_, count)| count)
        .sum();
    if priced > 0 {
        specs.push(
            chart(
                14,
                "price_range_distribution",
                "What price ranges do restaurants report? (RestaurantsPriceRange2, 1–4)",
            )
            .with_notes(format!(
                "{} businesses with price range",
                group_thousands(priced)
            )),
        );
    }
    if !business.stars_by_price.is_empty() {
        specs.push(chart(
            15,
            "stars_by_price_range_violin",
            "How do star ratings vary by restaurant price range?",
        ));
    }
    if !business.stars_open.is_empty() || !business.stars_closed.is_empty() {
        specs.push(chart(
            16,
            "stars_by_open_status",
            "Do open vs closed businesses differ in star ratings?",
        ));
    }
}

fn plan_checkins(summary: &DatasetSummary, specs: &mut Vec<ChartSpec>) {
    let total = summary.checkins.matrix.total();
    if total == 0 {
        return;
    }
    specs.push(
        chart(
            17,
            "checkins_heatmap",
            "When do check-ins happen? (day-of-week × hour heatmap)",
        )
        .with_notes(format!("{} check-ins (filtered)", group_thousands(total))),
    );
    specs.push(chart(
        18,
        "checkins_by_day",
        "Which days of the week have the most check-ins?",
    ));
    specs.push(chart(
        19,
        "checkins_by_hour",
        "At what hours of the day do check-ins peak?",
    ));
}

fn plan_reviews(summary: &DatasetSummary, specs: &mut Vec<ChartSpec>) {
    let reviews = &summary.reviews;
    if !reviews.month_counts.is_empty() {
        specs.push(
            chart(
                20,
                "reviews_over_time",
                "How has review volume changed over time? (reviews per month)",
            )
            .with_notes(format!(
                "{} reviews (filtered; {})",
                processed(summary, RecordKind::Review),
                cap_note(summary, RecordKind::Review)
            )),
        );
    }
    if !reviews.star_counts.is_empty() {
        specs.push(chart(
            21,
            "review_star_distribution",
            "What is the distribution of review star ratings?",
        ));
    }
    if let Some(p99) = reviews.lengths.quantile(0.99) {
        specs.push(
            chart(
                22,
                "review_length_distribution",
                "How long are reviews? (characters; 99th percentile clipped)",
            )
            .with_notes(format!(
                "clipped at p99={} chars",
                group_thousands(p99.round() as u64)
            )),
        );
    }
    if !reviews.lengths_by_star.is_empty() {
        specs.push(chart(
            23,
            "review_length_by_stars",
            "How does review length vary by star rating?",
        ));
    }
    let vote_clip = [&reviews.useful, &reviews.funny, &reviews.cool]
        .into_iter()
        .filter_map(|votes| votes.quantile(0.995))
        .reduce(f64::max);
    if let Some(clip) = vote_clip {
        specs.push(
            chart(
                24,
                "review_votes_boxplot",
                "How do 'useful', 'funny', and 'cool' votes compare per review?",
            )
            .with_notes(format!(
                "clipped at p99.5={} votes",
                group_thousands(clip.round() as u64)
            )),
        );
    }
}

fn plan_users(summary: &DatasetSummary, specs: &mut Vec<ChartSpec>) {
    let users = &summary.users;
    if !users.join_year_counts.is_empty() {
        specs.push(
            chart(
                25,
                "user_join_years",
                "When did users join Yelp? (join year from yelping_since)",
            )
            .with_notes(format!(
                "{} users ({})",
                processed(summary, RecordKind::User),
                cap_note(summary, RecordKind::User)
            )),
        );
    }
    if !users.review_counts.is_empty() {
        specs.push(chart(
            26,
            "user_reviewcount_distribution",
            "What is the distribution of user review counts? (symlog scale)",
        ));
    }
    if !users.fans.is_empty() {
        specs.push(chart(
            27,
            "user_fans_distribution",
            "What is the distribution of user fan counts? (symlog scale)",
        ));
    }
    if !users.average_stars.is_empty() {
        specs.push(chart(
            28,
            "user_average_stars_distribution",
            "What is the distribution of users' average star ratings?",
        ));
    }
}

fn plan_tips(summary: &DatasetSummary, specs: &mut Vec<ChartSpec>) {
    let tips = &summary.tips;
    if !tips.month_counts.is_empty() {
        specs.push(
            chart(
                29,
                "tips_over_time",
                "How has tip volume changed over time? (tips per month)",
            )
            .with_notes(format!(
                "{} tips ({})",
                processed(summary, RecordKind::Tip),
                cap_note(summary, RecordKind::Tip)
            )),
        );
    }
    if !tips.compliments.is_empty() {
        specs.push(chart(
            30,
            "tip_compliments_distribution",
            "What is the distribution of tip compliment counts? (symlog scale)",
        ));
    }
}

fn plan_photos(summary: &DatasetSummary, specs: &mut Vec<ChartSpec>) {
    if !summary.photos.label_counts.is_empty() {
        specs.push(
            chart(
                31,
                "photo_label_distribution",
                "What photo labels are present in the dataset? (photo.json)",
            )
            .with_notes(format!(
                "{} photos ({})",
                processed(summary, RecordKind::Photo),
                cap_note(summary, RecordKind::Photo)
            )),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::summary_fixture;

    #[test]
    fn plans_business_charts_only_when_other_passes_are_empty() {
        let mut summary = summary_fixture();
        summary.reviews = Default::default();
        summary.checkins = Default::default();
        summary.users = Default::default();
        summary.tips = Default::default();
        summary.photos = Default::default();

        let specs = plan_charts(&summary, 20);
        let names: Vec<&str> = specs.iter().map(|spec| spec.filename.as_str()).collect();
        assert!(names.contains(&"01_business_star_distribution.png"));
        assert!(names.contains(&"10_country_distribution.png"));
        assert!(!names.contains(&"07_top_categories_by_avg_stars.png"));
        assert!(names.iter().all(|name| name[..2].parse::<u8>().expect("number") <= 16));
    }

    #[test]
    fn numbers_are_ordered_and_notes_carry_caps() {
        let summary = summary_fixture();
        let specs = plan_charts(&summary, 1);
        let numbers: Vec<u8> = specs
            .iter()
            .map(|spec| spec.filename[..2].parse().expect("number"))
            .collect();
        let mut sorted = numbers.clone();
        sorted.sort();
        assert_eq!(numbers, sorted);

        let reviews = specs
            .iter()
            .find(|spec| spec.filename == "20_reviews_over_time.png")
            .expect("reviews chart");
        assert_eq!(
            reviews.notes.as_deref(),
            Some("2 reviews (filtered; cap=2)")
        );
        let heatmap = specs
            .iter()
            .find(|spec| spec.filename == "17_checkins_heatmap.png")
            .expect("heatmap");
        assert_eq!(heatmap.notes.as_deref(), Some("2 check-ins (filtered)"));
        let states = specs
            .iter()
            .find(|spec| spec.filename == "09_top_states.png")
            .expect("states");
        assert!(states.title.contains("Top 1 "));
    }
}
