//! Tag-string handling and frequency ranking.
//!
//! Tags live in a single comma-delimited column, so splitting, trimming and
//! counting happen here rather than in SQL.

/// Splits a raw tag string on commas, trimming whitespace and dropping
/// empty fragments. Duplicates within one string are kept; callers that
/// need a set dedupe themselves.
pub fn split_tags(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|t| !t.is_empty())
}

/// Frequency counter over free-text labels. Labels are remembered in
/// first-seen order, which doubles as the tie-break when ranking.
#[derive(Debug, Default)]
pub struct LabelCounter {
    counts: Vec<(String, u64)>,
}

impl LabelCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, label: &str) {
        match self.counts.iter_mut().find(|(seen, _)| seen == label) {
            Some((_, count)) => *count += 1,
            None => self.counts.push((label.to_string(), 1)),
        }
    }

    pub fn observe_tag_string(&mut self, raw: &str) {
        for tag in split_tags(raw) {
            self.observe(tag);
        }
    }

    /// Labels sorted descending by count, truncated to `limit`. The sort is
    /// stable, so equal counts come out in first-seen order.
    pub fn into_ranked(self, limit: usize) -> Vec<String> {
        let mut counts = self.counts;
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts.truncate(limit);
        counts.into_iter().map(|(label, _)| label).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_trims_and_drops_empty_fragments() {
        let tags: Vec<_> = split_tags(" rust , web,, async ,").collect();
        assert_eq!(tags, vec!["rust", "web", "async"]);
    }

    #[test]
    fn ranked_by_count_descending() {
        let mut counter = LabelCounter::new();
        counter.observe_tag_string("a,b");
        counter.observe_tag_string("a,c");
        counter.observe_tag_string("a,b");

        assert_eq!(counter.into_ranked(2), vec!["a", "b"]);
    }

    #[test]
    fn ties_break_by_first_seen_order() {
        let mut counter = LabelCounter::new();
        counter.observe_tag_string("zeta,alpha");
        counter.observe_tag_string("zeta,alpha");

        assert_eq!(counter.into_ranked(10), vec!["zeta", "alpha"]);
    }

    #[test]
    fn truncates_to_limit() {
        let mut counter = LabelCounter::new();
        counter.observe_tag_string("a,b,c,d");

        assert_eq!(counter.into_ranked(2).len(), 2);
    }

    #[test]
    fn empty_counter_ranks_empty() {
        assert!(LabelCounter::new().into_ranked(5).is_empty());
    }
}
