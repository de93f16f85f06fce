use std::collections::{BTreeSet, HashMap, HashSet};

use crate::models::{StudyRecord, StudyStatistics, TopicCount};

pub const TOP_TOPIC_LIMIT: usize = 5;

pub fn compute_statistics(records: &[StudyRecord]) -> StudyStatistics {
    if records.is_empty() {
        return StudyStatistics {
            total_days: 0,
            total_hours: 0.0,
            average_hours: 0.0,
            top_topics: Vec::new(),
        };
    }

    let total_days = records.len();
    let total_minutes: u64 = records
        .iter()
        .map(|record| u64::from(record.duration_minutes))
        .sum();
    let exact_hours = total_minutes as f64 / 60.0;

    StudyStatistics {
        total_days,
        total_hours: round_one_decimal(exact_hours),
        average_hours: round_one_decimal(exact_hours / total_days as f64),
        top_topics: top_topics(records, TOP_TOPIC_LIMIT),
    }
}

/// Most frequent topics, counting each topic once per record.
///
/// Ties keep the order in which topics were first seen.
pub fn top_topics(records: &[StudyRecord], limit: usize) -> Vec<TopicCount> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<TopicCount> = Vec::new();

    for record in records {
        let mut seen_in_record: HashSet<&str> = HashSet::new();
        for topic in &record.topics {
            if !seen_in_record.insert(topic.as_str()) {
                continue;
            }
            match positions.get(topic.as_str()) {
                Some(&index) => counts[index].count += 1,
                None => {
                    positions.insert(topic.as_str(), counts.len());
                    counts.push(TopicCount {
                        topic: topic.clone(),
                        count: 1,
                    });
                }
            }
        }
    }

    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(limit);
    counts
}

pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Sorted, de-duplicated topics across all records.
pub fn all_topics(records: &[StudyRecord]) -> Vec<String> {
    records
        .iter()
        .flat_map(|record| record.topics.iter().cloned())
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect()
}

pub fn filter_by_topic<'a>(records: &'a [StudyRecord], topic: Option<&str>) -> Vec<&'a StudyRecord> {
    match topic {
        None => records.iter().collect(),
        Some(wanted) => records
            .iter()
            .filter(|record| record.topics.iter().any(|topic| topic == wanted))
            .collect(),
    }
}

pub fn sort_by_day(records: &mut [StudyRecord]) {
    records.sort_by_key(|record| record.day);
}

/// The record logged on the day after `current`, if any.
pub fn next_by_day<'a>(records: &'a [StudyRecord], current: &StudyRecord) -> Option<&'a StudyRecord> {
    let wanted = current.day.checked_add(1)?;
    records.iter().find(|record| record.day == wanted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn record(day: u32, minutes: u32, topics: &[&str]) -> StudyRecord {
        StudyRecord {
            id: format!("r{day}"),
            day,
            duration_minutes: minutes,
            date: Some(Utc.with_ymd_and_hms(2025, 1, day.min(28), 12, 0, 0).unwrap()),
            topics: topics.iter().map(|topic| topic.to_string()).collect(),
            description: None,
            link: None,
        }
    }

    #[test]
    fn empty_input_yields_zeroes() {
        let stats = compute_statistics(&[]);
        assert_eq!(stats.total_days, 0);
        assert_eq!(stats.total_hours, 0.0);
        assert_eq!(stats.average_hours, 0.0);
        assert!(stats.top_topics.is_empty());
    }

    #[test]
    fn single_ninety_minute_session() {
        let stats = compute_statistics(&[record(1, 90, &[])]);
        assert_eq!(stats.total_days, 1);
        assert_eq!(stats.total_hours, 1.5);
        assert_eq!(stats.average_hours, 1.5);
        assert!(stats.top_topics.is_empty());
    }

    #[test]
    fn totals_round_to_one_decimal() {
        let records = vec![record(1, 50, &["js"]), record(2, 45, &["js"]), record(3, 20, &["css"])];
        let stats = compute_statistics(&records);
        assert_eq!(stats.total_days, 3);
        // 115 minutes
        assert_eq!(stats.total_hours, 1.9);
        assert_eq!(stats.average_hours, 0.6);
    }

    #[test]
    fn topics_count_once_per_record() {
        let records = vec![record(1, 30, &["react", "react", "js"]), record(2, 30, &["react"])];
        let topics = top_topics(&records, 5);
        assert_eq!(
            topics,
            vec![
                TopicCount { topic: "react".to_string(), count: 2 },
                TopicCount { topic: "js".to_string(), count: 1 },
            ]
        );
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let records = vec![
            record(1, 30, &["python", "django"]),
            record(2, 30, &["git", "docker"]),
            record(3, 30, &["docker", "python", "sql", "ai"]),
        ];
        let names: Vec<String> = top_topics(&records, 5)
            .into_iter()
            .map(|entry| entry.topic)
            .collect();
        assert_eq!(names, vec!["python", "docker", "django", "git", "sql"]);
    }

    #[test]
    fn top_topics_sum_never_exceeds_total_topic_slots() {
        let records = vec![
            record(1, 30, &["a", "b", "c"]),
            record(2, 30, &["a", "d", "e", "f"]),
            record(3, 30, &["g"]),
        ];
        let topics = top_topics(&records, TOP_TOPIC_LIMIT);
        let summed: usize = topics.iter().map(|entry| entry.count).sum();
        let slots: usize = records.iter().map(|record| record.topics.len()).sum();
        assert_eq!(topics.len(), 5);
        assert!(summed <= slots);
        let ranked: Vec<(&str, usize)> = topics
            .iter()
            .map(|entry| (entry.topic.as_str(), entry.count))
            .collect();
        assert_eq!(
            ranked,
            vec![("a", 2), ("b", 1), ("c", 1), ("d", 1), ("e", 1)]
        );
    }

    #[test]
    fn catalogue_is_sorted_and_unique() {
        let records = vec![record(1, 30, &["react", "js"]), record(2, 30, &["css", "js"])];
        assert_eq!(all_topics(&records), vec!["css", "js", "react"]);
    }

    #[test]
    fn filters_by_topic() {
        let records = vec![record(1, 30, &["react"]), record(2, 30, &["css"])];
        assert_eq!(filter_by_topic(&records, None).len(), 2);
        let filtered = filter_by_topic(&records, Some("css"));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].day, 2);
    }

    #[test]
    fn next_record_follows_day_numbers() {
        let mut records = vec![record(3, 30, &["a"]), record(1, 30, &["a"]), record(2, 30, &["a"])];
        sort_by_day(&mut records);
        assert_eq!(records.iter().map(|r| r.day).collect::<Vec<_>>(), vec![1, 2, 3]);

        let next = next_by_day(&records, &records[1]).unwrap();
        assert_eq!(next.day, 3);
        assert!(next_by_day(&records, &records[2]).is_none());
    }
}
