//! MQTT topic filters used for the fixed subscription set.

use crate::error::FilterError;

/// Single-level wildcard.
const SINGLE_LEVEL: &str = "+";
/// Multi-level wildcard.
const MULTI_LEVEL: &str = "#";

/// Subscriptions the bridge makes when none are configured.
pub const DEFAULT_SUBSCRIPTIONS: &[&str] = &[
    "homie/+/temperature/degrees",
    "homie/+/humidity/relative",
    "/hooks/devices/+/LED/on",
];

/// A validated MQTT topic filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopicFilter {
    filter: String,
}

impl TopicFilter {
    /// Validate a filter string.
    pub fn parse(filter: impl Into<String>) -> Result<Self, FilterError> {
        let filter = filter.into();
        if filter.is_empty() {
            return Err(FilterError::Empty);
        }

        let levels: Vec<&str> = filter.split('/').collect();
        let last = levels.len() - 1;
        for (idx, level) in levels.iter().enumerate() {
            let has_wildcard = level.contains(['+', '#']);
            if has_wildcard && *level != SINGLE_LEVEL && *level != MULTI_LEVEL {
                return Err(FilterError::PartialWildcard(idx));
            }
            if *level == MULTI_LEVEL && idx != last {
                return Err(FilterError::MisplacedMultiLevel);
            }
        }

        Ok(Self { filter })
    }

    pub fn as_str(&self) -> &str {
        &self.filter
    }

    /// Whether `topic` would be delivered to a subscriber of this filter.
    pub fn matches(&self, topic: &str) -> bool {
        let mut topic_levels = topic.split('/');
        for level in self.filter.split('/') {
            if level == MULTI_LEVEL {
                return true;
            }
            match topic_levels.next() {
                Some(_) if level == SINGLE_LEVEL => {}
                Some(actual) if actual == level => {}
                _ => return false,
            }
        }
        topic_levels.next().is_none()
    }
}

impl std::fmt::Display for TopicFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.filter)
    }
}

/// The default subscription set as validated filters.
pub fn default_filters() -> Vec<TopicFilter> {
    DEFAULT_SUBSCRIPTIONS
        .iter()
        .map(|filter| TopicFilter {
            filter: (*filter).to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_subscriptions_are_valid() {
        for filter in DEFAULT_SUBSCRIPTIONS {
            assert!(TopicFilter::parse(*filter).is_ok(), "{}", filter);
        }
        assert_eq!(default_filters().len(), DEFAULT_SUBSCRIPTIONS.len());
    }

    #[test]
    fn test_invalid_filters() {
        assert_eq!(TopicFilter::parse(""), Err(FilterError::Empty));
        assert_eq!(
            TopicFilter::parse("homie/dev+/temperature"),
            Err(FilterError::PartialWildcard(1))
        );
        assert_eq!(
            TopicFilter::parse("homie/#/degrees"),
            Err(FilterError::MisplacedMultiLevel)
        );
        assert_eq!(TopicFilter::parse("homie/a#"), Err(FilterError::PartialWildcard(1)));
    }

    #[test]
    fn test_single_level_match() {
        let filter = TopicFilter::parse("homie/+/temperature/degrees").unwrap();
        assert!(filter.matches("homie/5ccf7fd3945b/temperature/degrees"));
        assert!(!filter.matches("homie/5ccf7fd3945b/humidity/relative"));
        assert!(!filter.matches("homie/5ccf7fd3945b/temperature/degrees/set"));
        assert!(!filter.matches("homie/5ccf7fd3945b/temperature"));
    }

    #[test]
    fn test_leading_slash_match() {
        let filter = TopicFilter::parse("/hooks/devices/+/LED/on").unwrap();
        assert!(filter.matches("/hooks/devices/17/LED/on"));
        assert!(!filter.matches("hooks/devices/17/LED/on"));
        assert!(!filter.matches("/hooks/devices/17/dht/temp"));
    }

    #[test]
    fn test_multi_level_match() {
        let filter = TopicFilter::parse("homie/#").unwrap();
        assert!(filter.matches("homie/5ccf7fd3945b/temperature/degrees"));
        assert!(filter.matches("homie/5ccf7fd3945b/switch/on/set"));
        assert!(!filter.matches("/hooks/devices/17/LED/on"));

        let all = TopicFilter::parse("#").unwrap();
        assert!(all.matches("some/other/topic"));
    }
}
