//! Topic namespaces and the positional parser for both buses.
//!
//! ```text
//! Device bus   homie/<deviceId>/<property>/<attribute>
//!              [0]   [1]        [2]        [3]
//! Hub bus      /hooks/devices/<deviceId>/<command>/<action>
//!              [0][1]  [2]     [3]        [4]       [5]
//! ```
//!
//! Levels are validated before they are read, so a short or long topic
//! becomes a [`TopicParseError`] instead of an out-of-range access.

use crate::error::TopicParseError;

/// Root of the device-oriented (Homie) bus.
pub const DEVICE_BUS_PREFIX: &str = "homie/";

/// Root of the hub-oriented bus.
pub const HUB_BUS_PREFIX: &str = "/hooks/devices/";

/// Levels after the prefix: device id plus a two-level command key.
const ADDRESS_LEVELS: usize = 3;

/// Which bus a topic belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    DeviceBus,
    HubBus,
}

impl Namespace {
    /// Classify a topic by its prefix. The prefixes are disjoint.
    pub fn of(topic: &str) -> Option<Self> {
        if topic.starts_with(DEVICE_BUS_PREFIX) {
            Some(Self::DeviceBus)
        } else if topic.starts_with(HUB_BUS_PREFIX) {
            Some(Self::HubBus)
        } else {
            None
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            Self::DeviceBus => DEVICE_BUS_PREFIX,
            Self::HubBus => HUB_BUS_PREFIX,
        }
    }

    /// Number of `/`-separated levels the prefix itself contributes.
    fn prefix_levels(&self) -> usize {
        match self {
            Self::DeviceBus => 1,
            Self::HubBus => 3,
        }
    }

    /// Total level count of a well-formed topic in this namespace.
    pub fn level_count(&self) -> usize {
        self.prefix_levels() + ADDRESS_LEVELS
    }

    /// Direction a message travels when it arrives on this namespace.
    pub fn direction(&self) -> Direction {
        match self {
            Self::DeviceBus => Direction::DeviceToHub,
            Self::HubBus => Direction::HubToDevice,
        }
    }
}

/// Translation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    DeviceToHub,
    HubToDevice,
}

impl Direction {
    /// Prefix of the bus the translated topic is published on.
    pub fn target_prefix(&self) -> &'static str {
        match self {
            Self::DeviceToHub => HUB_BUS_PREFIX,
            Self::HubToDevice => DEVICE_BUS_PREFIX,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DeviceToHub => write!(f, "device->hub"),
            Self::HubToDevice => write!(f, "hub->device"),
        }
    }
}

/// A topic split into the parts the translator needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTopic<'a> {
    pub direction: Direction,
    /// Device identity as seen on the inbound bus.
    pub device_id: &'a str,
    /// The two trailing levels joined with `/`, e.g. `temperature/degrees`.
    pub command_key: &'a str,
}

/// Parse an inbound topic from either bus.
pub fn parse_topic(topic: &str) -> Result<ParsedTopic<'_>, TopicParseError> {
    let namespace =
        Namespace::of(topic).ok_or_else(|| TopicParseError::UnknownNamespace(topic.to_string()))?;

    let rest = &topic[namespace.prefix().len()..];
    let levels: Vec<&str> = rest.split('/').collect();
    if levels.len() != ADDRESS_LEVELS {
        return Err(TopicParseError::SegmentCount {
            expected: namespace.level_count(),
            found: namespace.prefix_levels() + levels.len(),
        });
    }
    if let Some(idx) = levels.iter().position(|level| level.is_empty()) {
        return Err(TopicParseError::EmptySegment(namespace.prefix_levels() + idx));
    }

    let device_id = levels[0];
    Ok(ParsedTopic {
        direction: namespace.direction(),
        device_id,
        command_key: &rest[device_id.len() + 1..],
    })
}

/// Indexed dump of every level, e.g. `[1] 5ccf7fd3945b`.
pub fn levels(topic: &str) -> impl Iterator<Item = String> + '_ {
    topic
        .split('/')
        .enumerate()
        .map(|(idx, level)| format!("[{}] {}", idx, level))
}
