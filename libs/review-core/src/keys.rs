//! Storage key layout and profile namespacing.
//!
//! ```text
//! <ns>:review:<itemId>                          legacy
//! <ns>:review_<itemId>_<direction>              enhanced (v2)
//! <ns>:<profileId>:review_<itemId>_<direction>  profiled (v3)
//! ```

use crate::generation::Generation;
use crate::types::Direction;
use std::cell::RefCell;

/// Resolves logical keys into profile-scoped storage keys.
pub trait ProfileKeyResolver {
    /// Application namespace every key starts with.
    fn namespace(&self) -> &str;

    /// Fully qualified key for `logical_key`, scoped to `profile_id` or the active profile.
    fn namespaced_key(&self, logical_key: &str, profile_id: Option<&str>) -> String;

    /// Currently active profile.
    fn active_profile_id(&self) -> String;
}

/// Default resolver: `<namespace>:<profile>:<logical>` with a switchable active profile.
#[derive(Debug)]
pub struct NamespacedProfiles {
    namespace: String,
    active: RefCell<String>,
}

impl NamespacedProfiles {
    pub fn new(namespace: impl Into<String>, active_profile: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            active: RefCell::new(active_profile.into()),
        }
    }

    /// Make `profile_id` the active profile.
    pub fn switch_profile(&self, profile_id: impl Into<String>) {
        let profile_id = profile_id.into();
        tracing::info!(profile = %profile_id, "switched active profile");
        *self.active.borrow_mut() = profile_id;
    }
}

impl ProfileKeyResolver for NamespacedProfiles {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn namespaced_key(&self, logical_key: &str, profile_id: Option<&str>) -> String {
        match profile_id {
            Some(profile) => format!("{}:{}:{}", self.namespace, profile, logical_key),
            None => format!("{}:{}:{}", self.namespace, self.active.borrow(), logical_key),
        }
    }

    fn active_profile_id(&self) -> String {
        self.active.borrow().clone()
    }
}

/// A parsed review-record key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewKey {
    Legacy {
        item_id: String,
    },
    Enhanced {
        item_id: String,
        direction: Direction,
    },
    Profiled {
        profile_id: String,
        item_id: String,
        direction: Direction,
    },
}

impl ReviewKey {
    /// Profile-independent part of a v2/v3 key: `review_<itemId>_<direction>`.
    pub fn logical(item_id: &str, direction: Direction) -> String {
        format!("review_{}_{}", item_id, direction.as_str())
    }

    /// Render the full storage key under `namespace`.
    pub fn render(&self, namespace: &str) -> String {
        match self {
            Self::Legacy { item_id } => format!("{}:review:{}", namespace, item_id),
            Self::Enhanced { item_id, direction } => {
                format!("{}:{}", namespace, Self::logical(item_id, *direction))
            }
            Self::Profiled {
                profile_id,
                item_id,
                direction,
            } => format!("{}:{}:{}", namespace, profile_id, Self::logical(item_id, *direction)),
        }
    }

    /// Parse a storage key. Returns `None` for keys outside the namespace or
    /// keys that are not review records.
    ///
    /// The profiled shape is tried first, so a profile named `review` is not
    /// mistaken for a legacy key.
    pub fn parse(namespace: &str, key: &str) -> Option<Self> {
        let rest = key.strip_prefix(namespace)?.strip_prefix(':')?;

        if let Some((profile_id, tail)) = rest.split_once(':') {
            let logical = tail.strip_prefix("review_").and_then(parse_logical);
            if let (false, Some((item_id, direction))) = (profile_id.is_empty(), logical) {
                return Some(Self::Profiled {
                    profile_id: profile_id.to_string(),
                    item_id,
                    direction,
                });
            }
        }

        if let Some(item_id) = rest.strip_prefix("review:") {
            if item_id.is_empty() {
                return None;
            }
            return Some(Self::Legacy {
                item_id: item_id.to_string(),
            });
        }

        let (item_id, direction) = parse_logical(rest.strip_prefix("review_")?)?;
        Some(Self::Enhanced { item_id, direction })
    }

    pub fn item_id(&self) -> &str {
        match self {
            Self::Legacy { item_id }
            | Self::Enhanced { item_id, .. }
            | Self::Profiled { item_id, .. } => item_id,
        }
    }

    pub fn direction(&self) -> Option<Direction> {
        match self {
            Self::Legacy { .. } => None,
            Self::Enhanced { direction, .. } | Self::Profiled { direction, .. } => Some(*direction),
        }
    }

    /// Record generation implied by the key shape.
    pub fn generation(&self) -> Generation {
        match self {
            Self::Legacy { .. } => Generation::Legacy,
            Self::Enhanced { .. } => Generation::Enhanced,
            Self::Profiled { .. } => Generation::Profiled,
        }
    }

    /// Whether this key belongs to `profile_id`.
    pub fn is_owned_by(&self, profile_id: &str) -> bool {
        matches!(self, Self::Profiled { profile_id: owner, .. } if owner == profile_id)
    }
}

fn parse_logical(logical: &str) -> Option<(String, Direction)> {
    let (item_id, direction) = logical.rsplit_once('_')?;
    if item_id.is_empty() {
        return None;
    }
    Some((item_id.to_string(), Direction::from_str(direction)?))
}
