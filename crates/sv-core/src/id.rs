//! Node identifiers: an interned tag plus a process-wide serial.

use lasso::{Spur, ThreadedRodeo};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Tag names only. Bounded by the vocabulary of loaded documents, not by
/// how many nodes they hold.
static TAGS: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);
static NEXT_SERIAL: AtomicU64 = AtomicU64::new(0);

/// Stable identifier for a node of a loaded document.
///
/// Minted once per node while the arena is built (`rect_3`, `text_7`) and
/// never reused, so tables keyed by it outlive selections and re-renders.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    tag: Spur,
    serial: u64,
}

impl NodeId {
    /// A new, never-before-seen id named after `tag`. Characters that are
    /// not ASCII alphanumerics become `_`.
    pub fn fresh(tag: &str) -> Self {
        let serial = NEXT_SERIAL.fetch_add(1, Ordering::Relaxed);
        let tag: String = tag
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        Self {
            tag: TAGS.get_or_intern(tag),
            serial,
        }
    }

    /// The id spelled `name` (as printed by `Display`), only if one with
    /// that tag and serial could have been minted.
    pub fn lookup(name: &str) -> Option<Self> {
        let (tag, digits) = name.rsplit_once('_')?;
        let serial: u64 = digits.parse().ok()?;
        if serial.to_string() != digits || serial >= NEXT_SERIAL.load(Ordering::Relaxed) {
            return None;
        }
        Some(Self {
            tag: TAGS.get(tag)?,
            serial,
        })
    }

    pub fn tag(&self) -> &'static str {
        TAGS.resolve(&self.tag)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({self})")
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.tag(), self.serial)
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Self::lookup(&name).ok_or_else(|| D::Error::custom(format!("unknown node id {name:?}")))
    }
}
