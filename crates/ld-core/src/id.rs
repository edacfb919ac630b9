//! Interned primitive identifiers.

use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

static PRIMITIVE_NAMES: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);
static NEXT_GENERATED: AtomicU64 = AtomicU64::new(0);

/// Name of a scene primitive: a host path, a segment, a marker, a guide.
/// Copy and hashable as a 4-byte `Spur`; the name is resolved on demand.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrimitiveId(Spur);

impl PrimitiveId {
    pub fn intern(name: &str) -> Self {
        PrimitiveId(PRIMITIVE_NAMES.get_or_intern(name))
    }

    pub fn as_str(&self) -> &str {
        PRIMITIVE_NAMES.resolve(&self.0)
    }

    /// A fresh `{role}_{n}` name. Skips names the host already interned, so
    /// editor-made primitives never alias a document primitive.
    pub fn with_prefix(role: &str) -> Self {
        loop {
            let n = NEXT_GENERATED.fetch_add(1, Ordering::Relaxed);
            let name = format!("{role}_{n}");
            if PRIMITIVE_NAMES.get(name.as_str()).is_none() {
                return Self::intern(&name);
            }
        }
    }
}

impl From<&str> for PrimitiveId {
    fn from(name: &str) -> Self {
        Self::intern(name)
    }
}

impl AsRef<str> for PrimitiveId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Debug for PrimitiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for PrimitiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PrimitiveId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PrimitiveId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = Cow::<'de, str>::deserialize(deserializer)?;
        Ok(Self::intern(&name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_name_same_id() {
        let a = PrimitiveId::intern("outline");
        let b = PrimitiveId::from("outline");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "outline");
        assert_eq!(format!("{a:?}"), "#outline");
    }

    #[test]
    fn generated_names_are_unique() {
        let a = PrimitiveId::with_prefix("marker");
        let b = PrimitiveId::with_prefix("marker");
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("marker_"));
    }

    #[test]
    fn generated_names_skip_host_names() {
        let next = NEXT_GENERATED.load(Ordering::Relaxed);
        let taken = PrimitiveId::intern(&format!("taken_{next}"));
        let fresh = PrimitiveId::with_prefix("taken");
        assert_ne!(fresh, taken);
    }
}
