/// A target-side tag, generic over the identifier type.
///
/// Arr-style targets address tags by numeric id, label-style targets by the
/// label string itself; everything downstream of resolution works against
/// this one shape.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Tag<T> {
    pub id: T,
    pub name: String,
}

impl<T> Tag<T> {
    pub fn new(id: T, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl<T: std::fmt::Display> std::fmt::Display for Tag<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}
