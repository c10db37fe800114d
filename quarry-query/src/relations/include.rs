//! Include specifications for eager loading associations.

/// Specification for eager loading one association, with nested includes.
///
/// Include specs form a forest: each spec owns its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeSpec {
    /// Name of the association to include.
    pub name: String,
    /// Nested includes, loaded on the fetched children.
    pub nested: Vec<IncludeSpec>,
}

impl IncludeSpec {
    /// Create a new include spec for an association.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nested: Vec::new(),
        }
    }

    /// Create a spec with nested includes in one go.
    pub fn with_nested<I: Into<IncludeSpec>>(
        name: impl Into<String>,
        nested: impl IntoIterator<Item = I>,
    ) -> Self {
        Self {
            name: name.into(),
            nested: nested.into_iter().map(Into::into).collect(),
        }
    }

    /// Include a nested association.
    pub fn include(mut self, nested: impl Into<IncludeSpec>) -> Self {
        self.nested.push(nested.into());
        self
    }

    /// Check if there are nested includes.
    pub fn has_nested(&self) -> bool {
        !self.nested.is_empty()
    }

    /// Add `spec` to `forest`, unioning its nested includes into an existing
    /// spec of the same name.
    pub fn merge_into(forest: &mut Vec<IncludeSpec>, spec: IncludeSpec) {
        match forest.iter_mut().find(|existing| existing.name == spec.name) {
            Some(existing) => {
                for nested in spec.nested {
                    Self::merge_into(&mut existing.nested, nested);
                }
            }
            None => forest.push(spec),
        }
    }

    /// Merge same-named specs at every level, keeping first-seen order.
    pub fn merged(specs: impl IntoIterator<Item = IncludeSpec>) -> Vec<IncludeSpec> {
        let mut forest = Vec::new();
        for spec in specs {
            Self::merge_into(&mut forest, spec);
        }
        forest
    }

    /// Depth of this spec (1 for a bare name).
    pub fn depth(&self) -> usize {
        1 + self.nested.iter().map(IncludeSpec::depth).max().unwrap_or(0)
    }
}

impl From<&str> for IncludeSpec {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for IncludeSpec {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<(&str, Vec<IncludeSpec>)> for IncludeSpec {
    fn from((name, nested): (&str, Vec<IncludeSpec>)) -> Self {
        Self::with_nested(name, nested)
    }
}

impl<const N: usize> From<(&str, [&str; N])> for IncludeSpec {
    fn from((name, nested): (&str, [&str; N])) -> Self {
        Self::with_nested(name, nested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_include_spec_nesting() {
        let spec = IncludeSpec::new("posts").include(("comments", ["author"]));
        assert!(spec.has_nested());
        assert_eq!(spec.nested[0].name, "comments");
        assert_eq!(spec.depth(), 3);
    }

    #[test]
    fn test_merge_unions_nested() {
        let forest = IncludeSpec::merged([
            IncludeSpec::from(("posts", ["comments"])),
            IncludeSpec::from("profile"),
            IncludeSpec::from(("posts", ["tags", "comments"])),
        ]);
        assert_eq!(forest.len(), 2);
        assert_eq!(forest[0].name, "posts");
        let nested: Vec<&str> = forest[0].nested.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(nested, vec!["comments", "tags"]);
        assert_eq!(forest[1].name, "profile");
    }

    #[test]
    fn test_bare_name() {
        let spec = IncludeSpec::from("posts");
        assert!(!spec.has_nested());
        assert_eq!(spec.depth(), 1);
    }
}
