//! Model registry: model name to table and association metadata.
//!
//! The registry is built once, validated, and read-only afterward. Share it
//! behind an `Arc`; concurrent reads need no locking.

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::debug;

use super::spec::{AssociationMeta, ModelMeta};
use crate::error::{QueryError, QueryResult};

/// Immutable table of registered models.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: IndexMap<String, ModelMeta>,
}

impl ModelRegistry {
    /// Start declaring models.
    pub fn builder() -> ModelRegistryBuilder {
        ModelRegistryBuilder::default()
    }

    /// Look up a model, failing with a not-found error for unknown names.
    pub fn resolve(&self, model: &str) -> QueryResult<&ModelMeta> {
        self.models
            .get(model)
            .ok_or_else(|| QueryError::model_not_registered(model))
    }

    /// Look up an association declared on `model`.
    pub fn association(&self, model: &str, name: &str) -> QueryResult<&AssociationMeta> {
        self.resolve(model)?
            .get_association(name)
            .ok_or_else(|| QueryError::invalid_include(model, name))
    }

    /// Check if a model is registered.
    pub fn contains(&self, model: &str) -> bool {
        self.models.contains_key(model)
    }

    /// Registered model names, in registration order.
    pub fn model_names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    /// Number of registered models.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Check if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

/// Collects model declarations and validates them in [`build`](Self::build).
#[derive(Debug, Default)]
pub struct ModelRegistryBuilder {
    models: IndexMap<String, ModelMeta>,
    duplicates: Vec<String>,
}

impl ModelRegistryBuilder {
    /// Register a model under `name`.
    pub fn register(mut self, name: impl Into<String>, meta: ModelMeta) -> Self {
        let name = name.into();
        if self.models.contains_key(&name) {
            self.duplicates.push(name);
        } else {
            self.models.insert(name, meta);
        }
        self
    }

    /// Validate the declarations and freeze them.
    pub fn build(self) -> QueryResult<ModelRegistry> {
        if let Some(name) = self.duplicates.first() {
            return Err(QueryError::configuration(format!(
                "model {} is registered more than once",
                name
            ))
            .with_model(name));
        }

        for (model, meta) in &self.models {
            let mut seen = HashSet::new();
            for association in &meta.associations {
                if !seen.insert(association.name.as_str()) {
                    return Err(QueryError::configuration(format!(
                        "{} declares association {} more than once",
                        model, association.name
                    ))
                    .with_model(model)
                    .with_field(&association.name));
                }
                if !self.models.contains_key(&association.target_model) {
                    return Err(QueryError::configuration(format!(
                        "{}.{} targets unregistered model {}",
                        model, association.name, association.target_model
                    ))
                    .with_model(model)
                    .with_field(&association.name)
                    .with_suggestion(format!(
                        "Register {} before building the registry",
                        association.target_model
                    )));
                }
            }
        }

        if let Some(cycle) = find_ownership_cycle(&self.models) {
            return Err(QueryError::configuration(format!(
                "association ownership cycle: {}",
                cycle.join(" -> ")
            ))
            .with_help("has_one/has_many chains must not lead back to the owning model"));
        }

        debug!(models = self.models.len(), "model registry built");
        Ok(ModelRegistry {
            models: self.models,
        })
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Find a cycle through has-one/has-many edges between distinct models.
///
/// Self-references are not edges here; a tree table owning its own rows is fine.
fn find_ownership_cycle(models: &IndexMap<String, ModelMeta>) -> Option<Vec<String>> {
    let mut marks = vec![Mark::Unvisited; models.len()];
    let mut path = Vec::new();

    for start in 0..models.len() {
        if marks[start] == Mark::Unvisited {
            if let Some(cycle) = visit(models, start, &mut marks, &mut path) {
                return Some(cycle);
            }
        }
    }
    None
}

fn visit(
    models: &IndexMap<String, ModelMeta>,
    index: usize,
    marks: &mut [Mark],
    path: &mut Vec<usize>,
) -> Option<Vec<String>> {
    marks[index] = Mark::InProgress;
    path.push(index);

    let (_, meta) = models.get_index(index)?;
    for association in meta.associations.iter().filter(|a| a.kind.is_owning()) {
        let Some(target) = models.get_index_of(&association.target_model) else {
            continue;
        };
        if target == index {
            continue;
        }
        match marks[target] {
            Mark::InProgress => {
                let from = path.iter().position(|&i| i == target).unwrap_or(0);
                let mut cycle: Vec<String> = path[from..]
                    .iter()
                    .filter_map(|&i| models.get_index(i).map(|(name, _)| name.clone()))
                    .collect();
                cycle.push(association.target_model.clone());
                return Some(cycle);
            }
            Mark::Unvisited => {
                if let Some(cycle) = visit(models, target, marks, path) {
                    return Some(cycle);
                }
            }
            Mark::Done => {}
        }
    }

    path.pop();
    marks[index] = Mark::Done;
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn blog() -> ModelRegistryBuilder {
        ModelRegistry::builder()
            .register(
                "User",
                ModelMeta::new("users").has_many("posts", "Post", "user_id"),
            )
            .register(
                "Post",
                ModelMeta::new("posts")
                    .belongs_to("author", "User", "user_id")
                    .has_many("comments", "Comment", "post_id"),
            )
            .register(
                "Comment",
                ModelMeta::new("comments").belongs_to("post", "Post", "post_id"),
            )
    }

    #[test]
    fn test_build_and_resolve() {
        let registry = blog().build().unwrap();
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.resolve("Post").unwrap().table, "posts");
        assert_eq!(
            registry.association("User", "posts").unwrap().target_model,
            "Post"
        );
    }

    #[test]
    fn test_unknown_model_is_not_found() {
        let registry = blog().build().unwrap();
        let err = registry.resolve("Ghost").unwrap_err();
        assert!(err.is_not_found());
        assert!(err.message.contains("model not registered"));
    }

    #[test]
    fn test_unknown_association_is_invalid_include() {
        let registry = blog().build().unwrap();
        let err = registry.association("User", "likes").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInclude);
    }

    #[test]
    fn test_unregistered_target_rejected() {
        let err = ModelRegistry::builder()
            .register("User", ModelMeta::new("users").has_many("posts", "Post", "user_id"))
            .build()
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidConfiguration);
    }

    #[test]
    fn test_duplicate_association_rejected() {
        let err = ModelRegistry::builder()
            .register(
                "User",
                ModelMeta::new("users")
                    .has_many("friends", "User", "friend_id")
                    .has_one("friends", "User", "best_friend_id"),
            )
            .build()
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidConfiguration);
    }

    #[test]
    fn test_ownership_cycle_rejected() {
        let err = ModelRegistry::builder()
            .register("A", ModelMeta::new("a").has_many("bs", "B", "a_id"))
            .register("B", ModelMeta::new("b").has_one("c", "C", "b_id"))
            .register("C", ModelMeta::new("c").has_many("as", "A", "c_id"))
            .build()
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidConfiguration);
        assert!(err.message.contains("A -> B -> C -> A"));
    }

    #[test]
    fn test_self_reference_allowed() {
        let registry = ModelRegistry::builder()
            .register(
                "Category",
                ModelMeta::new("categories")
                    .belongs_to("parent", "Category", "parent_id")
                    .has_many("children", "Category", "parent_id"),
            )
            .build();
        assert!(registry.is_ok());
    }

    #[test]
    fn test_belongs_to_back_reference_is_not_a_cycle() {
        assert!(blog().build().is_ok());
    }
}
