//! Associations: declaration, registry and batched eager loading.
//!
//! ## Example
//!
//! ```rust
//! use quarry_query::relations::{IncludeSpec, ModelMeta, ModelRegistry};
//!
//! let registry = ModelRegistry::builder()
//!     .register("User", ModelMeta::new("users").has_many("posts", "Post", "user_id"))
//!     .register(
//!         "Post",
//!         ModelMeta::new("posts")
//!             .belongs_to("author", "User", "user_id")
//!             .has_many("comments", "Comment", "post_id"),
//!     )
//!     .register("Comment", ModelMeta::new("comments"))
//!     .build()
//!     .unwrap();
//!
//! // posts, and the comments of those posts
//! let include = IncludeSpec::new("posts").include("comments");
//! assert_eq!(include.depth(), 2);
//! assert_eq!(registry.resolve("Post").unwrap().table, "posts");
//! ```

mod include;
mod loader;
mod registry;
mod spec;

pub use include::IncludeSpec;
pub use loader::RelationLoader;
pub use registry::{ModelRegistry, ModelRegistryBuilder};
pub use spec::{AssociationKind, AssociationMeta, ModelMeta};
