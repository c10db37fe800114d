//! Association and model metadata.

/// Kind of association between models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssociationKind {
    /// The owner holds the foreign key (e.g., Post belongs to User).
    BelongsTo,
    /// The target holds the foreign key, at most one target per owner.
    HasOne,
    /// The target holds the foreign key, any number of targets per owner.
    HasMany,
}

impl AssociationKind {
    /// Check if this association resolves to a list.
    pub fn is_many(&self) -> bool {
        matches!(self, Self::HasMany)
    }

    /// Check if the owner model is on the owning side (its key is referenced).
    pub fn is_owning(&self) -> bool {
        matches!(self, Self::HasOne | Self::HasMany)
    }

    /// Lowercase name, as used in error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BelongsTo => "belongs_to",
            Self::HasOne => "has_one",
            Self::HasMany => "has_many",
        }
    }
}

/// One declared association.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationMeta {
    /// Name of the association (the field it populates).
    pub name: String,
    /// Kind of association.
    pub kind: AssociationKind,
    /// Foreign key column. Lives on the owner for `BelongsTo`, on the
    /// target otherwise.
    pub foreign_key: String,
    /// Name of the target model.
    pub target_model: String,
}

impl AssociationMeta {
    /// Create a new association.
    pub fn new(
        name: impl Into<String>,
        kind: AssociationKind,
        foreign_key: impl Into<String>,
        target_model: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            foreign_key: foreign_key.into(),
            target_model: target_model.into(),
        }
    }
}

/// Table and association metadata for one model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelMeta {
    /// Table name.
    pub table: String,
    /// Primary key column.
    pub primary_key: String,
    /// Declared associations, in declaration order.
    pub associations: Vec<AssociationMeta>,
}

impl ModelMeta {
    /// Create metadata for a table with an `id` primary key.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            primary_key: "id".to_string(),
            associations: Vec::new(),
        }
    }

    /// Use a different primary key column.
    pub fn primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = column.into();
        self
    }

    /// Declare an association.
    pub fn association(mut self, association: AssociationMeta) -> Self {
        self.associations.push(association);
        self
    }

    /// Declare a belongs-to association; `foreign_key` is a column of this model.
    pub fn belongs_to(
        self,
        name: impl Into<String>,
        target_model: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.association(AssociationMeta::new(
            name,
            AssociationKind::BelongsTo,
            foreign_key,
            target_model,
        ))
    }

    /// Declare a has-one association; `foreign_key` is a column of the target.
    pub fn has_one(
        self,
        name: impl Into<String>,
        target_model: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.association(AssociationMeta::new(
            name,
            AssociationKind::HasOne,
            foreign_key,
            target_model,
        ))
    }

    /// Declare a has-many association; `foreign_key` is a column of the target.
    pub fn has_many(
        self,
        name: impl Into<String>,
        target_model: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.association(AssociationMeta::new(
            name,
            AssociationKind::HasMany,
            foreign_key,
            target_model,
        ))
    }

    /// Look up an association by name.
    pub fn get_association(&self, name: &str) -> Option<&AssociationMeta> {
        self.associations.iter().find(|a| a.name == name)
    }
}
