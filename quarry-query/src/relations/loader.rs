//! Batched eager loading of associations.
//!
//! Each association in an include forest costs one `IN` query per nesting
//! level, no matter how many owner records there are. The forest is walked
//! level by level: every association of a level is fetched concurrently, and
//! the next level starts only once the whole level's rows are in hand.
//!
//! Results are assembled off to the side and attached to the caller's records
//! only after every query succeeded, so a failed or cancelled load leaves the
//! records exactly as they were.

use futures::future::try_join_all;
use indexmap::IndexMap;
use tracing::debug;

use super::include::IncludeSpec;
use super::registry::ModelRegistry;
use super::spec::{AssociationKind, AssociationMeta};
use crate::compiler;
use crate::error::QueryResult;
use crate::filter::Condition;
use crate::query::Relation;
use crate::row::{Association, Record};
use crate::sql::Dialect;
use crate::traits::Executor;
use crate::value::{Value, ValueKey};

/// Loads associations for already-materialized records.
pub struct RelationLoader<'a, E: Executor> {
    executor: &'a E,
    registry: &'a ModelRegistry,
    dialect: Dialect,
}

/// The columns joining an owner model to one of its associations.
struct Join<'r> {
    association: &'r AssociationMeta,
    table: &'r str,
    /// Column read on the owner.
    owner_column: &'r str,
    /// Column matched on the target.
    target_column: &'r str,
}

/// One association fetched during the walk.
///
/// Its owners are the root records when `parent` is `None`, otherwise the
/// fetched rows of the parent node.
struct Node<'s> {
    model: &'s str,
    spec: &'s IncludeSpec,
    parent: Option<usize>,
    rows: Vec<Record>,
}

/// One association resolved for a list of owners, in owner order.
struct Loaded {
    name: String,
    values: Vec<Association>,
}

impl Loaded {
    fn apply(self, records: &mut [Record]) {
        for (record, association) in records.iter_mut().zip(self.values) {
            record.set_association(self.name.clone(), association);
        }
    }
}

impl<'a, E: Executor> RelationLoader<'a, E> {
    /// Create a new relation loader.
    pub fn new(executor: &'a E, registry: &'a ModelRegistry, dialect: Dialect) -> Self {
        Self {
            executor,
            registry,
            dialect,
        }
    }

    /// Populate `includes` on every record of `model`.
    ///
    /// Specs naming the same association are merged first. Unknown models or
    /// association names fail before any query is issued.
    pub async fn load(
        &self,
        model: &str,
        records: &mut [Record],
        includes: &[IncludeSpec],
    ) -> QueryResult<()> {
        if includes.is_empty() {
            return Ok(());
        }
        let includes = IncludeSpec::merged(includes.iter().cloned());
        self.validate(model, &includes)?;

        let mut nodes: Vec<Node<'_>> = includes
            .iter()
            .map(|spec| Node {
                model,
                spec,
                parent: None,
                rows: Vec::new(),
            })
            .collect();

        let mut level = 0..nodes.len();
        let mut depth = 1;
        while !level.is_empty() {
            debug!(model = %model, depth, associations = level.len(), "loading include level");

            let fetched = {
                let nodes = &nodes;
                let roots = &*records;
                try_join_all(level.clone().map(move |i| {
                    let node = &nodes[i];
                    let owners = match node.parent {
                        Some(parent) => &nodes[parent].rows[..],
                        None => roots,
                    };
                    self.fetch_association(node.model, owners, node.spec)
                }))
                .await?
            };

            let next = nodes.len();
            for (i, rows) in level.clone().zip(fetched) {
                nodes[i].rows = rows;
                let spec = nodes[i].spec;
                let target = &self.registry.association(nodes[i].model, &spec.name)?.target_model;
                nodes.extend(spec.nested.iter().map(|nested| Node {
                    model: target.as_str(),
                    spec: nested,
                    parent: Some(i),
                    rows: Vec::new(),
                }));
            }
            level = next..nodes.len();
            depth += 1;
        }

        // Children were created after their parents, so walking backwards
        // attaches every nested level before its owners are distributed.
        let mut top = Vec::with_capacity(includes.len());
        for i in (0..nodes.len()).rev() {
            let rows = std::mem::take(&mut nodes[i].rows);
            let parent = nodes[i].parent;
            let node = &nodes[i];
            let join = self.join(node.model, &node.spec.name)?;
            let owners = match parent {
                Some(parent) => &nodes[parent].rows[..],
                None => &*records,
            };
            let loaded = Loaded {
                name: node.spec.name.clone(),
                values: distribute(
                    join.association.kind,
                    owners,
                    join.owner_column,
                    join.target_column,
                    &rows,
                ),
            };
            match parent {
                Some(parent) => loaded.apply(&mut nodes[parent].rows),
                None => top.push(loaded),
            }
        }

        for loaded in top.into_iter().rev() {
            loaded.apply(records);
        }
        Ok(())
    }

    /// Check every name in the include forest against the registry.
    fn validate(&self, model: &str, includes: &[IncludeSpec]) -> QueryResult<()> {
        self.registry.resolve(model)?;
        for spec in includes {
            let association = self.registry.association(model, &spec.name)?;
            self.validate(&association.target_model, &spec.nested)?;
        }
        Ok(())
    }

    fn join(&self, model: &str, name: &str) -> QueryResult<Join<'a>> {
        let registry = self.registry;
        let association = registry.association(model, name)?;
        let owner_meta = registry.resolve(model)?;
        let target_meta = registry.resolve(&association.target_model)?;

        let (owner_column, target_column) = match association.kind {
            AssociationKind::BelongsTo => (&association.foreign_key, &target_meta.primary_key),
            AssociationKind::HasOne | AssociationKind::HasMany => {
                (&owner_meta.primary_key, &association.foreign_key)
            }
        };
        Ok(Join {
            association,
            table: &target_meta.table,
            owner_column,
            target_column,
        })
    }

    /// Fetch the target rows of one association for `owners`.
    async fn fetch_association(
        &self,
        model: &str,
        owners: &[Record],
        spec: &IncludeSpec,
    ) -> QueryResult<Vec<Record>> {
        let join = self.join(model, &spec.name)?;
        let keys = distinct_keys(owners, join.owner_column);
        debug!(
            model = %model,
            association = %spec.name,
            keys = keys.len(),
            "loading association batch"
        );

        if keys.is_empty() && join.association.kind == AssociationKind::BelongsTo {
            return Ok(Vec::new());
        }
        self.fetch_targets(join.association, join.table, join.target_column, keys)
            .await
    }

    async fn fetch_targets(
        &self,
        association: &AssociationMeta,
        table: &str,
        column: &str,
        keys: Vec<Value>,
    ) -> QueryResult<Vec<Record>> {
        let relation = Relation::new().r#where(Condition::In(column.to_string(), keys));
        let (sql, values) = compiler::compile(&relation, self.dialect, table)?;
        let output = self.executor.execute(&sql, values).await.map_err(|e| {
            e.with_context(format!("loading association {}", association.name))
                .with_model(&association.target_model)
        })?;

        Ok(output
            .rows
            .into_iter()
            .map(|row| Record::new(association.target_model.clone(), row))
            .collect())
    }
}

/// Distinct non-null values of `column`, in first-seen order.
fn distinct_keys(records: &[Record], column: &str) -> Vec<Value> {
    let mut seen: IndexMap<ValueKey, Value> = IndexMap::new();
    for value in records.iter().filter_map(|r| r.get(column)) {
        if let Some(key) = value.key() {
            seen.entry(key).or_insert_with(|| value.clone());
        }
    }
    seen.into_values().collect()
}

fn distribute(
    kind: AssociationKind,
    owners: &[Record],
    owner_column: &str,
    target_column: &str,
    children: &[Record],
) -> Vec<Association> {
    let mut groups: IndexMap<ValueKey, Vec<&Record>> = IndexMap::new();
    for child in children {
        if let Some(key) = child.get(target_column).and_then(Value::key) {
            groups.entry(key).or_default().push(child);
        }
    }

    owners
        .iter()
        .map(|owner| {
            let group = owner
                .get(owner_column)
                .and_then(Value::key)
                .and_then(|key| groups.get(&key));
            match kind {
                AssociationKind::HasMany => Association::Many(
                    group
                        .map(|g| g.iter().map(|r| (*r).clone()).collect())
                        .unwrap_or_default(),
                ),
                AssociationKind::BelongsTo | AssociationKind::HasOne => Association::One(
                    group
                        .and_then(|g| g.first())
                        .map(|r| Box::new((*r).clone())),
                ),
            }
        })
        .collect()
}
