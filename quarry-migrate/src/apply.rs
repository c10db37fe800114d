//! Running generated scripts through an [`Executor`].

use quarry_query::Executor;
use tracing::{debug, info};

use crate::error::{MigrateResult, MigrationError};
use crate::history;
use crate::script::Script;
use crate::sql::GeneratorOptions;

/// Run every executable statement of `script` in order.
///
/// The first failing statement aborts the run; nothing is retried.
/// Returns the number of statements executed.
pub async fn apply_script<E: Executor>(executor: &E, script: &Script) -> MigrateResult<usize> {
    let statements = script.statements();
    for (index, sql) in statements.iter().enumerate() {
        debug!(index, sql = %sql, "applying statement");
        executor
            .execute(sql, Vec::new())
            .await
            .map_err(|e| MigrationError::execution(index, e.with_sql(*sql)))?;
    }
    info!(statements = statements.len(), "applied script");
    Ok(statements.len())
}

/// Run the preamble, then only the sections whose version is not yet in
/// the ledger.
///
/// Unlike [`apply_script`], this is safe for statements that cannot run
/// twice, such as `ADD COLUMN`. Returns the versions that were applied.
pub async fn apply_pending<E: Executor>(
    executor: &E,
    options: &GeneratorOptions,
    script: &Script,
) -> MigrateResult<Vec<String>> {
    let mut index = 0;
    for statement in script.preamble.iter().filter(|s| !s.disabled) {
        executor
            .execute(&statement.sql, Vec::new())
            .await
            .map_err(|e| MigrationError::execution(index, e.with_sql(&statement.sql)))?;
        index += 1;
    }

    let applied = history::applied_versions(executor, options.dialect, &options.version_table).await?;
    let mut newly_applied = Vec::new();

    for section in &script.sections {
        if let Some(version) = &section.version {
            if applied.contains(version) {
                debug!(version = %version, "migration already applied");
                continue;
            }
        }
        for statement in section.statements.iter().filter(|s| !s.disabled) {
            executor
                .execute(&statement.sql, Vec::new())
                .await
                .map_err(|e| MigrationError::execution(index, e.with_sql(&statement.sql)))?;
            index += 1;
        }
        if let Some(version) = &section.version {
            info!(version = %version, "applied migration");
            newly_applied.push(version.clone());
        }
    }

    Ok(newly_applied)
}
