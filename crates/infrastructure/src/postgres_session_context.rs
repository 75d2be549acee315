use sqlx::{Postgres, Transaction};
use stockroom_application::SessionContext;
use stockroom_core::{AppError, AppResult};

/// Transaction-local setting read by the ledger trigger as the actor.
pub(crate) const ACTOR_SETTING: &str = "app.user";
/// Transaction-local setting read by the ledger trigger as the actor role.
pub(crate) const ROLE_SETTING: &str = "app.role";

/// Stamps the open transaction with the acting user and role.
///
/// `set_config(.., true)` scopes both values to the current transaction: they
/// are invisible to concurrent transactions and reset on commit or rollback.
/// Must run before the mutating statement on the same transaction.
pub(crate) async fn bind_session_context(
    transaction: &mut Transaction<'_, Postgres>,
    context: &SessionContext,
) -> AppResult<()> {
    sqlx::query("SELECT set_config($1, $2, true), set_config($3, $4, true)")
        .bind(ACTOR_SETTING)
        .bind(context.actor())
        .bind(ROLE_SETTING)
        .bind(context.role().as_str())
        .execute(&mut **transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to bind session context for actor '{}': {error}",
                context.actor()
            ))
        })?;

    Ok(())
}
