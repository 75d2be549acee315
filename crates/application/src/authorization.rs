use stockroom_core::{AppError, AppResult, UserIdentity};
use stockroom_domain::Permission;

/// Ensures the principal's role grants the permission.
pub fn require_permission(actor: &UserIdentity, permission: Permission) -> AppResult<()> {
    if permission.is_granted_to(actor.role()) {
        return Ok(());
    }

    Err(AppError::Forbidden(format!(
        "subject '{}' with role '{}' is missing permission '{}'",
        actor.subject(),
        actor.role(),
        permission.as_str()
    )))
}

#[cfg(test)]
mod tests {
    use stockroom_core::{AppError, Role, UserIdentity};
    use stockroom_domain::Permission;

    use super::require_permission;

    #[test]
    fn missing_permission_is_forbidden() {
        let viewer = UserIdentity::new("vera", Role::Viewer);

        assert!(require_permission(&viewer, Permission::ItemRead).is_ok());
        assert!(matches!(
            require_permission(&viewer, Permission::ItemWrite),
            Err(AppError::Forbidden(_))
        ));
    }
}
