//! Authentication and role extractors for admin.
//!
//! Every page except sign-in requires a signed-in staff member. Section pages
//! additionally require a [`Permission`], checked with [`RequirePermission`].

use std::marker::PhantomData;

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use shopfront_core::Permission;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::models::{CurrentStaff, session_keys};

const LOGIN_PATH: &str = "/auth/login";

/// Error returned when a handler's staff requirement is not met.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaffRejection {
    /// Nobody is signed in.
    RedirectToLogin,
    /// Signed in, but the role lacks the permission.
    Forbidden,
}

impl IntoResponse for StaffRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                "You do not have permission to access this page.",
            )
                .into_response(),
        }
    }
}

async fn current_staff(parts: &Parts) -> Option<CurrentStaff> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<CurrentStaff>(session_keys::CURRENT_STAFF)
        .await
        .ok()
        .flatten()
}

/// Extractor that requires a signed-in staff member.
///
/// Anonymous requests are redirected to the sign-in page.
///
/// # Example
///
/// ```rust,ignore
/// async fn dashboard(RequireStaff(staff): RequireStaff) -> impl IntoResponse {
///     format!("Hello, {}!", staff.display_name)
/// }
/// ```
pub struct RequireStaff(pub CurrentStaff);

impl<S> FromRequestParts<S> for RequireStaff
where
    S: Send + Sync,
{
    type Rejection = StaffRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current_staff(parts)
            .await
            .map(Self)
            .ok_or(StaffRejection::RedirectToLogin)
    }
}

/// Extractor that optionally gets the signed-in staff member.
pub struct OptionalStaff(pub Option<CurrentStaff>);

impl<S> FromRequestParts<S> for OptionalStaff
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(current_staff(parts).await))
    }
}

/// Names the permission a [`RequirePermission`] extractor checks.
pub trait PermissionMarker {
    const PERMISSION: Permission;
}

/// Catalogue section: Admin, Manager, Merchandiser.
pub struct CanManageCatalogue;

/// Inventory section: Admin, Manager, Inventory.
pub struct CanManageInventory;

/// Customer directory: Admin, Manager, Support.
pub struct CanManageCustomers;

/// Staff administration: Admin only.
pub struct CanManageStaff;

impl PermissionMarker for CanManageCatalogue {
    const PERMISSION: Permission = Permission::Catalogue;
}

impl PermissionMarker for CanManageInventory {
    const PERMISSION: Permission = Permission::Inventory;
}

impl PermissionMarker for CanManageCustomers {
    const PERMISSION: Permission = Permission::Customers;
}

impl PermissionMarker for CanManageStaff {
    const PERMISSION: Permission = Permission::Staff;
}

/// Extractor that requires a signed-in staff member whose role grants `P`.
///
/// Anonymous requests are redirected to sign in; signed-in staff without the
/// permission get 403 Forbidden.
///
/// # Example
///
/// ```rust,ignore
/// async fn staff_list(
///     RequirePermission(staff, _): RequirePermission<CanManageStaff>,
/// ) -> impl IntoResponse {
///     format!("{} may manage staff", staff.username)
/// }
/// ```
pub struct RequirePermission<P>(pub CurrentStaff, pub PhantomData<P>);

impl<S, P> FromRequestParts<S> for RequirePermission<P>
where
    S: Send + Sync,
    P: PermissionMarker + Send,
{
    type Rejection = StaffRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let staff = current_staff(parts)
            .await
            .ok_or(StaffRejection::RedirectToLogin)?;

        if !staff.can(P::PERMISSION) {
            tracing::warn!(
                username = %staff.username,
                role = staff.role.as_str(),
                permission = ?P::PERMISSION,
                path = %parts.uri.path(),
                "Permission denied"
            );
            return Err(StaffRejection::Forbidden);
        }

        Ok(Self(staff, PhantomData))
    }
}

/// Store the signed-in staff member in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_staff(
    session: &Session,
    staff: &CurrentStaff,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_STAFF, staff).await?;
    set_sentry_user(staff.id.as_i32(), &staff.username);
    Ok(())
}

/// Sign out: drop the whole session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_staff(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await?;
    clear_sentry_user();
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::http::Request;
    use shopfront_core::{StaffRole, StaffUserId};
    use tower_sessions::MemoryStore;

    use super::*;

    fn staff(role: StaffRole) -> CurrentStaff {
        CurrentStaff {
            id: StaffUserId::new(7),
            username: "mei".to_string(),
            display_name: "Mei Tan".to_string(),
            role,
        }
    }

    async fn parts_with(staff: Option<&CurrentStaff>) -> Parts {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        if let Some(staff) = staff {
            session
                .insert(session_keys::CURRENT_STAFF, staff)
                .await
                .unwrap();
        }
        let (mut parts, ()) = Request::builder()
            .uri("/staff")
            .body(())
            .unwrap()
            .into_parts();
        parts.extensions.insert(session);
        parts
    }

    #[tokio::test]
    async fn test_require_staff_redirects_anonymous() {
        let mut parts = parts_with(None).await;
        let result = RequireStaff::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(StaffRejection::RedirectToLogin)));
    }

    #[tokio::test]
    async fn test_permission_granted() {
        let me = staff(StaffRole::Admin);
        let mut parts = parts_with(Some(&me)).await;
        let RequirePermission(found, _) =
            RequirePermission::<CanManageStaff>::from_request_parts(&mut parts, &())
                .await
                .unwrap();
        assert_eq!(found, me);
    }

    #[tokio::test]
    async fn test_permission_denied_is_forbidden() {
        let me = staff(StaffRole::Support);
        let mut parts = parts_with(Some(&me)).await;
        let result =
            RequirePermission::<CanManageCatalogue>::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(StaffRejection::Forbidden)));
        assert_eq!(
            StaffRejection::Forbidden.into_response().status(),
            StatusCode::FORBIDDEN
        );
    }

    #[tokio::test]
    async fn test_optional_staff_without_session() {
        let (mut parts, ()) = Request::builder().body(()).unwrap().into_parts();
        let OptionalStaff(found) = OptionalStaff::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert!(found.is_none());
    }
}
