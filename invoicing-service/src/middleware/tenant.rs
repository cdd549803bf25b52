//! Tenant context extraction.
//!
//! The organization is taken from the `X-Org-ID` header set by the gateway
//! after it has authenticated the caller. It is trusted as-is here.

use crate::models::OrgId;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use service_core::error::AppError;

pub const ORG_ID_HEADER: &str = "X-Org-ID";
pub const USER_ID_HEADER: &str = "X-User-ID";

#[derive(Debug, Clone)]
pub struct TenantContext {
    pub org_id: OrgId,
    /// Acting user, when the gateway supplies one.
    pub user_id: Option<String>,
}

#[async_trait]
impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let org_id = parts
            .headers
            .get(ORG_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::AuthError(anyhow::anyhow!("Missing X-Org-ID header")))?;

        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let span = tracing::Span::current();
        span.record("org_id", org_id);
        if let Some(ref uid) = user_id {
            span.record("user_id", uid.as_str());
        }

        Ok(TenantContext {
            org_id: OrgId::new(org_id),
            user_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<TenantContext, AppError> {
        let (mut parts, _) = request.into_parts();
        TenantContext::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn reads_org_and_user_headers() {
        let request = Request::builder()
            .header(ORG_ID_HEADER, "org-42")
            .header(USER_ID_HEADER, "user-7")
            .body(())
            .unwrap();

        let tenant = extract(request).await.unwrap();
        assert_eq!(tenant.org_id, OrgId::new("org-42"));
        assert_eq!(tenant.user_id.as_deref(), Some("user-7"));
    }

    #[tokio::test]
    async fn missing_or_blank_org_is_unauthorized() {
        let missing = Request::builder().body(()).unwrap();
        assert!(matches!(
            extract(missing).await,
            Err(AppError::AuthError(_))
        ));

        let blank = Request::builder()
            .header(ORG_ID_HEADER, "  ")
            .body(())
            .unwrap();
        assert!(matches!(extract(blank).await, Err(AppError::AuthError(_))));
    }
}
