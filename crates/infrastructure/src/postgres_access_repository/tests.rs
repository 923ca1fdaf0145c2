use chrono::{Duration, Utc};
use serde_json::json;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use veridex_application::{AclRepository, AttributeRepository, PolicyRepository, RoleRepository};
use veridex_core::TenantId;
use veridex_domain::{AclResourceScope, AclSubject, AttributeValue, RoleId, UserId};

use super::PostgresAccessRepository;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres access tests: {error}");
    }

    Some(pool)
}

async fn ensure_tenant(pool: &PgPool, tenant_id: TenantId, name: &str) {
    let insert = sqlx::query(
        r#"
        INSERT INTO tenants (id, name)
        VALUES ($1, $2)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(tenant_id.as_uuid())
    .bind(name)
    .execute(pool)
    .await;

    assert!(insert.is_ok());
}

async fn insert_permission(pool: &PgPool, code: &str, is_active: bool) -> uuid::Uuid {
    let inserted = sqlx::query_scalar::<_, uuid::Uuid>(
        r#"
        INSERT INTO access_permissions (code, is_active)
        VALUES ($1, $2)
        ON CONFLICT (code) DO UPDATE SET is_active = EXCLUDED.is_active
        RETURNING id
        "#,
    )
    .bind(code)
    .bind(is_active)
    .fetch_one(pool)
    .await;

    match inserted {
        Ok(permission_id) => permission_id,
        Err(error) => panic!("failed to insert permission in test: {error}"),
    }
}

async fn insert_role(pool: &PgPool, tenant_id: TenantId, name: &str, is_active: bool) -> RoleId {
    let inserted = sqlx::query_scalar::<_, uuid::Uuid>(
        r#"
        INSERT INTO rbac_roles (tenant_id, name, is_active)
        VALUES ($1, $2, $3)
        RETURNING id
        "#,
    )
    .bind(tenant_id.as_uuid())
    .bind(name)
    .bind(is_active)
    .fetch_one(pool)
    .await;

    match inserted {
        Ok(role_id) => RoleId::from_uuid(role_id),
        Err(error) => panic!("failed to insert role in test: {error}"),
    }
}

async fn link_permission(pool: &PgPool, role_id: RoleId, permission_id: uuid::Uuid) {
    let linked = sqlx::query(
        r#"
        INSERT INTO rbac_role_permissions (role_id, permission_id)
        VALUES ($1, $2)
        ON CONFLICT (role_id, permission_id) DO NOTHING
        "#,
    )
    .bind(role_id.as_uuid())
    .bind(permission_id)
    .execute(pool)
    .await;

    assert!(linked.is_ok());
}

async fn insert_attribute(pool: &PgPool, name: &str) -> uuid::Uuid {
    let inserted = sqlx::query_scalar::<_, uuid::Uuid>(
        r#"
        INSERT INTO abac_attributes (name)
        VALUES ($1)
        ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(name)
    .fetch_one(pool)
    .await;

    match inserted {
        Ok(attribute_id) => attribute_id,
        Err(error) => panic!("failed to insert attribute in test: {error}"),
    }
}

#[tokio::test]
async fn role_assignments_exclude_inactive_roles_and_foreign_tenants() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresAccessRepository::new(pool.clone());
    let tenant_id = TenantId::new();
    let other_tenant = TenantId::new();
    let user_id = UserId::new();
    ensure_tenant(&pool, tenant_id, "Assignments Tenant").await;
    ensure_tenant(&pool, other_tenant, "Other Tenant").await;

    let active_role = insert_role(&pool, tenant_id, "readers", true).await;
    let inactive_role = insert_role(&pool, tenant_id, "dormant", false).await;
    let foreign_role = insert_role(&pool, other_tenant, "outsiders", true).await;

    for (scoped_tenant, role_id) in [
        (tenant_id, active_role),
        (tenant_id, inactive_role),
        (other_tenant, foreign_role),
    ] {
        let assigned = sqlx::query(
            r#"
            INSERT INTO rbac_role_assignments (tenant_id, user_id, role_id, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(scoped_tenant.as_uuid())
        .bind(user_id.as_uuid())
        .bind(role_id.as_uuid())
        .bind(Option::<chrono::DateTime<Utc>>::None)
        .execute(&pool)
        .await;
        assert!(assigned.is_ok());
    }

    let assignments = repository
        .list_active_role_assignments(user_id, tenant_id)
        .await;
    let Ok(assignments) = assignments else {
        panic!("assignment listing failed");
    };
    assert_eq!(assignments.len(), 1);
    assert_eq!(assignments[0].role_id, active_role);
    assert_eq!(assignments[0].role_name, "readers");
}

#[tokio::test]
async fn expired_assignments_are_returned_with_their_expiry() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresAccessRepository::new(pool.clone());
    let tenant_id = TenantId::new();
    let user_id = UserId::new();
    ensure_tenant(&pool, tenant_id, "Expiry Tenant").await;

    let role_id = insert_role(&pool, tenant_id, "temporaries", true).await;
    let expires_at = Utc::now() - Duration::days(1);
    let assigned = sqlx::query(
        r#"
        INSERT INTO rbac_role_assignments (tenant_id, user_id, role_id, expires_at)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(tenant_id.as_uuid())
    .bind(user_id.as_uuid())
    .bind(role_id.as_uuid())
    .bind(expires_at)
    .execute(&pool)
    .await;
    assert!(assigned.is_ok());

    let assignments = repository
        .list_active_role_assignments(user_id, tenant_id)
        .await;
    let Ok(assignments) = assignments else {
        panic!("assignment listing failed");
    };
    assert_eq!(assignments.len(), 1);
    assert!(assignments[0]
        .expires_at
        .is_some_and(|stored| (stored - expires_at).num_seconds().abs() < 1));
}

#[tokio::test]
async fn role_grants_exclude_deactivated_catalog_entries() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresAccessRepository::new(pool.clone());
    let tenant_id = TenantId::new();
    ensure_tenant(&pool, tenant_id, "Grants Tenant").await;

    let role_id = insert_role(&pool, tenant_id, "readers", true).await;
    let active_permission = insert_permission(&pool, "pgtest:user:read", true).await;
    let inactive_permission = insert_permission(&pool, "pgtest:user:purge", false).await;
    link_permission(&pool, role_id, active_permission).await;
    link_permission(&pool, role_id, inactive_permission).await;

    let permissions = repository.list_active_permissions(role_id).await;
    let Ok(permissions) = permissions else {
        panic!("grant listing failed");
    };
    assert_eq!(permissions.len(), 1);
    assert_eq!(permissions[0].as_str(), "pgtest:user:read");
}

#[tokio::test]
async fn policies_rebuild_with_rules_in_priority_order() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresAccessRepository::new(pool.clone());
    let tenant_id = TenantId::new();
    ensure_tenant(&pool, tenant_id, "Policies Tenant").await;

    let attribute_id = insert_attribute(&pool, "department").await;
    for (name, effect, priority) in [
        ("low-allow", "allow", 1),
        ("high-deny", "deny", 10),
    ] {
        let policy_id = sqlx::query_scalar::<_, uuid::Uuid>(
            r#"
            INSERT INTO pbac_policies (tenant_id, name, effect, priority)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(name)
        .bind(effect)
        .bind(priority)
        .fetch_one(&pool)
        .await;
        let Ok(policy_id) = policy_id else {
            panic!("failed to insert policy in test");
        };

        let rule = sqlx::query(
            r#"
            INSERT INTO pbac_policy_rules (policy_id, attribute_id, operator, expected_value)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(policy_id)
        .bind(attribute_id)
        .bind("eq")
        .bind(json!("finance"))
        .execute(&pool)
        .await;
        assert!(rule.is_ok());
    }

    let policies = repository.list_active_policies(tenant_id).await;
    let Ok(policies) = policies else {
        panic!("policy listing failed");
    };
    assert_eq!(policies.len(), 2);
    assert_eq!(policies[0].name().as_str(), "high-deny");
    assert_eq!(policies[0].rules().len(), 1);
    assert_eq!(policies[0].rules()[0].operator(), "eq");
    assert_eq!(
        policies[0].rules()[0].expected(),
        &AttributeValue::from("finance")
    );
    assert_eq!(policies[1].name().as_str(), "low-allow");
}

#[tokio::test]
async fn attribute_values_round_trip_from_jsonb() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresAccessRepository::new(pool.clone());
    let user_id = UserId::new();
    let attribute_id = insert_attribute(&pool, "clearance").await;

    let stored = sqlx::query(
        r#"
        INSERT INTO abac_user_attribute_values (user_id, attribute_id, value)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, attribute_id) DO UPDATE SET value = EXCLUDED.value
        "#,
    )
    .bind(user_id.as_uuid())
    .bind(attribute_id)
    .bind(json!(4))
    .execute(&pool)
    .await;
    assert!(stored.is_ok());

    let values = repository.list_attribute_values(user_id).await;
    let Ok(values) = values else {
        panic!("attribute listing failed");
    };
    assert_eq!(values.get("clearance"), Some(&AttributeValue::from(4_i64)));
}

#[tokio::test]
async fn acl_scopes_filter_as_declared() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresAccessRepository::new(pool.clone());
    let tenant_id = TenantId::new();
    let subject = AclSubject::User(UserId::new());
    ensure_tenant(&pool, tenant_id, "ACL Tenant").await;

    let inserted = sqlx::query(
        r#"
        INSERT INTO acl_entries (tenant_id, subject_type, subject_id, resource_type, resource_id, permission)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(tenant_id.as_uuid())
    .bind(subject.type_as_str())
    .bind(subject.id_as_uuid())
    .bind("file")
    .bind("F1")
    .bind("download")
    .execute(&pool)
    .await;
    assert!(inserted.is_ok());

    let exact = repository
        .find_entry(
            &subject,
            tenant_id,
            "file",
            &AclResourceScope::Instance("F1".to_owned()),
            "download",
        )
        .await;
    assert!(matches!(exact, Ok(Some(_))));

    let other = repository
        .find_entry(
            &subject,
            tenant_id,
            "file",
            &AclResourceScope::Instance("F2".to_owned()),
            "download",
        )
        .await;
    assert!(matches!(other, Ok(None)));

    let any = repository
        .find_entry(&subject, tenant_id, "file", &AclResourceScope::Any, "download")
        .await;
    assert!(matches!(any, Ok(Some(_))));

    let unscoped_only = repository
        .find_entry(
            &subject,
            tenant_id,
            "file",
            &AclResourceScope::UnscopedOnly,
            "download",
        )
        .await;
    assert!(matches!(unscoped_only, Ok(None)));
}
