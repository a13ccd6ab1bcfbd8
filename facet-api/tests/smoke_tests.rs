//! End-to-end smoke tests for the Facet API
//!
//! These run against a live PostgreSQL instance configured through the
//! FACET_DB_* environment variables. Enable with `--features db-tests`.

use facet_api::{ApiResult, DbClient, DbConfig};

fn test_db() -> ApiResult<DbClient> {
    let config = DbConfig::from_env();
    DbClient::from_config(&config)
}

#[tokio::test]
#[cfg(feature = "db-tests")]
async fn smoke_test_attribute_catalog() -> ApiResult<()> {
    use facet_core::{Attribute, AttributeType};

    let db = test_db()?;
    db.ensure_schema().await?;

    let attribute = Attribute::new("Department".to_string(), AttributeType::Select)?;
    db.attribute_create(&attribute).await?;

    let all = db.attribute_list().await?;
    assert!(all.iter().any(|a| a.id == attribute.id));

    // Catalog listing is ordered by id, which for UUIDv7 is creation order.
    let ids: Vec<_> = all.iter().map(|a| a.id).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);

    Ok(())
}

#[tokio::test]
#[cfg(feature = "db-tests")]
async fn smoke_test_project_with_inline_values() -> ApiResult<()> {
    use facet_core::{Attribute, AttributeType, Project};
    use std::collections::BTreeMap;

    let db = test_db()?;
    db.ensure_schema().await?;

    let department = Attribute::new("Department".to_string(), AttributeType::Select)?;
    db.attribute_create(&department).await?;

    let project = Project::new("Website Redesign".to_string(), Some("active".to_string()))?;
    let mut inline = BTreeMap::new();
    inline.insert(department.id, "IT".to_string());

    let created = db.project_create(&project, &inline, false).await?;
    assert_eq!(created.values.len(), 1);
    assert_eq!(created.values[0].value, "IT");
    assert_eq!(created.values[0].attribute.id, department.id);

    let fetched = db
        .project_get(project.id)
        .await?
        .expect("project should exist");
    assert_eq!(fetched.project.name, "Website Redesign");
    assert_eq!(fetched.values.len(), 1);

    Ok(())
}

#[tokio::test]
#[cfg(feature = "db-tests")]
async fn smoke_test_inline_value_unknown_attribute_rolls_back() -> ApiResult<()> {
    use facet_core::{new_entity_id, Project};
    use std::collections::BTreeMap;

    let db = test_db()?;
    db.ensure_schema().await?;

    let project = Project::new("Doomed".to_string(), None)?;
    let mut inline = BTreeMap::new();
    inline.insert(new_entity_id(), "whatever".to_string());

    assert!(db.project_create(&project, &inline, false).await.is_err());
    // The transaction rolled back, so the project row is gone too.
    assert!(db.project_get(project.id).await?.is_none());

    Ok(())
}

#[tokio::test]
#[cfg(feature = "db-tests")]
async fn smoke_test_filter_conjunction() -> ApiResult<()> {
    use facet_core::{Attribute, AttributeFilter, AttributeType, AttributeValue, Project};
    use std::collections::BTreeMap;

    let db = test_db()?;
    db.ensure_schema().await?;

    let department = Attribute::new("Department".to_string(), AttributeType::Select)?;
    let start_date = Attribute::new("Start Date".to_string(), AttributeType::Date)?;
    db.attribute_create(&department).await?;
    db.attribute_create(&start_date).await?;

    let matching = Project::new("Matching".to_string(), None)?;
    let other = Project::new("Other".to_string(), None)?;
    db.project_create(&matching, &BTreeMap::new(), false).await?;
    db.project_create(&other, &BTreeMap::new(), false).await?;

    db.attribute_value_create(
        &AttributeValue::new(department.id, matching.id, "IT".to_string()),
        false,
    )
    .await?;
    db.attribute_value_create(
        &AttributeValue::new(start_date.id, matching.id, "2024-02-13".to_string()),
        false,
    )
    .await?;
    db.attribute_value_create(
        &AttributeValue::new(department.id, other.id, "HR".to_string()),
        false,
    )
    .await?;

    // Both predicates hold for `matching`, each via a different value row.
    let filter = AttributeFilter::new()
        .with(department.id, "IT")
        .with(start_date.id, "2024-02-13");
    let results = db.project_filter(&filter).await?;
    assert!(results.iter().any(|p| p.project.id == matching.id));
    assert!(!results.iter().any(|p| p.project.id == other.id));

    // One failing predicate excludes the project.
    let filter = AttributeFilter::new()
        .with(department.id, "IT")
        .with(start_date.id, "1999-01-01");
    let results = db.project_filter(&filter).await?;
    assert!(!results.iter().any(|p| p.project.id == matching.id));

    // Value comparison is exact and case-sensitive.
    let filter = AttributeFilter::new().with(department.id, "it");
    let results = db.project_filter(&filter).await?;
    assert!(!results.iter().any(|p| p.project.id == matching.id));

    Ok(())
}

#[tokio::test]
#[cfg(feature = "db-tests")]
async fn smoke_test_empty_filter_returns_everything() -> ApiResult<()> {
    use facet_core::{AttributeFilter, Project};
    use std::collections::BTreeMap;

    let db = test_db()?;
    db.ensure_schema().await?;

    let project = Project::new("Unadorned".to_string(), None)?;
    db.project_create(&project, &BTreeMap::new(), false).await?;

    let results = db.project_filter(&AttributeFilter::new()).await?;
    assert!(results.iter().any(|p| p.project.id == project.id));

    let all = db.project_list().await?;
    assert_eq!(results.len(), all.len());

    Ok(())
}

#[tokio::test]
#[cfg(feature = "db-tests")]
async fn smoke_test_delete_cascades_to_values() -> ApiResult<()> {
    use facet_core::{Attribute, AttributeType, AttributeValue, Project};
    use std::collections::BTreeMap;

    let db = test_db()?;
    db.ensure_schema().await?;

    let attribute = Attribute::new("Priority".to_string(), AttributeType::Text)?;
    db.attribute_create(&attribute).await?;

    let project = Project::new("Short-lived".to_string(), None)?;
    db.project_create(&project, &BTreeMap::new(), false).await?;
    db.attribute_value_create(
        &AttributeValue::new(attribute.id, project.id, "high".to_string()),
        false,
    )
    .await?;

    assert!(db.project_delete(project.id).await?);
    assert!(db.project_get(project.id).await?.is_none());
    assert!(db.values_for_project(project.id).await?.is_empty());

    // Deleting again reports not found.
    assert!(!db.project_delete(project.id).await?);

    Ok(())
}

#[tokio::test]
#[cfg(feature = "db-tests")]
async fn smoke_test_repeat_value_writes_accumulate() -> ApiResult<()> {
    use facet_core::{Attribute, AttributeType, AttributeValue, Project};
    use std::collections::BTreeMap;

    let db = test_db()?;
    db.ensure_schema().await?;

    let tag = Attribute::new("Tag".to_string(), AttributeType::Text)?;
    db.attribute_create(&tag).await?;

    let project = Project::new("Tagged Twice".to_string(), None)?;
    db.project_create(&project, &BTreeMap::new(), false).await?;

    // Writing the same (attribute, value) pair twice is not an upsert:
    // each call inserts a fresh row.
    db.attribute_value_create(
        &AttributeValue::new(tag.id, project.id, "urgent".to_string()),
        false,
    )
    .await?;
    db.attribute_value_create(
        &AttributeValue::new(tag.id, project.id, "urgent".to_string()),
        false,
    )
    .await?;

    let values = db.values_for_project(project.id).await?;
    let urgent: Vec<_> = values
        .iter()
        .filter(|v| v.attribute.id == tag.id && v.value == "urgent")
        .collect();
    assert_eq!(urgent.len(), 2);

    Ok(())
}

#[tokio::test]
#[cfg(feature = "db-tests")]
async fn smoke_test_type_enforcement_opt_in() -> ApiResult<()> {
    use facet_core::{Attribute, AttributeType, AttributeValue, Project};
    use std::collections::BTreeMap;

    let db = test_db()?;
    db.ensure_schema().await?;

    let budget = Attribute::new("Budget".to_string(), AttributeType::Number)?;
    db.attribute_create(&budget).await?;

    let project = Project::new("Typed".to_string(), None)?;
    db.project_create(&project, &BTreeMap::new(), false).await?;

    // Default mode stores anything, declared types are advisory.
    db.attribute_value_create(
        &AttributeValue::new(budget.id, project.id, "not-a-number".to_string()),
        false,
    )
    .await?;

    // Enforcing mode rejects the mismatch.
    let result = db
        .attribute_value_create(
            &AttributeValue::new(budget.id, project.id, "also-not-a-number".to_string()),
            true,
        )
        .await;
    assert!(result.is_err());

    // And accepts a well-formed value.
    db.attribute_value_create(
        &AttributeValue::new(budget.id, project.id, "50000".to_string()),
        true,
    )
    .await?;

    Ok(())
}

#[tokio::test]
#[cfg(feature = "db-tests")]
async fn smoke_test_user_registration_and_login_flow() -> ApiResult<()> {
    use facet_api::{hash_password, verify_password, User};
    use facet_core::new_entity_id;

    let db = test_db()?;
    db.ensure_schema().await?;

    let email = format!("smoke-{}@example.com", new_entity_id());
    let user = User {
        id: new_entity_id(),
        first_name: "Jane".to_string(),
        last_name: "Doe".to_string(),
        email: email.clone(),
        password_hash: hash_password("hunter22")?,
        created_at: chrono::Utc::now(),
    };
    db.user_create(&user).await?;

    // Duplicate email is a conflict.
    assert!(db.user_create(&user).await.is_err());

    let fetched = db
        .user_get_by_email(&email)
        .await?
        .expect("user should exist");
    assert!(verify_password("hunter22", &fetched.password_hash)?);
    assert!(!verify_password("wrong", &fetched.password_hash)?);

    assert!(db.user_get_by_email("nobody@example.com").await?.is_none());

    Ok(())
}
