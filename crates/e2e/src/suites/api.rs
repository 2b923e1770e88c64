//! Entity CRUD suite

use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::warn;

use entityqa_common::{remove_id_keys, strip_ids, validate, EntityData, EntityResponse, ExportData, IdPerson};

use crate::api::EntityApi;
use crate::ensure;
use crate::error::E2eResult;
use crate::fixtures::CreatedEntity;
use crate::report::{step, Attachment};

use super::{CaseFuture, Severity, TestCase, TestContext};

pub const TAG: &str = "api";

const EPIC: &str = "Entity API";
const FEATURE: &str = "Entity CRUD Operations";

pub fn cases() -> Vec<TestCase> {
    vec![
        TestCase {
            name: "test_create_entity",
            title: "Create entity",
            description: "Test creating a new entity and verifying it exists",
            tags: &[TAG],
            epic: EPIC,
            feature: FEATURE,
            story: "Entity Creation",
            severity: Severity::Critical,
            body: test_create_entity,
        },
        TestCase {
            name: "test_delete_entity",
            title: "Delete entity",
            description: "Test deleting an entity and verifying it no longer exists",
            tags: &[TAG],
            epic: EPIC,
            feature: FEATURE,
            story: "Entity Deletion",
            severity: Severity::Critical,
            body: test_delete_entity,
        },
        TestCase {
            name: "test_get_entity",
            title: "Get entity",
            description: "Test retrieving an entity by ID",
            tags: &[TAG],
            epic: EPIC,
            feature: FEATURE,
            story: "Entity Retrieval",
            severity: Severity::Normal,
            body: test_get_entity,
        },
        TestCase {
            name: "test_get_all_entities",
            title: "Get all entities",
            description: "Test retrieving all entities and finding a specific one",
            tags: &[TAG],
            epic: EPIC,
            feature: FEATURE,
            story: "Entity List Retrieval",
            severity: Severity::Normal,
            body: test_get_all_entities,
        },
        TestCase {
            name: "test_update_entity",
            title: "Update entity",
            description: "Test updating an entity and verifying the changes",
            tags: &[TAG],
            epic: EPIC,
            feature: FEATURE,
            story: "Entity Update",
            severity: Severity::Critical,
            body: test_update_entity,
        },
    ]
}

/// Validate a stored entity and strip its ids, checking the top-level one
fn stored_payload(body: &Value, id: i64) -> E2eResult<Value> {
    let export: ExportData = validate(body)?;
    Ok(strip_ids(&export, Some(id), true)?)
}

fn payload(data: &EntityData) -> E2eResult<Value> {
    Ok(serde_json::to_value(data)?)
}

/// Run `body` against a freshly created entity, always tearing it down
async fn with_created_entity<'a, F, Fut>(ctx: &'a TestContext, body: F) -> E2eResult<()>
where
    F: FnOnce(EntityApi, i64, EntityData) -> Fut,
    Fut: std::future::Future<Output = E2eResult<()>> + 'a,
{
    let api = ctx.api_client();
    let data = ctx.json_data("Generate test data");
    let entity = CreatedEntity::setup(&api, data).await?;
    let result = body(api.clone(), entity.id, entity.data.clone()).await;
    entity.teardown(&api).await;
    result
}

fn test_create_entity(ctx: &TestContext) -> CaseFuture<'_> {
    Box::pin(async move {
        let api = ctx.api_client();
        let reporter = ctx.reporter.clone();
        let data = ctx.json_data("Generate test data");

        let id = step(&*reporter, "Create new entity with test data", api.create_entity(&data)).await?;

        let outcome = async {
            step(&*reporter, "Validate the returned entity ID", async {
                let identity: IdPerson = validate(&json!({ "id": id }))?;
                reporter.attach("Created Entity ID", Attachment::text(identity.id.to_string()));
                Ok(())
            })
            .await?;

            let response = step(&*reporter, "Retrieve the created entity", api.get_entity(id)).await?;

            step(&*reporter, "Compare entity data with original test data", async {
                let clean = stored_payload(&response.body, id)?;
                ensure!(
                    response.status == StatusCode::OK,
                    "expected status 200, got {}",
                    response.status
                );
                ensure!(clean == payload(&data)?, "stored entity {} differs from sent payload", clean);
                Ok(())
            })
            .await
        }
        .await;

        reporter.start_step("Clean up - delete the created entity");
        if let Err(e) = api.delete_entity(id).await {
            warn!(id, "cleanup failed: {}", e);
            reporter.attach("Exception during entity cleanup", Attachment::text(e.to_string()));
        }
        reporter.finish_step(crate::report::Status::Passed);

        outcome
    })
}

fn test_delete_entity(ctx: &TestContext) -> CaseFuture<'_> {
    Box::pin(with_created_entity(ctx, move |api, id, _| async move {
        let reporter = api.reporter().clone();

        step(&*reporter, format!("Delete entity with ID {}", id), async {
            let status = api.delete_entity(id).await?;
            ensure!(status == StatusCode::NO_CONTENT, "expected status 204, got {}", status);
            Ok(())
        })
        .await?;

        step(&*reporter, format!("Verify entity with ID {} no longer exists", id), async {
            match api.get_entity(id).await {
                Ok(response) => {
                    ensure!(
                        response.status != StatusCode::OK,
                        "deleted entity {} is still served",
                        id
                    );
                    reporter.attach(
                        "Response status code",
                        Attachment::text(response.status.as_u16().to_string()),
                    );
                }
                // a failed request also proves the entity is gone
                Err(e) => reporter.attach(
                    "Exception on retrieving deleted entity",
                    Attachment::text(e.to_string()),
                ),
            }
            Ok(())
        })
        .await
    }))
}

fn test_get_entity(ctx: &TestContext) -> CaseFuture<'_> {
    Box::pin(with_created_entity(ctx, move |api, id, data| async move {
        let reporter = api.reporter().clone();

        let response = step(
            &*reporter,
            format!("Retrieve entity with ID {}", id),
            api.get_entity(id),
        )
        .await?;

        step(&*reporter, "Validate the retrieved entity data", async {
            let clean = stored_payload(&response.body, id)?;
            ensure!(
                response.status == StatusCode::OK,
                "expected status 200, got {}",
                response.status
            );
            ensure!(clean == payload(&data)?, "stored entity {} differs from sent payload", clean);
            Ok(())
        })
        .await
    }))
}

fn test_get_all_entities(ctx: &TestContext) -> CaseFuture<'_> {
    Box::pin(with_created_entity(ctx, move |api, _, data| async move {
        let reporter = api.reporter().clone();

        let response = step(&*reporter, "Retrieve all entities", api.get_all_entities()).await?;

        step(&*reporter, "Validate the response format", async {
            let list: EntityResponse = validate(&response.body)?;
            reporter.attach("Total entities found", Attachment::text(list.entity.len().to_string()));

            let expected = payload(&data)?;
            let mut found = false;
            for entity in &list.entity {
                if remove_id_keys(&serde_json::to_value(entity)?, None, false)? == expected {
                    found = true;
                    break;
                }
            }

            ensure!(
                response.status == StatusCode::OK,
                "expected status 200, got {}",
                response.status
            );
            ensure!(found, "Created entity not found in the list of all entities");
            Ok(())
        })
        .await
    }))
}

fn test_update_entity(ctx: &TestContext) -> CaseFuture<'_> {
    Box::pin(async move {
        let patch = ctx.json_data("Generate update data");
        with_created_entity(ctx, move |api, id, _| async move {
            let reporter = api.reporter().clone();

            step(&*reporter, format!("Update entity with ID {}", id), async {
                let status = api.update_entity(id, &patch).await?;
                ensure!(status == StatusCode::NO_CONTENT, "expected status 204, got {}", status);
                Ok(())
            })
            .await?;

            let clean = step(&*reporter, "Retrieve the updated entity", async {
                let response = api.get_entity(id).await?;
                stored_payload(&response.body, id)
            })
            .await?;

            step(&*reporter, "Verify the entity was updated correctly", async {
                ensure!(clean == payload(&patch)?, "entity {} does not reflect the update", clean);
                Ok(())
            })
            .await
        })
        .await
    })
}
