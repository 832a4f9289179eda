//! Resource command handlers.

use std::io::{self, Read};

use anyhow::{Context, Result, bail};
use campus_core::dispatch::ApiError;
use campus_core::resources::{Resource, ResourceFilters};

use crate::console::{Console, resource_table};

const RESOURCES_PATH: &str = "/resources";

/// Mutations are admin-only in the UI; the API still enforces its own rules.
fn require_admin(console: &mut Console) -> Result<()> {
    let record = console.require_session(RESOURCES_PATH)?;
    if !record.is_admin() {
        bail!("This action requires an administrator account.");
    }
    Ok(())
}

fn parse_body(json: &str) -> Result<Resource> {
    let raw = if json == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("read resource JSON from stdin")?;
        buf
    } else {
        json.to_string()
    };
    serde_json::from_str(&raw).context("parse resource JSON")
}

pub async fn list(console: &mut Console) -> Result<()> {
    console.require_session(RESOURCES_PATH)?;
    let resources = console.resources().list().await.map_err(api_error)?;
    println!("{}", resource_table(&resources));
    Ok(())
}

pub async fn get(console: &mut Console, id: i64) -> Result<()> {
    console.require_session(&format!("{RESOURCES_PATH}/{id}"))?;
    let resource = console.resources().get(id).await.map_err(api_error)?;
    println!("{}", serde_json::to_string_pretty(&resource)?);
    Ok(())
}

pub async fn search(console: &mut Console, filters: &ResourceFilters) -> Result<()> {
    console.require_session(RESOURCES_PATH)?;
    let resources = console
        .resources()
        .search(filters)
        .await
        .map_err(api_error)?;
    println!("{}", resource_table(&resources));
    Ok(())
}

pub async fn create(console: &mut Console, json: &str) -> Result<()> {
    require_admin(console)?;
    let body = parse_body(json)?;
    let created = console.resources().create(&body).await.map_err(api_error)?;
    println!(
        "✓ Created resource {} ({})",
        created.id.map(|id| id.to_string()).unwrap_or_default(),
        created.name
    );
    Ok(())
}

pub async fn update(console: &mut Console, id: i64, json: &str) -> Result<()> {
    require_admin(console)?;
    let body = parse_body(json)?;
    let updated = console
        .resources()
        .update(id, &body)
        .await
        .map_err(api_error)?;
    println!("✓ Updated resource {id} ({})", updated.name);
    Ok(())
}

pub async fn delete(console: &mut Console, id: i64) -> Result<()> {
    require_admin(console)?;
    console.resources().delete(id).await.map_err(api_error)?;
    println!("✓ Deleted resource {id}");
    Ok(())
}

pub async fn analytics(console: &mut Console) -> Result<()> {
    console.require_session(RESOURCES_PATH)?;
    let analytics = console.resources().analytics().await.map_err(api_error)?;
    println!("Total resources:  {}", analytics.total_resources);
    println!("Active:           {}", analytics.active_resources);
    println!("Out of service:   {}", analytics.out_of_service_resources);
    for (kind, count) in &analytics.resources_by_type {
        println!("  {kind}: {count}");
    }
    Ok(())
}

fn api_error(err: ApiError) -> anyhow::Error {
    let message = err.user_message();
    anyhow::Error::new(err).context(message)
}
