use std::path::Path;

use quill_core::{Category, CategoryId, FetchStrategy};
use serde::Serialize;

use crate::commands::common::open_context;
use crate::error::CliError;

pub fn run_category_add(
    name: &str,
    color: Option<&str>,
    position: i64,
    db_path: &Path,
) -> Result<(), CliError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CliError::EmptyName);
    }

    let mut category = Category::new(name).with_position(position);
    if let Some(color) = color {
        category = category.with_color(color.trim());
    }

    let ctx = open_context(db_path)?;
    let created = ctx.categories.create(category)?;

    println!("{}", created.id);
    Ok(())
}

#[derive(Debug, Serialize)]
struct CategoryListItem {
    id: String,
    name: String,
    color_hex: Option<String>,
    position: i64,
}

pub async fn run_category_list(as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let ctx = open_context(db_path)?;
    let mut categories = ctx.categories.list(FetchStrategy::Cached).await?;
    categories.sort_by_key(|category| category.position);

    if as_json {
        let json_items = categories
            .iter()
            .map(|category| CategoryListItem {
                id: category.id.to_string(),
                name: category.name.clone(),
                color_hex: category.color_hex.clone(),
                position: category.position,
            })
            .collect::<Vec<CategoryListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if categories.is_empty() {
        println!("No categories.");
        return Ok(());
    }

    for category in &categories {
        match &category.color_hex {
            Some(color) => println!("{}  {}  {}", category.id, category.name, color),
            None => println!("{}  {}", category.id, category.name),
        }
    }
    Ok(())
}

pub fn run_category_delete(id: &str, db_path: &Path) -> Result<(), CliError> {
    let category_id = id
        .trim()
        .parse::<CategoryId>()
        .map_err(|_| CliError::InvalidId(id.to_string()))?;

    let ctx = open_context(db_path)?;
    ctx.categories.delete(&category_id.as_str())?;
    println!("{category_id}");
    Ok(())
}
