use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use recipebox_application::AppContext;
use recipebox_core::recipe::{ImageAttachment, NewRecipe, Recipe};
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct AddArgs {
    #[arg(long)]
    name: String,
    #[arg(long, default_value = "")]
    description: String,
    /// One ingredient per line
    #[arg(long, default_value = "", conflicts_with = "ingredients_file")]
    ingredients: String,
    #[arg(long)]
    ingredients_file: Option<PathBuf>,
    /// One step per line
    #[arg(long, default_value = "", conflicts_with = "instructions_file")]
    instructions: String,
    #[arg(long)]
    instructions_file: Option<PathBuf>,
    /// Minutes; anything unparsable counts as 0
    #[arg(long, default_value = "")]
    prep_time: String,
    #[arg(long, default_value = "")]
    cook_time: String,
    #[arg(long, default_value = "")]
    servings: String,
    #[arg(long, default_value = "")]
    category: String,
    /// Image to attach
    #[arg(long)]
    image: Option<PathBuf>,
}

impl AddArgs {
    async fn into_new_recipe(self) -> Result<NewRecipe> {
        let ingredients = match &self.ingredients_file {
            Some(path) => read_text(path).await?,
            None => self.ingredients,
        };
        let instructions = match &self.instructions_file {
            Some(path) => read_text(path).await?,
            None => self.instructions,
        };
        let image = match &self.image {
            Some(path) => Some(read_image(path).await?),
            None => None,
        };

        Ok(NewRecipe {
            name: self.name,
            description: self.description,
            ingredients,
            instructions,
            prep_time: self.prep_time,
            cook_time: self.cook_time,
            servings: self.servings,
            category: self.category,
            image,
        })
    }
}

async fn read_text(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

async fn read_image(path: &Path) -> Result<ImageAttachment> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read image {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(ImageAttachment { file_name, bytes })
}

pub async fn add(context: &AppContext, args: AddArgs) -> Result<()> {
    let input = args.into_new_recipe().await?;
    let state = context.session().initialize().await?;

    let id = context.recipes().create(&input, &state).await?;
    println!("{} {}", "Recipe added:".green(), id);
    Ok(())
}

pub async fn list(context: &AppContext, json: bool) -> Result<()> {
    let recipes = context.recipes().list().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&recipes)?);
        return Ok(());
    }

    if recipes.is_empty() {
        println!("{}", "No recipes yet.".dimmed());
        return Ok(());
    }
    for recipe in &recipes {
        print_recipe(recipe);
    }
    Ok(())
}

fn print_recipe(recipe: &Recipe) {
    let author = recipe.author_label.as_deref().unwrap_or("Guest");
    println!("{}", recipe.name.bold());
    println!(
        "  {}",
        format!(
            "by {} on {}",
            author,
            recipe.created_at.format("%Y-%m-%d %H:%M")
        )
        .dimmed()
    );
    if let Some(category) = &recipe.category {
        println!("  Category: {}", category);
    }
    if !recipe.description.is_empty() {
        println!("  {}", recipe.description);
    }
    println!(
        "  Prep {} min | Cook {} min | Serves {}",
        recipe.prep_time_minutes, recipe.cook_time_minutes, recipe.servings
    );
    if !recipe.ingredients.is_empty() {
        println!("  {}", "Ingredients".cyan());
        for item in &recipe.ingredients {
            println!("    - {}", item);
        }
    }
    if !recipe.instructions.is_empty() {
        println!("  {}", "Instructions".cyan());
        for (step, line) in recipe.instructions.iter().enumerate() {
            println!("    {}. {}", step + 1, line);
        }
    }
    if let Some(url) = &recipe.image_url {
        println!("  Image: {}", url);
    }
    println!();
}
