use crate::adapters::image_links::ImageLinker;
use crate::core::identify::similar_plants;
use crate::core::prompts::search_prompt;
use crate::core::response::{
    object_list_field, parse_model_reply, string_field, string_list_field, ModelReply,
};
use crate::domain::model::{Content, Part, SearchResult, NO_DESCRIPTION, UNKNOWN_PLANT_NAME};
use crate::domain::ports::ModelClient;
use crate::utils::error::Result;

pub fn search_results_from_reply(query: &str, text: &str, linker: &ImageLinker) -> Vec<SearchResult> {
    match parse_model_reply(text) {
        ModelReply::Json(value) => object_list_field(&value, "plants")
            .into_iter()
            .map(|plant| {
                let name = string_field(plant, "name").unwrap_or_else(|| UNKNOWN_PLANT_NAME.to_string());
                SearchResult {
                    image: linker.generate_image(&format!("{} plant realistic high quality", name)),
                    description: string_field(plant, "description")
                        .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
                    care_instructions: string_list_field(plant, "careInstructions").unwrap_or_default(),
                    similar_plants: similar_plants(plant, linker, "realistic"),
                    name,
                }
            })
            .collect(),
        ModelReply::Text { cleaned, .. } => {
            tracing::warn!("⚠️ Search reply was not JSON, returning it as a single result");
            vec![SearchResult {
                name: query.to_string(),
                description: cleaned,
                image: linker.generate_image(&format!("{} plant realistic", query)),
                care_instructions: Vec::new(),
                similar_plants: Vec::new(),
            }]
        }
    }
}

pub async fn search_plants<C: ModelClient + ?Sized>(
    client: &C,
    linker: &ImageLinker,
    query: &str,
) -> Result<Vec<SearchResult>> {
    let query = query.trim();
    if query.is_empty() {
        tracing::debug!("Empty search query, skipping model request");
        return Ok(Vec::new());
    }

    tracing::info!("🔎 Searching plants for '{}'", query);
    let contents = vec![Content::user(vec![Part::text(search_prompt(query))])];
    let text = client.generate_content(contents).await?;

    let results = search_results_from_reply(query, &text, linker);
    tracing::info!("🔎 Found {} plants", results.len());
    Ok(results)
}
