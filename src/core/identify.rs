use crate::adapters::image_links::ImageLinker;
use crate::core::prompts::IDENTIFY_PROMPT;
use crate::core::response::{
    object_list_field, parse_model_reply, string_field, string_list_field, ModelReply,
};
use crate::domain::model::{
    Content, ImagePayload, Part, PlantInfo, SimilarPlant, NO_CARE_INSTRUCTIONS, NO_DESCRIPTION,
    UNKNOWN_PLANT_NAME,
};
use crate::domain::ports::ModelClient;
use crate::utils::error::Result;
use serde_json::Value;

/// Maps `similarPlants` hints to named pictures; entries without a name are dropped.
pub(crate) fn similar_plants(
    value: &Value,
    linker: &ImageLinker,
    prompt_suffix: &str,
) -> Vec<SimilarPlant> {
    object_list_field(value, "similarPlants")
        .into_iter()
        .filter_map(|hint| {
            let name = string_field(hint, "name")?;
            let visual = string_field(hint, "imagePrompt").unwrap_or_default();
            let image = linker.generate_image(&format!("{} plant {} {}", name, visual, prompt_suffix));
            Some(SimilarPlant { name, image })
        })
        .collect()
}

pub fn plant_info_from_reply(text: &str, linker: &ImageLinker) -> PlantInfo {
    match parse_model_reply(text) {
        ModelReply::Json(value) => PlantInfo {
            name: string_field(&value, "name").unwrap_or_else(|| UNKNOWN_PLANT_NAME.to_string()),
            description: string_field(&value, "description")
                .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
            care_instructions: string_list_field(&value, "careInstructions")
                .unwrap_or_else(|| vec![NO_CARE_INSTRUCTIONS.to_string()]),
            image: None,
            similar_plants: similar_plants(&value, linker, "realistic high quality"),
        },
        ModelReply::Text { raw, .. } => {
            tracing::warn!("⚠️ Identification reply was not JSON, showing it as plain text");
            PlantInfo::from_plain_text(&raw)
        }
    }
}

pub async fn identify_plant<C: ModelClient + ?Sized>(
    client: &C,
    linker: &ImageLinker,
    image: &ImagePayload,
) -> Result<PlantInfo> {
    let contents = vec![Content::user(vec![
        Part::text(IDENTIFY_PROMPT),
        Part::image(image.clone()),
    ])];

    let text = client.generate_content(contents).await?;
    let info = plant_info_from_reply(&text, linker);
    tracing::info!(
        "🌿 Identified '{}' with {} care tips, {} similar plants",
        info.name,
        info.care_instructions.len(),
        info.similar_plants.len()
    );
    Ok(info)
}
