pub const IDENTIFY_PROMPT: &str = r#"Identify the plant in this image. Reply with JSON only, in exactly this shape:
{
  "name": "common plant name",
  "description": "a short description of the plant",
  "careInstructions": ["care tip 1", "care tip 2", "care tip 3"],
  "similarPlants": [
    { "name": "similar plant name", "imagePrompt": "short visual description of the similar plant" }
  ]
}"#;

pub const CHAT_ACKNOWLEDGEMENT: &str = "I'll help you with any questions about your plant.";

pub fn chat_context(name: &str, description: &str) -> String {
    format!("I have a {}. Here's what I know about it: {}", name, description)
}

pub fn search_prompt(query: &str) -> String {
    format!(
        r#"Find plants matching the query below and reply with JSON only.

If the query names a general kind of plant (for example "Rose", "Fern" or "Cactus"), list 3 to 5 popular varieties of it as separate entries.

For every plant give:
- name: the specific variety name where one applies
- description: a short description
- careInstructions: an array of 3 short care tips
- similarPlants: 2 or 3 similar plants, each with "name" and "imagePrompt" (a short visual description for image generation)

Shape:
{{
  "plants": [
    {{
      "name": "plant name",
      "description": "short description",
      "careInstructions": ["tip 1", "tip 2", "tip 3"],
      "similarPlants": [
        {{ "name": "similar plant name", "imagePrompt": "visual description" }}
      ]
    }}
  ]
}}

Query: {}"#,
        query
    )
}
