// Adapters layer: concrete implementations for external systems (model API, image input, image links).

pub mod gemini;
pub mod image_input;
pub mod image_links;
