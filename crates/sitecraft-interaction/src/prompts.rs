//! Prompt templates for generating and refining a single-file website.

use minijinja::{Environment, context};
use sitecraft_core::generation::GenerationError;

const GENERATION_TEMPLATE: &str = r#"You are an expert full-stack web developer. Your task is to generate a complete, single-file 'index.html' for a web application based on the user's prompt.

The output MUST be a single JSON object with a single key "htmlContent".

The value of "htmlContent" must be a string containing the full HTML code.

Guidelines for the generated HTML:
1.  **Single File:** All necessary CSS and JavaScript must be included directly within the HTML file.
2.  **CSS:** Use a <style> tag in the <head> section. Use modern, responsive design principles. You can use Tailwind CSS via the CDN ({{ tailwind_cdn }}) if you prefer, otherwise use standard CSS. Make the website visually appealing.
3.  **JavaScript:** Use a <script> tag just before the closing </body> tag. The JavaScript should be functional and directly related to the user's request.
4.  **No External Files:** Do not link to any external CSS or JavaScript files other than the Tailwind CDN if you choose to use it. All code must be self-contained in the provided HTML.
5.  **Placeholders:** Use placeholder images from `{{ placeholder_images }}` if images are needed. For example: `<img src="{{ placeholder_images }}800/600" alt="Placeholder">`.
6.  **Content:** The generated website should be visually appealing and fully functional according to the user's prompt.

User Prompt:
---
{{ prompt }}
---

Remember, respond ONLY with the JSON object. Do not include any other text, explanations, or markdown formatting like ```json. Your entire response must be valid JSON."#;

const REFINEMENT_TEMPLATE: &str = r#"You are an expert full-stack web developer. Your task is to take an existing HTML file content and a user's instruction, then return the modified, complete, single-file 'index.html'.

The output MUST be a single JSON object with a single key "htmlContent".

The value of "htmlContent" must be a string containing the full, modified HTML code.

Guidelines for the modification:
1.  **Single File Integrity:** The output must remain a single HTML file. All CSS and JavaScript must be embedded.
2.  **Minimal Necessary Changes:** Only modify what is necessary to fulfill the user's request. Preserve the existing structure, styles, and functionality as much as possible.
3.  **Modern Practices:** Ensure the final code is modern, responsive, and visually appealing.
4.  **No External Files:** Do not add links to external CSS or JavaScript files other than a Tailwind CDN if used.
5.  **Maintain Placeholders:** Keep using placeholder images from `{{ placeholder_images }}` if images are needed.

Existing HTML Content:
---
{{ document }}
---

User's Refinement Request:
---
{{ prompt }}
---

Remember, respond ONLY with the JSON object containing the full, updated HTML. Do not include any other text, explanations, or markdown formatting. Your entire response must be valid JSON."#;

pub const TAILWIND_CDN: &str = "https://cdn.tailwindcss.com";
pub const PLACEHOLDER_IMAGES: &str = "https://picsum.photos/";

/// Renders the generation and refinement prompts.
///
/// Template names carry no file extension, so minijinja applies no
/// auto-escaping and documents pass through verbatim.
pub struct PromptBuilder {
    env: Environment<'static>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        let mut env = Environment::new();
        // Both templates are compile-time constants; a syntax error would
        // surface on the first render instead.
        if let Err(e) = env.add_template("generation", GENERATION_TEMPLATE) {
            tracing::error!("Invalid generation template: {e}");
        }
        if let Err(e) = env.add_template("refinement", REFINEMENT_TEMPLATE) {
            tracing::error!("Invalid refinement template: {e}");
        }
        Self { env }
    }

    pub fn generation(&self, prompt: &str) -> Result<String, GenerationError> {
        self.render(
            "generation",
            context! {
                prompt => prompt,
                tailwind_cdn => TAILWIND_CDN,
                placeholder_images => PLACEHOLDER_IMAGES,
            },
        )
    }

    pub fn refinement(&self, document: &str, prompt: &str) -> Result<String, GenerationError> {
        self.render(
            "refinement",
            context! {
                document => document,
                prompt => prompt,
                placeholder_images => PLACEHOLDER_IMAGES,
            },
        )
    }

    fn render(&self, name: &str, ctx: minijinja::Value) -> Result<String, GenerationError> {
        self.env
            .get_template(name)
            .and_then(|template| template.render(ctx))
            .map_err(|e| GenerationError::Prompt(e.to_string()))
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_prompt_embeds_user_prompt() {
        let prompt = PromptBuilder::new().generation("build a todo app").unwrap();

        assert!(prompt.contains("---\nbuild a todo app\n---"));
        assert!(prompt.contains("https://cdn.tailwindcss.com"));
        assert!(prompt.contains("https://picsum.photos/800/600"));
        assert!(prompt.contains("\"htmlContent\""));
    }

    #[test]
    fn test_refinement_prompt_keeps_document_verbatim() {
        let document = "<html><body><p class=\"x\">a & b {{ not a tag }}</p></body></html>";
        let prompt = PromptBuilder::new().refinement(document, "add dark mode").unwrap();

        assert!(prompt.contains(document));
        assert!(prompt.contains("User's Refinement Request:\n---\nadd dark mode\n---"));
    }
}
