//! Prompt templates for idea and post generation

use super::IdeaParams;
use crate::session::{Idea, MAX_IDEAS};

pub const SYSTEM_PROMPT: &str = "You are a professional content strategist and copywriter with experience in marketing and viral content.

Your job is to help users come up with original, engaging content ideas that:
- Fit the target audience
- Hold attention and drive engagement
- Are optimized for the specific platform
- Contain a clear call to action

Always:
1. Generate fresh, creative ideas
2. Take current trends and events into account
3. Adapt the content to the requested format
4. Keep the text simple and clear
5. Use emoji and structure for readability";

/// User instruction asking for exactly [`MAX_IDEAS`] ideas as a JSON array
pub fn ideas_prompt(params: &IdeaParams) -> String {
    format!(
        r#"Generate exactly {MAX_IDEAS} unique content ideas in JSON format.

Parameters:
- Niche: {niche}
- Content goal: {goal}
- Format: {format}

Requirements for each idea:
- title: A short, catchy title (5-10 words)
- description: A brief description of the idea (2-3 sentences, at most 150 characters)

Reply ONLY with JSON and no other text, in this shape:
[
  {{"title": "...", "description": "..."}},
  {{"title": "...", "description": "..."}},
  ...
]"#,
        niche = params.niche,
        goal = params.goal,
        format = params.format,
    )
}

/// User instruction asking for a publish-ready post built on one idea
pub fn post_prompt(params: &IdeaParams, idea: &Idea) -> String {
    format!(
        "Write a ready-to-publish post based on the selected idea.

Parameters:
- Niche: {niche}
- Content goal: {goal}
- Format: {format}
- Idea: {title}
- Idea description: {description}

Requirements for the post:
- Written for the target audience
- Opens with an attention-grabbing headline or hook
- Structured for easy reading
- Contains relevant emoji
- Ends with a clear call to action
- Optimized for the chosen format
- Ready to publish immediately

Write the complete, publish-ready post.",
        niche = params.niche,
        goal = params.goal,
        format = params.format,
        title = idea.title,
        description = idea.description,
    )
}
