/// OpenAI-compatible planning provider
///
/// Drives both planning calls: plan generation (a JSON-object completion
/// parsed into a `PlanDraft`) and per-item explanation (a plain one-line
/// completion). Transport failures, non-success statuses, and unparseable
/// payloads all surface as `Planning`/`Explanation` errors so the
/// orchestrator's fallback ladder can take over.
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::{Mode, PlanContext, PlanDraft, ScoredCandidate},
    services::providers::PlanningProvider,
};

#[derive(Clone)]
pub struct OpenAiPlanner {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

const PLAN_SYSTEM_PROMPT: &str = "You are a gift search planner. Respond with a single JSON \
object with keys: keywords (array of search strings), category_weights (array of \
{path, weight} with weight in [0,1]), price_min, price_max, condition (new|any), \
candidate_target (integer). No prose.";

const EXPLAIN_SYSTEM_PROMPT: &str = "You write one short reason (at most 20 words) why an item \
makes a good gift. Mention only details provided. No quotes, no markdown.";

impl OpenAiPlanner {
    pub fn new(api_key: String, api_url: String, model: String, timeout_secs: u64) -> Self {
        let http_client = HttpClient::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            http_client,
            api_key,
            api_url,
            model,
        }
    }

    async fn complete(&self, request: ChatRequest) -> AppResult<String> {
        if self.api_key.is_empty() {
            return Err(AppError::Planning(
                "Planning service API key not configured".to_string(),
            ));
        }

        let url = format!("{}/v1/chat/completions", self.api_url);
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Planning(format!("Planning request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Planning(format!(
                "Planning service returned status {}: {}",
                status, body
            )));
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::Planning(format!("Invalid planning response: {}", e)))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| AppError::Planning("Planning response had no content".to_string()))
    }

    fn plan_prompt(mode: Mode, context: &PlanContext) -> String {
        let mut prompt = format!(
            "Build a marketplace search plan for {} gift recommendations in region {}. \
             Price range: ${:.0} to ${:.0}. Aim for candidate_target = {}.",
            mode, context.region, context.budget_min, context.budget_max, context.candidate_target,
        );

        match mode {
            Mode::Popular => {
                prompt.push_str(
                    " Focus on broadly popular, well-reviewed gift items across mainstream \
                     categories (home, kitchen, tech accessories, games, self-care).",
                );
            }
            Mode::Occasion => {
                if let Some(occasion) = &context.occasion {
                    prompt.push_str(&format!(
                        " The occasion is: {}. Weight categories appropriate to it.",
                        occasion
                    ));
                }
            }
            Mode::Personalized => {
                if let Some(relationship) = &context.relationship {
                    prompt.push_str(&format!(" The recipient is the buyer's {}.", relationship));
                }
                if let Some(gender) = &context.gender {
                    prompt.push_str(&format!(" Gender: {}.", gender));
                }
                if let Some(age_range) = &context.age_range {
                    prompt.push_str(&format!(" Age range: {}.", age_range));
                }
                if !context.interests.is_empty() {
                    prompt.push_str(&format!(" Interests: {}.", context.interests.join(", ")));
                }
                if let Some(preferences) = &context.special_preferences {
                    prompt.push_str(&format!(" Special preferences: {}.", preferences));
                }
            }
        }

        prompt
    }

    fn explain_prompt(candidate: &ScoredCandidate, mode: Mode) -> String {
        let c = &candidate.candidate;
        let mut prompt = format!(
            "Item: {}. Price: {:.2} {}.",
            c.title,
            c.price_midpoint(),
            c.currency
        );
        if let Some(category) = &c.category {
            prompt.push_str(&format!(" Category: {}.", category));
        }
        if let (Some(avg), Some(count)) = (c.rating_avg, c.rating_count) {
            prompt.push_str(&format!(" Rated {:.1}/5 by {} buyers.", avg, count));
        }
        if !c.badges.is_empty() {
            prompt.push_str(&format!(" Badges: {}.", c.badges.join(", ")));
        }
        prompt.push_str(&format!(" Mode: {} recommendations.", mode));
        prompt
    }
}

#[async_trait::async_trait]
impl PlanningProvider for OpenAiPlanner {
    async fn plan(&self, mode: Mode, context: &PlanContext) -> AppResult<PlanDraft> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: PLAN_SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: Self::plan_prompt(mode, context),
                },
            ],
            temperature: 0.2,
            response_format: Some(ResponseFormat {
                format_type: "json_object",
            }),
        };

        let content = self.complete(request).await?;
        let draft: PlanDraft = serde_json::from_str(content.trim())
            .map_err(|e| AppError::Planning(format!("Unparseable plan payload: {}", e)))?;

        tracing::info!(
            mode = %mode,
            keywords = draft.keywords.len(),
            provider = "openai",
            "Plan draft received"
        );

        Ok(draft)
    }

    async fn explain(&self, candidate: &ScoredCandidate, mode: Mode) -> AppResult<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: EXPLAIN_SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: Self::explain_prompt(candidate, mode),
                },
            ],
            temperature: 0.4,
            response_format: None,
        };

        self.complete(request)
            .await
            .map_err(|e| AppError::Explanation(e.to_string()))
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}
