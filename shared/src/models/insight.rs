//! AI insight models and reply parsing

use serde::{Deserialize, Serialize};

/// Natural-language assessment attached to every analysis
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AiInsight {
    /// Short status title
    pub status: String,
    pub summary: String,
    #[serde(alias = "weatherImpact")]
    pub weather_impact: String,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub title: String,
    pub description: String,
    pub category: RecommendationCategory,
    pub priority: Priority,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationCategory {
    Irrigation,
    Fertilization,
    Protection,
    Monitoring,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl RecommendationCategory {
    pub const ALL: [&'static str; 4] = ["irrigation", "fertilization", "protection", "monitoring"];
}

impl Priority {
    pub const ALL: [&'static str; 3] = ["high", "medium", "low"];
}

impl AiInsight {
    /// Fixed insight substituted whenever the language model is unavailable
    pub fn placeholder() -> Self {
        AiInsight {
            status: "Анализ ИИ недоступен".to_string(),
            summary: "Не удалось получить оценку от ИИ, показаны только расчётные показатели."
                .to_string(),
            weather_impact: "Оценка влияния погоды временно недоступна.".to_string(),
            recommendations: vec![Recommendation {
                title: "Продолжайте наблюдение".to_string(),
                description: "Повторите анализ позже, чтобы получить рекомендации.".to_string(),
                category: RecommendationCategory::Monitoring,
                priority: Priority::Medium,
            }],
        }
    }
}

/// Remove markdown code-fence markers around a model reply
pub fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        text = rest.strip_prefix("json").unwrap_or(rest);
    }
    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// Parse a model reply into an insight
pub fn parse_insight(raw: &str) -> Result<AiInsight, serde_json::Error> {
    serde_json::from_str(strip_code_fences(raw))
}

/// Parse a model reply, substituting the placeholder on any failure
pub fn parse_insight_or_placeholder(raw: &str) -> AiInsight {
    parse_insight(raw).unwrap_or_else(|_| AiInsight::placeholder())
}
