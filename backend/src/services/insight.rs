//! AI insight generation
//!
//! Renders the agronomist prompt from the numeric context of an analysis and
//! turns the provider reply into an [`AiInsight`]. Failures of any kind yield
//! the placeholder insight; nothing here returns an error.

use chrono::NaiveDate;
use shared::{
    deviation_percent, parse_insight, AiInsight, Priority, RecommendationCategory,
    WeatherSnapshot,
};

use crate::external::InsightProvider;

pub const SYSTEM_PROMPT: &str = "Ты агроном-аналитик, который оценивает состояние посевов по \
спутниковому индексу NDVI и погодным данным. Отвечай только валидным JSON без пояснений.";

/// Numeric context embedded in the prompt
#[derive(Debug, Clone)]
pub struct InsightContext<'a> {
    pub crop_type: &'a str,
    pub date: NaiveDate,
    pub ndvi: f64,
    pub seasonal_norm: f64,
    pub deviation: f64,
    pub weather: &'a WeatherSnapshot,
}

/// Render the user prompt for a given context
pub fn build_prompt(ctx: &InsightContext<'_>) -> String {
    let categories = RecommendationCategory::ALL.join("|");
    let priorities = Priority::ALL.join("|");

    format!(
        "Культура: {crop}\n\
         Дата: {date}\n\
         Средний NDVI: {ndvi:.2}\n\
         Сезонная норма NDVI: {norm:.2}\n\
         Отклонение от нормы: {dev:+.1}%\n\
         Температура: {temp:.1}°C\n\
         Влажность: {humidity:.0}%\n\
         Скорость ветра: {wind:.1} м/с\n\
         Осадки за 14 дней: {rain:.1} мм\n\n\
         Оцени состояние поля и верни JSON ровно с четырьмя полями:\n\
         {{\"status\": \"краткий заголовок состояния\", \
         \"summary\": \"одно предложение с общей оценкой\", \
         \"weather_impact\": \"одно предложение о влиянии погоды\", \
         \"recommendations\": [{{\"title\": \"...\", \"description\": \"...\", \
         \"category\": \"{categories}\", \"priority\": \"{priorities}\"}}]}}",
        crop = ctx.crop_type,
        date = ctx.date.format("%d.%m.%Y"),
        ndvi = ctx.ndvi,
        norm = ctx.seasonal_norm,
        dev = deviation_percent(ctx.deviation, ctx.seasonal_norm),
        temp = ctx.weather.temperature_celsius,
        humidity = ctx.weather.humidity_percent,
        wind = ctx.weather.wind_speed_mps,
        rain = ctx.weather.rain_14d_mm,
        categories = categories,
        priorities = priorities,
    )
}

/// Produces insights through the configured provider
#[derive(Clone)]
pub struct InsightGenerator {
    provider: InsightProvider,
}

impl InsightGenerator {
    pub fn new(provider: InsightProvider) -> Self {
        Self { provider }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// One provider round trip; the placeholder stands in for any failure
    pub async fn generate(&self, ctx: &InsightContext<'_>) -> AiInsight {
        if matches!(self.provider, InsightProvider::Unconfigured) {
            tracing::debug!("No language-model provider configured, using placeholder insight");
            return AiInsight::placeholder();
        }

        let prompt = build_prompt(ctx);
        let reply = match self.provider.complete(SYSTEM_PROMPT, &prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(provider = self.provider.name(), error = %e, "Insight request failed");
                return AiInsight::placeholder();
            }
        };

        match parse_insight(&reply) {
            Ok(insight) => insight,
            Err(e) => {
                tracing::warn!(
                    provider = self.provider.name(),
                    error = %e,
                    "Insight reply was not valid JSON"
                );
                AiInsight::placeholder()
            }
        }
    }
}
