//! Dinner menu recommendation.
//!
//! One completion call per run. Dish titles are scraped from the keycap
//! headings (`1️⃣` .. `5️⃣`) and recorded so tomorrow's prompt can exclude them.
//! A menu that mentions a forbidden food is still delivered, with a warning logged.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::llm_client::prompts::{fill_template, TELEGRAM_MARKDOWN_INSTRUCTION};
use crate::llm_client::{CompletionOptions, CompletionService};
use crate::meals::diet::DietReference;
use crate::meals::prompts::{recent_meals_block, DINNER_PROMPT_TEMPLATE};
use crate::store::meals::MealHistory;

/// Days of past menus excluded from the prompt.
const RECENT_MEAL_DAYS: usize = 30;
const DISHES_PER_MENU: usize = 5;
const MENU_TEMPERATURE: f32 = 0.9;

static DISH_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[1-5]\x{FE0F}?\x{20E3}[ \t]*\[?([^\]\n*]+)\]?").expect("static regex is valid")
});

#[derive(Debug, Clone, PartialEq)]
pub enum MealOutcome {
    Menu { text: String, dishes: Vec<String> },
    Failed { message: String },
}

impl MealOutcome {
    pub fn message(&self) -> &str {
        match self {
            MealOutcome::Menu { text, .. } => text,
            MealOutcome::Failed { message } => message,
        }
    }
}

pub struct MealRecommender {
    llm: Arc<dyn CompletionService>,
    diet: Box<dyn DietReference>,
    history: MealHistory,
}

impl MealRecommender {
    pub fn new(
        llm: Arc<dyn CompletionService>,
        diet: impl DietReference + 'static,
        history: MealHistory,
    ) -> Self {
        Self {
            llm,
            diet: Box::new(diet),
            history,
        }
    }

    #[cfg(test)]
    pub fn history(&self) -> &MealHistory {
        &self.history
    }

    pub async fn generate_dinner_menu(&mut self) -> MealOutcome {
        let span = info_span!("meal_run", run_id = %Uuid::new_v4());
        self.run().instrument(span).await
    }

    async fn run(&mut self) -> MealOutcome {
        let diet_context = self.diet.render_context();
        let recent_meals = recent_meals_block(&self.history.recent_meals(RECENT_MEAL_DAYS));
        let prompt = fill_template(
            DINNER_PROMPT_TEMPLATE,
            &[
                ("diet_context", diet_context.as_str()),
                ("recent_meals", recent_meals.as_str()),
                ("markdown", TELEGRAM_MARKDOWN_INSTRUCTION),
            ],
        );
        let options = CompletionOptions {
            temperature: Some(MENU_TEMPERATURE),
            grounding: false,
        };

        let text = match self.llm.complete(&prompt, &options).await {
            Ok(text) => text,
            Err(e) => {
                error!("Dinner menu generation failed: {e}");
                return MealOutcome::Failed {
                    message: format!(
                        "⚠️ 식단 추천 생성 중 오류가 발생했습니다!\n\n에러: {e}\n\n잠시 후 다시 시도합니다."
                    ),
                };
            }
        };

        let forbidden = self.diet.forbidden_mentions(&text);
        if !forbidden.is_empty() {
            warn!("Menu mentions forbidden foods: {}", forbidden.join(", "));
        }

        let dishes = extract_dishes(&text);
        if dishes.is_empty() {
            warn!("No dish titles found in menu; history not updated");
        } else {
            info!("Dishes: {}", dishes.join(", "));
            self.history.record_meals(dishes.clone());
        }

        MealOutcome::Menu { text, dishes }
    }
}

/// Dish names from keycap headings, in order, without duplicates.
pub fn extract_dishes(text: &str) -> Vec<String> {
    let mut dishes: Vec<String> = Vec::new();
    for caps in DISH_HEADING.captures_iter(text) {
        let dish = caps[1]
            .trim()
            .trim_matches(|c: char| matches!(c, '*' | '[' | ']'))
            .trim()
            .to_string();
        if !dish.is_empty() && !dishes.contains(&dish) {
            dishes.push(dish);
        }
        if dishes.len() == DISHES_PER_MENU {
            break;
        }
    }
    dishes
}
