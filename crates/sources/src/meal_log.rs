//! Daily goals and the meal log.
//!
//! The log is owned by the caller. The engine never reads it; it only
//! receives the remaining budget computed here.

use data_loader::{Macro, MacroTarget};
use serde::{Deserialize, Serialize};

/// Daily macro goals.
pub type DailyGoals = MacroTarget;

/// One logged food with the amounts actually eaten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedMeal {
    pub name: String,
    pub portion_g: f64,
    /// Nutrient values per 100 g
    pub per_100g: MacroTarget,
}

impl LoggedMeal {
    pub fn new(name: impl Into<String>, per_100g: MacroTarget, portion_g: f64) -> Self {
        Self {
            name: name.into(),
            portion_g,
            per_100g,
        }
    }

    /// Amounts consumed: per-100g values scaled by `portion_g / 100`.
    pub fn consumed(&self) -> MacroTarget {
        self.per_100g.per_portion(self.portion_g)
    }
}

/// Progress towards one goal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacroProgress {
    pub consumed: f64,
    pub goal: f64,
    /// `consumed / goal`, 0 when the goal is 0
    pub fraction: f64,
}

impl MacroProgress {
    fn new(consumed: f64, goal: f64) -> Self {
        let fraction = if goal > 0.0 { consumed / goal } else { 0.0 };
        Self {
            consumed,
            goal,
            fraction,
        }
    }
}

/// Progress for energy and every macro.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyProgress {
    pub kcal: MacroProgress,
    pub protein: MacroProgress,
    pub fat: MacroProgress,
    pub carbs: MacroProgress,
}

impl DailyProgress {
    pub fn get(&self, m: Macro) -> MacroProgress {
        match m {
            Macro::Protein => self.protein,
            Macro::Fat => self.fat,
            Macro::Carbs => self.carbs,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MealLog {
    pub meals: Vec<LoggedMeal>,
}

impl MealLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&mut self, meal: LoggedMeal) {
        self.meals.push(meal);
    }

    pub fn is_empty(&self) -> bool {
        self.meals.is_empty()
    }

    /// Most recently logged meal.
    pub fn last(&self) -> Option<&LoggedMeal> {
        self.meals.last()
    }

    pub fn clear(&mut self) {
        self.meals.clear();
    }

    /// Sum of everything consumed so far.
    pub fn totals(&self) -> MacroTarget {
        self.meals
            .iter()
            .map(LoggedMeal::consumed)
            .fold(MacroTarget::default(), |acc, m| {
                MacroTarget::new(
                    acc.kcal + m.kcal,
                    acc.protein_g + m.protein_g,
                    acc.fat_g + m.fat_g,
                    acc.carbs_g + m.carbs_g,
                )
            })
    }

    /// What is left of each goal, clamped at 0.
    pub fn remaining(&self, goals: &DailyGoals) -> MacroTarget {
        let totals = self.totals();
        MacroTarget::new(
            (goals.kcal - totals.kcal).max(0.0),
            (goals.protein_g - totals.protein_g).max(0.0),
            (goals.fat_g - totals.fat_g).max(0.0),
            (goals.carbs_g - totals.carbs_g).max(0.0),
        )
    }

    pub fn progress(&self, goals: &DailyGoals) -> DailyProgress {
        let totals = self.totals();
        DailyProgress {
            kcal: MacroProgress::new(totals.kcal, goals.kcal),
            protein: MacroProgress::new(totals.protein_g, goals.protein_g),
            fat: MacroProgress::new(totals.fat_g, goals.fat_g),
            carbs: MacroProgress::new(totals.carbs_g, goals.carbs_g),
        }
    }

    /// True once no protein, fat or carbohydrate budget is left.
    pub fn goals_met(&self, goals: &DailyGoals) -> bool {
        self.remaining(goals).total_macros_g() <= 0.0
    }
}
