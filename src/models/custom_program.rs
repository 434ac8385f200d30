use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// A per-user program: program → workouts → exercises.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomProgram {
    pub id: String,
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Filled in by the program loader; not a column
    #[serde(default)]
    pub workouts: Vec<Workout>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workout {
    pub id: String,
    pub program_id: String,
    pub name: String,
    #[serde(default)]
    pub day_number: i32,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub position: i32,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exercise {
    pub id: String,
    pub workout_id: String,
    pub name: String,
    #[serde(default)]
    pub sets: Option<i32>,
    #[serde(default)]
    pub reps: Option<String>,
    #[serde(default)]
    pub rest_seconds: Option<i32>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub position: i32,
}

/// Admin create/update payload for a whole program tree.
#[derive(Debug, Default, Deserialize)]
pub struct ProgramInput {
    pub user_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    /// On update, None leaves the existing workouts untouched
    #[serde(default)]
    pub workouts: Option<Vec<WorkoutInput>>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct WorkoutInput {
    /// Present when editing an existing workout
    pub id: Option<String>,
    pub name: Option<String>,
    pub day_number: Option<i32>,
    pub notes: Option<String>,
    #[serde(default)]
    pub exercises: Vec<ExerciseInput>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ExerciseInput {
    pub id: Option<String>,
    pub name: Option<String>,
    pub sets: Option<i32>,
    pub reps: Option<String>,
    pub rest_seconds: Option<i32>,
    pub notes: Option<String>,
}

impl ProgramInput {
    /// Validate for creation: owner and title are required.
    pub fn validate_create(&self) -> Result<()> {
        if self.user_id.as_deref().is_none_or(|v| v.trim().is_empty()) {
            return Err(AppError::missing_field("user_id"));
        }
        if self.title.as_deref().is_none_or(|v| v.trim().is_empty()) {
            return Err(AppError::missing_field("title"));
        }
        self.validate_children()
    }

    /// Validate for update: the title may be omitted but not blanked.
    pub fn validate_update(&self) -> Result<()> {
        if self.title.as_deref().is_some_and(|v| v.trim().is_empty()) {
            return Err(AppError::missing_field("title"));
        }
        self.validate_children()
    }

    fn validate_children(&self) -> Result<()> {
        for (w, workout) in self.workouts.iter().flatten().enumerate() {
            if workout.name.as_deref().is_none_or(|v| v.trim().is_empty()) {
                return Err(AppError::missing_field(&format!("workouts[{}].name", w)));
            }
            for (e, exercise) in workout.exercises.iter().enumerate() {
                if exercise.name.as_deref().is_none_or(|v| v.trim().is_empty()) {
                    return Err(AppError::missing_field(&format!(
                        "workouts[{}].exercises[{}].name",
                        w, e
                    )));
                }
                if exercise.sets.is_some_and(|s| s < 0)
                    || exercise.rest_seconds.is_some_and(|r| r < 0)
                {
                    return Err(AppError::BadRequest(format!(
                        "workouts[{}].exercises[{}] has a negative value",
                        w, e
                    )));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct NewProgram {
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProgramPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Workout columns written on insert and update.
#[derive(Debug, Serialize)]
pub struct WorkoutRow {
    pub program_id: String,
    pub name: String,
    pub day_number: i32,
    pub notes: Option<String>,
    pub position: i32,
}

impl WorkoutRow {
    pub fn from_input(program_id: &str, input: &WorkoutInput, position: usize) -> Self {
        Self {
            program_id: program_id.to_string(),
            name: input.name.clone().unwrap_or_default().trim().to_string(),
            day_number: input.day_number.unwrap_or(position as i32 + 1),
            notes: input.notes.clone(),
            position: position as i32,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ExerciseRow {
    pub workout_id: String,
    pub name: String,
    pub sets: Option<i32>,
    pub reps: Option<String>,
    pub rest_seconds: Option<i32>,
    pub notes: Option<String>,
    pub position: i32,
}

impl ExerciseRow {
    pub fn from_input(workout_id: &str, input: &ExerciseInput, position: usize) -> Self {
        Self {
            workout_id: workout_id.to_string(),
            name: input.name.clone().unwrap_or_default().trim().to_string(),
            sets: input.sets,
            reps: input.reps.clone(),
            rest_seconds: input.rest_seconds,
            notes: input.notes.clone(),
            position: position as i32,
        }
    }
}
