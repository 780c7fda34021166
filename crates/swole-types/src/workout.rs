//! Workout types

use crate::{require, MissingField};
use serde::{Deserialize, Serialize};

/// A stored workout record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workout {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub weight: String,
    pub reps: String,
    pub muscle: String,
}

/// Workout creation request as it arrives on the wire
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkoutRequest {
    pub user_id: Option<i64>,
    pub title: Option<String>,
    pub weight: Option<String>,
    pub reps: Option<String>,
    pub muscle: Option<String>,
}

/// A workout ready to insert, every field present
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWorkout {
    pub user_id: i64,
    pub title: String,
    pub weight: String,
    pub reps: String,
    pub muscle: String,
}

impl WorkoutRequest {
    pub fn validate(self) -> Result<NewWorkout, MissingField> {
        Ok(NewWorkout {
            user_id: require(self.user_id, "user_id")?,
            title: require(self.title, "title")?,
            weight: require(self.weight, "weight")?,
            reps: require(self.reps, "reps")?,
            muscle: require(self.muscle, "muscle")?,
        })
    }
}

/// Partial workout update.
///
/// Absent and null fields both mean "leave unchanged". Unknown keys such as
/// `user_id` are accepted and ignored; a workout never changes owner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutPatch {
    pub title: Option<String>,
    pub weight: Option<String>,
    pub reps: Option<String>,
    pub muscle: Option<String>,
}

impl WorkoutPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.weight.is_none() && self.reps.is_none() && self.muscle.is_none()
    }

    /// Overwrite the fields this patch carries
    pub fn apply(&self, workout: &mut Workout) {
        if let Some(title) = &self.title {
            workout.title = title.clone();
        }
        if let Some(weight) = &self.weight {
            workout.weight = weight.clone();
        }
        if let Some(reps) = &self.reps {
            workout.reps = reps.clone();
        }
        if let Some(muscle) = &self.muscle {
            workout.muscle = muscle.clone();
        }
    }
}
