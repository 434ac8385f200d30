//! Program tree operations: loading, creation, diff-and-upsert editing, removal.
//!
//! Sibling rows at one level are written concurrently and awaited together.
//! Nothing is rolled back: if one sibling fails, the others stay written and
//! the first error is returned.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use futures_util::future::join_all;

use crate::db::queries;
use crate::error::Result;
use crate::models::*;
use crate::supabase::SupabaseClient;

/// What to do with one level of children when applying an edit.
#[derive(Debug)]
pub struct ChildPlan<'a, T> {
    /// (existing id, position, input)
    pub update: Vec<(String, usize, &'a T)>,
    /// (position, input)
    pub insert: Vec<(usize, &'a T)>,
    pub delete: Vec<String>,
}

/// Match incoming children against existing ids.
///
/// An incoming child whose id belongs to this parent is updated in place.
/// A child with no id, an unknown id, or an id already claimed earlier in
/// the list is inserted fresh. Existing children nobody claimed are deleted.
pub fn plan_children<'a, T>(
    existing: &[String],
    incoming: &'a [T],
    id_of: impl Fn(&T) -> Option<&str>,
) -> ChildPlan<'a, T> {
    let known: HashSet<&str> = existing.iter().map(String::as_str).collect();
    let mut claimed: HashSet<String> = HashSet::new();
    let mut plan = ChildPlan {
        update: Vec::new(),
        insert: Vec::new(),
        delete: Vec::new(),
    };

    for (position, child) in incoming.iter().enumerate() {
        match id_of(child) {
            Some(id) if known.contains(id) && claimed.insert(id.to_string()) => {
                plan.update.push((id.to_string(), position, child));
            }
            _ => plan.insert.push((position, child)),
        }
    }

    plan.delete = existing
        .iter()
        .filter(|id| !claimed.contains(*id))
        .cloned()
        .collect();
    plan
}

fn collect<T>(results: Vec<Result<T>>) -> Result<Vec<T>> {
    results.into_iter().collect()
}

/// Attach workouts and exercises to each program, ordered by position.
pub async fn load_trees(
    db: &SupabaseClient,
    mut programs: Vec<CustomProgram>,
) -> Result<Vec<CustomProgram>> {
    let program_ids: Vec<String> = programs.iter().map(|p| p.id.clone()).collect();
    let workouts = queries::list_workouts(db, &program_ids).await?;
    let workout_ids: Vec<String> = workouts.iter().map(|w| w.id.clone()).collect();
    let exercises = queries::list_exercises(db, &workout_ids).await?;

    let mut exercises_by_workout: HashMap<String, Vec<Exercise>> = HashMap::new();
    for exercise in exercises {
        exercises_by_workout
            .entry(exercise.workout_id.clone())
            .or_default()
            .push(exercise);
    }

    let mut workouts_by_program: HashMap<String, Vec<Workout>> = HashMap::new();
    for mut workout in workouts {
        workout.exercises = exercises_by_workout.remove(&workout.id).unwrap_or_default();
        workouts_by_program
            .entry(workout.program_id.clone())
            .or_default()
            .push(workout);
    }

    for program in &mut programs {
        program.workouts = workouts_by_program.remove(&program.id).unwrap_or_default();
    }
    Ok(programs)
}

pub async fn load_tree(db: &SupabaseClient, program: CustomProgram) -> Result<CustomProgram> {
    let mut trees = load_trees(db, vec![program]).await?;
    Ok(trees.remove(0))
}

/// Insert a program with its whole child tree.
pub async fn create_program(db: &SupabaseClient, input: &ProgramInput) -> Result<CustomProgram> {
    let program = queries::insert_program(
        db,
        &NewProgram {
            user_id: input.user_id.clone().unwrap_or_default().trim().to_string(),
            title: input.title.clone().unwrap_or_default().trim().to_string(),
            description: input.description.clone(),
        },
    )
    .await?;

    let workouts = input.workouts.as_deref().unwrap_or_default();
    let rows: Vec<WorkoutRow> = workouts
        .iter()
        .enumerate()
        .map(|(i, w)| WorkoutRow::from_input(&program.id, w, i))
        .collect();
    let inserted =
        collect(join_all(rows.iter().map(|row| queries::insert_workout(db, row))).await)?;

    let exercise_rows: Vec<ExerciseRow> = inserted
        .iter()
        .zip(workouts)
        .flat_map(|(workout, input)| {
            input
                .exercises
                .iter()
                .enumerate()
                .map(|(i, e)| ExerciseRow::from_input(&workout.id, e, i))
        })
        .collect();
    collect(join_all(exercise_rows.iter().map(|row| queries::insert_exercise(db, row))).await)?;

    tracing::info!(
        program_id = %program.id,
        user_id = %program.user_id,
        workouts = inserted.len(),
        exercises = exercise_rows.len(),
        "Custom program created"
    );

    load_tree(db, program).await
}

/// Update program fields and reconcile children against the request.
///
/// Returns None when the program does not exist.
pub async fn update_program(
    db: &SupabaseClient,
    id: &str,
    input: &ProgramInput,
) -> Result<Option<CustomProgram>> {
    let patch = ProgramPatch {
        title: input.title.as_ref().map(|t| t.trim().to_string()),
        description: input.description.clone(),
        updated_at: Utc::now(),
    };
    let Some(program) = queries::update_program(db, id, &patch).await? else {
        return Ok(None);
    };

    if let Some(workouts) = input.workouts.as_deref() {
        apply_workouts(db, &program.id, workouts).await?;
    }

    load_tree(db, program).await.map(Some)
}

async fn apply_workouts(
    db: &SupabaseClient,
    program_id: &str,
    incoming: &[WorkoutInput],
) -> Result<()> {
    let existing = queries::list_workouts(db, &[program_id.to_string()]).await?;
    let existing_ids: Vec<String> = existing.iter().map(|w| w.id.clone()).collect();
    let plan = plan_children(&existing_ids, incoming, |w| w.id.as_deref());

    // Removed workouts take their exercises with them.
    queries::delete_exercises_for_workouts(db, &plan.delete).await?;
    queries::delete_workouts(db, &plan.delete).await?;

    let update_rows: Vec<(String, WorkoutRow)> = plan
        .update
        .iter()
        .map(|(wid, pos, w)| (wid.clone(), WorkoutRow::from_input(program_id, w, *pos)))
        .collect();
    let insert_rows: Vec<WorkoutRow> = plan
        .insert
        .iter()
        .map(|(pos, w)| WorkoutRow::from_input(program_id, w, *pos))
        .collect();

    let (updated, inserted) = tokio::join!(
        join_all(update_rows.iter().map(|(wid, row)| queries::update_workout(db, wid, row))),
        join_all(insert_rows.iter().map(|row| queries::insert_workout(db, row))),
    );
    collect(updated)?;
    let inserted = collect(inserted)?;

    // Pair every surviving workout id with the exercises requested for it.
    let mut targets: Vec<(String, &[ExerciseInput])> = plan
        .update
        .iter()
        .map(|(wid, _, w)| (wid.clone(), w.exercises.as_slice()))
        .collect();
    targets.extend(
        inserted
            .iter()
            .zip(plan.insert.iter())
            .map(|(workout, (_, w))| (workout.id.clone(), w.exercises.as_slice())),
    );

    let kept_ids: Vec<String> = plan.update.iter().map(|(wid, _, _)| wid.clone()).collect();
    let existing_exercises = queries::list_exercises(db, &kept_ids).await?;
    let mut existing_by_workout: HashMap<&str, Vec<String>> = HashMap::new();
    for e in &existing_exercises {
        existing_by_workout
            .entry(e.workout_id.as_str())
            .or_default()
            .push(e.id.clone());
    }

    let mut deletes: Vec<String> = Vec::new();
    let mut updates: Vec<(String, ExerciseRow)> = Vec::new();
    let mut inserts: Vec<ExerciseRow> = Vec::new();
    for (workout_id, exercises) in &targets {
        let existing = existing_by_workout
            .get(workout_id.as_str())
            .cloned()
            .unwrap_or_default();
        let plan = plan_children(&existing, *exercises, |e| e.id.as_deref());
        deletes.extend(plan.delete);
        updates.extend(
            plan.update
                .into_iter()
                .map(|(eid, pos, e)| (eid, ExerciseRow::from_input(workout_id, e, pos))),
        );
        inserts.extend(
            plan.insert
                .into_iter()
                .map(|(pos, e)| ExerciseRow::from_input(workout_id, e, pos)),
        );
    }

    queries::delete_exercises(db, &deletes).await?;
    let (updated, inserted) = tokio::join!(
        join_all(updates.iter().map(|(eid, row)| queries::update_exercise(db, eid, row))),
        join_all(inserts.iter().map(|row| queries::insert_exercise(db, row))),
    );
    collect(updated)?;
    collect(inserted)?;

    tracing::info!(
        program_id,
        workouts_removed = plan.delete.len(),
        workouts_added = insert_rows.len(),
        exercises_removed = deletes.len(),
        exercises_added = inserts.len(),
        "Custom program children reconciled"
    );
    Ok(())
}

/// Remove a program and all of its children. Returns false if it did not exist.
pub async fn delete_program(db: &SupabaseClient, id: &str) -> Result<bool> {
    let workouts = queries::list_workouts(db, &[id.to_string()]).await?;
    let workout_ids: Vec<String> = workouts.into_iter().map(|w| w.id).collect();
    queries::delete_exercises_for_workouts(db, &workout_ids).await?;
    queries::delete_workouts(db, &workout_ids).await?;
    queries::delete_program(db, id).await
}
