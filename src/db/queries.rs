use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::models::*;
use crate::supabase::SupabaseClient;

const PACKAGES: &str = "packages";
const PURCHASES: &str = "purchases";
const SUPPORT_TICKETS: &str = "support_tickets";
const CUSTOM_PROGRAMS: &str = "custom_programs";
const PROGRAM_WORKOUTS: &str = "program_workouts";
const WORKOUT_EXERCISES: &str = "workout_exercises";
const SUGGESTIONS: &str = "suggestions";

/// Partial update body with `updated_at` stamped alongside the changed fields.
#[derive(Serialize)]
struct Stamped<'a, T: Serialize> {
    #[serde(flatten)]
    fields: &'a T,
    updated_at: DateTime<Utc>,
}

fn stamped<T: Serialize>(fields: &T) -> Stamped<'_, T> {
    Stamped {
        fields,
        updated_at: Utc::now(),
    }
}

// ============ Packages ============

pub async fn list_active_packages(db: &SupabaseClient) -> Result<Vec<Package>> {
    db.table(PACKAGES)
        .eq("is_active", true)
        .order("sort_order", true)
        .select()
        .await
}

pub async fn list_all_packages(db: &SupabaseClient) -> Result<Vec<Package>> {
    db.table(PACKAGES).order("sort_order", true).select().await
}

pub async fn get_package(db: &SupabaseClient, id: &str) -> Result<Option<Package>> {
    db.table(PACKAGES).eq("id", id).maybe_single().await
}

pub async fn get_active_package(db: &SupabaseClient, id: &str) -> Result<Option<Package>> {
    db.table(PACKAGES)
        .eq("id", id)
        .eq("is_active", true)
        .maybe_single()
        .await
}

pub async fn create_package(db: &SupabaseClient, input: &CreatePackage) -> Result<Package> {
    db.table(PACKAGES).insert_one(input).await
}

pub async fn update_package(
    db: &SupabaseClient,
    id: &str,
    input: &UpdatePackage,
) -> Result<Option<Package>> {
    let rows: Vec<Package> = db.table(PACKAGES).eq("id", id).update(&stamped(input)).await?;
    Ok(rows.into_iter().next())
}

pub async fn delete_package(db: &SupabaseClient, id: &str) -> Result<bool> {
    let rows: Vec<Package> = db.table(PACKAGES).eq("id", id).delete().await?;
    Ok(!rows.is_empty())
}

// ============ Purchases ============

pub async fn find_purchase_by_session(
    db: &SupabaseClient,
    session_id: &str,
) -> Result<Option<Purchase>> {
    db.table(PURCHASES)
        .eq("stripe_session_id", session_id)
        .maybe_single()
        .await
}

pub async fn insert_purchase(db: &SupabaseClient, input: &CreatePurchase) -> Result<Purchase> {
    db.table(PURCHASES).insert_one(input).await
}

/// Purchases are stored with lowercased emails, so the lookup lowercases too.
pub async fn list_purchases_for_email(db: &SupabaseClient, email: &str) -> Result<Vec<Purchase>> {
    db.table(PURCHASES)
        .eq("email", email.trim().to_lowercase())
        .order("created_at", false)
        .select()
        .await
}

pub async fn list_all_purchases(db: &SupabaseClient) -> Result<Vec<Purchase>> {
    db.table(PURCHASES).order("created_at", false).select().await
}

// ============ Support tickets ============

pub async fn list_tickets_for_user(
    db: &SupabaseClient,
    user_id: &str,
) -> Result<Vec<SupportTicket>> {
    db.table(SUPPORT_TICKETS)
        .eq("user_id", user_id)
        .order("created_at", false)
        .select()
        .await
}

pub async fn list_all_tickets(db: &SupabaseClient) -> Result<Vec<SupportTicket>> {
    db.table(SUPPORT_TICKETS)
        .order("created_at", false)
        .select()
        .await
}

pub async fn create_ticket(db: &SupabaseClient, input: &CreateTicket) -> Result<SupportTicket> {
    db.table(SUPPORT_TICKETS).insert_one(input).await
}

/// Delete a ticket only if `user_id` owns it. Returns whether a row went away.
pub async fn delete_ticket_for_user(db: &SupabaseClient, id: &str, user_id: &str) -> Result<bool> {
    let rows: Vec<SupportTicket> = db
        .table(SUPPORT_TICKETS)
        .eq("id", id)
        .eq("user_id", user_id)
        .delete()
        .await?;
    Ok(!rows.is_empty())
}

pub async fn update_ticket(
    db: &SupabaseClient,
    id: &str,
    patch: &TicketPatch,
) -> Result<Option<SupportTicket>> {
    let rows: Vec<SupportTicket> = db.table(SUPPORT_TICKETS).eq("id", id).update(patch).await?;
    Ok(rows.into_iter().next())
}

// ============ Custom programs ============

pub async fn list_programs(
    db: &SupabaseClient,
    user_id: Option<&str>,
) -> Result<Vec<CustomProgram>> {
    let query = db.table(CUSTOM_PROGRAMS);
    let query = match user_id {
        Some(uid) => query.eq("user_id", uid),
        None => query,
    };
    query.order("created_at", false).select().await
}

pub async fn get_program(db: &SupabaseClient, id: &str) -> Result<Option<CustomProgram>> {
    db.table(CUSTOM_PROGRAMS).eq("id", id).maybe_single().await
}

pub async fn get_program_for_user(
    db: &SupabaseClient,
    id: &str,
    user_id: &str,
) -> Result<Option<CustomProgram>> {
    db.table(CUSTOM_PROGRAMS)
        .eq("id", id)
        .eq("user_id", user_id)
        .maybe_single()
        .await
}

pub async fn insert_program(db: &SupabaseClient, row: &NewProgram) -> Result<CustomProgram> {
    db.table(CUSTOM_PROGRAMS).insert_one(row).await
}

pub async fn update_program(
    db: &SupabaseClient,
    id: &str,
    patch: &ProgramPatch,
) -> Result<Option<CustomProgram>> {
    let rows: Vec<CustomProgram> = db.table(CUSTOM_PROGRAMS).eq("id", id).update(patch).await?;
    Ok(rows.into_iter().next())
}

pub async fn delete_program(db: &SupabaseClient, id: &str) -> Result<bool> {
    let rows: Vec<CustomProgram> = db.table(CUSTOM_PROGRAMS).eq("id", id).delete().await?;
    Ok(!rows.is_empty())
}

pub async fn list_workouts(db: &SupabaseClient, program_ids: &[String]) -> Result<Vec<Workout>> {
    if program_ids.is_empty() {
        return Ok(Vec::new());
    }
    db.table(PROGRAM_WORKOUTS)
        .in_list("program_id", program_ids)
        .order("position", true)
        .select()
        .await
}

pub async fn insert_workout(db: &SupabaseClient, row: &WorkoutRow) -> Result<Workout> {
    db.table(PROGRAM_WORKOUTS).insert_one(row).await
}

pub async fn update_workout(
    db: &SupabaseClient,
    id: &str,
    row: &WorkoutRow,
) -> Result<Option<Workout>> {
    let rows: Vec<Workout> = db.table(PROGRAM_WORKOUTS).eq("id", id).update(row).await?;
    Ok(rows.into_iter().next())
}

pub async fn delete_workouts(db: &SupabaseClient, ids: &[String]) -> Result<usize> {
    if ids.is_empty() {
        return Ok(0);
    }
    let rows: Vec<Workout> = db.table(PROGRAM_WORKOUTS).in_list("id", ids).delete().await?;
    Ok(rows.len())
}

pub async fn list_exercises(db: &SupabaseClient, workout_ids: &[String]) -> Result<Vec<Exercise>> {
    if workout_ids.is_empty() {
        return Ok(Vec::new());
    }
    db.table(WORKOUT_EXERCISES)
        .in_list("workout_id", workout_ids)
        .order("position", true)
        .select()
        .await
}

pub async fn insert_exercise(db: &SupabaseClient, row: &ExerciseRow) -> Result<Exercise> {
    db.table(WORKOUT_EXERCISES).insert_one(row).await
}

pub async fn update_exercise(
    db: &SupabaseClient,
    id: &str,
    row: &ExerciseRow,
) -> Result<Option<Exercise>> {
    let rows: Vec<Exercise> = db.table(WORKOUT_EXERCISES).eq("id", id).update(row).await?;
    Ok(rows.into_iter().next())
}

pub async fn delete_exercises(db: &SupabaseClient, ids: &[String]) -> Result<usize> {
    if ids.is_empty() {
        return Ok(0);
    }
    let rows: Vec<Exercise> = db.table(WORKOUT_EXERCISES).in_list("id", ids).delete().await?;
    Ok(rows.len())
}

pub async fn delete_exercises_for_workouts(
    db: &SupabaseClient,
    workout_ids: &[String],
) -> Result<usize> {
    if workout_ids.is_empty() {
        return Ok(0);
    }
    let rows: Vec<Exercise> = db
        .table(WORKOUT_EXERCISES)
        .in_list("workout_id", workout_ids)
        .delete()
        .await?;
    Ok(rows.len())
}

// ============ Suggestions ============

pub async fn create_suggestion(
    db: &SupabaseClient,
    input: &CreateSuggestion,
) -> Result<Suggestion> {
    db.table(SUGGESTIONS).insert_one(input).await
}

pub async fn list_suggestions(db: &SupabaseClient) -> Result<Vec<Suggestion>> {
    db.table(SUGGESTIONS).order("created_at", false).select().await
}
