//! Progress reconciliation: keeps the per-user aggregate consistent with
//! completion toggles while tolerating questions that no longer exist.
//!
//! The question-side flag and the aggregate are persisted as two separate
//! document updates with no cross-entity transaction; each update is atomic
//! on its own and a crash between them leaves a window the next toggle
//! closes.

use chrono::Utc;

use crate::database::{
    DatabaseManager, Progress, ProgressStats, Result as DbResult,
};

/// Mutate the aggregate for one toggle. Set semantics both ways: adding a
/// present id and removing an absent one are no-ops. `total_completed` is
/// always recomputed from the set size, never adjusted incrementally.
pub fn apply_completion(progress: &mut Progress, question_id: &str, is_completed: bool) {
    if is_completed {
        if !progress.completed_question_ids.iter().any(|id| id == question_id) {
            progress.completed_question_ids.push(question_id.to_string());
        }
    } else {
        progress.completed_question_ids.retain(|id| id != question_id);
    }
    progress.total_completed = progress.completed_question_ids.len() as i32;
    progress.last_updated = Utc::now();
}

/// Read path: a user with no aggregate gets an empty one created and
/// persisted. This is the defined initial state, not an error.
pub async fn fetch_or_create(db: &DatabaseManager, user_id: &str) -> DbResult<Progress> {
    if let Some(progress) = db.get_progress(user_id).await? {
        return Ok(progress);
    }
    let progress = Progress::empty(user_id);
    db.upsert_progress(&progress).await?;
    Ok(progress)
}

/// Write path: set the completion state for (user, question).
///
/// The question update is skipped when the id resolves to no live question;
/// the aggregate still records the toggle (dangling weak references are
/// tolerated).
pub async fn set_completion(
    db: &DatabaseManager,
    user_id: &str,
    question_id: &str,
    is_completed: bool,
) -> DbResult<Progress> {
    let mut progress = match db.get_progress(user_id).await? {
        Some(progress) => progress,
        None => Progress::empty(user_id),
    };

    db.set_question_solved(question_id, is_completed).await?;

    apply_completion(&mut progress, question_id, is_completed);
    db.upsert_progress(&progress).await?;
    Ok(progress)
}

/// Difficulty-bucketed stats for the dashboard. Joins the completed set
/// against live questions; dangling ids count toward the total only.
pub async fn stats(db: &DatabaseManager, user_id: &str) -> DbResult<ProgressStats> {
    let Some(progress) = db.get_progress(user_id).await? else {
        return Ok(ProgressStats {
            total_completed: 0,
            easy: 0,
            medium: 0,
            hard: 0,
            last_active: None,
        });
    };

    let (easy, medium, hard) = db.difficulty_counts(&progress.completed_question_ids).await?;
    Ok(ProgressStats {
        total_completed: progress.total_completed,
        easy,
        medium,
        hard,
        last_active: Some(progress.last_updated),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completing_adds_once_and_recomputes_total() {
        let mut progress = Progress::empty("user-1");
        apply_completion(&mut progress, "two-sum", true);
        apply_completion(&mut progress, "two-sum", true);
        assert_eq!(progress.completed_question_ids, vec!["two-sum"]);
        assert_eq!(progress.total_completed, 1);
    }

    #[test]
    fn uncompleting_removes_and_tolerates_absent_ids() {
        let mut progress = Progress::empty("user-1");
        apply_completion(&mut progress, "two-sum", true);
        apply_completion(&mut progress, "three-sum", true);
        apply_completion(&mut progress, "two-sum", false);
        apply_completion(&mut progress, "never-added", false);
        assert_eq!(progress.completed_question_ids, vec!["three-sum"]);
        assert_eq!(progress.total_completed, 1);
    }

    #[test]
    fn total_matches_set_size_after_any_toggle_sequence() {
        let mut progress = Progress::empty("user-1");
        let toggles = [
            ("a", true),
            ("b", true),
            ("a", false),
            ("a", true),
            ("b", false),
            ("c", true),
            ("c", true),
            ("a", false),
        ];
        for (id, target) in toggles {
            apply_completion(&mut progress, id, target);
            assert_eq!(
                progress.total_completed as usize,
                progress.completed_question_ids.len()
            );
        }
        // Last toggle per id determines membership.
        assert!(!progress.completed_question_ids.contains(&"a".to_string()));
        assert!(!progress.completed_question_ids.contains(&"b".to_string()));
        assert!(progress.completed_question_ids.contains(&"c".to_string()));
    }
}
