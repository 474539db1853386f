// core/src/records.rs
use std::cmp::Ordering;

use crate::error::StoreError;
use crate::storage::RecordStore;
use crate::types::{Record, RecordType, RecordUpdate, WorkoutEntry};

fn qualifying(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite() && *x > 0.0)
}

fn to_record(entry: &WorkoutEntry, record_type: RecordType, value: f64) -> Record {
    Record {
        user_id: entry.user_id,
        activity_type: entry.activity_type.clone(),
        record_type,
        value,
        workout_id: entry.workout_id.clone(),
        workout_date: entry.workout_date,
    }
}

fn current_for<'a>(current: &'a [Record], user_id: i64, activity_type: &str, t: RecordType) -> Option<&'a Record> {
    current
        .iter()
        .find(|r| r.user_id == user_id && r.activity_type == activity_type && r.record_type == t)
}

/// Compare a new workout against the current records of its user/activity.
///
/// Only strictly greater values replace a record; ties keep the older one.
pub fn evaluate(entry: &WorkoutEntry, current: &[Record]) -> Vec<RecordUpdate> {
    let mut out = Vec::new();
    for t in RecordType::ALL {
        let Some(value) = qualifying(entry.metric(t)) else {
            continue;
        };
        match current_for(current, entry.user_id, &entry.activity_type, t) {
            None => out.push(RecordUpdate::Set {
                record: to_record(entry, t, value),
                replaces: None,
            }),
            Some(existing) if value > existing.value => out.push(RecordUpdate::Set {
                record: to_record(entry, t, value),
                replaces: Some(existing.clone()),
            }),
            Some(_) => {}
        }
    }
    out
}

// Better candidate first: higher value, then earlier date, then lower id.
fn rank(a: (&WorkoutEntry, f64), b: (&WorkoutEntry, f64)) -> Ordering {
    b.1.total_cmp(&a.1)
        .then_with(|| a.0.workout_date.cmp(&b.0.workout_date))
        .then_with(|| a.0.workout_id.cmp(&b.0.workout_id))
}

/// Best holder per record type, rescanning every workout of that user/activity.
pub fn best_records(user_id: i64, activity_type: &str, workouts: &[WorkoutEntry]) -> Vec<Record> {
    let mut out = Vec::new();
    for t in RecordType::ALL {
        let best = workouts
            .iter()
            .filter(|w| w.user_id == user_id && w.activity_type == activity_type)
            .filter_map(|w| qualifying(w.metric(t)).map(|v| (w, v)))
            .min_by(|a, b| rank(*a, *b));
        if let Some((w, v)) = best {
            out.push(to_record(w, t, v));
        }
    }
    out
}

/// Full recomputation, diffed against the current records.
pub fn recompute(user_id: i64, activity_type: &str, workouts: &[WorkoutEntry], current: &[Record]) -> Vec<RecordUpdate> {
    let target = best_records(user_id, activity_type, workouts);
    let mut out = Vec::new();
    for t in RecordType::ALL {
        let new = target.iter().find(|r| r.record_type == t);
        let old = current_for(current, user_id, activity_type, t);
        match (new, old) {
            (Some(n), Some(o)) if n.workout_id == o.workout_id && n.value == o.value => {}
            (Some(n), o) => out.push(RecordUpdate::Set {
                record: n.clone(),
                replaces: o.cloned(),
            }),
            (None, Some(o)) => out.push(RecordUpdate::Remove { record: o.clone() }),
            (None, None) => {}
        }
    }
    out
}

fn holds_record(current: &[Record], user_id: i64, activity_type: &str, workout_id: &str) -> bool {
    current
        .iter()
        .any(|r| r.user_id == user_id && r.activity_type == activity_type && r.workout_id == workout_id)
}

/// Updates after deleting `removed`; `remaining` must not contain it.
pub fn on_workout_removed(removed: &WorkoutEntry, remaining: &[WorkoutEntry], current: &[Record]) -> Vec<RecordUpdate> {
    if !holds_record(current, removed.user_id, &removed.activity_type, &removed.workout_id) {
        return Vec::new();
    }
    let others: Vec<WorkoutEntry> = remaining
        .iter()
        .filter(|w| w.workout_id != removed.workout_id)
        .cloned()
        .collect();
    recompute(removed.user_id, &removed.activity_type, &others, current)
}

/// Updates after editing a workout. `workouts` holds the edited version.
pub fn on_workout_edited(
    previous_activity_type: &str,
    edited: &WorkoutEntry,
    workouts: &[WorkoutEntry],
    current: &[Record],
) -> Vec<RecordUpdate> {
    let user = edited.user_id;
    if previous_activity_type != edited.activity_type {
        let mut out = recompute(user, previous_activity_type, workouts, current);
        out.extend(recompute(user, &edited.activity_type, workouts, current));
        return out;
    }
    if holds_record(current, user, &edited.activity_type, &edited.workout_id) {
        recompute(user, &edited.activity_type, workouts, current)
    } else {
        evaluate(edited, current)
    }
}

/// Applies record decisions through a `RecordStore`, one `apply` per event.
pub struct RecordAggregator<S: RecordStore> {
    store: S,
}

impl<S: RecordStore> RecordAggregator<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    pub fn record_workout(&mut self, entry: &WorkoutEntry) -> Result<Vec<RecordUpdate>, StoreError> {
        let current = self.store.records(entry.user_id, &entry.activity_type)?;
        let updates = evaluate(entry, &current);
        self.commit(updates)
    }

    pub fn remove_workout(&mut self, removed: &WorkoutEntry, remaining: &[WorkoutEntry]) -> Result<Vec<RecordUpdate>, StoreError> {
        let current = self.store.records(removed.user_id, &removed.activity_type)?;
        let updates = on_workout_removed(removed, remaining, &current);
        self.commit(updates)
    }

    pub fn edit_workout(
        &mut self,
        previous_activity_type: &str,
        edited: &WorkoutEntry,
        workouts: &[WorkoutEntry],
    ) -> Result<Vec<RecordUpdate>, StoreError> {
        let mut current = self.store.records(edited.user_id, previous_activity_type)?;
        if previous_activity_type != edited.activity_type {
            current.extend(self.store.records(edited.user_id, &edited.activity_type)?);
        }
        let updates = on_workout_edited(previous_activity_type, edited, workouts, &current);
        self.commit(updates)
    }

    fn commit(&mut self, updates: Vec<RecordUpdate>) -> Result<Vec<RecordUpdate>, StoreError> {
        if !updates.is_empty() {
            self.store.apply(&updates)?;
            log::info!("[records] applied {} update(s)", updates.len());
        }
        Ok(updates)
    }
}
