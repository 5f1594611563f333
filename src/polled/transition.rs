//! Polled transition rows and the per-source table that holds them.

use super::machine::PolledMachine;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Predicate deciding whether a polled transition fires.
///
/// Conditions see the whole machine by shared reference and are expected to
/// be free of side effects. Cloning a condition shares the function.
pub struct Condition<C> {
    predicate: Arc<dyn Fn(&PolledMachine<C>) -> bool + Send + Sync>,
}

impl<C> Condition<C> {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&PolledMachine<C>) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
        }
    }

    pub fn check(&self, machine: &PolledMachine<C>) -> bool {
        (self.predicate)(machine)
    }

    /// True when both conditions wrap the same function.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.predicate, &other.predicate)
    }
}

impl<C> Clone for Condition<C> {
    fn clone(&self) -> Self {
        Self {
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<C> fmt::Debug for Condition<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condition").finish_non_exhaustive()
    }
}

/// One or more source states for a transition registration.
///
/// A string is always a single state id, never a sequence of characters.
///
/// ```rust
/// use statewright::polled::Sources;
///
/// assert_eq!(Sources::from("idle").as_slice(), ["idle"]);
/// assert_eq!(Sources::from(["idle", "moving"]).len(), 2);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sources(Vec<String>);

impl Sources {
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl From<&str> for Sources {
    fn from(source: &str) -> Self {
        Self(vec![source.to_string()])
    }
}

impl From<String> for Sources {
    fn from(source: String) -> Self {
        Self(vec![source])
    }
}

impl From<&String> for Sources {
    fn from(source: &String) -> Self {
        Self(vec![source.clone()])
    }
}

impl<const N: usize> From<[&str; N]> for Sources {
    fn from(sources: [&str; N]) -> Self {
        Self(sources.iter().map(|s| s.to_string()).collect())
    }
}

impl From<&[&str]> for Sources {
    fn from(sources: &[&str]) -> Self {
        Self(sources.iter().map(|s| s.to_string()).collect())
    }
}

impl From<Vec<&str>> for Sources {
    fn from(sources: Vec<&str>) -> Self {
        Self(sources.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for Sources {
    fn from(sources: Vec<String>) -> Self {
        Self(sources)
    }
}

impl FromIterator<String> for Sources {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A single `from -> to` row guarded by a condition.
pub struct Transition<C> {
    pub from: String,
    pub to: String,
    pub condition: Condition<C>,
}

impl<C> Clone for Transition<C> {
    fn clone(&self) -> Self {
        Self {
            from: self.from.clone(),
            to: self.to.clone(),
            condition: self.condition.clone(),
        }
    }
}

impl<C> fmt::Debug for Transition<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("from", &self.from)
            .field("to", &self.to)
            .finish_non_exhaustive()
    }
}

/// Transition rows grouped by source state, each group in registration order.
///
/// Cloning the table copies every row container; only the conditions are
/// shared.
pub struct TransitionTable<C> {
    rows: HashMap<String, Vec<Transition<C>>>,
}

impl<C> TransitionTable<C> {
    pub fn new() -> Self {
        Self {
            rows: HashMap::new(),
        }
    }

    /// Append one row per source, all sharing `condition`.
    pub fn insert(&mut self, sources: Sources, to: &str, condition: Condition<C>) {
        for from in sources.into_vec() {
            let row = Transition {
                from: from.clone(),
                to: to.to_string(),
                condition: condition.clone(),
            };
            self.rows.entry(from).or_default().push(row);
        }
    }

    /// Rows leaving `from`, in registration order. Unknown states have none.
    pub fn from_state(&self, from: &str) -> &[Transition<C>] {
        self.rows.get(from).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of rows.
    pub fn len(&self) -> usize {
        self.rows.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Source states that have at least one row.
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }
}

impl<C> Default for TransitionTable<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Clone for TransitionTable<C> {
    fn clone(&self) -> Self {
        Self {
            rows: self.rows.clone(),
        }
    }
}

impl<C> fmt::Debug for TransitionTable<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.rows.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Context;

    fn always() -> Condition<Context> {
        Condition::new(|_| true)
    }

    #[test]
    fn single_string_is_one_source() {
        let sources = Sources::from("idle");
        assert_eq!(sources.as_slice(), ["idle".to_string()]);

        let owned = Sources::from(String::from("ab"));
        assert_eq!(owned.len(), 1);
    }

    #[test]
    fn collection_expands_to_one_row_per_source() {
        let mut table = TransitionTable::new();
        let condition = always();
        table.insert(Sources::from(["A", "B"]), "C", condition.clone());

        assert_eq!(table.len(), 2);
        let a = &table.from_state("A")[0];
        let b = &table.from_state("B")[0];
        assert_eq!((a.from.as_str(), a.to.as_str()), ("A", "C"));
        assert_eq!((b.from.as_str(), b.to.as_str()), ("B", "C"));
        assert!(a.condition.ptr_eq(&condition));
        assert!(b.condition.ptr_eq(&condition));
    }

    #[test]
    fn rows_keep_registration_order() {
        let mut table = TransitionTable::new();
        table.insert("idle".into(), "walk", always());
        table.insert("idle".into(), "run", always());
        table.insert("idle".into(), "jump", always());

        let targets: Vec<&str> = table
            .from_state("idle")
            .iter()
            .map(|t| t.to.as_str())
            .collect();
        assert_eq!(targets, vec!["walk", "run", "jump"]);
    }

    #[test]
    fn unknown_source_has_no_rows() {
        let table: TransitionTable<Context> = TransitionTable::new();
        assert!(table.from_state("nowhere").is_empty());
    }

    #[test]
    fn clone_copies_rows_and_shares_conditions() {
        let mut table = TransitionTable::new();
        table.insert("a".into(), "b", always());

        let mut copy = table.clone();
        copy.insert("a".into(), "c", always());

        assert_eq!(table.from_state("a").len(), 1);
        assert_eq!(copy.from_state("a").len(), 2);
        assert!(table.from_state("a")[0]
            .condition
            .ptr_eq(&copy.from_state("a")[0].condition));
    }

    #[test]
    fn clear_removes_everything() {
        let mut table = TransitionTable::new();
        table.insert(["a", "b"].into(), "c", always());
        table.clear();
        assert!(table.is_empty());
    }
}
