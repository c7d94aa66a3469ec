//! Change planning between observed and desired leaves.

use vyos_session::{ConfigEntry, Leaves};

/// Returns the entries turning `observed` into `desired`, deletions first.
///
/// A leaf whose values differ is deleted and set again, since a set on a
/// multi-value leaf appends instead of replacing. Leaves only present in
/// `observed` are deleted.
pub fn plan_changes(observed: &Leaves, desired: &Leaves) -> Vec<ConfigEntry> {
    let mut deletes = Vec::new();
    let mut sets = Vec::new();

    for path in observed.keys() {
        if !desired.contains_key(path) {
            deletes.push(ConfigEntry::delete(path.clone()));
        }
    }

    for (path, values) in desired {
        match observed.get(path) {
            Some(current) if current == values => {}
            Some(_) => {
                deletes.push(ConfigEntry::delete(path.clone()));
                sets.extend(values.iter().map(|v| ConfigEntry::set(path.clone(), v.clone())));
            }
            None => {
                sets.extend(values.iter().map(|v| ConfigEntry::set(path.clone(), v.clone())));
            }
        }
    }

    deletes.extend(sets);
    deletes
}

/// Returns every set needed to create `desired` from nothing.
pub fn full_sets(desired: &Leaves) -> Vec<ConfigEntry> {
    desired
        .iter()
        .flat_map(|(path, values)| {
            values
                .iter()
                .map(move |v| ConfigEntry::set(path.clone(), v.clone()))
        })
        .collect()
}
