use serde::de::Error;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Which catalog services are selected for a job.
///
/// Stored as a map from service id to a flag. A missing id and an id mapped to `false` both mean
/// "not selected". On the wire it is either a JSON object such as `{"1": true, "3": false}` or a
/// list of selected ids such as `[1, 3]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectedServices(BTreeMap<i64, bool>);

impl SelectedServices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a selection in which every id in `ids` is selected.
    pub fn from_ids(ids: impl IntoIterator<Item = i64>) -> Self {
        Self(ids.into_iter().map(|id| (id, true)).collect())
    }

    /// Sets the flag for `id`.
    pub fn set(&mut self, id: i64, selected: bool) {
        self.0.insert(id, selected);
    }

    /// Flips the flag for `id`, treating a missing id as unselected.
    pub fn toggle(&mut self, id: i64) {
        let current = self.is_selected(id);
        self.0.insert(id, !current);
    }

    pub fn is_selected(&self, id: i64) -> bool {
        self.0.get(&id).copied().unwrap_or(false)
    }

    /// The ids whose flag is `true`, in ascending order.
    pub fn selected_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.0.iter().filter(|(_, on)| **on).map(|(id, _)| *id)
    }

    pub fn is_empty(&self) -> bool {
        self.selected_ids().next().is_none()
    }
}

impl FromIterator<(i64, bool)> for SelectedServices {
    fn from_iter<T: IntoIterator<Item = (i64, bool)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'de> Deserialize<'de> for SelectedServices {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            // JSON object keys are always strings
            Map(BTreeMap<String, bool>),
            Ids(Vec<i64>),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Map(map) => map
                .into_iter()
                .map(|(key, on)| {
                    key.trim()
                        .parse::<i64>()
                        .map(|id| (id, on))
                        .map_err(|_| D::Error::custom(format!("Invalid service id '{key}'")))
                })
                .collect(),
            Raw::Ids(ids) => Ok(SelectedServices::from_ids(ids)),
        }
    }
}
