use crate::core::error::ConfigurationError;
use crate::core::types::ItemId;
use std::collections::HashMap;

/// Topological ordering of items along their bill of materials
pub struct BomOrderBuilder;

impl BomOrderBuilder {
    /// Groups items into levels: level 0 consumes nothing, level n only consumes
    /// items of lower levels. Uses Kahn's algorithm, so a cycle leaves items
    /// that never reach in-degree zero.
    ///
    /// `edges` are `(component, consumer)` pairs; duplicates are allowed.
    pub fn build_levels(
        item_names: &[String],
        edges: &[(ItemId, ItemId)],
    ) -> Result<Vec<Vec<ItemId>>, ConfigurationError> {
        let mut adj_list: HashMap<ItemId, Vec<ItemId>> = HashMap::new();
        let mut in_degree: HashMap<ItemId, usize> = HashMap::new();

        for index in 0..item_names.len() {
            in_degree.insert(ItemId(index), 0);
            adj_list.insert(ItemId(index), Vec::new());
        }

        for &(component, consumer) in edges {
            if !in_degree.contains_key(&component) || !in_degree.contains_key(&consumer) {
                continue;
            }
            if let Some(neighbors) = adj_list.get_mut(&component) {
                neighbors.push(consumer);
            }
            if let Some(degree) = in_degree.get_mut(&consumer) {
                *degree += 1;
            }
        }

        let mut levels = Vec::new();
        let mut processed_count = 0;

        while processed_count < item_names.len() {
            let mut current_level: Vec<ItemId> = in_degree
                .iter()
                .filter(|(_, &degree)| degree == 0)
                .map(|(id, _)| *id)
                .collect();

            if current_level.is_empty() {
                let mut remaining: Vec<ItemId> = in_degree.keys().copied().collect();
                remaining.sort();
                return Err(ConfigurationError::CyclicBom {
                    items: remaining
                        .into_iter()
                        .map(|id| item_names[id.0].clone())
                        .collect(),
                });
            }

            // Sort level for deterministic results
            current_level.sort();

            for item in &current_level {
                in_degree.remove(item);
                processed_count += 1;

                if let Some(neighbors) = adj_list.get(item) {
                    for neighbor in neighbors {
                        if let Some(degree) = in_degree.get_mut(neighbor) {
                            *degree -= 1;
                        }
                    }
                }
            }

            levels.push(current_level);
        }

        Ok(levels)
    }

    /// Reject a cyclic bill of materials without keeping the levels
    pub fn check_acyclic(item_names: &[String], edges: &[(ItemId, ItemId)]) -> Result<(), ConfigurationError> {
        Self::build_levels(item_names, edges).map(|_| ())
    }
}
