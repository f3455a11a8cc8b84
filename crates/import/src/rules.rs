use cashtrack_core::{CategoryId, CategoryRule};

/// A rule reduced to what matching needs: a lowercased, trimmed needle.
#[derive(Debug, Clone, PartialEq, Eq)]
struct NormalizedRule {
    category_id: CategoryId,
    needle: String,
}

/// Case-insensitive substring matcher over a user's ordered rules.
#[derive(Debug, Clone, Default)]
pub struct CategoryRuleEngine {
    rules: Vec<NormalizedRule>,
}

impl CategoryRuleEngine {
    /// Orders by position (ties by id) and drops rules whose needle is blank.
    pub fn new(mut rules: Vec<CategoryRule>) -> Self {
        rules.sort_by_key(|r| (r.position, r.id));
        let rules = rules
            .into_iter()
            .filter_map(|rule| {
                let needle = rule.needle.trim().to_lowercase();
                (!needle.is_empty()).then_some(NormalizedRule {
                    category_id: rule.category_id,
                    needle,
                })
            })
            .collect();
        Self { rules }
    }

    /// Category of the first rule whose needle occurs in `description`.
    pub fn find_category(&self, description: &str) -> Option<CategoryId> {
        if self.rules.is_empty() || description.is_empty() {
            return None;
        }
        let haystack = description.to_lowercase();
        self.rules
            .iter()
            .find(|rule| haystack.contains(&rule.needle))
            .map(|rule| rule.category_id)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }
}
