use std::collections::BTreeMap;

/// Accumulated weight per categorical value (item, rune, spell, spell pair).
///
/// Ranking is by total weight descending, ties broken by the key ascending, so
/// the result never depends on the order values were added in.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedTally<K: Ord> {
    weights: BTreeMap<K, f64>,
}

impl<K: Ord> Default for WeightedTally<K> {
    fn default() -> Self {
        WeightedTally {
            weights: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Clone> WeightedTally<K> {
    pub fn new() -> Self {
        WeightedTally::default()
    }

    pub fn add(&mut self, key: K, weight: f64) {
        *self.weights.entry(key).or_insert(0.0) += weight;
    }

    pub fn add_all<I: IntoIterator<Item = K>>(&mut self, keys: I, weight: f64) {
        for key in keys {
            self.add(key, weight);
        }
    }

    pub fn weight_of(&self, key: &K) -> f64 {
        self.weights.get(key).copied().unwrap_or(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn top_k(&self, k: usize) -> Vec<K> {
        self.top_k_where(k, |_| true)
    }

    pub fn top_k_where<P: Fn(&K) -> bool>(&self, k: usize, keep: P) -> Vec<K> {
        let mut ranked: Vec<(&K, f64)> = self
            .weights
            .iter()
            .filter(|(key, _)| keep(key))
            .map(|(key, weight)| (key, *weight))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.into_iter().take(k).map(|(key, _)| key.clone()).collect()
    }

    pub fn top(&self) -> Option<K> {
        self.top_k(1).into_iter().next()
    }
}

/// `Σ(value·weight) / Σ(weight)` over non-negative weights; 0 when no weight.
pub fn weighted_average(pairs: &[(f64, f64)]) -> f64 {
    let total_weight: f64 = pairs.iter().map(|(_, w)| w.max(0.0)).sum();
    if total_weight <= 0.0 {
        return 0.0;
    }
    pairs.iter().map(|(v, w)| v * w.max(0.0)).sum::<f64>() / total_weight
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Round half away from zero to `digits` decimals.
pub fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}
