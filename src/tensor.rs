use crate::frac::Frac;
use crate::tree::Event;
use crate::Index;
use crate::Num;
use crate::Outcome;

/// A dense map from fixed-length outcome tuples to a shared-denominator
/// rational, indexed by a positional mixed-radix hash of the tuple.
#[derive(Debug, Clone)]
pub struct EventTensor {
    n_parties: Index,
    base: Outcome,
    data: Vec<Num>,
    weights: Vec<Index>,
    denom: Num,
}

impl EventTensor {
    pub fn new(n_parties: Index, base: Outcome) -> Self {
        assert!(base >= 2, "EventTensor base must be at least 2");
        let size = (base as Index).pow(n_parties as u32);
        let weights = (0..n_parties)
            .map(|i| (base as Index).pow(i as u32))
            .collect();
        Self {
            n_parties,
            base,
            data: vec![0; size],
            weights,
            denom: 1,
        }
    }

    pub fn n_parties(&self) -> Index {
        self.n_parties
    }

    pub fn base(&self) -> Outcome {
        self.base
    }

    pub fn denom(&self) -> Num {
        self.denom
    }

    pub fn has_same_shape_as(&self, other: &Self) -> bool {
        self.n_parties == other.n_parties && self.base == other.base
    }

    pub fn get_event_hash(&self, event: &Event) -> Index {
        assert_eq!(
            event.len(),
            self.n_parties,
            "event length must match the tensor's party count"
        );
        event
            .iter()
            .zip(self.weights.iter())
            .map(|(&outcome, &weight)| outcome as Index * weight)
            .sum()
    }

    fn event_from_hash(&self, hash: Index) -> Event {
        (0..self.n_parties)
            .map(|i| ((hash / self.weights[i]) % self.base as Index) as Outcome)
            .collect()
    }

    pub fn get_num(&self, hash: Index) -> Num {
        self.data[hash]
    }

    pub fn get_num_of_event(&self, event: &Event) -> Num {
        self.get_num(self.get_event_hash(event))
    }

    pub fn set_num(&mut self, hash: Index, value: Num) {
        self.data[hash] = value;
    }

    pub fn set_num_of_event(&mut self, event: &Event, value: Num) {
        let hash = self.get_event_hash(event);
        self.set_num(hash, value);
    }

    pub fn get_frac(&self, hash: Index) -> Frac {
        Frac::new(self.get_num(hash), self.denom)
    }

    pub fn get_frac_of_event(&self, event: &Event) -> Frac {
        self.get_frac(self.get_event_hash(event))
    }

    pub fn set_denom(&mut self, denom: Num) {
        assert!(denom > 0, "EventTensor denominator must be strictly positive");
        self.denom = denom;
    }

    /// Total number of entries, `base^n_parties`.
    pub fn hash_range(&self) -> std::ops::Range<Index> {
        0..self.data.len()
    }

    /// All length-`n_parties` tuples, in the order matching `hash_range`.
    /// Asserts this tensor is not a scalar.
    pub fn get_event_range(&self) -> impl Iterator<Item = Event> + '_ {
        assert!(self.n_parties > 0, "a scalar EventTensor has no event range");
        self.hash_range().map(move |h| self.event_from_hash(h))
    }

    /// Reduce `denom` and every entry by their greatest common divisor.
    pub fn simplify(&mut self) {
        let mut g = self.denom;
        for &entry in &self.data {
            g = gcd(g, entry);
            if g == 1 {
                return;
            }
        }
        if g > 1 {
            for entry in &mut self.data {
                *entry /= g;
            }
            self.denom /= g;
        }
    }

    /// Overwrite this tensor with the positional tensor product of
    /// `factors`, taken in order, then simplify.
    ///
    /// Every event of this tensor is decomposed into consecutive
    /// sub-events, one per factor, consuming `factor.n_parties` outcomes
    /// at a time in `factors` order.
    pub fn set_to_tensor_product(&mut self, factors: &[&EventTensor]) {
        for factor in factors {
            assert_eq!(factor.base, self.base, "tensor product factors must share a base");
        }
        let total_parties: Index = factors.iter().map(|f| f.n_parties).sum();
        assert_eq!(
            total_parties, self.n_parties,
            "tensor product factors' party counts must sum to this tensor's"
        );

        for hash in self.hash_range() {
            let event = self.event_from_hash(hash);
            let mut product: Num = 1;
            let mut offset = 0;
            for factor in factors {
                let sub_event = event[offset..offset + factor.n_parties].to_vec();
                product *= factor.get_num_of_event(&sub_event);
                offset += factor.n_parties;
            }
            self.data[hash] = product;
        }
        self.denom = factors.iter().map(|f| f.denom).product();
        self.simplify();
    }
}

fn gcd(a: Num, b: Num) -> Num {
    let (mut a, mut b) = (a.abs(), b.abs());
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_round_trip() {
        let mut t = EventTensor::new(3, 4);
        let event = vec![2, 1, 3];
        t.set_num_of_event(&event, 7);
        let hash = t.get_event_hash(&event);
        assert_eq!(hash, 2 + 4 * 1 + 16 * 3);
        assert_eq!(t.get_num(hash), 7);
    }

    #[test]
    fn simplify_reduces_by_gcd() {
        let mut t = EventTensor::new(1, 2);
        t.set_num(0, 4);
        t.set_num(1, 6);
        t.set_denom(8);
        t.simplify();
        assert_eq!(t.get_num(0), 2);
        assert_eq!(t.get_num(1), 3);
        assert_eq!(t.denom(), 4);
    }

    #[test]
    fn simplify_is_idempotent() {
        let mut t = EventTensor::new(1, 2);
        t.set_num(0, 4);
        t.set_num(1, 6);
        t.set_denom(8);
        t.simplify();
        let snapshot = t.clone();
        t.simplify();
        assert_eq!(snapshot.get_num(0), t.get_num(0));
        assert_eq!(snapshot.denom(), t.denom());
    }

    #[test]
    fn simplify_collapses_denom_when_all_entries_zero() {
        let mut t = EventTensor::new(1, 2);
        t.set_denom(8);
        t.simplify();
        assert_eq!(t.denom(), 1);
    }

    #[test]
    fn scalar_tensor_product() {
        let mut a = EventTensor::new(0, 2);
        a.set_num(0, 3);
        a.set_denom(4);
        let mut b = EventTensor::new(0, 2);
        b.set_num(0, 5);
        b.set_denom(6);

        let mut product = EventTensor::new(0, 2);
        product.set_to_tensor_product(&[&a, &b]);

        assert_eq!(product.get_num(0), 5);
        assert_eq!(product.denom(), 8);
    }

    #[test]
    fn tensor_product_is_positional() {
        let mut a = EventTensor::new(1, 2);
        a.set_num_of_event(&vec![0], 1);
        a.set_num_of_event(&vec![1], 2);
        let mut b = EventTensor::new(1, 2);
        b.set_num_of_event(&vec![0], 3);
        b.set_num_of_event(&vec![1], 4);

        let mut product = EventTensor::new(2, 2);
        product.set_to_tensor_product(&[&a, &b]);

        assert_eq!(product.get_num_of_event(&vec![1, 0]), 2 * 3);
        assert_eq!(product.get_num_of_event(&vec![0, 1]), 1 * 4);
    }

    #[test]
    #[should_panic]
    fn scalar_tensor_has_no_event_range() {
        let t = EventTensor::new(0, 2);
        let _ = t.get_event_range().count();
    }
}
