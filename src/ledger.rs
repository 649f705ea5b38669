// 📒 Ledger - purchases, divisions and tax
// All totals are derived on demand from the current purchases

use crate::division::Division;
use crate::purchase::Purchase;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

/// Ledger - one receipt being split
///
/// Every purchase owns exactly one division (keyed by purchase id). Adding
/// a purchase creates its division, removing it drops the division.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    purchases: Vec<Purchase>,
    divisions: HashMap<Uuid, Division>,
    tax_rate: f64,
}

impl Ledger {
    pub fn new() -> Self {
        Ledger::default()
    }

    // ========================================================================
    // PURCHASES
    // ========================================================================

    /// Append a purchase with an empty division, returns its id
    pub fn add_purchase(&mut self, purchase: Purchase) -> Uuid {
        let id = purchase.id();
        self.divisions.insert(id, Division::new());
        self.purchases.push(purchase);
        id
    }

    /// Remove the purchase at `index` together with its division
    pub fn remove_purchase(&mut self, index: usize) -> Option<Purchase> {
        if index >= self.purchases.len() {
            return None;
        }
        let purchase = self.purchases.remove(index);
        self.divisions.remove(&purchase.id());
        debug!(item = %purchase.item, "removed purchase");
        Some(purchase)
    }

    pub fn purchases(&self) -> &[Purchase] {
        &self.purchases
    }

    pub fn purchase(&self, index: usize) -> Option<&Purchase> {
        self.purchases.get(index)
    }

    pub fn purchase_mut(&mut self, index: usize) -> Option<&mut Purchase> {
        self.purchases.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.purchases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.purchases.is_empty()
    }

    // ========================================================================
    // DIVISIONS
    // ========================================================================

    pub fn division(&self, id: Uuid) -> Option<&Division> {
        self.divisions.get(&id)
    }

    pub fn division_mut(&mut self, id: Uuid) -> Option<&mut Division> {
        self.divisions.get_mut(&id)
    }

    /// Division of the purchase at `index`
    pub fn division_at(&self, index: usize) -> Option<&Division> {
        self.purchases.get(index).and_then(|p| self.divisions.get(&p.id()))
    }

    pub fn division_at_mut(&mut self, index: usize) -> Option<&mut Division> {
        let id = self.purchases.get(index)?.id();
        self.divisions.get_mut(&id)
    }

    fn share(&self, purchase: &Purchase, actor: &str) -> f64 {
        self.divisions
            .get(&purchase.id())
            .map(|d| d.share(actor))
            .unwrap_or(0.0)
    }

    // ========================================================================
    // TAX
    // ========================================================================

    pub fn tax_rate(&self) -> f64 {
        self.tax_rate
    }

    /// Negative or non-finite rates are treated as zero
    pub fn set_tax_rate(&mut self, rate: f64) {
        self.tax_rate = if rate.is_finite() && rate > 0.0 { rate } else { 0.0 };
    }

    // ========================================================================
    // TOTALS
    // ========================================================================

    /// Untaxed total of every purchase
    pub fn total(&self) -> f64 {
        self.purchases.iter().map(Purchase::subtotal).sum()
    }

    /// Tax owed on taxed purchases
    pub fn tax(&self) -> f64 {
        let taxable: f64 = self
            .purchases
            .iter()
            .filter(|p| p.taxed)
            .map(Purchase::subtotal)
            .sum();
        taxable * self.tax_rate
    }

    /// Actor's untaxed share of one purchase
    pub fn actor_partial(&self, purchase: &Purchase, actor: &str) -> f64 {
        purchase.subtotal() * self.share(purchase, actor)
    }

    pub fn actor_total(&self, actor: &str) -> f64 {
        self.purchases
            .iter()
            .map(|p| self.actor_partial(p, actor))
            .sum()
    }

    /// Actor's share of the tax, only over taxed purchases they split
    pub fn actor_tax(&self, actor: &str) -> f64 {
        let taxable: f64 = self
            .purchases
            .iter()
            .filter(|p| p.taxed)
            .map(|p| self.actor_partial(p, actor))
            .sum();
        taxable * self.tax_rate
    }

    /// Percentage of purchases with at least one subscriber (0 when empty)
    pub fn percent_paid(&self) -> f64 {
        if self.purchases.is_empty() {
            return 0.0;
        }
        let assigned = self
            .purchases
            .iter()
            .filter(|p| self.divisions.get(&p.id()).map_or(false, |d| !d.is_empty()))
            .count();
        100.0 * assigned as f64 / self.purchases.len() as f64
    }

    /// Untaxed cost nobody has claimed yet
    pub fn unassigned_total(&self) -> f64 {
        self.purchases
            .iter()
            .filter(|p| self.divisions.get(&p.id()).map_or(true, |d| d.is_empty()))
            .map(Purchase::subtotal)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn sample() -> Ledger {
        let mut ledger = Ledger::new();
        let milk = ledger.add_purchase(Purchase::new("milk", 3.0, 2, false));
        let soap = ledger.add_purchase(Purchase::new("soap", 4.0, 1, true));
        ledger.add_purchase(Purchase::new("gum", 1.0, 5, true));

        let d = ledger.division_mut(milk).unwrap();
        d.subscribe("alice");
        d.subscribe("bob");

        ledger.division_mut(soap).unwrap().subscribe("alice");
        ledger
    }

    #[test]
    fn test_total_and_tax() {
        let mut ledger = sample();
        assert!(approx(ledger.total(), 15.0));
        assert!(approx(ledger.tax(), 0.0));

        ledger.set_tax_rate(0.1);
        // taxed: soap 4 + gum 5
        assert!(approx(ledger.tax(), 0.9));
    }

    #[test]
    fn test_actor_totals() {
        let ledger = sample();
        assert!(approx(ledger.actor_total("alice"), 3.0 + 4.0));
        assert!(approx(ledger.actor_total("bob"), 3.0));
        assert!(approx(ledger.actor_total("carol"), 0.0));
    }

    #[test]
    fn test_actor_partial() {
        let ledger = sample();
        let milk = ledger.purchase(0).unwrap();
        let gum = ledger.purchase(2).unwrap();
        assert!(approx(ledger.actor_partial(milk, "bob"), 3.0));
        assert!(approx(ledger.actor_partial(gum, "bob"), 0.0));

        let stranger = Purchase::new("milk", 3.0, 2, false);
        assert!(approx(ledger.actor_partial(&stranger, "bob"), 0.0));
    }

    #[test]
    fn test_actor_tax_only_counts_taxed_subscriptions() {
        let mut ledger = sample();
        ledger.set_tax_rate(0.1);
        assert!(approx(ledger.actor_tax("alice"), 0.4));
        assert!(approx(ledger.actor_tax("bob"), 0.0));
    }

    #[test]
    fn test_percent_paid() {
        let ledger = sample();
        assert!(approx(ledger.percent_paid(), 200.0 / 3.0));
        assert!(approx(ledger.unassigned_total(), 5.0));
    }

    #[test]
    fn test_percent_paid_empty_ledger() {
        let ledger = Ledger::new();
        assert_eq!(ledger.percent_paid(), 0.0);
        assert_eq!(ledger.total(), 0.0);
    }

    #[test]
    fn test_added_purchase_gets_division() {
        let mut ledger = Ledger::new();
        let id = ledger.add_purchase(Purchase::blank());
        assert!(ledger.division(id).is_some());
        assert!(ledger.division_at(0).unwrap().is_empty());
    }

    #[test]
    fn test_remove_purchase_drops_division() {
        let mut ledger = sample();
        let id = ledger.purchase(0).unwrap().id();

        let removed = ledger.remove_purchase(0).unwrap();
        assert_eq!(removed.item, "milk");
        assert!(ledger.division(id).is_none());
        assert_eq!(ledger.len(), 2);
        assert!(approx(ledger.actor_total("bob"), 0.0));
        assert!(ledger.remove_purchase(10).is_none());
    }

    #[test]
    fn test_edits_are_reflected_immediately() {
        let mut ledger = sample();
        ledger.purchase_mut(0).unwrap().quantity = 4;
        assert!(approx(ledger.actor_total("bob"), 6.0));

        ledger.division_at_mut(2).unwrap().subscribe("bob");
        assert!(approx(ledger.percent_paid(), 100.0));
    }

    #[test]
    fn test_negative_tax_rate_clamped() {
        let mut ledger = Ledger::new();
        ledger.set_tax_rate(-0.5);
        assert_eq!(ledger.tax_rate(), 0.0);
        ledger.set_tax_rate(f64::NAN);
        assert_eq!(ledger.tax_rate(), 0.0);
    }
}
