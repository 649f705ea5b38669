// 🧾 Purchase - one line of a receipt
// Mutable in place by the UI, identified by a stable UUID

use uuid::Uuid;

/// Purchase - item, unit cost, quantity and whether sales tax applies
///
/// The `id` is assigned at creation and never changes, so two rows with
/// identical fields are still tracked as different purchases.
#[derive(Debug, Clone, PartialEq)]
pub struct Purchase {
    id: Uuid,
    pub item: String,
    pub cost: f64,
    pub quantity: u32,
    pub taxed: bool,
}

impl Purchase {
    pub fn new(item: impl Into<String>, cost: f64, quantity: u32, taxed: bool) -> Self {
        Purchase {
            id: Uuid::new_v4(),
            item: item.into(),
            cost,
            quantity,
            taxed,
        }
    }

    /// Empty row added from the editor
    pub fn blank() -> Self {
        Purchase::new("", 0.0, 0, false)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Untaxed cost of the whole line (cost × quantity)
    pub fn subtotal(&self) -> f64 {
        self.cost * self.quantity as f64
    }

    pub fn increment_quantity(&mut self) {
        self.quantity = self.quantity.saturating_add(1);
    }

    /// Never goes below zero
    pub fn decrement_quantity(&mut self) {
        self.quantity = self.quantity.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtotal() {
        let p = Purchase::new("milk", 2.5, 4, false);
        assert_eq!(p.subtotal(), 10.0);
    }

    #[test]
    fn test_blank_purchase() {
        let p = Purchase::blank();
        assert!(p.item.is_empty());
        assert_eq!(p.cost, 0.0);
        assert_eq!(p.quantity, 0);
        assert!(!p.taxed);
        assert_eq!(p.subtotal(), 0.0);
    }

    #[test]
    fn test_identical_purchases_have_distinct_ids() {
        let a = Purchase::new("eggs", 3.0, 1, false);
        let b = Purchase::new("eggs", 3.0, 1, false);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_quantity_saturates_at_zero() {
        let mut p = Purchase::new("bread", 1.0, 1, false);
        p.decrement_quantity();
        assert_eq!(p.quantity, 0);
        p.decrement_quantity();
        assert_eq!(p.quantity, 0);
        p.increment_quantity();
        assert_eq!(p.quantity, 1);
    }
}
