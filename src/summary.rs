// 📊 Summary - snapshot of ledger totals for display and export

use crate::ledger::Ledger;
use serde::Serialize;
use std::fmt;

/// One actor's slice of a purchase
#[derive(Debug, Clone, Serialize)]
pub struct LineItem {
    pub item: String,
    pub cost: f64,
    pub quantity: u32,
    pub partial: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActorSummary {
    pub actor: String,
    pub lines: Vec<LineItem>,
    pub untaxed_total: f64,
    pub tax: f64,
    pub total: f64,
}

/// LedgerSummary - everything the "Tables" view shows
#[derive(Debug, Clone, Serialize)]
pub struct LedgerSummary {
    pub tax_rate: f64,
    pub untaxed_total: f64,
    pub tax: f64,
    pub total: f64,
    pub percent_paid: f64,
    pub unassigned_total: f64,
    pub actors: Vec<ActorSummary>,
}

impl ActorSummary {
    pub fn build(ledger: &Ledger, actor: &str) -> Self {
        let lines = ledger
            .purchases()
            .iter()
            .filter_map(|p| {
                let partial = ledger.actor_partial(p, actor);
                (partial > 0.0).then(|| LineItem {
                    item: p.item.clone(),
                    cost: p.cost,
                    quantity: p.quantity,
                    partial,
                })
            })
            .collect();

        let untaxed_total = ledger.actor_total(actor);
        let tax = ledger.actor_tax(actor);

        ActorSummary {
            actor: actor.to_string(),
            lines,
            untaxed_total,
            tax,
            total: untaxed_total + tax,
        }
    }
}

impl LedgerSummary {
    pub fn build(ledger: &Ledger, actors: &[String]) -> Self {
        let untaxed_total = ledger.total();
        let tax = ledger.tax();

        LedgerSummary {
            tax_rate: ledger.tax_rate(),
            untaxed_total,
            tax,
            total: untaxed_total + tax,
            percent_paid: ledger.percent_paid(),
            unassigned_total: ledger.unassigned_total(),
            actors: actors
                .iter()
                .map(|a| ActorSummary::build(ledger, a))
                .collect(),
        }
    }
}

impl fmt::Display for LedgerSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Receipt")?;
        writeln!(f, "  Untaxed total: ${:.2}", self.untaxed_total)?;
        writeln!(f, "  Tax: ${:.2}", self.tax)?;
        writeln!(f, "  Total: ${:.2}", self.total)?;

        for actor in &self.actors {
            writeln!(f)?;
            writeln!(f, "{}", actor.actor)?;
            for line in &actor.lines {
                writeln!(
                    f,
                    "  {:<24} ${:>8.2} x{:<3} ${:>8.2}",
                    line.item, line.cost, line.quantity, line.partial
                )?;
            }
            writeln!(f, "  Untaxed total: ${:.2}", actor.untaxed_total)?;
            writeln!(f, "  Tax: ${:.2}", actor.tax)?;
            writeln!(f, "  Total: ${:.2}", actor.total)?;
        }

        writeln!(f)?;
        if self.unassigned_total > 0.0 {
            writeln!(f, "Unassigned: ${:.2}", self.unassigned_total)?;
        }
        write!(f, "% paid: {}%", self.percent_paid as u32)
    }
}
