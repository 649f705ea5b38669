// ➗ Division - who splits a purchase
// Equal-share split among subscribed actors

/// Division - set of actors subscribed to one purchase
///
/// Actor names are case-insensitive and kept in subscription order so the
/// UI shows them consistently.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Division {
    actors: Vec<String>,
}

fn normalize(actor: &str) -> String {
    actor.trim().to_lowercase()
}

impl Division {
    pub fn new() -> Self {
        Division::default()
    }

    /// Subscribe an actor. Subscribing twice has no effect.
    pub fn subscribe(&mut self, actor: &str) {
        let actor = normalize(actor);
        if actor.is_empty() || self.actors.contains(&actor) {
            return;
        }
        self.actors.push(actor);
    }

    pub fn unsubscribe(&mut self, actor: &str) {
        let actor = normalize(actor);
        self.actors.retain(|a| *a != actor);
    }

    /// Flip subscription, returns the new state
    pub fn toggle(&mut self, actor: &str) -> bool {
        if self.is_subscribed(actor) {
            self.unsubscribe(actor);
            false
        } else {
            self.subscribe(actor);
            true
        }
    }

    pub fn is_subscribed(&self, actor: &str) -> bool {
        let actor = normalize(actor);
        self.actors.contains(&actor)
    }

    pub fn actors(&self) -> &[String] {
        &self.actors
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// Fraction of the purchase owed by `actor`: 1/n for subscribers, 0 otherwise
    pub fn share(&self, actor: &str) -> f64 {
        if self.is_subscribed(actor) {
            1.0 / self.actors.len() as f64
        } else {
            0.0
        }
    }
}
