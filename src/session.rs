//! Presentation state of the current navigation.

use crate::{orchestrator::Outcome, prelude::*};

/// Tag of a navigation, used to recognise responses to a superseded one.
#[must_use]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Ticket(u64);

#[derive(Debug)]
pub enum Panel {
    Ready(Outcome),

    /// The storage could not be reached. Details are in the log.
    Failed,
}

#[derive(Debug)]
pub struct View {
    pub label: String,
    pub panel: Panel,
}

/// Chart state which lives from one navigation to the next.
#[must_use]
#[derive(Debug, Default)]
pub struct Session {
    generation: u64,
    views: Vec<View>,
}

impl Session {
    /// Start a new navigation, dropping the views of the previous one.
    pub fn begin(&mut self) -> Ticket {
        self.generation += 1;
        self.views.clear();
        Ticket(self.generation)
    }

    /// Store the response unless it belongs to a superseded navigation.
    ///
    /// Returns whether the response has been accepted.
    pub fn accept(
        &mut self,
        ticket: Ticket,
        label: impl Into<String>,
        result: Result<Outcome>,
    ) -> bool {
        let label = label.into();
        if ticket.0 != self.generation {
            debug!(
                label,
                ticket = ticket.0,
                generation = self.generation,
                "discarded a stale response",
            );
            return false;
        }
        let panel = match result {
            Ok(outcome) => Panel::Ready(outcome),
            Err(error) => {
                error!(label, "failed: {error:#}");
                Panel::Failed
            }
        };
        self.views.push(View { label, panel });
        true
    }

    pub fn views(&self) -> &[View] {
        &self.views
    }
}
