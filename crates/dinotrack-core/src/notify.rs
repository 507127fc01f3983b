//! Change notification text and the sink interface that receives it.

use dinotrack_types::{ChangeRecord, Gender};

/// A downstream collaborator failed to deliver a notification.
///
/// Delivery failures are logged by the scheduler and never roll back the
/// tick that produced the change.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("notification failed: {message}")]
pub struct NotifyError {
    /// Description of the failure.
    pub message: String,
}

/// Receives every change record, once, in application order.
pub trait ChangeSink: Send {
    /// Handle one change.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] if the change could not be delivered.
    fn on_change(&mut self, change: &ChangeRecord) -> Result<(), NotifyError>;
}

/// Render a change as a one-line chat notification.
///
/// The gender component is omitted when the source did not report one.
pub fn render_change(change: &ChangeRecord) -> String {
    match change {
        ChangeRecord::Joined {
            display_name,
            species,
            fresh_spawn: true,
            gender,
            ..
        } => format!(
            "{display_name} joined as new {species} ({}fresh spawn)",
            gender_prefix(*gender)
        ),
        ChangeRecord::Joined {
            display_name,
            species,
            gender,
            growth,
            ..
        } => format!(
            "{display_name} joined as {species} ({}{growth:.2} growth)",
            gender_prefix(*gender)
        ),
        ChangeRecord::ChangedSpecies {
            display_name,
            to,
            gender,
            growth,
            ..
        } => format!(
            "{display_name} changed to {to} ({}{growth:.2} growth)",
            gender_prefix(*gender)
        ),
        ChangeRecord::Left {
            display_name,
            species,
            growth,
            ..
        } => format!("{display_name} left (was {species}, {growth:.2} growth)"),
    }
}

fn gender_prefix(gender: Option<Gender>) -> String {
    gender.map_or_else(String::new, |g| format!("{g}, "))
}

#[cfg(test)]
mod tests {
    use dinotrack_types::PlayerId;

    use super::*;

    fn joined(fresh_spawn: bool, gender: Option<Gender>) -> ChangeRecord {
        ChangeRecord::Joined {
            player_id: PlayerId::new("1"),
            display_name: String::from("Rexy"),
            species: String::from("Stegosaurus"),
            fresh_spawn,
            gender,
            growth: 0.25,
        }
    }

    #[test]
    fn fresh_spawn_join() {
        assert_eq!(
            render_change(&joined(true, Some(Gender::Female))),
            "Rexy joined as new Stegosaurus (Female, fresh spawn)"
        );
    }

    #[test]
    fn join_with_save_shows_growth() {
        assert_eq!(
            render_change(&joined(false, Some(Gender::Male))),
            "Rexy joined as Stegosaurus (Male, 0.25 growth)"
        );
    }

    #[test]
    fn missing_gender_is_omitted() {
        assert_eq!(
            render_change(&joined(true, None)),
            "Rexy joined as new Stegosaurus (fresh spawn)"
        );
    }

    #[test]
    fn species_change() {
        let change = ChangeRecord::ChangedSpecies {
            player_id: PlayerId::new("1"),
            display_name: String::from("Rexy"),
            from: String::from("Stegosaurus"),
            to: String::from("Carnotaurus"),
            gender: Some(Gender::Male),
            growth: 0.5,
        };
        assert_eq!(
            render_change(&change),
            "Rexy changed to Carnotaurus (Male, 0.50 growth)"
        );
    }

    #[test]
    fn leave() {
        let change = ChangeRecord::Left {
            player_id: PlayerId::new("1"),
            display_name: String::from("Rexy"),
            species: String::from("Carnotaurus"),
            growth: 0.756,
        };
        assert_eq!(
            render_change(&change),
            "Rexy left (was Carnotaurus, 0.76 growth)"
        );
    }
}
