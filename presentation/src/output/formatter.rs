//! Event formatter trait

use roundtable_domain::TurnEvent;

/// Renders turn events for an output stream.
///
/// Formatters may keep state across one turn (the console formatter
/// remembers which role already streamed its answer), so `format` takes
/// `&mut self`. An empty string means "print nothing".
pub trait EventFormatter: Send {
    fn format(&mut self, event: &TurnEvent) -> String;
}
