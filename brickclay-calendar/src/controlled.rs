//! Framework-neutral binding for form-style hosts.

use crate::callback::CallbackWith;

/// A component whose value a host reads, writes and observes.
///
/// Hosts bind to this instead of to a concrete widget, so any forms layer
/// can drive a picker without the picker knowing about it.
pub trait ControlledValue {
    /// Value exchanged with the host.
    type Value;

    /// Current value.
    fn value(&self) -> Self::Value;

    /// Replaces the value without notifying change listeners.
    fn set_value(&mut self, value: Self::Value);

    /// Adds a listener that receives every value the component emits.
    fn on_value_change(&mut self, callback: CallbackWith<Self::Value>);

    /// Enables or disables user interaction.
    fn set_disabled(&mut self, disabled: bool);
}
