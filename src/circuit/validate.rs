//! Validation of selections used to build custom components.

use crate::components::ComponentType;
use crate::error::BuildError;

use super::{Circuit, ComponentId};

/// Whether `name` can be stored as `<name>.json` inside a library directory.
pub fn is_valid_name(name: &str) -> bool {
    let name = name.trim();
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name
            .chars()
            .any(|c| matches!(c, '/' | '\\' | ':') || c.is_control())
}

/// Validate a selection for packaging into a custom component.
///
/// Checks:
/// - The name is not blank and is usable as a file name
/// - The selection contains at least one live component
/// - At least one bus input marker and one bus output marker are selected
pub fn validate_selection(
    circuit: &Circuit,
    name: &str,
    selection: &[ComponentId],
) -> Result<(), BuildError> {
    if name.trim().is_empty() {
        return Err(BuildError::EmptyName);
    }
    if !is_valid_name(name) {
        return Err(BuildError::InvalidName);
    }

    let types: Vec<ComponentType> = selection
        .iter()
        .filter_map(|id| circuit.component(*id))
        .map(|c| c.component_type())
        .collect();

    if types.is_empty() {
        return Err(BuildError::EmptySelection);
    }
    if !types.contains(&ComponentType::BusInput) {
        return Err(BuildError::MissingBusInput);
    }
    if !types.contains(&ComponentType::BusOutput) {
        return Err(BuildError::MissingBusOutput);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::Point;
    use crate::components::{BusInput, BusOutput, ComponentKind, Nand};

    #[test]
    fn test_selection_reasons() {
        let mut circuit = Circuit::new("main");
        let input = circuit.add_component(
            ComponentKind::BusInput(BusInput::new(1)),
            Point::default(),
        );
        let gate = circuit.add_component(ComponentKind::Nand(Nand), Point::default());
        let output = circuit.add_component(
            ComponentKind::BusOutput(BusOutput::new(1)),
            Point::default(),
        );

        assert_eq!(validate_selection(&circuit, "  ", &[input]), Err(BuildError::EmptyName));
        assert_eq!(validate_selection(&circuit, "X", &[]), Err(BuildError::EmptySelection));
        for name in ["../escape", "a/b", "a\\b", ".."] {
            assert_eq!(
                validate_selection(&circuit, name, &[input, gate, output]),
                Err(BuildError::InvalidName)
            );
        }
        assert_eq!(
            validate_selection(&circuit, "X", &[gate, output]),
            Err(BuildError::MissingBusInput)
        );
        assert_eq!(
            validate_selection(&circuit, "X", &[input, gate]),
            Err(BuildError::MissingBusOutput)
        );
        assert_eq!(validate_selection(&circuit, "X", &[input, gate, output]), Ok(()));
    }
}
