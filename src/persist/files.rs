//! Reading and writing circuits and libraries on disk.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use tracing::{info, warn};

use super::{from_doc, to_doc, CircuitDoc};
use crate::circuit::{is_valid_name, Circuit};
use crate::components::ComponentType;
use crate::error::{NandboardError, Result};
use crate::library::ComponentLibrary;

fn parse(path: &Path, text: &str) -> Result<CircuitDoc> {
    serde_json::from_str(text).map_err(|source| NandboardError::InvalidDocument {
        path: path.display().to_string(),
        source,
    })
}

fn encode(doc: &CircuitDoc) -> Result<String> {
    serde_json::to_string_pretty(doc).map_err(|source| NandboardError::EncodeError {
        name: doc.name.clone(),
        source,
    })
}

/// Write `circuit` to `path` as JSON.
pub fn save_file(circuit: &Circuit, path: &Path) -> Result<()> {
    let json = encode(&to_doc(circuit))?;
    fs::write(path, json).map_err(|e| NandboardError::write(path, e))?;
    info!(path = %path.display(), components = circuit.len(), "saved circuit");
    Ok(())
}

/// Load a circuit from `path`, resolving custom components against `library`.
///
/// A document without a name takes the file stem.
pub fn load_file(path: &Path, library: &ComponentLibrary) -> Result<Circuit> {
    let text = fs::read_to_string(path).map_err(|e| NandboardError::read(path, e))?;
    let mut doc = parse(path, &text)?;
    if doc.name.is_empty() {
        doc.name = file_stem(path);
    }
    let circuit = from_doc(&doc, library);
    info!(path = %path.display(), components = circuit.len(), "loaded circuit");
    Ok(circuit)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Write every definition to `dir` as `<name>.json`. Returns the number written.
///
/// Definitions whose name can't be a file name inside `dir` are skipped.
pub fn save_library(library: &ComponentLibrary, dir: &Path) -> Result<usize> {
    fs::create_dir_all(dir).map_err(|e| NandboardError::write(dir, e))?;
    let mut written = 0;
    for (name, circuit) in library.iter() {
        if !is_valid_name(name) {
            warn!(name, "definition name is not a usable file name, skipping");
            continue;
        }
        let mut doc = to_doc(circuit);
        doc.name = name.to_string();
        doc.is_custom_component = true;
        let path = dir.join(format!("{name}.json"));
        fs::write(&path, encode(&doc)?).map_err(|e| NandboardError::write(&path, e))?;
        written += 1;
    }
    info!(dir = %dir.display(), definitions = written, "saved library");
    Ok(written)
}

/// Load every `*.json` definition in `dir`.
///
/// Definitions may use each other in any file order. A definition that
/// (directly or indirectly) contains itself loses the component closing the
/// cycle. Unreadable or unparseable files are skipped with a warning.
pub fn load_library(dir: &Path) -> Result<ComponentLibrary> {
    let entries = fs::read_dir(dir).map_err(|e| NandboardError::read(dir, e))?;

    let mut docs: BTreeMap<String, CircuitDoc> = BTreeMap::new();
    for entry in entries {
        let path = entry.map_err(|e| NandboardError::read(dir, e))?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let doc = fs::read_to_string(&path)
            .map_err(|e| NandboardError::read(&path, e))
            .and_then(|text| parse(&path, &text));
        match doc {
            Ok(mut doc) => {
                if doc.name.is_empty() {
                    doc.name = file_stem(&path);
                }
                docs.insert(doc.name.clone(), doc);
            }
            Err(err) => warn!(error = %err, "skipping library file"),
        }
    }

    let mut library = ComponentLibrary::new();
    let mut visiting = HashSet::new();
    for name in docs.keys() {
        resolve(name, &docs, &mut library, &mut visiting);
    }
    info!(dir = %dir.display(), definitions = library.len(), "loaded library");
    Ok(library)
}

/// Load `name` after every definition it uses.
fn resolve(
    name: &str,
    docs: &BTreeMap<String, CircuitDoc>,
    library: &mut ComponentLibrary,
    visiting: &mut HashSet<String>,
) {
    if library.contains(name) {
        return;
    }
    let Some(doc) = docs.get(name) else {
        return;
    };
    if !visiting.insert(name.to_string()) {
        warn!(name, "custom component refers to itself, breaking the cycle");
        return;
    }

    let children = doc
        .components
        .iter()
        .filter(|c| c.component_type == ComponentType::Custom)
        .filter_map(|c| c.custom_name.as_deref());
    for child in children {
        resolve(child, docs, library, visiting);
    }

    let circuit = from_doc(doc, library);
    library.insert(name, circuit);
    visiting.remove(name);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::Point;
    use crate::components::{BusInput, BusOutput, ComponentKind, Nand, Switch};
    use crate::signal::Signal;
    use tempfile::tempdir;

    fn not_definition() -> Circuit {
        let mut not = Circuit::new("NOT");
        let a = not.add_titled(
            ComponentKind::BusInput(BusInput::new(1)),
            Point::default(),
            Some("a".into()),
        );
        let g = not.add_component(ComponentKind::Nand(Nand), Point::new(100.0, 0.0));
        let y = not.add_titled(
            ComponentKind::BusOutput(BusOutput::new(1)),
            Point::new(200.0, 0.0),
            Some("y".into()),
        );
        let q = not.output_pin(a, 0).unwrap();
        not.connect(q, not.input_pin(g, 0).unwrap());
        not.connect(q, not.input_pin(g, 1).unwrap());
        not.connect(not.output_pin(g, 0).unwrap(), not.input_pin(y, 0).unwrap());
        not
    }

    #[test]
    fn test_save_and_load_circuit_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bench.json");
        let mut circuit = Circuit::new("bench");
        circuit.add_component(ComponentKind::Switch(Switch::new(true)), Point::new(40.0, 40.0));

        save_file(&circuit, &path).unwrap();
        let loaded = load_file(&path, &ComponentLibrary::new()).unwrap();
        assert_eq!(loaded.name, "bench");
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.components().next().unwrap().position, Point::new(40.0, 40.0));
    }

    #[test]
    fn test_load_missing_file_is_read_error() {
        let dir = tempdir().unwrap();
        let err = load_file(&dir.path().join("nope.json"), &ComponentLibrary::new()).unwrap_err();
        assert!(matches!(err, NandboardError::FileReadError { .. }));
    }

    #[test]
    fn test_unnamed_document_takes_file_stem() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scratch.json");
        fs::write(&path, r#"{ "components": [] }"#).unwrap();
        let loaded = load_file(&path, &ComponentLibrary::new()).unwrap();
        assert_eq!(loaded.name, "scratch");
    }

    #[test]
    fn test_library_directory_round_trip() {
        let mut library = ComponentLibrary::new();
        library.insert("NOT", not_definition());

        // BUF uses NOT; it sorts before NOT, so loading must resolve out of order
        let mut buf = Circuit::new("BUF");
        let a = buf.add_titled(
            ComponentKind::BusInput(BusInput::new(1)),
            Point::default(),
            Some("a".into()),
        );
        let n1 = buf.add_component(library.instantiate("NOT").unwrap(), Point::new(100.0, 0.0));
        let n2 = buf.add_component(library.instantiate("NOT").unwrap(), Point::new(200.0, 0.0));
        let y = buf.add_titled(
            ComponentKind::BusOutput(BusOutput::new(1)),
            Point::new(300.0, 0.0),
            Some("y".into()),
        );
        buf.connect(buf.output_pin(a, 0).unwrap(), buf.input_pin(n1, 0).unwrap());
        buf.connect(buf.output_pin(n1, 0).unwrap(), buf.input_pin(n2, 0).unwrap());
        buf.connect(buf.output_pin(n2, 0).unwrap(), buf.input_pin(y, 0).unwrap());
        library.insert("BUF", buf);

        let dir = tempdir().unwrap();
        assert_eq!(save_library(&library, dir.path()).unwrap(), 2);
        assert!(dir.path().join("NOT.json").exists());

        let loaded = load_library(dir.path()).unwrap();
        assert_eq!(loaded.names().collect::<Vec<_>>(), vec!["BUF", "NOT"]);
        assert_eq!(loaded.get("BUF").unwrap().len(), 4);

        let mut top = Circuit::new("top");
        let sw = top.add_component(ComponentKind::Switch(Switch::new(true)), Point::default());
        let placed = top.add_component(loaded.instantiate("BUF").unwrap(), Point::new(100.0, 0.0));
        top.connect(top.output_pin(sw, 0).unwrap(), top.input_pin(placed, 0).unwrap());
        top.simulate();
        assert_eq!(top.pin_value(top.output_pin(placed, 0).unwrap()), Signal::High);
    }

    #[test]
    fn test_save_library_skips_names_outside_the_directory() {
        let root = tempdir().unwrap();
        let dir = root.path().join("parts");
        let mut library = ComponentLibrary::new();
        library.insert("NOT", not_definition());
        library.insert("../escape", not_definition());

        assert_eq!(save_library(&library, &dir).unwrap(), 1);
        assert!(dir.join("NOT.json").exists());
        assert!(!root.path().join("escape.json").exists());
    }

    #[test]
    fn test_library_cycle_is_broken() {
        let dir = tempdir().unwrap();
        let cyclic = |name: &str, other: &str| {
            format!(
                r#"{{ "name": "{name}", "isCustomComponent": true, "components": [
                    {{ "id": 0, "type": "BusInput", "x": 0, "y": 0 }},
                    {{ "id": 1, "type": "Custom", "x": 100, "y": 0, "customName": "{other}" }},
                    {{ "id": 2, "type": "BusOutput", "x": 200, "y": 0 }}
                ] }}"#
            )
        };
        fs::write(dir.path().join("A.json"), cyclic("A", "B")).unwrap();
        fs::write(dir.path().join("B.json"), cyclic("B", "A")).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        fs::write(dir.path().join("broken.json"), "{").unwrap();

        let library = load_library(dir.path()).unwrap();
        assert_eq!(library.len(), 2);
        // B was resolved while A was in progress, so its reference to A is dropped
        assert_eq!(library.get("B").unwrap().len(), 2);
        assert_eq!(library.get("A").unwrap().len(), 3);
    }
}
