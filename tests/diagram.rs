use serde_json::{Value, json};
use wollok_bridge::diagram::{ElementKind, extract};
use wollok_bridge::interpreter::memory::Heap;

const SNAPSHOT: &str = r#"{
    "objects": {
        "pepita": {
            "module": "aves.pepita",
            "fields": [
                { "name": "energia", "value": "n100" },
                { "name": "amigas", "value": "amigas", "constant": true },
                { "name": "nido", "value": "null" }
            ]
        },
        "pepona": {
            "module": "aves.Golondrina",
            "fields": [ { "name": "amiga", "value": "pepita" } ]
        },
        "amigas": { "module": "wollok.lang.List", "inner": { "list": ["pepona"] } },
        "n100": { "module": "wollok.lang.Number", "inner": { "number": 100 } },
        "date": { "module": "wollok.lang.Date", "display": "1/1/2024" }
    },
    "well_known": { "aves.pepita": "pepita" },
    "packages": [
        { "name": "aves", "objects": [ { "name": "pepita", "id": "pepita" } ] }
    ],
    "repl": [ { "name": "hoy", "value": "date", "constant": true } ]
}"#;

fn data(elements: &Value, id: &str) -> Value {
    elements
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["data"].clone())
        .find(|d| d["id"] == id)
        .unwrap_or_else(|| panic!("no element {id}"))
}

#[test]
fn test_snapshot_package_diagram() {
    let heap = Heap::from_json(SNAPSHOT).unwrap();
    let diagram = extract(&heap, Some("aves"));

    let ids: Vec<&str> = diagram.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["pepita", "REPL", "date", "n100", "amigas", "null_1", "pepona"]);
    assert_eq!(diagram.node("pepona").unwrap().label, "Golondrina");
    assert_eq!(diagram.node("n100").unwrap().label, "100");
    assert_eq!(diagram.node("amigas").unwrap().kind, ElementKind::Literal);
    // pepona points back at pepita without a second pepita node.
    assert_eq!(diagram.edges.len(), 6);

    let elements = serde_json::to_value(diagram.elements()).unwrap();
    assert_eq!(
        data(&elements, "pepita"),
        json!({ "id": "pepita", "label": "pepita", "type": "object", "fontsize": "8px" })
    );
    let amigas = data(&elements, "pepita_amigas_amigas");
    assert_eq!(amigas["label"], "amigas🔒");
    assert_eq!(amigas["style"], "solid");
    assert_eq!(amigas["width"], 1.5);
    assert_eq!(data(&elements, "amigas_pepona_0")["style"], "dotted");
    assert_eq!(data(&elements, "REPL_date_hoy")["label"], "hoy🔒");
}

#[test]
fn test_snapshot_repl_diagram() {
    let heap = Heap::from_json(SNAPSHOT).unwrap();
    let diagram = extract(&heap, None);

    assert_eq!(diagram.nodes.len(), 2);
    assert_eq!(diagram.node("REPL").unwrap().kind, ElementKind::Repl);
    assert_eq!(diagram.node("date").unwrap().label, "1/1/2024");

    let elements = serde_json::to_value(diagram.elements()).unwrap();
    assert_eq!(data(&elements, "REPL_date_hoy")["label"], "hoy🔒");
}
