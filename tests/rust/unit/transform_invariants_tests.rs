//! Invariants of the entity and relationship transforms, driven through the
//! public API the way the pipeline drives them.

use std::collections::HashSet;

use graphload::source::{CellValue, SourceRow};
use graphload::transform::{
    edges_from_rows, nodes_from_rows, EndpointColumns, IdentityRegistry,
};

fn row(cells: &[(&str, CellValue)]) -> SourceRow {
    cells
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

fn int(i: i64) -> CellValue {
    CellValue::Int(i)
}

#[test]
fn node_ids_are_pairwise_distinct_across_tables() {
    let mut registry = IdentityRegistry::new();

    // Clients and transactions share raw numeric keys 1 and 2.
    let clients = vec![
        row(&[("id", int(1)), ("name", CellValue::Text("A".into()))]),
        row(&[("id", int(2)), ("name", CellValue::Text("B".into()))]),
    ];
    let transactions = vec![
        row(&[("id", int(1)), ("amount", CellValue::Float(10.0))]),
        row(&[("id", int(2)), ("amount", CellValue::Float(20.0))]),
    ];

    let client_batch =
        nodes_from_rows("clients.csv", "client", clients, None, &mut registry).unwrap();
    let transaction_batch =
        nodes_from_rows("transactions.csv", "transaction", transactions, None, &mut registry)
            .unwrap();

    let all_ids: Vec<&str> = client_batch
        .nodes
        .iter()
        .chain(transaction_batch.nodes.iter())
        .map(|n| n.id.as_str())
        .collect();
    let distinct: HashSet<&str> = all_ids.iter().copied().collect();

    assert_eq!(all_ids.len(), 4);
    assert_eq!(distinct.len(), 4, "label prefixing must prevent collisions");
}

#[test]
fn every_edge_source_is_a_registered_node() {
    let mut registry = IdentityRegistry::new();
    let clients = (1..=5)
        .map(|i| row(&[("id", int(i))]))
        .collect::<Vec<_>>();
    nodes_from_rows("clients.csv", "client", clients, None, &mut registry).unwrap();

    // Sources 1..=8: 6, 7, 8 have no node.
    let relationships = (1..=8)
        .map(|i| row(&[("client_id", int(i)), ("transaction_id", int(i * 100))]))
        .collect::<Vec<_>>();
    let batch = edges_from_rows(
        "performs.csv",
        "performs",
        relationships,
        &EndpointColumns::default(),
        &registry,
    )
    .unwrap();

    assert_eq!(batch.edges.len(), 5);
    assert_eq!(batch.dangling_dropped, 3);
    for edge in &batch.edges {
        assert!(
            registry.contains(&edge.id),
            "edge source {} must exist as a node",
            edge.id
        );
    }
}

#[test]
fn property_payloads_are_deterministic_and_round_trip() {
    let source_row = || {
        row(&[
            ("id", int(7)),
            ("name", CellValue::Text("Grace".into())),
            ("balance", CellValue::Float(1234.5)),
            ("isfraud", int(0)),
            ("note", CellValue::Null),
        ])
    };

    let mut first_registry = IdentityRegistry::new();
    let mut second_registry = IdentityRegistry::new();
    let first = nodes_from_rows("c.csv", "client", vec![source_row()], None, &mut first_registry)
        .unwrap();
    let second =
        nodes_from_rows("c.csv", "client", vec![source_row()], None, &mut second_registry)
            .unwrap();

    assert_eq!(first.nodes[0].properties, second.nodes[0].properties);

    let decoded: serde_json::Value = serde_json::from_str(&first.nodes[0].properties).unwrap();
    let object = decoded.as_object().unwrap();
    assert_eq!(object.len(), 4, "id is structural, the rest round-trips");
    assert_eq!(object["name"], "Grace");
    assert_eq!(object["balance"], 1234.5);
    assert_eq!(object["isfraud"], false);
    assert!(object["note"].is_null());
}

#[test]
fn entity_table_scenario() {
    let rows = vec![
        row(&[("id", int(1)), ("name", CellValue::Text("A".into()))]),
        row(&[("id", int(2)), ("name", CellValue::Text("B".into()))]),
    ];
    let mut registry = IdentityRegistry::new();
    let batch = nodes_from_rows("clients.csv", "client", rows, None, &mut registry).unwrap();

    assert_eq!(batch.nodes[0].id, "client_1");
    assert_eq!(batch.nodes[0].label, "client");
    assert_eq!(batch.nodes[0].properties, r#"{"name":"A"}"#);
    assert_eq!(batch.nodes[1].id, "client_2");
    assert_eq!(batch.nodes[1].properties, r#"{"name":"B"}"#);
}

#[test]
fn destination_nodes_are_not_required() {
    let mut registry = IdentityRegistry::new();
    nodes_from_rows(
        "clients.csv",
        "client",
        vec![row(&[("id", int(1))])],
        None,
        &mut registry,
    )
    .unwrap();

    // transaction_9 is never registered; the edge must still materialize.
    let rows = vec![row(&[
        ("client_id", int(1)),
        ("transaction_id", int(9)),
        ("amount", CellValue::Float(5.5)),
    ])];
    let batch = edges_from_rows(
        "performs.csv",
        "performs",
        rows,
        &EndpointColumns::default(),
        &registry,
    )
    .unwrap();

    assert_eq!(batch.edges.len(), 1);
    assert_eq!(batch.edges[0].id, "client_1");
    assert_eq!(batch.edges[0].dest_id, "transaction_9");
    assert_eq!(batch.edges[0].properties, r#"{"amount":5.5}"#);
    assert_eq!(batch.dangling_dropped, 0);
}

#[test]
fn unregistered_source_drops_the_row_without_error() {
    let mut registry = IdentityRegistry::new();
    nodes_from_rows(
        "clients.csv",
        "client",
        vec![row(&[("id", int(1))])],
        None,
        &mut registry,
    )
    .unwrap();

    let rows = vec![row(&[("client_id", int(99)), ("transaction_id", int(9))])];
    let batch = edges_from_rows(
        "performs.csv",
        "performs",
        rows,
        &EndpointColumns::default(),
        &registry,
    )
    .unwrap();

    assert!(batch.edges.is_empty());
    assert_eq!(batch.dangling_dropped, 1);
}
