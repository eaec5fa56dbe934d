//! Citescope viz — renders a citation graph as one self-contained HTML
//! page driven by the vis-network library.
//!
//! Rendering is pure string construction over the engine's graph; writing
//! the file is the caller's business.

use citescope_core::{CandidateNode, CitationGraph, SeedNode};
use serde_json::{Value, json};

const SEED_COLOR: &str = "#4CAF50";
const CITED_COLOR: &str = "#2196F3";
const CITING_COLOR: &str = "#FF9800";

const LABEL_MAX_CHARS: usize = 30;
const TOOLTIP_AUTHORS: usize = 3;

/// Render the graph to a complete HTML document.
pub fn render(graph: &CitationGraph, k_cited: u32, k_citing: u32) -> String {
    let mut nodes: Vec<Value> = Vec::with_capacity(graph.node_count());
    nodes.extend(graph.seed_papers.iter().map(seed_node));
    nodes.extend(
        graph
            .cited_papers
            .iter()
            .map(|node| candidate_node(node, CITED_COLOR, "dot", "CITED PAPER", "c_in")),
    );
    nodes.extend(
        graph
            .citing_papers
            .iter()
            .map(|node| candidate_node(node, CITING_COLOR, "triangle", "CITING PAPER", "c_out")),
    );

    let edges: Vec<Value> = graph
        .edges
        .iter()
        .map(|edge| json!({ "from": edge.source(), "to": edge.target() }))
        .collect();

    PAGE_TEMPLATE
        .replace("__NODES__", &to_json(&nodes))
        .replace("__EDGES__", &to_json(&edges))
        .replace("__SEED_COLOR__", SEED_COLOR)
        .replace("__CITED_COLOR__", CITED_COLOR)
        .replace("__CITING_COLOR__", CITING_COLOR)
        .replace("__SEED_COUNT__", &graph.seed_papers.len().to_string())
        .replace("__CITED_COUNT__", &graph.cited_papers.len().to_string())
        .replace("__CITING_COUNT__", &graph.citing_papers.len().to_string())
        .replace("__K_CITED__", &k_cited.to_string())
        .replace("__K_CITING__", &k_citing.to_string())
}

fn seed_node(node: &SeedNode) -> Value {
    json!({
        "id": node.key,
        "label": truncate_title(&node.title),
        "title": tooltip("SEED PAPER", &node.title, node.year, &node.authors, &node.venue),
        "color": SEED_COLOR,
        "shape": "square",
        "size": 30,
        "borderWidth": 3,
    })
}

fn candidate_node(
    node: &CandidateNode,
    color: &str,
    shape: &str,
    heading: &str,
    count_name: &str,
) -> Value {
    json!({
        "id": node.key,
        "label": truncate_title(&node.title),
        "title": tooltip(
            &format!("{heading} ({count_name}={})", node.count),
            &node.title,
            node.year,
            &node.authors,
            &node.venue,
        ),
        "color": color,
        "shape": shape,
        // Heavier-cited papers draw bigger.
        "size": 15 + node.count * 5,
        "borderWidth": 2,
    })
}

fn tooltip(heading: &str, title: &str, year: Option<i32>, authors: &[String], venue: &str) -> String {
    let year = year.map(|y| y.to_string()).unwrap_or_default();
    let mut names = authors
        .iter()
        .take(TOOLTIP_AUTHORS)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");
    if authors.len() > TOOLTIP_AUTHORS {
        names.push_str("...");
    }
    format!("{heading}\n{title}\nYear: {year}\nAuthors: {names}\nVenue: {venue}")
}

fn truncate_title(title: &str) -> String {
    if title.is_empty() {
        return "Unknown".to_string();
    }
    if title.chars().count() <= LABEL_MAX_CHARS {
        return title.to_string();
    }
    let head: String = title.chars().take(LABEL_MAX_CHARS - 3).collect();
    format!("{head}...")
}

fn to_json(value: &[Value]) -> String {
    serde_json::to_string(value).expect("serializing graph payload")
}

const PAGE_TEMPLATE: &str = r##"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Citation Graph</title>
<script src="https://unpkg.com/vis-network/standalone/umd/vis-network.min.js"></script>
<style>
  body { margin: 0; font-family: Arial, sans-serif; }
  #graph { width: 100%; height: 100vh; background: #ffffff; }
  #legend {
    position: fixed; top: 10px; left: 10px; background: white;
    padding: 15px; border-radius: 8px; box-shadow: 0 2px 10px rgba(0,0,0,0.2);
    z-index: 1000;
  }
  #legend h3 { margin: 0 0 10px 0; font-size: 14px; }
  #legend .row { margin: 5px 0; font-size: 12px; }
  #legend .swatch {
    display: inline-block; width: 14px; height: 14px;
    margin-right: 8px; vertical-align: middle;
  }
  #legend .note { margin-top: 10px; font-size: 11px; color: #666; }
</style>
</head>
<body>
<div id="legend">
  <h3>Citation Graph Legend</h3>
  <div class="row">
    <span class="swatch" style="background: __SEED_COLOR__;"></span>
    Seed papers &mdash; __SEED_COUNT__
  </div>
  <div class="row">
    <span class="swatch" style="background: __CITED_COLOR__; border-radius: 50%;"></span>
    Cited by &ge;__K_CITED__ seeds &mdash; __CITED_COUNT__
  </div>
  <div class="row">
    <span class="swatch" style="background: __CITING_COLOR__;"></span>
    Citing &ge;__K_CITING__ seeds &mdash; __CITING_COUNT__
  </div>
  <div class="note">Edges: paper &rarr; cites &rarr; paper</div>
</div>
<div id="graph"></div>
<script>
  const nodes = new vis.DataSet(__NODES__);
  const edges = new vis.DataSet(__EDGES__);
  const container = document.getElementById("graph");
  const options = {
    nodes: {
      font: { size: 14, face: "arial" }
    },
    edges: {
      arrows: { to: { enabled: true, scaleFactor: 0.5 } },
      color: { color: "#cccccc", highlight: "#666666" },
      smooth: { type: "continuous", forceDirection: "none" }
    },
    physics: {
      enabled: true,
      solver: "forceAtlas2Based",
      forceAtlas2Based: {
        gravitationalConstant: -100,
        centralGravity: 0.01,
        springLength: 150,
        springConstant: 0.08
      },
      stabilization: { iterations: 200 }
    },
    interaction: {
      hover: true,
      tooltipDelay: 100,
      navigationButtons: true,
      keyboard: true
    }
  };
  new vis.Network(container, { nodes, edges }, options);
</script>
</body>
</html>
"##;
