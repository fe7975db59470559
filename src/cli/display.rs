//! Display formatting for CLI output
//!
//! SBIO pattern: Pure functions that format data for display

use serde_json::Value;

use super::commands::ContextInfo;
use crate::cluster::NodeStatistics;
use crate::pools::{NodeAction, Pool};
use crate::resources::ChildRef;

// ============================================================================
// Table formatting helpers
// ============================================================================

/// Format a simple table with headers and rows
pub fn format_table(headers: &[&str], rows: Vec<Vec<String>>) -> String {
    if rows.is_empty() {
        return "No resources found.\n".to_string();
    }

    // Calculate column widths
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.len());
            }
        }
    }

    let mut output = String::new();

    for (i, header) in headers.iter().enumerate() {
        if i > 0 {
            output.push_str("   ");
        }
        output.push_str(&format!(
            "{:width$}",
            header.to_uppercase(),
            width = widths[i]
        ));
    }
    output.push('\n');

    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i > 0 {
                output.push_str("   ");
            }
            if i < widths.len() {
                output.push_str(&format!("{:width$}", cell, width = widths[i]));
            } else {
                output.push_str(cell);
            }
        }
        output.push('\n');
    }

    output
}

// ============================================================================
// Context display
// ============================================================================

/// Format context list for display
pub fn format_context_list(contexts: &[ContextInfo]) -> String {
    let headers = &["", "NAME", "API"];
    let rows: Vec<Vec<String>> = contexts
        .iter()
        .map(|ctx| {
            vec![
                if ctx.is_current { "*" } else { " " }.to_string(),
                ctx.name.clone(),
                ctx.api_root.clone(),
            ]
        })
        .collect();

    format_table(headers, rows)
}

/// Format current context for display
pub fn format_current_context(name: &str, api_root: &str) -> String {
    format!("Current context: {} ({})\n", name, api_root)
}

// ============================================================================
// Pool display
// ============================================================================

pub fn format_pool_list(names: &[String]) -> String {
    let rows = names.iter().map(|n| vec![n.clone()]).collect();
    format_table(&["NAME"], rows)
}

/// Format a pool's nodes with their draining state
pub fn format_pool_detail(pool: &Pool) -> String {
    let mut output = format!(
        "Pool: {}\nNodes: {} ({} active, {} draining)\n\n",
        pool.name(),
        pool.nodes().len(),
        pool.active_nodes().len(),
        pool.draining().len()
    );

    let rows = pool
        .nodes()
        .iter()
        .map(|node| {
            let state = if pool.draining().contains(node) {
                "DRAINING"
            } else {
                "ACTIVE"
            };
            vec![node.clone(), state.to_string()]
        })
        .collect();

    output.push_str(&format_table(&["NODE", "STATE"], rows));
    output
}

/// Summarise a successful node mutation
pub fn format_mutation(action: NodeAction, nodes: &[String], pool: &Pool) -> String {
    let verb = match action {
        NodeAction::Drain => "draining",
        NodeAction::Undrain => "undrained",
        NodeAction::Add => "added",
        NodeAction::Remove => "removed",
    };
    format!(
        "{} {} in pool \"{}\" ({} nodes, {} draining)\n",
        nodes.join(", "),
        verb,
        pool.name(),
        pool.nodes().len(),
        pool.draining().len()
    )
}

// ============================================================================
// Cluster display
// ============================================================================

pub fn format_members(members: &[ChildRef]) -> String {
    let rows = members
        .iter()
        .map(|m| vec![m.name.clone(), m.href.clone()])
        .collect();
    format_table(&["NAME", "HREF"], rows)
}

/// Format merged node statistics, sorted by node
pub fn format_node_statistics(details: &NodeStatistics) -> String {
    let headers = &["NODE", "STATE", "CURRENT", "TOTAL", "BYTES IN", "BYTES OUT", "ERRORS"];

    let mut names: Vec<&String> = details.keys().collect();
    names.sort();

    let rows = names
        .into_iter()
        .map(|name| {
            let stats = details[name].get("statistics").unwrap_or(&details[name]);
            vec![
                name.clone(),
                stat_field(stats, "state"),
                stat_field(stats, "current_conn"),
                stat_field(stats, "total_conn"),
                stat_field(stats, "bytes_from_node"),
                stat_field(stats, "bytes_to_node"),
                stat_field(stats, "errors"),
            ]
        })
        .collect();

    format_table(headers, rows)
}

fn stat_field(stats: &Value, key: &str) -> String {
    match stats.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "-".to_string(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_table() {
        let headers = &["NAME", "STATE"];
        let rows = vec![
            vec!["10.0.0.1:80".to_string(), "ACTIVE".to_string()],
            vec!["10.0.0.2:80".to_string(), "DRAINING".to_string()],
        ];

        let output = format_table(headers, rows);
        assert!(output.contains("NAME"));
        assert!(output.contains("10.0.0.1:80"));
        assert!(output.contains("DRAINING"));
    }

    #[test]
    fn test_format_table_empty() {
        let rows: Vec<Vec<String>> = vec![];
        let output = format_table(&["NAME"], rows);
        assert!(output.contains("No resources found"));
    }

    #[test]
    fn test_format_context_list() {
        let contexts = vec![
            ContextInfo {
                name: "prod".to_string(),
                api_root: "https://lb1:9070/api/tm/2.0".to_string(),
                is_current: true,
            },
            ContextInfo {
                name: "dev".to_string(),
                api_root: "https://lb-dev:9070/api/tm/2.0".to_string(),
                is_current: false,
            },
        ];

        let output = format_context_list(&contexts);
        assert!(output.contains("prod"));
        assert!(output.contains("lb-dev"));
        assert!(output.contains("*")); // Current marker
    }

    #[test]
    fn test_format_pool_list() {
        let output = format_pool_list(&["web-pool".to_string(), "api-pool".to_string()]);
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].trim(), "web-pool");
    }

    #[test]
    fn test_format_members() {
        let output = format_members(&[ChildRef::new("tm1", "/api/tm/2.0/status/tm1/")]);
        assert!(output.contains("tm1"));
        assert!(output.contains("/api/tm/2.0/status/tm1/"));
    }

    #[test]
    fn test_format_node_statistics_sorted() {
        let mut details = NodeStatistics::new();
        details.insert(
            "web-10.0.0.2:80".to_string(),
            json!({"statistics": {"state": "alive", "current_conn": 3, "total_conn": 40}}),
        );
        details.insert(
            "web-10.0.0.1:80".to_string(),
            json!({"statistics": {"state": "dead", "errors": 7}}),
        );

        let output = format_node_statistics(&details);
        let lines: Vec<_> = output.lines().collect();
        assert!(lines[1].starts_with("web-10.0.0.1:80"));
        assert!(lines[1].contains("dead"));
        assert!(lines[1].contains('7'));
        assert!(lines[2].contains("alive"));
        assert!(lines[2].contains("40"));
    }

    #[test]
    fn test_stat_field_missing() {
        assert_eq!(stat_field(&json!({}), "state"), "-");
        assert_eq!(stat_field(&json!({"state": "alive"}), "state"), "alive");
        assert_eq!(stat_field(&json!({"n": 5}), "n"), "5");
    }
}
