use std::collections::BTreeMap;

use tabled::settings::Style;
use tabled::{Table, Tabled};
use termtree::Tree;

use crate::workflow::PublishReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Tabled)]
struct ReportRow {
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

pub fn render_report(report: &PublishReport, format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Table => Ok(render_table(report)),
        OutputFormat::Json => serde_json::to_string_pretty(report),
    }
}

fn render_table(report: &PublishReport) -> String {
    let rows = vec![
        ReportRow {
            field: "Organization",
            value: report.organization.clone(),
        },
        ReportRow {
            field: "Workspace",
            value: report.workspace.clone(),
        },
        ReportRow {
            field: "Workspace ID",
            value: report.workspace_id.clone(),
        },
        ReportRow {
            field: "Configuration version",
            value: report
                .configuration_version_id
                .clone()
                .unwrap_or_else(|| "-".to_string()),
        },
        ReportRow {
            field: "Archive",
            value: report.artifact_name.clone(),
        },
        ReportRow {
            field: "Files",
            value: report.file_count.to_string(),
        },
        ReportRow {
            field: "Bytes",
            value: report.archive_bytes.to_string(),
        },
    ];

    Table::new(rows).with(Style::rounded()).to_string()
}

#[derive(Default)]
struct Node {
    children: BTreeMap<String, Node>,
}

/// Nests slash-separated archive entry names under `root`.
pub fn archive_tree(root: &str, entries: &[String]) -> Tree<String> {
    let mut top = Node::default();
    for entry in entries {
        let mut node = &mut top;
        for part in entry.split('/').filter(|p| !p.is_empty() && *p != ".") {
            node = node.children.entry(part.to_string()).or_default();
        }
    }
    to_tree(root.to_string(), &top)
}

fn to_tree(label: String, node: &Node) -> Tree<String> {
    let mut tree = Tree::new(label);
    for (name, child) in &node.children {
        tree.push(to_tree(name.clone(), child));
    }
    tree
}
