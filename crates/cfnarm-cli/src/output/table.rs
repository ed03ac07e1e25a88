//! Table formatting utilities for CLI output.

use cfnarm::translate::ResourceSummary;
use comfy_table::{presets, CellAlignment, ContentArrangement, Table};

/// Format what each source resource contributed as an ASCII table.
pub fn format_summary_table(summary: &[ResourceSummary]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_BORDERS_ONLY);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "Resource",
        "Type",
        "Entries",
        "Parameters",
        "Variables",
        "Outputs",
    ]);

    for row in summary {
        table.add_row(vec![
            row.name.clone(),
            row.resource_type.clone(),
            row.entries.to_string(),
            row.parameters.to_string(),
            row.variables.to_string(),
            row.outputs.to_string(),
        ]);
    }
    for index in 2..6 {
        if let Some(column) = table.column_mut(index) {
            column.set_cell_alignment(CellAlignment::Right);
        }
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_row_per_resource() {
        let summary = vec![ResourceSummary {
            name: "Web".to_string(),
            resource_type: "AWS::EC2::Instance".to_string(),
            parameters: 5,
            variables: 9,
            entries: 3,
            outputs: 0,
        }];
        let rendered = format_summary_table(&summary).to_string();
        assert!(rendered.contains("AWS::EC2::Instance"));
        assert!(rendered.contains("Variables"));
    }
}
