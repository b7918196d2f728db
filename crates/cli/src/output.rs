//! Terminal rendering of form and table view models

use colored::Colorize;
use crm_form::{Cell, Control, FormView, Item, Section, SortDirection, TableView};
use crm_schema::{ErrorEntry, ErrorTree, Widget};

const INDENT: &str = "  ";

/// Outline of a record form
pub fn form_outline(view: &FormView) -> String {
    let mut out = format!("{}\n", view.title.bold());
    section_lines(&view.section, 1, &mut out);
    out.push_str(&format!("{}[{}]\n", INDENT, view.submit_label.green()));
    out
}

/// Outline of a search panel
pub fn search_outline(title: &str, section: &Section) -> String {
    let mut out = format!("{}\n", format!("Search {}", title).bold());
    section_lines(section, 1, &mut out);
    out
}

fn section_lines(section: &Section, depth: usize, out: &mut String) {
    let indent = INDENT.repeat(depth);
    for item in &section.items {
        match item {
            Item::Control(control) => {
                out.push_str(&indent);
                out.push_str(&control_line(control));
                out.push('\n');
            }
            Item::Section(nested) => {
                let heading = nested.title.as_deref().unwrap_or(&nested.name);
                out.push_str(&format!("{}{}\n", indent, heading.cyan().bold()));
                section_lines(nested, depth + 1, out);
            }
        }
    }
}

fn control_line(control: &Control) -> String {
    let marker = if control.required { "*" } else { " " };
    let mut line = format!(
        "{}{} ({})",
        marker.red(),
        control.title,
        control.widget.hint_name().dimmed()
    );

    match control.widget {
        Widget::Bool => line.push_str(if control.checked { " [x]" } else { " [ ]" }),
        Widget::Select => {
            let labels: Vec<&str> = control
                .options
                .iter()
                .map(|option| {
                    if option.is_blank() {
                        "-"
                    } else {
                        option.label.as_str()
                    }
                })
                .collect();
            line.push_str(&format!(" {{{}}}", labels.join(" | ")));
            if !control.value.is_empty() {
                line.push_str(&format!(" = {}", control.value));
            }
        }
        _ => {
            if !control.value.is_empty() {
                line.push_str(&format!(" = {}", control.value));
            }
        }
    }

    if let (Some(min), Some(max)) = (&control.minimum, &control.maximum) {
        line.push_str(&format!(" [{}..{}]", min, max));
    } else if let Some(min) = &control.minimum {
        line.push_str(&format!(" [>= {}]", min));
    } else if let Some(max) = &control.maximum {
        line.push_str(&format!(" [<= {}]", max));
    }

    if let Some(error) = &control.error {
        line.push_str(&format!("  {}", error.red()));
    }
    line
}

/// Plain-text table with padded columns
pub fn table(view: &TableView) -> String {
    let headers: Vec<String> = view
        .headers
        .iter()
        .map(|header| match header.sorted {
            Some(SortDirection::Asc) => format!("{} ^", header.title),
            Some(SortDirection::Desc) => format!("{} v", header.title),
            None => header.title.clone(),
        })
        .collect();

    let rows: Vec<Vec<String>> = view
        .rows
        .iter()
        .map(|row| {
            row.cells
                .iter()
                .map(|cell| match cell {
                    Cell::Key(_) => "#".to_string(),
                    Cell::Text(text) => text.clone(),
                })
                .collect()
        })
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            rows.iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = format!("{}\n", padded(&headers, &widths).bold());
    for row in &rows {
        out.push_str(&padded(row, &widths));
        out.push('\n');
    }
    out
}

fn padded(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

/// Validation errors, one dotted path per line
pub fn error_lines(tree: &ErrorTree) -> String {
    let mut out = String::new();
    collect_errors(tree, "", &mut out);
    out
}

fn collect_errors(tree: &ErrorTree, prefix: &str, out: &mut String) {
    for (key, entry) in tree.iter() {
        let path = crm_schema::join_path(prefix, key);
        match entry {
            ErrorEntry::Message(message) => {
                out.push_str(&format!("{} {}: {}\n", "✗".red(), path, message));
            }
            ErrorEntry::Nested(nested) => collect_errors(nested, &path, out),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
