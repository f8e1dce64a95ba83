//! Dataset context: the text snapshot of a dataset sent to the model

use crate::dataset::{DType, DataColumn, Dataset, Describe};
use std::fmt;
use std::fmt::Write as _;

/// Instructions appended to every context so generated code targets `df`
const CODE_GENERATION_NOTES: &[&str] = &[
    "A pandas DataFrame named 'df' is available in the execution environment.",
    "You can use standard pandas operations for aggregations:",
    "  - df.groupby('column').agg({'other_col': 'mean'})",
    "  - df[df['column'] > value]",
    "  - df.pivot_table(...)",
    "All necessary imports (pandas, numpy, matplotlib) are available.",
    "Generate code that uses 'df' directly - it contains the full dataset.",
];

/// Caps on how much of the dataset ends up in the prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextOptions {
    /// How many grouping columns get a value-count listing
    pub max_distribution_columns: usize,
    /// Values listed per distribution before eliding the rest
    pub max_distribution_rows: usize,
    /// Columns with fewer distinct values than this count as grouping columns
    pub cardinality_threshold: usize,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            max_distribution_columns: 3,
            max_distribution_rows: 20,
            cardinality_threshold: 20,
        }
    }
}

/// Read-only text snapshot of a dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetContext(String);

impl DatasetContext {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for DatasetContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DatasetContext {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Build the context text for a dataset. Pure and deterministic.
pub fn build_context(dataset: &Dataset, options: &ContextOptions) -> DatasetContext {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Dataset: {} rows, {} columns",
        dataset.n_rows(),
        dataset.n_cols()
    );
    let _ = writeln!(out, "Columns: {}", dataset.column_names().join(", "));

    out.push_str("\nData types:\n");
    out.push_str(&dtype_listing(dataset));

    out.push_str("\nNumeric column summary:\n");
    out.push_str(&describe_table(dataset));

    let grouping: Vec<DataColumn<'_>> = dataset
        .columns()
        .filter(|c| c.dtype() == DType::Object || c.n_unique() < options.cardinality_threshold)
        .collect();

    if !grouping.is_empty() {
        let names: Vec<&str> = grouping.iter().map(|c| c.name()).collect();
        let _ = writeln!(out, "\nPotential grouping columns: {}", names.join(", "));

        for column in grouping.iter().take(options.max_distribution_columns) {
            let _ = writeln!(out, "\n{} distribution:", column.name());
            out.push_str(&distribution(column, options.max_distribution_rows));
        }
    }

    let rule = "=".repeat(50);
    let _ = writeln!(out, "\n{}", rule);
    out.push_str("IMPORTANT FOR CODE GENERATION:\n");
    let _ = writeln!(out, "{}", rule);
    for line in CODE_GENERATION_NOTES {
        out.push_str(line);
        out.push('\n');
    }

    DatasetContext(out)
}

fn dtype_listing(dataset: &Dataset) -> String {
    let width = dataset
        .columns()
        .map(|c| c.name().chars().count())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for column in dataset.columns() {
        let _ = writeln!(out, "{:<width$}    {}", column.name(), column.dtype());
    }
    out
}

fn stat_cell(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.6}", v),
        None => "NaN".to_string(),
    }
}

/// Describe-style table: one row per statistic, one column per numeric column
fn describe_table(dataset: &Dataset) -> String {
    let stats: Vec<(&str, Describe)> = dataset
        .columns()
        .filter_map(|c| c.describe().map(|d| (c.name(), d)))
        .collect();

    if stats.is_empty() {
        return "(no numeric columns)\n".to_string();
    }

    let rows: [(&str, fn(&Describe) -> Option<f64>); 8] = [
        ("count", |d| Some(d.count as f64)),
        ("mean", |d| d.mean),
        ("std", |d| d.std),
        ("min", |d| d.min),
        ("25%", |d| d.q25),
        ("50%", |d| d.median),
        ("75%", |d| d.q75),
        ("max", |d| d.max),
    ];

    // Column widths fit both the header and every formatted cell
    let cells: Vec<Vec<String>> = stats
        .iter()
        .map(|(_, d)| rows.iter().map(|(_, get)| stat_cell(get(d))).collect())
        .collect();
    let widths: Vec<usize> = stats
        .iter()
        .zip(&cells)
        .map(|((name, _), col)| {
            col.iter()
                .map(|c| c.len())
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    out.push_str("     ");
    for ((name, _), width) in stats.iter().zip(&widths) {
        let _ = write!(out, "  {:>width$}", name, width = *width);
    }
    out.push('\n');

    for (i, (label, _)) in rows.iter().enumerate() {
        let _ = write!(out, "{:<5}", label);
        for (col, width) in cells.iter().zip(&widths) {
            let _ = write!(out, "  {:>width$}", col[i], width = *width);
        }
        out.push('\n');
    }
    out
}

fn distribution(column: &DataColumn<'_>, max_rows: usize) -> String {
    let counts = column.value_counts();
    let shown = &counts[..counts.len().min(max_rows)];
    let width = shown
        .iter()
        .map(|(label, _)| label.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for (label, count) in shown {
        let _ = writeln!(out, "{:<width$}    {}", label, count);
    }
    if counts.len() > shown.len() {
        let _ = writeln!(out, "... ({} more values)", counts.len() - shown.len());
    }
    out
}
