//! Sample datasets compiled into the binary

use clap::ValueEnum;
use datasight_agent::Dataset;

const IRIS_CSV: &str = include_str!("../data/iris.csv");

/// A bundled dataset selectable with `--sample`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Sample {
    /// Fisher's iris measurements, 150 rows, numeric `target` class
    Iris,
}

impl Sample {
    pub fn name(&self) -> &'static str {
        match self {
            Sample::Iris => "iris",
        }
    }

    /// File name used when the data has to exist on disk for chart scripts
    pub fn file_name(&self) -> String {
        format!("{}.csv", self.name())
    }

    pub fn csv(&self) -> &'static str {
        match self {
            Sample::Iris => IRIS_CSV,
        }
    }

    pub fn load(&self) -> datasight_agent::Result<Dataset> {
        Dataset::from_csv_reader(self.csv().as_bytes(), b',')
    }
}
