//! Turns generated matplotlib code into a runnable script and, optionally, a PNG

use crate::render::extract_code;
use crate::samples::Sample;
use std::path::{Path, PathBuf};
use std::time::Duration;

const RENDER_TIMEOUT: Duration = Duration::from_secs(60);

/// Where the scripts load `df` from
#[derive(Debug, Clone)]
pub enum ScriptData {
    /// The CSV the session was started with
    File { path: PathBuf, delimiter: u8 },
    /// A bundled sample, copied next to the scripts on first use
    Sample(Sample),
}

/// Writes `chart_<n>.py` files into a directory
pub struct ChartWriter {
    dir: PathBuf,
    data: ScriptData,
    python: Option<String>,
    next_index: usize,
}

/// What was produced for one insight
#[derive(Debug)]
pub struct ChartOutput {
    pub script: PathBuf,
    /// Set when the interpreter ran and saved the figure
    pub image: Option<PathBuf>,
    /// Interpreter failure, shown next to the code
    pub render_error: Option<String>,
}

fn python_str(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("'{}'", s))
}

fn read_csv_call(csv_path: &Path, delimiter: u8) -> String {
    let path = python_str(&csv_path.display().to_string());
    if delimiter == b',' {
        format!("pd.read_csv({})", path)
    } else {
        let sep = python_str(&char::from(delimiter).to_string());
        format!("pd.read_csv({}, sep={})", path, sep)
    }
}

/// Standalone script: loads the CSV into `df`, runs the code, saves `fig`
pub fn build_script(csv_path: &Path, delimiter: u8, code: &str, image_path: &Path) -> String {
    let body = extract_code(code);
    format!(
        "import pandas as pd\n\
import numpy as np\n\
import matplotlib\n\
matplotlib.use(\"Agg\")\n\
import matplotlib.pyplot as plt\n\
from io import StringIO\n\
try:\n    from scipy.spatial import ConvexHull\nexcept ImportError:\n    ConvexHull = None\n\
\n\
df = {read_csv}\n\
\n\
{body}\n\
\n\
if 'fig' not in globals():\n    fig = plt.gcf()\n\
fig.savefig({png}, bbox_inches=\"tight\")\n",
        read_csv = read_csv_call(csv_path, delimiter),
        png = python_str(&image_path.display().to_string()),
        body = body,
    )
}

impl ChartWriter {
    pub fn new(dir: impl Into<PathBuf>, data: ScriptData, python: Option<String>) -> Self {
        Self {
            dir: dir.into(),
            data,
            python,
            next_index: 1,
        }
    }

    /// Path and delimiter of the CSV the scripts read
    async fn data_file(&self) -> std::io::Result<(PathBuf, u8)> {
        match &self.data {
            ScriptData::File { path, delimiter } => {
                let path = std::path::absolute(path).unwrap_or_else(|_| path.clone());
                Ok((path, *delimiter))
            }
            ScriptData::Sample(sample) => {
                let path = self.dir.join(sample.file_name());
                if !tokio::fs::try_exists(&path).await? {
                    tokio::fs::write(&path, sample.csv()).await?;
                }
                let path = std::path::absolute(&path).unwrap_or(path);
                Ok((path, b','))
            }
        }
    }

    /// Write the script for `code` and render it when an interpreter is set
    pub async fn write(&mut self, code: &str) -> anyhow::Result<ChartOutput> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let index = self.next_index;
        self.next_index += 1;
        let script = self.dir.join(format!("chart_{}.py", index));
        let image = self.dir.join(format!("chart_{}.png", index));

        let (csv_path, delimiter) = self.data_file().await?;
        tokio::fs::write(&script, build_script(&csv_path, delimiter, code, &image)).await?;
        tracing::debug!("Wrote chart script {}", script.display());

        let Some(python) = self.python.as_deref() else {
            return Ok(ChartOutput {
                script,
                image: None,
                render_error: None,
            });
        };

        match run_script(python, &script).await {
            Ok(()) => Ok(ChartOutput {
                script,
                image: Some(image),
                render_error: None,
            }),
            Err(e) => {
                tracing::warn!("Chart rendering failed: {}", e);
                Ok(ChartOutput {
                    script,
                    image: None,
                    render_error: Some(e.to_string()),
                })
            }
        }
    }
}

async fn run_script(python: &str, script: &Path) -> anyhow::Result<()> {
    let run = tokio::process::Command::new(python)
        .arg(script)
        .kill_on_drop(true)
        .output();

    let output = tokio::time::timeout(RENDER_TIMEOUT, run)
        .await
        .map_err(|_| anyhow::anyhow!("timed out after {}s", RENDER_TIMEOUT.as_secs()))??;

    if output.status.success() {
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let last = stderr.lines().last().unwrap_or("").trim();
        anyhow::bail!("{} exited with {}: {}", python, output.status, last)
    }
}
