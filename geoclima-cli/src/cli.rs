use anyhow::{Context, bail};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use geoclima_core::{
    Catalog, Config, Enricher, Field, IngestReport, LocationRecord, Selection, ingest,
    open_source, provider_from_config,
};
use inquire::{Password, PasswordDisplayMode, Text};
use std::io::Write;
use std::path::PathBuf;
use tracing::warn;

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "geoclima", version, about = "School locations with live weather")]
pub struct Cli {
    /// Raise log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Workbook (.xlsx, .xls, .ods) or CSV export; overrides the configured path.
    #[arg(long, global = true)]
    pub workbook: Option<PathBuf>,

    /// Worksheet holding the school list; overrides the configured sheet.
    #[arg(long, global = true)]
    pub sheet: Option<String>,

    /// OpenWeather API key; overrides the configured key.
    #[arg(long, env = "OPENWEATHER_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API key and workbook location.
    Configure,

    /// List the distinct values available for filtering.
    Options {
        /// Only this field; all four when absent.
        field: Option<FieldArg>,
    },

    /// Show the filtered school table with summary figures.
    List {
        #[command(flatten)]
        filters: FilterArgs,

        /// Emit JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Show one school with its current weather.
    Show {
        /// Row number as printed by `list`, or the exact school name.
        institution: String,

        #[arg(long)]
        json: bool,
    },

    /// Fetch weather for every marker of the map view.
    Map {
        #[command(flatten)]
        filters: FilterArgs,

        /// Simultaneous weather requests; defaults to the configured value.
        #[arg(long)]
        concurrency: Option<usize>,

        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FieldArg {
    Department,
    Province,
    District,
    Level,
}

impl From<FieldArg> for Field {
    fn from(arg: FieldArg) -> Self {
        match arg {
            FieldArg::Department => Field::Department,
            FieldArg::Province => Field::Province,
            FieldArg::District => Field::District,
            FieldArg::Level => Field::Level,
        }
    }
}

#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// Keep these departments (repeatable).
    #[arg(long = "department")]
    pub departments: Vec<String>,

    #[arg(long = "province")]
    pub provinces: Vec<String>,

    #[arg(long = "district")]
    pub districts: Vec<String>,

    /// Keep these levels/modalities (repeatable).
    #[arg(long = "level")]
    pub levels: Vec<String>,

    /// Start from the first value of each field, as the dashboard filters do.
    #[arg(long)]
    pub defaults: bool,
}

impl FilterArgs {
    /// Explicit values replace the default for their field only.
    pub fn selection(&self, catalog: &Catalog) -> Selection {
        let explicit = [
            (Field::Department, &self.departments),
            (Field::Province, &self.provinces),
            (Field::District, &self.districts),
            (Field::Level, &self.levels),
        ];

        explicit
            .into_iter()
            .fold(Selection::new(), |selection, (field, values)| {
                if !values.is_empty() {
                    selection.with(field, values.iter().cloned())
                } else if self.defaults {
                    selection.with(field, catalog.unique_values(field).into_iter().take(1))
                } else {
                    selection
                }
            })
    }
}

impl Cli {
    /// Flag and environment overrides apply to this run only. `configure` edits the
    /// stored file, so it sees the stored values untouched.
    fn session_config(&self, mut config: Config) -> Config {
        if matches!(self.command, Command::Configure) {
            return config;
        }

        if let Some(workbook) = &self.workbook {
            config.data.workbook = Some(workbook.clone());
        }
        if let Some(sheet) = &self.sheet {
            config.data.sheet = sheet.clone();
        }
        if let Some(key) = &self.api_key {
            config.set_api_key(key.clone());
        }
        config
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let config = self.session_config(Config::load()?);

        match self.command {
            Command::Configure => configure(config),
            Command::Options { field } => {
                let catalog = load_catalog(&config)?;
                let fields: Vec<Field> = match field {
                    Some(f) => vec![f.into()],
                    None => Field::all().to_vec(),
                };
                for field in fields {
                    render::print_options(field, &catalog.unique_values(field));
                }
                Ok(())
            }
            Command::List { filters, json } => {
                let catalog = load_catalog(&config)?;
                let selection = filters.selection(&catalog);
                let rows: Vec<(usize, &LocationRecord)> = catalog
                    .records()
                    .iter()
                    .enumerate()
                    .filter(|(_, r)| selection.admits(r))
                    .collect();

                if json {
                    let records: Vec<&LocationRecord> = rows.iter().map(|(_, r)| *r).collect();
                    println!("{}", serde_json::to_string_pretty(&records)?);
                } else {
                    render::print_table(&rows);
                }
                Ok(())
            }
            Command::Show { institution, json } => {
                let catalog = load_catalog(&config)?;
                let record = resolve(&catalog, &institution)?;
                let provider = provider_from_config(&config)?;

                eprintln!("Fetching current weather...");
                let enriched = Enricher::new(provider.as_ref()).one(record).await;

                if json {
                    println!("{}", serde_json::to_string_pretty(&enriched)?);
                } else {
                    render::print_detail(&enriched);
                }
                Ok(())
            }
            Command::Map {
                filters,
                concurrency,
                json,
            } => {
                let catalog = load_catalog(&config)?;
                let selection = filters.selection(&catalog);
                let records = catalog.filter(&selection);
                let provider = provider_from_config(&config)?;
                let limit = concurrency.unwrap_or(config.weather.concurrency);

                let batch = Enricher::new(provider.as_ref())
                    .with_concurrency(limit)
                    .all_with_progress(records.iter().copied(), |done, total| {
                        eprint!("\rFetching weather {done}/{total}");
                        let _ = std::io::stderr().flush();
                    })
                    .await;
                eprintln!();

                let center = catalog.centroid();
                if json {
                    let value = render::map_json(center, &batch);
                    println!("{}", serde_json::to_string_pretty(&value)?);
                } else {
                    render::print_map(center, &batch);
                }
                Ok(())
            }
        }
    }
}

/// Any ingestion failure, or a catalog with no usable rows, ends the session here.
fn load_catalog(config: &Config) -> anyhow::Result<Catalog> {
    let path = config.require_workbook()?;
    let source = open_source(path, &config.data.sheet)?;

    let (catalog, report) = ingest(source.as_ref())
        .with_context(|| format!("Failed to load data from {}", path.display()))?;

    report_dropped(&report);

    if catalog.is_empty() {
        bail!(
            "No data could be loaded. Check the workbook {} and sheet '{}'.",
            path.display(),
            config.data.sheet
        );
    }

    Ok(catalog)
}

fn report_dropped(report: &IngestReport) {
    if report.dropped.is_empty() {
        return;
    }

    warn!(
        skipped = report.dropped.len(),
        rows = report.rows_read,
        "Skipped rows without usable coordinates (run with -vv for details)"
    );
}

fn resolve<'a>(catalog: &'a Catalog, institution: &str) -> anyhow::Result<&'a LocationRecord> {
    let by_index = institution
        .trim()
        .parse::<usize>()
        .ok()
        .and_then(|index| catalog.get(index));
    if let Some(record) = by_index {
        return Ok(record);
    }

    catalog
        .find_by_name(institution)
        .map(|(_, record)| record)
        .with_context(|| {
            format!("No school matches '{institution}'. Use `geoclima list` to see row numbers.")
        })
}

fn configure(mut config: Config) -> anyhow::Result<()> {
    let workbook_default = config
        .data
        .workbook
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default();

    let workbook = Text::new("Workbook or CSV path:")
        .with_default(&workbook_default)
        .prompt()?;
    let sheet = Text::new("Worksheet name:")
        .with_default(&config.data.sheet)
        .prompt()?;
    let api_key = Password::new("OpenWeather API key (leave blank to keep current):")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()?;

    if !workbook.trim().is_empty() {
        config.data.workbook = Some(PathBuf::from(workbook.trim()));
    }
    config.data.sheet = sheet.trim().to_string();
    if !api_key.trim().is_empty() {
        config.set_api_key(api_key);
    }

    let path = config.save()?;
    println!("Configuration saved to {}", path.display());
    Ok(())
}
