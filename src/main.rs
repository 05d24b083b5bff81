use anyhow::Context;
use clap::Parser;
use gomaker::config::{self, Config};
use gomaker::project;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{Level, error, info};

const OPTION_HELP: &str = "\
[Options]
  none:    normal go build, Shell: go build
  verbose: verbose build, Shell: go build -x
  lite:    no debug symbols, Shell: -ldflags '-s'
  static:  try making a static linked binary (no deps)
  commit:  try adding version info into the mix

Default:
  gomaker -o Makefile --options 'static,verbose,lite,commit' .";

/// Makefile generator for Go projects
#[derive(Parser, Debug)]
#[command(name = "gomaker", about, long_about = None, after_help = OPTION_HELP)]
struct Cli {
    /// Go project directory
    #[arg(default_value = ".")]
    dir: PathBuf,
    /// Output file, `-` for stdout [default: Makefile]
    #[arg(short, long, value_name = "FILE")]
    output: Option<String>,
    /// Comma separated option list [default: static,verbose,lite,commit]
    #[arg(long, value_name = "LIST")]
    options: Option<String>,
    /// Version (v4.3.2), prefixed to the commit when `commit` is used
    #[arg(long, value_name = "VERSION")]
    version: Option<String>,
    /// Build tags, comma separated
    #[arg(long, value_name = "TAGS")]
    tags: Option<String>,
    /// Extra linker flags
    #[arg(long, value_name = "FLAGS", allow_hyphen_values = true)]
    ldflags: Option<String>,
    /// Link-time variable, e.g. main.author=me (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,
    /// Copy an existing output file to the temp dir before overwriting it
    #[arg(long)]
    backup: bool,
    /// Fail instead of overwriting an existing output file
    #[arg(long)]
    no_clobber: bool,
    /// Config file [default: <DIR>/gomaker.toml when present]
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Debug logging
    #[arg(long)]
    debug: bool,
}

impl Cli {
    fn overrides(&self) -> Config {
        Config {
            output: self.output.clone(),
            options: self.options.clone(),
            version: self.version.clone(),
            tags: self.tags.clone(),
            ldflags: self.ldflags.clone(),
            set: self.set.clone(),
            backup: self.backup.then_some(true),
            no_clobber: self.no_clobber.then_some(true),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // logs go to stderr so `-o -` leaves stdout to the Makefile
    tracing_subscriber::fmt()
        .with_max_level(if cli.debug { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    info!("[Gomaker] {}", env!("CARGO_PKG_VERSION"));

    let project = project::inspect(&cli.dir)
        .with_context(|| format!("inspecting {}", cli.dir.display()))?;
    info!("[Project] {}", project.name);

    if let Some(path) = config::config_path(&project.dir, cli.config.as_deref()) {
        info!("[Config] {}", path.display());
    }
    let settings = Config::discover(&project.dir, cli.config.as_deref())?
        .merge(cli.overrides())
        .into_settings();
    info!("[Options] {}", settings.options);

    let generated = gomaker::generate(&project, &settings).context("generating Makefile")?;
    info!("[Gomaker] Makefile generated ({} lines).", generated.lines);
    Ok(())
}
