//! # `build` CLI Entry Point
//!
//! Parses the command line with clap and dispatches to the init, listing,
//! doctor, clean, watch or build handlers.
//!
//! ```text
//! build --init NAME [--template T]
//! build --listtemplates
//! build [--sudo] [cmake|make|ctest] [ARGS...]
//! ```

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::{Shell, generate};
use std::path::PathBuf;

use cmbuild::build::{self, Action, BuildOptions};
use cmbuild::commands;
use cmbuild::manifest::DEFAULT_BUILDFILE;
use cmbuild::settings::Settings;

#[derive(Parser)]
#[command(name = "build")]
#[command(about = "Easy to use wrapper around cmake and make", version = env!("CARGO_PKG_VERSION"))]
#[command(
    after_help = "ARGS starting with cmake, make or ctest select that tool; anything else is passed to make.\nUse -- before ARGS that look like options of build itself."
)]
struct Cli {
    /// Use FILE as the build file
    #[arg(short = 'f', long, value_name = "FILE", default_value = DEFAULT_BUILDFILE)]
    buildfile: PathBuf,

    /// Initialize a new project with the given name
    #[arg(short = 'i', long = "init", value_name = "NAME")]
    init: Option<String>,

    /// With --init, use a template for initialization
    #[arg(short = 't', long, value_name = "T", requires = "init")]
    template: Option<String>,

    /// List all available templates and exit
    #[arg(short = 'T', long = "listtemplates", visible_alias = "list-templates")]
    list_templates: bool,

    /// Don't run cmake
    #[arg(short = 'c', long)]
    no_cmake: bool,

    /// Don't run make
    #[arg(short = 'm', long)]
    no_make: bool,

    /// Don't create a git repository
    #[arg(short = 'g', long)]
    no_git: bool,

    /// Run make with sudo
    #[arg(short = 's', long)]
    sudo: bool,

    /// Directory to put executables in (default: project root)
    #[arg(long, value_name = "DIR")]
    exec_dir: Option<PathBuf>,

    /// Explain regeneration decisions
    #[arg(short, long)]
    verbose: bool,

    /// Remove the build directory and built executables, then exit
    #[arg(long, conflicts_with_all = ["init", "watch"])]
    clean: bool,

    /// Rebuild whenever a project file changes
    #[arg(long)]
    watch: bool,

    /// Check external tools and project state, then exit
    #[arg(long)]
    doctor: bool,

    /// Print a shell completion script and exit
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,

    /// [cmake|make|ctest] followed by arguments for that tool
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
    args: Vec<String>,
}

impl Cli {
    fn build_options(&self) -> BuildOptions {
        let (action, args) = Action::split(&self.args);
        BuildOptions {
            buildfile: self.buildfile.clone(),
            action,
            args,
            run_cmake: !self.no_cmake,
            run_make: !self.no_make,
            make_git: !self.no_git,
            sudo: self.sudo,
            exec_dir: self.exec_dir.clone(),
            verbose: self.verbose,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        let mut cmd = Cli::command();
        let bin_name = cmd.get_name().to_string();
        generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
        return Ok(());
    }

    let settings = Settings::load()?;

    if cli.list_templates {
        commands::list_templates(&settings);
        return Ok(());
    }

    let project_dir = std::env::current_dir()?;
    let options = cli.build_options();

    let code = if cli.doctor {
        commands::doctor::run_doctor(&project_dir, &options, &settings)?;
        0
    } else if cli.clean {
        build::clean(&project_dir, &options, &settings)?;
        0
    } else if let Some(name) = &cli.init {
        let code = commands::init::init_project(
            &project_dir,
            name,
            cli.template.as_deref(),
            &options,
            &settings,
        )?;
        if code == 0 && cli.watch {
            build::watch(&project_dir, &options, &settings)?;
        }
        code
    } else if cli.watch {
        build::watch(&project_dir, &options, &settings)?;
        0
    } else {
        build::build_project(&project_dir, &options, &settings)?
    };

    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
