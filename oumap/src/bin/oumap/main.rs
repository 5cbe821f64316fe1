mod commands;
mod examples;
mod output;
mod theme;

use std::fmt::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{
    ColorChoice, Command, CommandFactory, FromArgMatches, Parser, Subcommand,
    builder::{
        Styles,
        styling::{Ansi256Color, Color as ClapColor, RgbColor, Style},
    },
};
use colored::{Color as ThemeColor, Colorize, control::ShouldColorize};

use commands::{
    export::{ExportArgs, handle_export},
    filter::{FilterCommandArgs, handle_filter},
    hours::{HoursArgs, handle_hours},
};
use examples::{ExampleGroup, command_examples};
use oumap::OumapConfig;
use output::{GlobalOptions, OutputFormat, OutputManager};
use theme::{ICONS, THEME};

const ENVIRONMENT_VARIABLES: &[(&str, &str)] = &[
    ("OUMAP_CONFIG", "Path to the oumap.toml configuration file"),
    ("RUST_LOG", "Log filter, e.g. oumap=debug"),
];

#[derive(Parser)]
#[command(name = "oumap")]
#[command(version)]
#[command(
    about = "Filter, inspect and export Open User Map location snapshots",
    long_about = r#"Command-line companion for Open User Map location data that provides:

• The map's marker filtering (search text, categories, custom fields)
• Opening hours evaluation for "open now" filters
• Map center and zoom for the visible markers
• CSV export of any filtered subset

Commands:
  filter    Show the locations a filter combination leaves visible
  export    Write the visible locations as CSV
  hours     Check an opening hours schedule
"#
)]
#[command(subcommand_required = true, arg_required_else_help = true)]
struct Cli {
    /// Output format
    #[arg(long, value_enum, default_value = "table", global = true)]
    output: OutputFormat,

    /// Suppress output (only errors will be shown)
    #[arg(short = 'q', long, global = true)]
    quiet: bool,

    /// Enable verbose output
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Configuration file (defaults to ./oumap.toml when present)
    #[arg(long, env = "OUMAP_CONFIG", value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Parse arguments with themed help; clap prints help, version and usage errors itself.
    fn parse_with_styles() -> Self {
        let matches = build_cli_command()
            .styles(help_styles())
            .try_get_matches()
            .unwrap_or_else(|err| err.exit());
        Cli::from_arg_matches(&matches).unwrap_or_else(|err| err.exit())
    }
}

fn build_cli_command() -> Command {
    let use_color = ShouldColorize::from_env().should_colorize();
    let mut command = Cli::command()
        .after_long_help(render_environment(use_color))
        .color(if use_color { ColorChoice::Auto } else { ColorChoice::Never });

    for example in command_examples() {
        let help = render_examples(example.groups, use_color);
        command = command.mut_subcommand(example.name, |subcommand| subcommand.after_long_help(help));
    }
    command
}

fn render_examples(groups: &[ExampleGroup], use_color: bool) -> String {
    let blocks: Vec<String> = groups
        .iter()
        .map(|group| {
            let mut block = format!("  {}\n", paint(group.title, THEME.primary, true, use_color));
            for command in group.commands {
                let arrow = paint(ICONS.arrow, THEME.secondary, false, use_color);
                let _ = writeln!(block, "    {arrow} {}", paint(command, THEME.secondary, false, use_color));
            }
            block
        })
        .collect();

    format!("{}\n{}", paint("Examples:", THEME.highlight, true, use_color), blocks.join("\n"))
}

fn render_environment(use_color: bool) -> String {
    let mut buffer = format!("{}\n", paint("Environment Variables:", THEME.highlight, true, use_color));
    for (key, description) in ENVIRONMENT_VARIABLES {
        let _ = writeln!(
            buffer,
            "  {}  {}",
            paint(key, THEME.key, true, use_color),
            paint(description, THEME.value, false, use_color)
        );
    }
    let _ = writeln!(
        buffer,
        "\n{} {}",
        paint("Tip:", THEME.highlight, true, use_color),
        paint("Use 'oumap <command> --help' to view examples for each command.", THEME.secondary, false, use_color)
    );
    buffer
}

fn paint(text: &str, color: ThemeColor, bold: bool, use_color: bool) -> String {
    match (use_color, bold) {
        (false, _) => text.to_string(),
        (true, false) => text.color(color).to_string(),
        (true, true) => text.color(color).bold().to_string(),
    }
}

fn help_styles() -> Styles {
    let style = |color: ThemeColor| Style::new().fg_color(Some(clap_color(color)));
    Styles::styled()
        .usage(style(THEME.primary).bold())
        .header(style(THEME.highlight).bold())
        .literal(style(THEME.secondary))
        .placeholder(style(THEME.muted))
        .valid(style(THEME.success))
        .invalid(style(THEME.warning))
        .error(style(THEME.error).bold())
}

/// Theme colors are named ANSI colors; their foreground codes (30-37, 90-97) map onto
/// the first sixteen palette entries.
fn clap_color(color: ThemeColor) -> ClapColor {
    if let ThemeColor::TrueColor { r, g, b } = color {
        return ClapColor::Rgb(RgbColor(r, g, b));
    }
    let index = match color.to_fg_str().parse::<u8>() {
        Ok(code @ 30..=37) => code - 30,
        Ok(code @ 90..=97) => code - 82,
        _ => 7,
    };
    ClapColor::Ansi256(Ansi256Color(index))
}

#[derive(Subcommand)]
enum Commands {
    /// Show the locations left visible by a filter combination
    Filter(FilterCommandArgs),

    /// Write the visible locations as CSV
    Export(ExportArgs),

    /// Check an opening hours schedule against a time
    Hours(HoursArgs),
}

fn main() {
    env_logger::init();

    let cli = Cli::parse_with_styles();

    if let Err(err) = execute(cli) {
        let message = format!("Error: {err:#}");
        let text = if ShouldColorize::from_env().should_colorize() {
            format!("{} {}", ICONS.error.color(THEME.error), message.color(THEME.error))
        } else {
            format!("{} {message}", ICONS.error)
        };
        eprintln!("{text}");
        std::process::exit(1);
    }
}

fn execute(cli: Cli) -> Result<()> {
    let global_options = GlobalOptions {
        output_format: cli.output,
        quiet: cli.quiet,
        verbose: cli.verbose,
        no_color: cli.no_color,
    };
    if global_options.no_color {
        colored::control::set_override(false);
    }

    let output = OutputManager::new(global_options);

    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let config = OumapConfig::load(cli.config.as_deref(), &cwd).context("Failed to load configuration")?;

    match cli.command {
        Commands::Filter(args) => handle_filter(args, &config, &output)?,
        Commands::Export(args) => handle_export(args, &config, &output)?,
        Commands::Hours(args) => handle_hours(args, &config, &output)?,
    }

    Ok(())
}
