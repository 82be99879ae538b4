use std::fs;
use std::io::{self, Read as _};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, ValueEnum};
use env_logger::Env;
use roster_core::core_api::{CoreError, Decoder, ParseResult};
use roster_core::{RosterFormat, supported_extensions};
use roster_render::{
    FieldSelection, JsonStyle, TextRenderOptions, render_field_lines, render_json_full,
    render_json_selected, render_summary_sheet_with_options,
};

const STDIN_PATH: &str = "-";

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Rosz,
    Ros,
    Json,
}

impl FormatArg {
    fn to_core(self) -> RosterFormat {
        match self {
            Self::Rosz => RosterFormat::Compressed,
            Self::Ros => RosterFormat::Xml,
            Self::Json => RosterFormat::Json,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Army list export to decode, or `-` to read stdin.
    #[arg(value_name = "FILE", required_unless_present = "list_formats")]
    path: Option<PathBuf>,
    /// Decode as this format instead of detecting it from the file name.
    #[arg(long, value_enum)]
    format: Option<FormatArg>,
    #[arg(long = "list-formats", conflicts_with = "path")]
    list_formats: bool,
    #[arg(long)]
    name: bool,
    #[arg(long)]
    faction: bool,
    #[arg(long = "game-system")]
    game_system: bool,
    #[arg(long)]
    points: bool,
    #[arg(long)]
    units: bool,
    #[arg(long)]
    generator: bool,
    #[arg(long)]
    revision: bool,
    #[arg(long)]
    json: bool,
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn field_selection(&self) -> FieldSelection {
        FieldSelection {
            name: self.name,
            faction: self.faction,
            game_system: self.game_system,
            points: self.points,
            units: self.units,
            generator: self.generator,
            revision: self.revision,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.list_formats {
        for format in RosterFormat::ALL {
            println!("{}\t{}", format.extension(), format.label());
        }
        return;
    }

    let Some(path) = cli.path.as_deref() else {
        eprintln!("FILE is required unless --list-formats is given");
        process::exit(2);
    };
    let format = cli.format.map(FormatArg::to_core);

    let result = if path == Path::new(STDIN_PATH) {
        let Some(format) = format else {
            eprintln!(
                "--format <rosz|ros|json> is required when reading from stdin ({})",
                supported_extensions().join(", ")
            );
            process::exit(2);
        };
        let bytes = read_stdin().unwrap_or_else(|e| {
            eprintln!("Error reading stdin: {e}");
            process::exit(1);
        });
        Decoder::new().decode_as(bytes, format)
    } else {
        decode_path(path, format)
    };

    let result = result.unwrap_or_else(|e| {
        report_decode_error(path, &e);
        process::exit(1);
    });

    let fields = cli.field_selection();
    if cli.json {
        let json = if fields.is_any_selected() {
            render_json_selected(&result, &fields, JsonStyle::CanonicalV1)
        } else {
            render_json_full(&result, JsonStyle::CanonicalV1)
        };
        let rendered = serde_json::to_string_pretty(&json).unwrap_or_else(|e| {
            eprintln!("Error rendering JSON output: {e}");
            process::exit(1);
        });
        println!("{rendered}");
        return;
    }

    if fields.is_any_selected() {
        print!("{}", render_field_lines(&result, &fields));
        return;
    }

    print_summary(&result, cli.verbose);
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();
}

fn decode_path(path: &Path, format: Option<RosterFormat>) -> Result<ParseResult, CoreError> {
    let decoder = Decoder::new();
    match format {
        Some(format) => {
            let bytes = fs::read(path).unwrap_or_else(|e| {
                eprintln!("Error reading {}: {e}", path.display());
                process::exit(1);
            });
            log::debug!("--format {format:?} overrides detection for {}", path.display());
            decoder.decode_as(bytes, format)
        }
        None => decoder.decode_file(path),
    }
}

fn read_stdin() -> io::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    io::stdin().lock().read_to_end(&mut bytes)?;
    Ok(bytes)
}

fn report_decode_error(path: &Path, err: &CoreError) {
    eprintln!("Error decoding army list: {}", path.display());
    eprintln!("  {err}");
    if let Some(position) = err.position {
        eprintln!("  at line {}, column {}", position.line, position.column);
    }
}

fn print_summary(result: &ParseResult, verbose: bool) {
    print!(
        "{}",
        render_summary_sheet_with_options(result, TextRenderOptions { verbose })
    );
}
