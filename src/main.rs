use clap::{Parser, Subcommand};
use image_inline::config::{self, ReaderConfig};
use image_inline::reader::{ImageReader, ImageRequest, ReaderSettings};
use image_inline::sandbox::AllowedRoot;
use image_inline::{logging, output};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Shared arguments for commands that run the read pipeline.
#[derive(clap::Args, Clone)]
struct ReadArgs {
    /// Image path, absolute or relative to the allowed root
    path: String,

    /// Refuse files larger than this many bytes (default: limits.max_file_size)
    #[arg(long)]
    max_size: Option<u64>,
}

impl ReadArgs {
    fn request(&self) -> ImageRequest {
        ImageRequest {
            path: self.path.clone(),
            max_size_bytes: self.max_size,
        }
    }
}

#[derive(Parser)]
#[command(name = "image-inline")]
#[command(version)]
#[command(about = "Read an image from a sandboxed directory as a base64 data URI")]
#[command(long_about = "\
Read an image from a sandboxed directory as a base64 data URI

The path must resolve inside the allowed root. Files over the size ceiling
are refused before decoding. PNG, JPEG, GIF and WebP are accepted; the
format is detected from the file contents, not its extension.

Images narrower than 20px are scaled up to 20px wide, images wider than
800px are scaled down to 800px wide; height follows the aspect ratio.
The result keeps its original format (JPEG is re-encoded at quality 85).

Configuration (later wins):
  stock defaults → <config-dir>/config.toml → IMAGE_INLINE_* env → --root

Run 'image-inline gen-config' to print a documented config.toml.")]
struct Cli {
    /// Allowed root directory (overrides config and IMAGE_INLINE_ROOT)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Directory containing config.toml
    #[arg(long, default_value = ".", global = true)]
    config_dir: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace); logs go to stderr
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the image as a data URI
    Read {
        #[command(flatten)]
        args: ReadArgs,

        /// Print a JSON object with dimensions and format alongside the data URI,
        /// or one with the error kind and message on failure
        #[arg(long)]
        json: bool,
    },
    /// Run the pipeline and summarize the result instead of printing the payload
    Inspect(ReadArgs),
    /// Validate configuration and the allowed root
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Read { ref args, json } => {
            let (_, reader) = build_reader(&cli.config_dir, cli.root.as_deref())?;
            match reader.read(&args.request()) {
                Ok(outcome) if json => println!("{}", serde_json::to_string_pretty(&outcome)?),
                Ok(outcome) => println!("{}", outcome.data_uri),
                Err(e) => {
                    if json {
                        println!("{}", output::format_error_json(&e)?);
                    }
                    return Err(output::format_error(&e).into());
                }
            }
        }
        Command::Inspect(ref args) => {
            let (_, reader) = build_reader(&cli.config_dir, cli.root.as_deref())?;
            let outcome = reader
                .read(&args.request())
                .map_err(|e| output::format_error(&e))?;
            output::print_outcome(&outcome, reader.root());
        }
        Command::Check => {
            let (config, reader) = build_reader(&cli.config_dir, cli.root.as_deref())?;
            output::print_check(&config, reader.root());
            println!("==> Configuration is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load layered config, apply the `--root` override, and open the allowed root.
fn build_reader(
    config_dir: &Path,
    root_override: Option<&Path>,
) -> Result<(ReaderConfig, ImageReader), Box<dyn std::error::Error>> {
    let mut config = config::load_config(config_dir)?;
    if let Some(root) = root_override {
        config.allowed_root = root.display().to_string();
        config.validate()?;
    }
    let root = AllowedRoot::new(&config.allowed_root)?;
    let reader = ImageReader::new(root, ReaderSettings::from_config(&config));
    Ok((config, reader))
}
