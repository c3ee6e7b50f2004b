use std::path::Path;
use std::path::PathBuf;
use std::process;

use bookfmt_cli::BookfmtCli;
use bookfmt_cli::Commands;
use bookfmt_cli::OutputFormat;
use bookfmt_core::BookConfig;
use bookfmt_core::CONFIG_FILE_CANDIDATES;
use bookfmt_core::Diagnostics;
use bookfmt_core::FileCache;
use bookfmt_core::ShortcodeContext;
use bookfmt_core::build_document;
use bookfmt_core::format_content_with;
use bookfmt_core::normalize_line_endings;
use clap::Parser;
use owo_colors::OwoColorize;
use serde::Serialize;
use similar::ChangeTag;
use similar::TextDiff;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

type CommandResult = Result<bool, Box<dyn std::error::Error>>;

fn main() {
	let args = BookfmtCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	init_tracing(args.verbose, use_color);

	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	let result = match &args.command {
		Some(Commands::Init) => run_init(&args),
		Some(Commands::Format { files, check, diff }) => run_format(&args, files, *check, *diff),
		Some(Commands::Expand {
			file,
			output_format,
		}) => run_expand(&args, file, *output_format),
		None => {
			eprintln!("No subcommand specified. Run `bookfmt --help` for usage.");
			process::exit(1);
		}
	};

	match result {
		Ok(false) => {}
		Ok(true) => process::exit(1),
		Err(e) => {
			match e.downcast::<bookfmt_core::BookError>() {
				Ok(book_err) => {
					let report: miette::Report = (*book_err).into();
					eprintln!("{report:?}");
				}
				Err(e) => {
					eprintln!("{} {e}", colored!("error:", red));
				}
			}
			process::exit(2);
		}
	}
}

/// Log to stderr. `BOOKFMT_LOG` takes `RUST_LOG` style directives.
fn init_tracing(verbose: bool, use_color: bool) {
	let default_directive = if verbose {
		"bookfmt=debug"
	} else {
		"bookfmt=warn"
	};

	tracing_subscriber::registry()
		.with(
			EnvFilter::try_from_env("BOOKFMT_LOG")
				.unwrap_or_else(|_| EnvFilter::new(default_directive)),
		)
		.with(
			tracing_subscriber::fmt::layer()
				.with_writer(std::io::stderr)
				.with_ansi(use_color)
				.without_time(),
		)
		.init();
}

fn resolve_root(args: &BookfmtCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Make a path relative to root for display purposes.
fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.unwrap_or(path)
		.display()
		.to_string()
}

fn run_init(args: &BookfmtCli) -> CommandResult {
	let root = resolve_root(args);

	if let Some(existing) = BookConfig::resolve_path(&root) {
		println!("Config file already exists: {}", existing.display());
		return Ok(false);
	}

	let config_path = root.join(CONFIG_FILE_CANDIDATES[0]);
	let sample_config = "# bookfmt configuration\n\n[shortcodes]\n# Extension assumed by `{% \
	                     include %}` when the file name has none.\nsource_extension = \
	                     \"gd\"\n# Extension assumed by `{% link %}` and the extension of the \
	                     published documents it points to.\ndocument_extension = \
	                     \"md\"\npublished_extension = \"html\"\n# Deepest heading level listed \
	                     by `{% contents %}`.\ncontents_max_level = 3\n\n[format]\n# Comments in \
	                     code blocks longer than this are re-wrapped.\ncomment_width = \
	                     80\ntab_width = 4\n\n# Files never indexed, in gitignore \
	                     syntax.\n[exclude]\npatterns = []\n";

	std::fs::write(&config_path, sample_config)?;
	println!("Created {}", make_relative(&config_path, &root));
	println!();
	println!("Next steps:");
	println!("  1. Adjust the extensions in bookfmt.toml to the language of your book");
	println!("  2. Run `bookfmt format` to format every chapter");
	println!("  3. Run `bookfmt expand <FILE>` to preview a built chapter");

	Ok(false)
}

fn run_format(args: &BookfmtCli, files: &[PathBuf], check: bool, show_diff: bool) -> CommandResult {
	let root = resolve_root(args);
	let config = BookConfig::load_or_default(&root)?;

	let paths: Vec<PathBuf> = if files.is_empty() {
		let cache = FileCache::build(&root, &config.cache_options())?;
		cache
			.paths()
			.filter(|path| {
				path.extension()
					.is_some_and(|ext| ext == config.shortcodes.document_extension.as_str())
			})
			.map(|path| root.join(path))
			.collect()
	} else {
		files.iter().map(|file| root.join(file)).collect()
	};

	let mut changed = 0;

	for path in &paths {
		let content = std::fs::read_to_string(path)?;
		let formatted = format_content_with(&content, &config.format);
		if formatted == normalize_line_endings(&content) {
			tracing::debug!(path = %path.display(), "already formatted");
			continue;
		}

		changed += 1;
		let rel = make_relative(path, &root);

		if check {
			println!("{} {rel}", colored!("Would reformat:", yellow));
		} else {
			std::fs::write(path, &formatted)?;
			println!("{} {rel}", colored!("Formatted:", green));
		}

		if show_diff {
			print_diff(&content, &formatted);
		}
	}

	if check && changed > 0 {
		eprintln!(
			"{}",
			colored!(
				format!("{changed} of {} file(s) would be reformatted.", paths.len()),
				red
			)
		);
		return Ok(true);
	}

	if check {
		println!("All {} file(s) are formatted.", paths.len());
	} else {
		println!("Formatted {changed} of {} file(s).", paths.len());
	}

	Ok(false)
}

#[derive(Serialize)]
struct ExpandReport<'a> {
	file: String,
	output: &'a str,
	diagnostics: &'a Diagnostics,
}

fn run_expand(args: &BookfmtCli, file: &Path, output_format: OutputFormat) -> CommandResult {
	let root = resolve_root(args);
	let config = BookConfig::load_or_default(&root)?;
	let cache = FileCache::build(&root, &config.cache_options())?;

	let absolute = root.join(file);
	let source_file = absolute.strip_prefix(&root).unwrap_or(&absolute);
	let content = std::fs::read_to_string(&absolute)?;

	let ctx = ShortcodeContext {
		cache: &cache,
		source_file,
		options: &config.shortcodes,
	};
	let mut diagnostics = Diagnostics::new();
	let output = build_document(&content, &ctx, &config.format, &mut diagnostics);

	match output_format {
		OutputFormat::Json => {
			let report = ExpandReport {
				file: make_relative(&absolute, &root),
				output: &output,
				diagnostics: &diagnostics,
			};
			println!("{}", serde_json::to_string_pretty(&report)?);
		}
		OutputFormat::Text => {
			print!("{output}");
			if !diagnostics.is_empty() {
				eprintln!(
					"{}",
					colored!(
						format!(
							"{} error(s), {} warning(s) in {}",
							diagnostics.error_count(),
							diagnostics.warning_count(),
							source_file.display()
						),
						bold
					)
				);
			}
		}
	}

	Ok(diagnostics.has_errors())
}

/// Print a unified diff between two strings, colorized.
fn print_diff(current: &str, expected: &str) {
	let diff = TextDiff::from_lines(current, expected);
	for change in diff.iter_all_changes() {
		match change.tag() {
			ChangeTag::Delete => {
				eprint!("  {}", colored!(format!("-{change}"), red));
			}
			ChangeTag::Insert => {
				eprint!("  {}", colored!(format!("+{change}"), green));
			}
			ChangeTag::Equal => {
				eprint!("   {change}");
			}
		}
	}
}
